//! Morton (Z-order) keys over a bounds rectangle.
//!
//! A key interleaves latitude and longitude bits by alternating binary
//! subdivision of the bounds, latitude taking the first (most significant)
//! bit. Reversing the bit order puts the coarsest subdivision into the low
//! bits, which is the form the tile tree traverses.

use geo::Rect;

/// Interleaved-bit spatial key encoder bound to a rectangle.
#[derive(Debug, Clone)]
pub struct SpatialKeyAlgo {
    bits: u32,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl SpatialKeyAlgo {
    /// Create an encoder producing keys of `bits` bits over `bounds`
    /// (x = longitude, y = latitude).
    ///
    /// `bits` must be an even number in `2..=64`.
    pub fn new(bits: u32, bounds: Rect<f64>) -> Self {
        debug_assert!((2..=64).contains(&bits) && bits % 2 == 0, "invalid bit width {bits}");
        Self {
            bits,
            min_lat: bounds.min().y,
            max_lat: bounds.max().y,
            min_lon: bounds.min().x,
            max_lon: bounds.max().x,
        }
    }

    /// Number of bits in every produced key.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Key of the tile containing `(lat, lon)`. Coordinates outside the
    /// bounds clamp to the border tiles.
    pub fn encode(&self, lat: f64, lon: f64) -> u64 {
        let mut key = 0u64;
        let (mut min_lat, mut max_lat) = (self.min_lat, self.max_lat);
        let (mut min_lon, mut max_lon) = (self.min_lon, self.max_lon);
        let mut i = 0;
        loop {
            let mid_lat = (min_lat + max_lat) / 2.0;
            if lat > mid_lat {
                key |= 1;
                min_lat = mid_lat;
            } else {
                max_lat = mid_lat;
            }
            i += 1;
            if i >= self.bits {
                break;
            }
            key <<= 1;

            let mid_lon = (min_lon + max_lon) / 2.0;
            if lon > mid_lon {
                key |= 1;
                min_lon = mid_lon;
            } else {
                max_lon = mid_lon;
            }
            i += 1;
            if i >= self.bits {
                break;
            }
            key <<= 1;
        }
        key
    }

    /// Centre `(lat, lon)` of the tile addressed by `key`.
    pub fn decode(&self, key: u64) -> (f64, f64) {
        let mut delta_lat = (self.max_lat - self.min_lat) / 2.0;
        let mut delta_lon = (self.max_lon - self.min_lon) / 2.0;
        let mut lat = self.min_lat;
        let mut lon = self.min_lon;
        let mut bit = 1u64 << (self.bits - 1);
        loop {
            if key & bit != 0 {
                lat += delta_lat;
            }
            delta_lat /= 2.0;
            bit >>= 1;
            if key & bit != 0 {
                lon += delta_lon;
            }
            delta_lon /= 2.0;
            if bit > 1 {
                bit >>= 1;
            } else {
                break;
            }
        }
        (lat + delta_lat, lon + delta_lon)
    }

    /// `key` with its `bits()` low bits reversed, so the coarsest subdivision
    /// ends up in the least significant bits.
    pub fn reverse(&self, key: u64) -> u64 {
        key.reverse_bits() >> (64 - self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn unit_bounds() -> Rect<f64> {
        Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 })
    }

    #[test]
    fn test_encode_quadrants() {
        let algo = SpatialKeyAlgo::new(2, unit_bounds());
        // bit 1 = lat half, bit 0 = lon half
        assert_eq!(algo.encode(0.25, 0.25), 0b00);
        assert_eq!(algo.encode(0.25, 0.75), 0b01);
        assert_eq!(algo.encode(0.75, 0.25), 0b10);
        assert_eq!(algo.encode(0.75, 0.75), 0b11);
    }

    #[test]
    fn test_decode_returns_tile_center() {
        let algo = SpatialKeyAlgo::new(2, unit_bounds());
        assert_eq!(algo.decode(0b00), (0.25, 0.25));
        assert_eq!(algo.decode(0b11), (0.75, 0.75));
    }

    #[test]
    fn test_round_trip_stays_within_tile() {
        let bits = 16;
        let algo = SpatialKeyAlgo::new(bits, unit_bounds());
        let tiles_per_axis = (1u64 << (bits / 2)) as f64;
        let half_tile = 1.0 / tiles_per_axis / 2.0;
        for i in 0..40 {
            for j in 0..40 {
                let lat = 0.0125 + i as f64 * 0.024;
                let lon = 0.0125 + j as f64 * 0.024;
                let (dec_lat, dec_lon) = algo.decode(algo.encode(lat, lon));
                assert!((dec_lat - lat).abs() <= half_tile + 1e-12);
                assert!((dec_lon - lon).abs() <= half_tile + 1e-12);
            }
        }
    }

    #[test]
    fn test_encode_clamps_outside_bounds() {
        let algo = SpatialKeyAlgo::new(8, unit_bounds());
        assert_eq!(algo.encode(-5.0, -5.0), 0);
        assert_eq!(algo.encode(5.0, 5.0), (1u64 << 8) - 1);
    }

    #[test]
    fn test_reverse_is_an_involution() {
        let algo = SpatialKeyAlgo::new(14, unit_bounds());
        for key in [0u64, 1, 0b10_1100_1010_0111 & ((1 << 14) - 1), (1 << 14) - 1] {
            assert_eq!(algo.reverse(algo.reverse(key)), key);
        }
    }

    #[test]
    fn test_reverse_moves_msb_to_lsb() {
        let algo = SpatialKeyAlgo::new(14, unit_bounds());
        assert_eq!(algo.reverse(1 << 13), 1);
        assert_eq!(algo.reverse(1), 1 << 13);
    }
}
