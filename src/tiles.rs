//! Tile schema: fan-out schedule, per-level shifts and masks, tile sizes.
//!
//! The schedule is derived once from the graph bounds and the requested
//! minimum tile width so that all leaves sit at the same depth. Upper levels
//! use a fan-out of 16 where density pays for it, every remaining level a
//! fan-out of 4, and the product of all fan-outs determines the leaf grid.

use crate::distance::{DIST_EARTH, DistanceCalc, EARTH_CIRCUMFERENCE};
use crate::error::{IndexError, Result};
use crate::spatial_key::SpatialKeyAlgo;
use geo::Rect;

#[derive(Debug, Clone)]
pub(crate) struct TileSchema {
    entries: Vec<u32>,
    shifts: Vec<u32>,
    bitmasks: Vec<u64>,
    delta_lat: f64,
    delta_lon: f64,
    bounds: Rect<f64>,
    key_algo: SpatialKeyAlgo,
}

impl TileSchema {
    /// Derive the schema for the given graph bounds and minimum tile width.
    pub(crate) fn prepare(
        bounds: Option<Rect<f64>>,
        node_count: usize,
        min_resolution_meters: u32,
    ) -> Result<Self> {
        if node_count == 0 {
            return Err(IndexError::InvalidGraphBounds(
                "graph has no nodes".to_string(),
            ));
        }
        let bounds = bounds.ok_or_else(|| {
            IndexError::InvalidGraphBounds("graph has no bounds".to_string())
        })?;
        let (min_lat, max_lat) = (bounds.min().y, bounds.max().y);
        let (min_lon, max_lon) = (bounds.min().x, bounds.max().x);
        let finite = [min_lat, max_lat, min_lon, max_lon]
            .iter()
            .all(|v| v.is_finite());
        if !finite || max_lat <= min_lat || max_lon <= min_lon {
            return Err(IndexError::InvalidGraphBounds(format!(
                "graph bounds are degenerate: lat [{min_lat}, {max_lat}], lon [{min_lon}, {max_lon}]"
            )));
        }

        // size the leaf grid from the larger bounds extent in meters
        let lat = min_lat.abs().min(max_lat.abs());
        let max_dist_meters = ((max_lat - min_lat) / 360.0 * EARTH_CIRCUMFERENCE)
            .max((max_lon - min_lon) / 360.0 * DIST_EARTH.calc_circumference(lat));
        let mut tmp = max_dist_meters / min_resolution_meters as f64;
        tmp *= tmp;

        let mut entries = Vec::new();
        // the last level is always 4, so nearly-empty leaves stay cheap
        tmp /= 4.0;
        while tmp > 1.0 {
            let fan_out = if tmp >= 16.0 {
                16
            } else if tmp >= 4.0 {
                4
            } else {
                break;
            };
            entries.push(fan_out);
            tmp /= fan_out as f64;
        }
        entries.push(4);

        let shifts: Vec<u32> = entries.iter().map(|&e| shift_for(e)).collect();
        let bitmasks: Vec<u64> = shifts.iter().map(|&s| bitmask_for(s)).collect();
        let shift_sum: u32 = shifts.iter().sum();
        if shift_sum > 64 {
            return Err(IndexError::KeySpaceOverflow(shift_sum));
        }

        let key_algo = SpatialKeyAlgo::new(shift_sum, bounds);
        let parts = entries
            .iter()
            .map(|&e| e as f64)
            .product::<f64>()
            .sqrt()
            .round();
        Ok(Self {
            entries,
            shifts,
            bitmasks,
            delta_lat: (max_lat - min_lat) / parts,
            delta_lon: (max_lon - min_lon) / parts,
            bounds,
            key_algo,
        })
    }

    pub(crate) fn depth(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[u32] {
        &self.entries
    }

    pub(crate) fn shift(&self, depth: usize) -> u32 {
        self.shifts[depth]
    }

    pub(crate) fn bitmask(&self, depth: usize) -> u64 {
        self.bitmasks[depth]
    }

    pub(crate) fn delta_lat(&self) -> f64 {
        self.delta_lat
    }

    pub(crate) fn delta_lon(&self) -> f64 {
        self.delta_lon
    }

    pub(crate) fn min_lat(&self) -> f64 {
        self.bounds.min().y
    }

    pub(crate) fn min_lon(&self) -> f64 {
        self.bounds.min().x
    }

    pub(crate) fn lat_span(&self) -> f64 {
        self.bounds.max().y - self.bounds.min().y
    }

    pub(crate) fn lon_span(&self) -> f64 {
        self.bounds.max().x - self.bounds.min().x
    }

    /// Reversed spatial key of `(lat, lon)`: the depth-0 child index sits in
    /// the low bits.
    pub(crate) fn create_reverse_key(&self, lat: f64, lon: f64) -> u64 {
        self.key_algo.reverse(self.key_algo.encode(lat, lon))
    }

    /// Minimum distance from `(lat, lon)` to the border of the
    /// `(2 * padding_tiles + 1)` square of leaf tiles centred on the tile
    /// containing the coordinate.
    pub(crate) fn calculate_r_min(
        &self,
        lat: f64,
        lon: f64,
        padding_tiles: u32,
        dist_calc: &dyn DistanceCalc,
    ) -> f64 {
        let (center_lat, center_lon) = self.key_algo.decode(self.key_algo.encode(lat, lon));

        let pad = 0.5 + padding_tiles as f64;
        let min_lat = center_lat - pad * self.delta_lat;
        let max_lat = center_lat + pad * self.delta_lat;
        let min_lon = center_lon - pad * self.delta_lon;
        let max_lon = center_lon + pad * self.delta_lon;

        let d_min_lat = if lat - min_lat < max_lat - lat {
            dist_calc.calc_dist(lat, lon, min_lat, lon)
        } else {
            dist_calc.calc_dist(lat, lon, max_lat, lon)
        };
        let d_min_lon = if lon - min_lon < max_lon - lon {
            dist_calc.calc_dist(lat, lon, lat, min_lon)
        } else {
            dist_calc.calc_dist(lat, lon, lat, max_lon)
        };

        d_min_lat.min(d_min_lon)
    }
}

fn shift_for(entries: u32) -> u32 {
    let shift = (entries as f64).log2().round() as u32;
    debug_assert!(shift > 0, "invalid shift {shift}");
    shift
}

fn bitmask_for(shift: u32) -> u64 {
    let bitmask = (1u64 << shift) - 1;
    debug_assert!(bitmask > 0, "invalid bitmask {bitmask}");
    bitmask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DIST_PLANE;
    use geo::Coord;

    fn bounds(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Rect<f64> {
        Rect::new(
            Coord {
                x: min_lon,
                y: min_lat,
            },
            Coord {
                x: max_lon,
                y: max_lat,
            },
        )
    }

    #[test]
    fn test_schedule_for_small_bounds() {
        let schema =
            TileSchema::prepare(Some(bounds(-0.01, -0.01, 0.01, 0.01)), 2, 10).unwrap();
        assert_eq!(schema.entries(), &[16, 16, 16, 4]);
        assert_eq!(schema.depth(), 4);
        assert_eq!(schema.key_algo.bits(), 14);
        // 128 x 128 leaf tiles
        assert!((schema.delta_lat() - 0.02 / 128.0).abs() < 1e-12);
        assert!((schema.delta_lon() - 0.02 / 128.0).abs() < 1e-12);
    }

    #[test]
    fn test_schedule_is_non_increasing_and_ends_with_four() {
        for resolution in [10, 50, 300, 1000] {
            let schema =
                TileSchema::prepare(Some(bounds(40.0, -5.0, 52.0, 8.0)), 2, resolution).unwrap();
            let entries = schema.entries();
            assert_eq!(*entries.last().unwrap(), 4);
            for pair in entries.windows(2) {
                assert!(pair[0] >= pair[1]);
            }
            let shift_sum: u32 = (0..schema.depth()).map(|d| schema.shift(d)).sum();
            assert!(shift_sum <= 64);
        }
    }

    #[test]
    fn test_masks_match_shifts() {
        let schema = TileSchema::prepare(Some(bounds(0.0, 0.0, 1.0, 1.0)), 2, 300).unwrap();
        for depth in 0..schema.depth() {
            assert_eq!(schema.bitmask(depth), (1 << schema.shift(depth)) - 1);
        }
    }

    #[test]
    fn test_empty_graph_is_rejected() {
        assert!(matches!(
            TileSchema::prepare(Some(bounds(0.0, 0.0, 1.0, 1.0)), 0, 300),
            Err(IndexError::InvalidGraphBounds(_))
        ));
        assert!(matches!(
            TileSchema::prepare(None, 1, 300),
            Err(IndexError::InvalidGraphBounds(_))
        ));
    }

    #[test]
    fn test_degenerate_bounds_are_rejected() {
        assert!(TileSchema::prepare(Some(bounds(0.5, 0.0, 0.5, 1.0)), 2, 300).is_err());
        assert!(
            TileSchema::prepare(Some(bounds(0.0, 0.0, f64::NAN, 1.0)), 2, 300).is_err()
        );
    }

    #[test]
    fn test_r_min_at_tile_center_is_half_tile() {
        let schema =
            TileSchema::prepare(Some(bounds(-0.01, -0.01, 0.01, 0.01)), 2, 10).unwrap();
        // the exact centre of a tile is half a tile away from every border
        let (lat, lon) = schema.key_algo.decode(schema.key_algo.encode(0.0005, 0.0005));
        let r_min = schema.calculate_r_min(lat, lon, 0, &DIST_PLANE);
        let half_tile_m = DIST_PLANE.calc_dist(lat, lon, lat + schema.delta_lat() / 2.0, lon);
        assert!((r_min - half_tile_m).abs() < 0.01);
    }

    #[test]
    fn test_r_min_grows_with_padding() {
        let schema =
            TileSchema::prepare(Some(bounds(-0.01, -0.01, 0.01, 0.01)), 2, 10).unwrap();
        let r0 = schema.calculate_r_min(0.0005, 0.0005, 0, &DIST_PLANE);
        let r1 = schema.calculate_r_min(0.0005, 0.0005, 1, &DIST_PLANE);
        let r2 = schema.calculate_r_min(0.0005, 0.0005, 2, &DIST_PLANE);
        assert!(r0 < r1 && r1 < r2);
        // each padding ring adds one tile of distance on the nearest side
        let tile_m = DIST_PLANE.calc_dist(0.0005, 0.0005, 0.0005 + schema.delta_lat(), 0.0005);
        assert!((r1 - r0 - tile_m).abs() < 0.05);
    }
}
