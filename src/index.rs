//! Location index facade: build, persist, load and query the tile tree.
//!
//! The index tiles the graph bounds into a uniform-depth hierarchical grid
//! addressed by reversed Morton keys and packs it into the flat store. A
//! nearest-edge query walks expanding rings of tiles around the query
//! coordinate to collect seed edges, then refines each seed with a
//! breadth-first walk over the graph, comparing normalised distances against
//! every polyline segment.

use crate::config::IndexConfig;
use crate::distance::{DIST_EARTH, DIST_PLANE, DistanceCalc};
use crate::error::{IndexError, Result};
use crate::graph::{
    AllEdges, BfsVisitor, EdgeFilter, EdgeRef, FetchMode, RoadGraph, breadth_first_search,
};
use crate::snap::{Snap, SnappedPosition};
use crate::store::IntStore;
use crate::tiles::TileSchema;
use crate::tree::InMemConstructionIndex;
use geo::{Coord, Rect};
use log::info;
use rustc_hash::FxHashSet;
use std::time::Instant;

/// First payload cell of the packed tree. Cell 0 stays reserved so that a
/// zero child slot can mean "empty subtree".
const START_POINTER: i32 = 1;

/// Header slot 0: format version marker.
const MAGIC_INT: i32 = i32::MAX / 22317;

/// Initial store capacity for a fresh build.
const INITIAL_STORE_BYTES: usize = 64 * 1024;

const HEADER_MAGIC: usize = 0;
const HEADER_CHECKSUM: usize = 1;
const HEADER_RESOLUTION: usize = 2;

/// Nearest-edge index over a road graph, persisted as a flat cell array.
///
/// A fresh instance is *unbuilt*: either [`prepare_index`] constructs and
/// stores the tile tree, or [`load_existing`] revives a previously flushed
/// one. Both may be called once; afterwards the index is read-only until
/// [`close`].
///
/// [`prepare_index`]: LocationIndex::prepare_index
/// [`load_existing`]: LocationIndex::load_existing
/// [`close`]: LocationIndex::close
pub struct LocationIndex<'g> {
    graph: &'g RoadGraph,
    store: IntStore,
    schema: Option<TileSchema>,
    dist_calc: &'static dyn DistanceCalc,
    min_resolution_meters: u32,
    max_region_search: u32,
    /// Normalised distance below which a hit counts as exact and the search
    /// can stop.
    equal_normed_delta: f64,
    initialized: bool,
}

impl<'g> LocationIndex<'g> {
    /// Create an unbuilt index over `graph` backed by `store`, with default
    /// configuration.
    pub fn new(graph: &'g RoadGraph, store: IntStore) -> Self {
        Self::from_parts(graph, store, &IndexConfig::default())
    }

    /// Create an unbuilt index with the given configuration.
    pub fn with_config(graph: &'g RoadGraph, store: IntStore, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(graph, store, &config))
    }

    fn from_parts(graph: &'g RoadGraph, mut store: IntStore, config: &IndexConfig) -> Self {
        let mut max_region_search = config.max_region_search;
        if max_region_search % 2 == 1 {
            // keep it even so the last ring runs a termination check
            max_region_search += 1;
        }
        if let Some(bytes) = config.segment_size_bytes {
            store.set_segment_size(bytes);
        }
        let dist_calc: &'static dyn DistanceCalc = if config.approximate_distance {
            &DIST_PLANE
        } else {
            &DIST_EARTH
        };
        Self {
            graph,
            store,
            schema: None,
            dist_calc,
            min_resolution_meters: config.min_resolution_meters,
            max_region_search,
            equal_normed_delta: dist_calc.normalize_dist(0.1),
            initialized: false,
        }
    }

    /// Switch query distances between the planar approximation and the
    /// precise earth model.
    pub fn set_approximation(&mut self, approximate: bool) {
        self.dist_calc = if approximate { &DIST_PLANE } else { &DIST_EARTH };
        self.equal_normed_delta = self.dist_calc.normalize_dist(0.1);
    }

    pub fn min_resolution_meters(&self) -> u32 {
        self.min_resolution_meters
    }

    pub fn max_region_search(&self) -> u32 {
        self.max_region_search
    }

    /// Leaf tile size `(delta_lat, delta_lon)` in degrees; `None` while the
    /// index is unbuilt. Mostly useful for tests and visualisation.
    pub fn tile_deltas(&self) -> Option<(f64, f64)> {
        self.schema.as_ref().map(|s| (s.delta_lat(), s.delta_lon()))
    }

    pub fn is_closed(&self) -> bool {
        self.store.is_closed()
    }

    /// Close the backing store. Idempotent; every later operation fails with
    /// a lifecycle error.
    pub fn close(&mut self) {
        self.store.close();
    }

    /// Bytes currently held by the backing store.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.store.is_closed() {
            return Err(IndexError::LifecycleViolation(
                "location index is closed, create a new instance",
            ));
        }
        Ok(())
    }

    fn live_schema(&self) -> Result<&TileSchema> {
        self.schema.as_ref().ok_or(IndexError::LifecycleViolation(
            "call prepare_index or load_existing first",
        ))
    }

    fn calc_checksum(&self) -> i32 {
        (self.graph.node_count() as i32) ^ (self.graph.edge_count() as i32)
    }

    /// Build the index from the graph and persist it (unbuilt -> live).
    pub fn prepare_index(&mut self) -> Result<()> {
        self.prepare_index_filtered(&AllEdges)
    }

    /// Build the index considering only edges accepted by `filter`.
    pub fn prepare_index_filtered(&mut self, filter: &dyn EdgeFilter) -> Result<()> {
        self.ensure_open()?;
        if self.initialized {
            return Err(IndexError::LifecycleViolation(
                "call prepare_index only once",
            ));
        }

        let started = Instant::now();
        let schema = TileSchema::prepare(
            self.graph.bounds(),
            self.graph.node_count(),
            self.min_resolution_meters,
        )?;

        let mut in_mem = InMemConstructionIndex::new(&schema, self.dist_calc);
        in_mem.prepare(self.graph, filter);

        self.store.create(INITIAL_STORE_BYTES);
        in_mem.store(&mut self.store, START_POINTER);
        let size = in_mem.size;
        let leafs = in_mem.leafs;
        let last_edge = in_mem.last_edge;

        if let Err(err) = self.flush_with_headers() {
            let context = match last_edge {
                Some(edge) => format!(
                    "last edge {} (base {}, adj {})",
                    edge.edge, edge.base_node, edge.adj_node
                ),
                None => "no edges processed".to_string(),
            };
            return Err(IndexError::ConstructionFailure {
                context,
                source: Box::new(err),
            });
        }

        let entries_per_leaf = if leafs > 0 {
            size as f64 / leafs as f64
        } else {
            0.0
        };
        info!(
            "location index created in {:.3}s, size: {}, leafs: {}, precision: {}, depth: {}, entries: {:?}, entries/leaf: {:.1}, checksum: {}",
            started.elapsed().as_secs_f64(),
            size,
            leafs,
            self.min_resolution_meters,
            schema.depth(),
            schema.entries(),
            entries_per_leaf,
            self.calc_checksum(),
        );

        self.schema = Some(schema);
        self.initialized = true;
        Ok(())
    }

    /// Load a previously built index from the store's backing file, verifying
    /// version and graph checksum. Returns false when no file exists; the
    /// index then stays unbuilt.
    pub fn load_existing(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if self.initialized {
            return Err(IndexError::LifecycleViolation(
                "call load_existing only once",
            ));
        }

        if !self.store.load_existing()? {
            return Ok(false);
        }

        let found = self.store.get_header(HEADER_MAGIC);
        if found != MAGIC_INT {
            return Err(IndexError::VersionMismatch {
                expected: MAGIC_INT,
                found,
            });
        }
        let stored = self.store.get_header(HEADER_CHECKSUM);
        let computed = self.calc_checksum();
        if stored != computed {
            return Err(IndexError::ChecksumMismatch { stored, computed });
        }
        let resolution = self.store.get_header(HEADER_RESOLUTION);
        if resolution <= 0 {
            return Err(IndexError::InvalidFormat);
        }
        self.min_resolution_meters = resolution as u32;

        self.schema = Some(TileSchema::prepare(
            self.graph.bounds(),
            self.graph.node_count(),
            self.min_resolution_meters,
        )?);
        self.initialized = true;
        Ok(true)
    }

    /// Write the header slots and persist the store.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush_with_headers()
    }

    fn flush_with_headers(&mut self) -> Result<()> {
        self.store.set_header(HEADER_MAGIC, MAGIC_INT);
        self.store.set_header(HEADER_CHECKSUM, self.calc_checksum());
        self.store
            .set_header(HEADER_RESOLUTION, self.min_resolution_meters as i32);
        self.store.flush()
    }

    /// Find the edge closest to `(query_lat, query_lon)` among the edges
    /// accepted by `filter`. The returned snap is invalid when nothing was
    /// found within the configured search region.
    pub fn find_closest(
        &self,
        query_lat: f64,
        query_lon: f64,
        filter: &dyn EdgeFilter,
    ) -> Result<Snap> {
        self.ensure_open()?;
        let schema = self.live_schema()?;

        let mut seeds: FxHashSet<u32> = FxHashSet::default();
        for iteration in 0..self.max_region_search {
            let done = self.find_edge_ids_in_neighborhood(
                schema, query_lat, query_lon, &mut seeds, iteration, filter,
            );
            if done {
                break;
            }
        }

        let mut snap = Snap::new(query_lat, query_lon);
        let mut visited: FxHashSet<u32> = FxHashSet::default();
        for &edge_id in &seeds {
            let start = self.graph.edge_ref_for_key(edge_id * 2).base_node;
            let mut search = NearestSearch {
                graph: self.graph,
                dist_calc: self.dist_calc,
                filter,
                equal_normed_delta: self.equal_normed_delta,
                query_lat,
                query_lon,
                go_further: true,
                curr_node: start,
                curr_lat: 0.0,
                curr_lon: 0.0,
                curr_normed_dist: 0.0,
                snap: &mut snap,
            };
            breadth_first_search(self.graph, start, &mut visited, &mut search);
        }

        if snap.is_valid() {
            snap.set_query_distance(self.dist_calc.denormalize_dist(snap.query_distance()));
            snap.calc_snapped_point(self.graph, self.dist_calc);
        }
        Ok(snap)
    }

    /// Collect seed edges from the ring of tiles at offset `iteration` around
    /// the query. Returns true when no later ring can hold a closer edge.
    fn find_edge_ids_in_neighborhood(
        &self,
        schema: &TileSchema,
        query_lat: f64,
        query_lon: f64,
        found: &mut FxHashSet<u32>,
        iteration: u32,
        filter: &dyn EdgeFilter,
    ) -> bool {
        let it = iteration as i64;
        for y_reg in -it..=it {
            let sub_lat = query_lat + y_reg as f64 * schema.delta_lat();
            let sub_lon_a = query_lon - it as f64 * schema.delta_lon();
            let sub_lon_b = query_lon + it as f64 * schema.delta_lon();
            self.find_network_entries_single_region(schema, found, sub_lat, sub_lon_a, filter);
            if iteration > 0 {
                self.find_network_entries_single_region(schema, found, sub_lat, sub_lon_b, filter);
            }
        }
        for x_reg in (-it + 1)..=(it - 1) {
            let sub_lon = query_lon + x_reg as f64 * schema.delta_lon();
            let sub_lat_a = query_lat - it as f64 * schema.delta_lat();
            let sub_lat_b = query_lat + it as f64 * schema.delta_lat();
            self.find_network_entries_single_region(schema, found, sub_lat_a, sub_lon, filter);
            self.find_network_entries_single_region(schema, found, sub_lat_b, sub_lon, filter);
        }

        if iteration % 2 != 0 && !found.is_empty() {
            let r_min = schema.calculate_r_min(query_lat, query_lon, iteration, self.dist_calc);
            let min_distance = self.calc_min_distance(query_lat, query_lon, found);
            if min_distance < r_min {
                // found a candidate closer than any tile beyond this ring
                // can possibly hold
                return true;
            }
            // an undetected nearer edge may still sit in a farther tile
        }
        false
    }

    fn find_network_entries_single_region(
        &self,
        schema: &TileSchema,
        found: &mut FxHashSet<u32>,
        lat: f64,
        lon: f64,
        filter: &dyn EdgeFilter,
    ) {
        let key_part = schema.create_reverse_key(lat, lon);
        self.fill_ids(schema, key_part, START_POINTER, found, 0, filter);
    }

    /// Smallest endpoint distance from the query over all candidate edges.
    fn calc_min_distance(&self, query_lat: f64, query_lon: f64, edges: &FxHashSet<u32>) -> f64 {
        let mut min = f64::MAX;
        for &edge_id in edges {
            let edge = self.graph.edge_ref_for_key(edge_id * 2);
            let dist_base = self.dist_calc.calc_dist(
                query_lat,
                query_lon,
                self.graph.node_lat(edge.base_node),
                self.graph.node_lon(edge.base_node),
            );
            if dist_base < min {
                min = dist_base;
            }
            let dist_adj = self.dist_calc.calc_dist(
                query_lat,
                query_lon,
                self.graph.node_lat(edge.adj_node),
                self.graph.node_lon(edge.adj_node),
            );
            if dist_adj < min {
                min = dist_adj;
            }
        }
        min
    }

    /// Descend from `int_pointer` along `key_part`, collecting every stored
    /// edge id of the addressed leaf that passes the filter.
    fn fill_ids(
        &self,
        schema: &TileSchema,
        key_part: u64,
        int_pointer: i32,
        set: &mut FxHashSet<u32>,
        depth: usize,
        filter: &dyn EdgeFilter,
    ) {
        let pointer = (int_pointer as u64) << 2;
        if depth == schema.depth() {
            let value = self.store.get_int(pointer);
            if value < 0 {
                // single edge id packed into the cell
                let edge_id = (-(value + 1)) as u32;
                if filter.accept(&self.graph.edge_ref_for_key(edge_id * 2)) {
                    set.insert(edge_id);
                }
            } else {
                // value is the exclusive end of the id run after the header
                let max = (value as u64) << 2;
                let mut leaf_pointer = pointer + 4;
                while leaf_pointer < max {
                    let edge_id = self.store.get_int(leaf_pointer) as u32;
                    if filter.accept(&self.graph.edge_ref_for_key(edge_id * 2)) {
                        set.insert(edge_id);
                    }
                    leaf_pointer += 4;
                }
            }
            return;
        }
        let offset = (schema.bitmask(depth) & key_part) << 2;
        let next_int_pointer = self.store.get_int(pointer + offset);
        if next_int_pointer > 0 {
            self.fill_ids(
                schema,
                key_part >> schema.shift(depth),
                next_int_pointer,
                set,
                depth + 1,
                filter,
            );
        }
    }

    /// Visit every stored edge whose tile overlaps `query_bbox`
    /// (x = lon, y = lat), each exactly once.
    pub fn query(&self, query_bbox: &Rect<f64>, mut visitor: impl FnMut(u32)) -> Result<()> {
        self.ensure_open()?;
        let schema = self.live_schema()?;

        let mut seen: FxHashSet<u32> = FxHashSet::default();
        self.query_cell(
            schema,
            START_POINTER,
            Some(*query_bbox),
            schema.min_lat(),
            schema.min_lon(),
            schema.lat_span(),
            schema.lon_span(),
            0,
            &mut |edge_id| {
                if seen.insert(edge_id) {
                    visitor(edge_id);
                }
            },
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn query_cell(
        &self,
        schema: &TileSchema,
        int_pointer: i32,
        query_bbox: Option<Rect<f64>>,
        min_lat: f64,
        min_lon: f64,
        delta_lat_per_depth: f64,
        delta_lon_per_depth: f64,
        depth: usize,
        on_edge: &mut dyn FnMut(u32),
    ) {
        let pointer = (int_pointer as u64) << 2;
        if depth == schema.depth() {
            let value = self.store.get_int(pointer);
            if value < 0 {
                on_edge((-(value + 1)) as u32);
            } else {
                let max = (value as u64) << 2;
                let mut leaf_pointer = pointer + 4;
                while leaf_pointer < max {
                    on_edge(self.store.get_int(leaf_pointer) as u32);
                    leaf_pointer += 4;
                }
            }
            return;
        }

        let max = 1u32 << schema.shift(depth);
        let factor = if max == 4 { 2.0 } else { 4.0 };
        let delta_lat_per_depth = delta_lat_per_depth / factor;
        let delta_lon_per_depth = delta_lon_per_depth / factor;
        for cell_index in 0..max {
            let next_int_pointer = self.store.get_int(pointer + (cell_index as u64) * 4);
            if next_int_pointer <= 0 {
                continue;
            }
            // the cell index is a chunk of the reversed key: even bits carry
            // the latitude, odd bits the longitude, coarsest bit first
            let (lat_count, lon_count) = if max == 4 {
                (cell_index & 1, cell_index >> 1)
            } else {
                (
                    (cell_index & 1) * 2 + if cell_index & 4 == 0 { 0 } else { 1 },
                    (cell_index & 2) + if cell_index & 8 == 0 { 0 } else { 1 },
                )
            };
            let cell_min_lat = min_lat + delta_lat_per_depth * lat_count as f64;
            let cell_min_lon = min_lon + delta_lon_per_depth * lon_count as f64;
            let cell = Rect::new(
                Coord {
                    x: cell_min_lon,
                    y: cell_min_lat,
                },
                Coord {
                    x: cell_min_lon + delta_lon_per_depth,
                    y: cell_min_lat + delta_lat_per_depth,
                },
            );

            let next_bbox = match query_bbox {
                // no restriction, emit the whole subtree
                None => None,
                Some(bbox) if bbox_contains(&bbox, &cell) => None,
                Some(bbox) if bbox_intersects(&bbox, &cell) => Some(bbox),
                Some(_) => continue,
            };
            self.query_cell(
                schema,
                next_int_pointer,
                next_bbox,
                cell_min_lat,
                cell_min_lon,
                delta_lat_per_depth,
                delta_lon_per_depth,
                depth + 1,
                on_edge,
            );
        }
    }
}

fn bbox_contains(outer: &Rect<f64>, inner: &Rect<f64>) -> bool {
    outer.min().x <= inner.min().x
        && outer.max().x >= inner.max().x
        && outer.min().y <= inner.min().y
        && outer.max().y >= inner.max().y
}

fn bbox_intersects(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && a.max().x >= b.min().x
        && a.min().y <= b.max().y
        && a.max().y >= b.min().y
}

/// Breadth-first refinement of one seed edge: checks the visited tower node,
/// then every accepted outgoing edge's polyline, recording whichever
/// candidate improves the shared snap.
struct NearestSearch<'a> {
    graph: &'a RoadGraph,
    dist_calc: &'static dyn DistanceCalc,
    filter: &'a dyn EdgeFilter,
    equal_normed_delta: f64,
    query_lat: f64,
    query_lon: f64,
    go_further: bool,
    curr_node: u32,
    curr_lat: f64,
    curr_lon: f64,
    curr_normed_dist: f64,
    snap: &'a mut Snap,
}

impl NearestSearch<'_> {
    fn check(
        &mut self,
        node: u32,
        normed_dist: f64,
        way_index: usize,
        edge: &EdgeRef,
        position: SnappedPosition,
    ) -> bool {
        if normed_dist < self.snap.query_distance() {
            self.snap
                .record(node, normed_dist, way_index, *edge, position);
            true
        } else {
            false
        }
    }
}

impl BfsVisitor for NearestSearch<'_> {
    fn go_further(&mut self, node: u32) -> bool {
        self.curr_node = node;
        self.curr_lat = self.graph.node_lat(node);
        self.curr_lon = self.graph.node_lon(node);
        self.curr_normed_dist = self.dist_calc.calc_normalized_dist(
            self.query_lat,
            self.query_lon,
            self.curr_lat,
            self.curr_lon,
        );
        self.go_further
    }

    fn check_adjacent(&mut self, curr_edge: &EdgeRef) -> bool {
        self.go_further = false;
        if !self.filter.accept(curr_edge) {
            return true;
        }

        let mut closest_node = self.curr_node;
        if self.check(
            closest_node,
            self.curr_normed_dist,
            0,
            curr_edge,
            SnappedPosition::Tower,
        ) && self.curr_normed_dist <= self.equal_normed_delta
        {
            return false;
        }

        let adj_node = curr_edge.adj_node;
        let adj_lat = self.graph.node_lat(adj_node);
        let adj_lon = self.graph.node_lon(adj_node);
        let adj_dist =
            self.dist_calc
                .calc_normalized_dist(adj_lat, adj_lon, self.query_lat, self.query_lon);
        // with shape points in between this is only an approximation
        if adj_dist < self.curr_normed_dist {
            closest_node = adj_node;
        }

        let mut tmp_lat = self.curr_lat;
        let mut tmp_lon = self.curr_lon;
        let points = self
            .graph
            .fetch_way_geometry(curr_edge, FetchMode::PillarAndAdj);
        let len = points.len();
        for (point_index, way_point) in points.iter().enumerate() {
            let way_lat = way_point.y();
            let way_lon = way_point.x();
            if self.dist_calc.is_cross_boundary(tmp_lon, way_lon) {
                tmp_lat = way_lat;
                tmp_lon = way_lon;
                continue;
            }

            let tmp_normed_dist;
            if self.dist_calc.valid_edge_distance(
                self.query_lat,
                self.query_lon,
                tmp_lat,
                tmp_lon,
                way_lat,
                way_lon,
            ) {
                tmp_normed_dist = self.dist_calc.calc_normalized_edge_distance(
                    self.query_lat,
                    self.query_lon,
                    tmp_lat,
                    tmp_lon,
                    way_lat,
                    way_lon,
                );
                self.check(
                    closest_node,
                    tmp_normed_dist,
                    point_index,
                    curr_edge,
                    SnappedPosition::Edge,
                );
            } else {
                let position;
                if point_index + 1 == len {
                    tmp_normed_dist = adj_dist;
                    position = SnappedPosition::Tower;
                } else {
                    tmp_normed_dist = self.dist_calc.calc_normalized_dist(
                        self.query_lat,
                        self.query_lon,
                        way_lat,
                        way_lon,
                    );
                    position = SnappedPosition::Pillar;
                }
                self.check(
                    closest_node,
                    tmp_normed_dist,
                    point_index + 1,
                    curr_edge,
                    position,
                );
            }

            if tmp_normed_dist <= self.equal_normed_delta {
                return false;
            }
            tmp_lat = way_lat;
            tmp_lon = way_lon;
        }
        self.snap.query_distance() > self.equal_normed_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_is_stable() {
        // the on-disk version marker must never change silently
        assert_eq!(MAGIC_INT, 96_226);
    }

    #[test]
    fn test_bbox_helpers() {
        let outer = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 });
        let inner = Rect::new(Coord { x: 2.0, y: 2.0 }, Coord { x: 3.0, y: 3.0 });
        let overlapping = Rect::new(Coord { x: 9.0, y: 9.0 }, Coord { x: 12.0, y: 12.0 });
        let outside = Rect::new(Coord { x: 20.0, y: 20.0 }, Coord { x: 21.0, y: 21.0 });

        assert!(bbox_contains(&outer, &inner));
        assert!(!bbox_contains(&outer, &overlapping));
        assert!(bbox_intersects(&outer, &overlapping));
        assert!(!bbox_intersects(&outer, &outside));
        // touching borders count as intersecting
        let touching = Rect::new(Coord { x: 10.0, y: 0.0 }, Coord { x: 11.0, y: 1.0 });
        assert!(bbox_intersects(&outer, &touching));
    }

    #[test]
    fn test_odd_region_search_is_rounded_up() {
        let graph = RoadGraph::new();
        let index = LocationIndex::with_config(
            &graph,
            IntStore::in_memory(),
            IndexConfig::default().with_max_region_search(3),
        )
        .unwrap();
        assert_eq!(index.max_region_search(), 4);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let graph = RoadGraph::new();
        assert!(matches!(
            LocationIndex::with_config(
                &graph,
                IntStore::in_memory(),
                IndexConfig::default().with_min_resolution(0),
            ),
            Err(IndexError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_query_before_prepare_fails() {
        let graph = RoadGraph::new();
        let index = LocationIndex::new(&graph, IntStore::in_memory());
        assert!(matches!(
            index.find_closest(0.0, 0.0, &AllEdges),
            Err(IndexError::LifecycleViolation(_))
        ));
    }

    #[test]
    fn test_prepare_empty_graph_fails() {
        let graph = RoadGraph::new();
        let mut index = LocationIndex::new(&graph, IntStore::in_memory());
        assert!(matches!(
            index.prepare_index(),
            Err(IndexError::InvalidGraphBounds(_))
        ));
    }
}
