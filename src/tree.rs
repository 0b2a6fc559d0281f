//! In-memory construction of the tile tree and its packed serialisation.
//!
//! Construction rasterises every edge polyline into leaf tiles with
//! Bresenham's line algorithm, collects edge ids in sorted duplicate-free
//! leaves, and finally packs the tree depth-first into the flat store using
//! one signed cell per slot: positive values point at subtrees or terminate
//! multi-entry leaves, negative values inline a single edge id, zero means
//! empty.

use crate::distance::DistanceCalc;
use crate::graph::{EdgeFilter, EdgeRef, FetchMode, RoadGraph};
use crate::store::IntStore;
use crate::tiles::TileSchema;

/// Initial capacity of a leaf's edge list.
const INIT_LEAF_ENTRIES: usize = 4;

pub(crate) enum InMemEntry {
    Tree(Vec<Option<InMemEntry>>),
    Leaf(Vec<u32>),
}

impl InMemEntry {
    fn tree(children: usize) -> Self {
        InMemEntry::Tree((0..children).map(|_| None).collect())
    }

    fn leaf() -> Self {
        InMemEntry::Leaf(Vec::with_capacity(INIT_LEAF_ENTRIES))
    }
}

/// Add `value` keeping the list sorted and duplicate-free. Returns false when
/// it was already present.
fn add_once(list: &mut Vec<u32>, value: u32) -> bool {
    match list.binary_search(&value) {
        Ok(_) => false,
        Err(pos) => {
            list.insert(pos, value);
            true
        }
    }
}

/// Visit every integer cell on the line from `(y1, x1)` to `(y2, x2)`.
pub(crate) fn bresenham(
    mut y1: i64,
    mut x1: i64,
    y2: i64,
    x2: i64,
    mut visit: impl FnMut(i64, i64),
) {
    let dy = (y2 - y1).abs();
    let dx = (x2 - x1).abs();
    let sy = if y1 < y2 { 1 } else { -1 };
    let sx = if x1 < x2 { 1 } else { -1 };
    let mut err = dx - dy;
    loop {
        visit(y1, x1);
        if y1 == y2 && x1 == x2 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x1 += sx;
        }
        if e2 < dx {
            err += dx;
            y1 += sy;
        }
    }
}

/// Mutable tree the index is built in before packing it into the store.
pub(crate) struct InMemConstructionIndex<'a> {
    schema: &'a TileSchema,
    dist_calc: &'a dyn DistanceCalc,
    pub(crate) root: InMemEntry,
    /// Total number of edge ids written to the store.
    pub(crate) size: usize,
    /// Number of non-empty leaves written.
    pub(crate) leafs: usize,
    /// Most recently rasterised edge, kept for failure diagnostics.
    pub(crate) last_edge: Option<EdgeRef>,
}

impl<'a> InMemConstructionIndex<'a> {
    pub(crate) fn new(schema: &'a TileSchema, dist_calc: &'a dyn DistanceCalc) -> Self {
        Self {
            root: InMemEntry::tree(schema.entries()[0] as usize),
            schema,
            dist_calc,
            size: 0,
            leafs: 0,
            last_edge: None,
        }
    }

    /// Rasterise every accepted edge of `graph` into the tree.
    pub(crate) fn prepare(&mut self, graph: &RoadGraph, filter: &dyn EdgeFilter) {
        for edge in graph.edges() {
            if !filter.accept(&edge) {
                continue;
            }
            self.last_edge = Some(edge);

            let mut lat1 = graph.node_lat(edge.base_node);
            let mut lon1 = graph.node_lon(edge.base_node);
            for pillar in graph.fetch_way_geometry(&edge, FetchMode::PillarOnly) {
                let (lat2, lon2) = (pillar.y(), pillar.x());
                self.add_edge_to_all_tiles_on_line(edge.edge, lat1, lon1, lat2, lon2);
                lat1 = lat2;
                lon1 = lon2;
            }
            let lat2 = graph.node_lat(edge.adj_node);
            let lon2 = graph.node_lon(edge.adj_node);
            self.add_edge_to_all_tiles_on_line(edge.edge, lat1, lon1, lat2, lon2);
        }
    }

    fn add_edge_to_all_tiles_on_line(
        &mut self,
        edge_id: u32,
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
    ) {
        if self.dist_calc.is_cross_boundary(lon1, lon2) {
            return;
        }
        let schema = self.schema;
        let min_lat = schema.min_lat();
        let min_lon = schema.min_lon();
        let delta_lat = schema.delta_lat();
        let delta_lon = schema.delta_lon();

        let y1 = ((lat1 - min_lat) / delta_lat) as i64;
        let x1 = ((lon1 - min_lon) / delta_lon) as i64;
        let y2 = ((lat2 - min_lat) / delta_lat) as i64;
        let x2 = ((lon2 - min_lon) / delta_lon) as i64;

        let root = &mut self.root;
        bresenham(y1, x1, y2, x2, |y, x| {
            // representative point just inside the tile; re-deriving the key
            // per tile keeps the Morton arithmetic out of the line walk
            let r_lat = (y as f64 + 0.1) * delta_lat + min_lat;
            let r_lon = (x as f64 + 0.1) * delta_lon + min_lon;
            let key_part = schema.create_reverse_key(r_lat, r_lon);
            add_edge_to_one_tile(root, edge_id, 0, key_part, schema);
        });
    }

    /// Depth-first pack the tree into `store` starting at `int_pointer`.
    /// Returns the next free int offset.
    pub(crate) fn store(&mut self, store: &mut IntStore, int_pointer: i32) -> i32 {
        store_entry(&self.root, store, int_pointer, &mut self.size, &mut self.leafs)
    }
}

fn add_edge_to_one_tile(
    entry: &mut InMemEntry,
    value: u32,
    depth: usize,
    key_part: u64,
    schema: &TileSchema,
) {
    match entry {
        InMemEntry::Leaf(ids) => {
            add_once(ids, value);
        }
        InMemEntry::Tree(children) => {
            let index = (schema.bitmask(depth) & key_part) as usize;
            let key_part = key_part >> schema.shift(depth);
            let depth = depth + 1;
            let child = children[index].get_or_insert_with(|| {
                if depth == schema.depth() {
                    InMemEntry::leaf()
                } else {
                    InMemEntry::tree(schema.entries()[depth] as usize)
                }
            });
            add_edge_to_one_tile(child, value, depth, key_part, schema);
        }
    }
}

fn store_entry(
    entry: &InMemEntry,
    store: &mut IntStore,
    int_pointer: i32,
    size: &mut usize,
    leafs: &mut usize,
) -> i32 {
    let pointer = (int_pointer as u64) << 2;
    match entry {
        InMemEntry::Leaf(ids) => {
            let len = ids.len();
            if len == 0 {
                return int_pointer;
            }
            *size += len;
            *leafs += 1;
            let mut int_pointer = int_pointer + 1;
            store.ensure_capacity((int_pointer as usize + len + 1) * 4);
            if len == 1 {
                // a single edge id fits into the header cell itself
                store.set_int(pointer, -(ids[0] as i32) - 1);
            } else {
                for &id in ids {
                    store.set_int((int_pointer as u64) << 2, id as i32);
                    int_pointer += 1;
                }
                store.set_int(pointer, int_pointer);
            }
            int_pointer
        }
        InMemEntry::Tree(children) => {
            let mut int_pointer = int_pointer + children.len() as i32;
            let mut pointer = pointer;
            for child in children {
                if let Some(child) = child {
                    store.ensure_capacity((int_pointer as usize + 1) * 4);
                    let prev_int_pointer = int_pointer;
                    int_pointer = store_entry(child, store, prev_int_pointer, size, leafs);
                    store.set_int(
                        pointer,
                        if int_pointer == prev_int_pointer {
                            0
                        } else {
                            prev_int_pointer
                        },
                    );
                }
                pointer += 4;
            }
            int_pointer
        }
    }
}
