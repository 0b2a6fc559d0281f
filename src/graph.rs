//! In-memory road graph: nodes, edges with pillar geometry, adjacency.
//!
//! Edges connect two *tower* nodes and may carry interior *pillar* points
//! describing the road shape between them. Every edge is undirected for
//! traversal purposes but stored in one orientation; [`EdgeRef`] is a cheap
//! directed view of it.

use geo::{Coord, Point, Rect};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Which parts of an edge's geometry to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Only the interior pillar points.
    PillarOnly,
    /// Pillar points plus the adjacent tower node.
    PillarAndAdj,
    /// Base tower, pillars and adjacent tower.
    All,
}

/// A directed view of a stored edge. `Copy`, so it can be kept around
/// independently of any iteration that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef {
    pub edge: u32,
    pub base_node: u32,
    pub adj_node: u32,
}

/// Predicate deciding which edges take part in indexing or a query.
pub trait EdgeFilter {
    fn accept(&self, edge: &EdgeRef) -> bool;
}

/// Filter accepting every edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllEdges;

impl EdgeFilter for AllEdges {
    fn accept(&self, _edge: &EdgeRef) -> bool {
        true
    }
}

impl<F: Fn(&EdgeRef) -> bool> EdgeFilter for F {
    fn accept(&self, edge: &EdgeRef) -> bool {
        self(edge)
    }
}

#[derive(Debug)]
struct EdgeData {
    base_node: u32,
    adj_node: u32,
    /// Interior shape points ordered base -> adj, x = lon, y = lat.
    pillars: Vec<Point<f64>>,
}

/// Mutable in-memory road graph.
#[derive(Debug, Default)]
pub struct RoadGraph {
    nodes: Vec<Point<f64>>,
    edges: Vec<EdgeData>,
    adjacency: Vec<Vec<u32>>,
    bounds: Option<Rect<f64>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, growing the graph bounds. Returns the node id.
    pub fn add_node(&mut self, lat: f64, lon: f64) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Point::new(lon, lat));
        self.adjacency.push(Vec::new());
        self.extend_bounds(lat, lon);
        id
    }

    /// Grow the bounds rectangle beyond the inserted geometry, e.g. to
    /// reserve a region the graph is expected to cover.
    pub fn extend_bounds(&mut self, lat: f64, lon: f64) {
        let c = Coord { x: lon, y: lat };
        self.bounds = Some(match self.bounds {
            None => Rect::new(c, c),
            Some(r) => Rect::new(
                Coord {
                    x: r.min().x.min(lon),
                    y: r.min().y.min(lat),
                },
                Coord {
                    x: r.max().x.max(lon),
                    y: r.max().y.max(lat),
                },
            ),
        });
    }

    /// Add an edge without interior geometry. Returns the edge id.
    pub fn add_edge(&mut self, base_node: u32, adj_node: u32) -> u32 {
        self.add_edge_with_geometry(base_node, adj_node, &[])
    }

    /// Add an edge with pillar points ordered from base to adj, given as
    /// `(lat, lon)` pairs. Returns the edge id.
    pub fn add_edge_with_geometry(
        &mut self,
        base_node: u32,
        adj_node: u32,
        pillars: &[(f64, f64)],
    ) -> u32 {
        assert!(
            (base_node as usize) < self.nodes.len() && (adj_node as usize) < self.nodes.len(),
            "unknown node"
        );
        let id = self.edges.len() as u32;
        for &(lat, lon) in pillars {
            self.extend_bounds(lat, lon);
        }
        self.edges.push(EdgeData {
            base_node,
            adj_node,
            pillars: pillars
                .iter()
                .map(|&(lat, lon)| Point::new(lon, lat))
                .collect(),
        });
        self.adjacency[base_node as usize].push(id);
        if base_node != adj_node {
            self.adjacency[adj_node as usize].push(id);
        }
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_point(&self, node: u32) -> Point<f64> {
        self.nodes[node as usize]
    }

    pub fn node_lat(&self, node: u32) -> f64 {
        self.nodes[node as usize].y()
    }

    pub fn node_lon(&self, node: u32) -> f64 {
        self.nodes[node as usize].x()
    }

    /// Bounding rectangle of all inserted coordinates, `None` while empty.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    /// All edges in storage orientation.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.edges.iter().enumerate().map(|(id, e)| EdgeRef {
            edge: id as u32,
            base_node: e.base_node,
            adj_node: e.adj_node,
        })
    }

    /// The edge in storage orientation.
    pub fn edge_ref(&self, edge: u32) -> EdgeRef {
        self.edge_ref_for_key(edge * 2)
    }

    /// Edge addressed by key: `edge_id * 2` is the stored orientation,
    /// `edge_id * 2 + 1` the reversed one.
    pub fn edge_ref_for_key(&self, edge_key: u32) -> EdgeRef {
        let edge = edge_key / 2;
        let data = &self.edges[edge as usize];
        if edge_key % 2 == 0 {
            EdgeRef {
                edge,
                base_node: data.base_node,
                adj_node: data.adj_node,
            }
        } else {
            EdgeRef {
                edge,
                base_node: data.adj_node,
                adj_node: data.base_node,
            }
        }
    }

    /// Geometry of `edge` following its orientation, as lon/lat points.
    pub fn fetch_way_geometry(&self, edge: &EdgeRef, mode: FetchMode) -> Vec<Point<f64>> {
        let data = &self.edges[edge.edge as usize];
        let reversed = edge.base_node != data.base_node;
        let mut points = Vec::with_capacity(data.pillars.len() + 2);
        if mode == FetchMode::All {
            points.push(self.nodes[edge.base_node as usize]);
        }
        if reversed {
            points.extend(data.pillars.iter().rev());
        } else {
            points.extend(data.pillars.iter());
        }
        if mode != FetchMode::PillarOnly {
            points.push(self.nodes[edge.adj_node as usize]);
        }
        points
    }

    /// Every incident edge of `node`, oriented so that `base_node == node`.
    pub fn connected_edges(&self, node: u32) -> impl Iterator<Item = EdgeRef> + '_ {
        self.adjacency[node as usize].iter().map(move |&edge| {
            let data = &self.edges[edge as usize];
            let adj_node = if data.base_node == node {
                data.adj_node
            } else {
                data.base_node
            };
            EdgeRef {
                edge,
                base_node: node,
                adj_node,
            }
        })
    }
}

/// Visitor driving a breadth-first walk.
pub trait BfsVisitor {
    /// Called when `node` is taken from the queue; returning false skips its
    /// edges.
    fn go_further(&mut self, node: u32) -> bool;

    /// Called for every edge of a visited node; returning true allows the
    /// adjacent node to be enqueued.
    fn check_adjacent(&mut self, edge: &EdgeRef) -> bool;
}

/// Breadth-first walk over `graph` starting at `start`. The visited set is
/// supplied by the caller so that several walks of one query can skip each
/// other's ground.
pub fn breadth_first_search(
    graph: &RoadGraph,
    start: u32,
    visited: &mut FxHashSet<u32>,
    visitor: &mut impl BfsVisitor,
) {
    let mut fifo = VecDeque::new();
    visited.insert(start);
    fifo.push_back(start);
    while let Some(current) = fifo.pop_front() {
        if !visitor.go_further(current) {
            continue;
        }
        for edge in graph.connected_edges(current) {
            let adj = edge.adj_node;
            if visitor.check_adjacent(&edge) && !visited.contains(&adj) {
                visited.insert(adj);
                fifo.push_back(adj);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> RoadGraph {
        let mut graph = RoadGraph::new();
        let a = graph.add_node(0.0, 0.0);
        let b = graph.add_node(0.0, 1.0);
        let c = graph.add_node(1.0, 1.0);
        graph.add_edge_with_geometry(a, b, &[(0.1, 0.5)]);
        graph.add_edge(b, c);
        graph
    }

    #[test]
    fn test_counts_and_bounds() {
        let graph = sample_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let bounds = graph.bounds().unwrap();
        assert_eq!(bounds.min().y, 0.0);
        assert_eq!(bounds.max().y, 1.0);
    }

    #[test]
    fn test_bounds_include_pillars() {
        let mut graph = RoadGraph::new();
        let a = graph.add_node(0.0, 0.0);
        let b = graph.add_node(0.0, 1.0);
        graph.add_edge_with_geometry(a, b, &[(2.0, 0.5)]);
        assert_eq!(graph.bounds().unwrap().max().y, 2.0);
    }

    #[test]
    fn test_edge_ref_for_key_orientation() {
        let graph = sample_graph();
        let forward = graph.edge_ref_for_key(0);
        assert_eq!((forward.base_node, forward.adj_node), (0, 1));
        let backward = graph.edge_ref_for_key(1);
        assert_eq!((backward.base_node, backward.adj_node), (1, 0));
    }

    #[test]
    fn test_fetch_way_geometry_modes() {
        let graph = sample_graph();
        let edge = graph.edge_ref(0);
        assert_eq!(graph.fetch_way_geometry(&edge, FetchMode::PillarOnly).len(), 1);
        assert_eq!(
            graph.fetch_way_geometry(&edge, FetchMode::PillarAndAdj).len(),
            2
        );
        let all = graph.fetch_way_geometry(&edge, FetchMode::All);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], graph.node_point(0));
        assert_eq!(all[2], graph.node_point(1));
    }

    #[test]
    fn test_fetch_way_geometry_reversed() {
        let mut graph = RoadGraph::new();
        let a = graph.add_node(0.0, 0.0);
        let b = graph.add_node(0.0, 1.0);
        graph.add_edge_with_geometry(a, b, &[(0.1, 0.2), (0.2, 0.8)]);

        let reversed = graph.edge_ref_for_key(1);
        let all = graph.fetch_way_geometry(&reversed, FetchMode::All);
        assert_eq!(all[0], graph.node_point(b));
        assert_eq!(all[1], Point::new(0.8, 0.2));
        assert_eq!(all[2], Point::new(0.2, 0.1));
        assert_eq!(all[3], graph.node_point(a));
    }

    #[test]
    fn test_connected_edges_orientation() {
        let graph = sample_graph();
        let from_b: Vec<EdgeRef> = graph.connected_edges(1).collect();
        assert_eq!(from_b.len(), 2);
        for edge in from_b {
            assert_eq!(edge.base_node, 1);
        }
    }

    struct CountingVisitor {
        expand: bool,
        nodes: Vec<u32>,
        edges: Vec<u32>,
    }

    impl BfsVisitor for CountingVisitor {
        fn go_further(&mut self, node: u32) -> bool {
            self.nodes.push(node);
            true
        }

        fn check_adjacent(&mut self, edge: &EdgeRef) -> bool {
            self.edges.push(edge.edge);
            self.expand
        }
    }

    #[test]
    fn test_bfs_visits_every_node_once() {
        let graph = sample_graph();
        let mut visited = FxHashSet::default();
        let mut visitor = CountingVisitor {
            expand: true,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        breadth_first_search(&graph, 0, &mut visited, &mut visitor);
        assert_eq!(visitor.nodes, vec![0, 1, 2]);
        assert_eq!(visited.len(), 3);
    }

    #[test]
    fn test_bfs_shares_visited_set_across_walks() {
        let graph = sample_graph();
        let mut visited = FxHashSet::default();
        let mut first = CountingVisitor {
            expand: true,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        breadth_first_search(&graph, 0, &mut visited, &mut first);

        // a second walk from an already-covered node still examines the
        // start node itself but cannot enqueue anything new
        let mut second = CountingVisitor {
            expand: true,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        breadth_first_search(&graph, 1, &mut visited, &mut second);
        assert_eq!(second.nodes, vec![1]);
    }
}
