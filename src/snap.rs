//! Snap: the result of matching a coordinate onto the road network.

use crate::distance::DistanceCalc;
use crate::graph::{EdgeRef, FetchMode, RoadGraph};
use geo::Point;
use std::cmp::Ordering;

/// What the snapped point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnappedPosition {
    /// An endpoint of the closest edge.
    Tower,
    /// An interior shape point of the closest edge.
    Pillar,
    /// Somewhere on a segment between two consecutive points.
    Edge,
}

/// Result of a nearest-edge query. Invalid until a candidate was recorded;
/// the query distance is kept in the distance calculator's normalised form
/// during the search and converted to meters when the search finishes.
#[derive(Debug, Clone)]
pub struct Snap {
    query_point: Point<f64>,
    closest_edge: Option<EdgeRef>,
    closest_node: Option<u32>,
    way_index: usize,
    position: SnappedPosition,
    query_distance: f64,
    snapped_point: Option<Point<f64>>,
}

impl Snap {
    pub fn new(query_lat: f64, query_lon: f64) -> Self {
        Self {
            query_point: Point::new(query_lon, query_lat),
            closest_edge: None,
            closest_node: None,
            way_index: 0,
            position: SnappedPosition::Edge,
            query_distance: f64::INFINITY,
            snapped_point: None,
        }
    }

    /// The queried coordinate (x = lon, y = lat).
    pub fn query_point(&self) -> Point<f64> {
        self.query_point
    }

    /// True once a candidate edge was recorded.
    pub fn is_valid(&self) -> bool {
        self.closest_edge.is_some()
    }

    pub fn closest_edge(&self) -> Option<EdgeRef> {
        self.closest_edge
    }

    pub fn closest_node(&self) -> Option<u32> {
        self.closest_node
    }

    /// Index into the closest edge's full geometry the snap is relative to.
    pub fn way_index(&self) -> usize {
        self.way_index
    }

    pub fn snapped_position(&self) -> SnappedPosition {
        self.position
    }

    /// Distance from the query to the snapped point. Normalised during the
    /// search, meters on a returned snap.
    pub fn query_distance(&self) -> f64 {
        self.query_distance
    }

    /// Coordinate of the snapped point, available on a valid returned snap.
    pub fn snapped_point(&self) -> Option<Point<f64>> {
        self.snapped_point
    }

    /// Ordering by ascending query distance.
    pub fn cmp_by_query_distance(&self, other: &Snap) -> Ordering {
        self.query_distance
            .partial_cmp(&other.query_distance)
            .unwrap_or(Ordering::Equal)
    }

    pub(crate) fn record(
        &mut self,
        node: u32,
        normed_dist: f64,
        way_index: usize,
        edge: EdgeRef,
        position: SnappedPosition,
    ) {
        self.closest_node = Some(node);
        self.query_distance = normed_dist;
        self.closest_edge = Some(edge);
        self.way_index = way_index;
        self.position = position;
    }

    pub(crate) fn set_query_distance(&mut self, distance: f64) {
        self.query_distance = distance;
    }

    /// Compute the snapped coordinate from the closest edge's geometry.
    pub(crate) fn calc_snapped_point(&mut self, graph: &RoadGraph, dist_calc: &dyn DistanceCalc) {
        let Some(edge) = self.closest_edge else {
            return;
        };
        let full = graph.fetch_way_geometry(&edge, FetchMode::All);
        let pivot = full[self.way_index];
        if self.position != SnappedPosition::Edge {
            self.snapped_point = Some(pivot);
            return;
        }

        let adjacent = full[self.way_index + 1];
        let (q_lat, q_lon) = (self.query_point.y(), self.query_point.x());
        if dist_calc.valid_edge_distance(
            q_lat,
            q_lon,
            pivot.y(),
            pivot.x(),
            adjacent.y(),
            adjacent.x(),
        ) {
            self.snapped_point = Some(dist_calc.calc_crossing_point_to_edge(
                q_lat,
                q_lon,
                pivot.y(),
                pivot.x(),
                adjacent.y(),
                adjacent.x(),
            ));
        } else {
            self.snapped_point = Some(pivot);
        }
    }
}
