//! Persistent nearest-edge location index for road graphs.
//!
//! The index tiles a graph's bounding box into a fixed-resolution
//! hierarchical grid addressed by reversed Morton keys, packs the grid into a
//! flat array of signed 32-bit cells, and answers "which edge is closest to
//! this coordinate?" as well as rectangular range queries over the stored
//! edges.
//!
//! ```rust
//! use roadgrid::{AllEdges, IntStore, LocationIndex, RoadGraph};
//!
//! let mut graph = RoadGraph::new();
//! let a = graph.add_node(0.0000, 0.0000);
//! let b = graph.add_node(0.0010, 0.0010);
//! graph.add_edge(a, b);
//!
//! let mut index = LocationIndex::new(&graph, IntStore::in_memory());
//! index.prepare_index()?;
//!
//! let snap = index.find_closest(0.0005, 0.0005, &AllEdges)?;
//! assert!(snap.is_valid());
//! # Ok::<(), roadgrid::IndexError>(())
//! ```

pub mod config;
pub mod distance;
pub mod error;
pub mod graph;
pub mod index;
pub mod snap;
pub mod spatial_key;
pub mod store;

mod tiles;
mod tree;

pub use config::IndexConfig;
pub use error::{IndexError, Result};

pub use distance::{DIST_EARTH, DIST_PLANE, DistanceCalc, DistanceEarth, DistancePlane};
pub use graph::{AllEdges, BfsVisitor, EdgeFilter, EdgeRef, FetchMode, RoadGraph};
pub use index::LocationIndex;
pub use snap::{Snap, SnappedPosition};
pub use spatial_key::SpatialKeyAlgo;
pub use store::IntStore;

pub use geo::{Point, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{AllEdges, EdgeFilter, EdgeRef, RoadGraph};

    pub use crate::{IndexConfig, IndexError, IntStore, LocationIndex, Result};

    pub use crate::{Snap, SnappedPosition};

    pub use geo::{Point, Rect};
}
