mod body;
mod bonds;
mod cluster;
mod domain;
mod error;
mod frame;
mod grid;
mod info;
mod matcher;
mod observer;
mod tracker;

pub use body::Body;
pub use bonds::{group_size_histogram, BondDict};
pub use cluster::{Cluster, ClusterId, MIN_CLUSTER_SIZE};
pub use domain::{Domain, Position};
pub use error::TrackingError;
pub use frame::Frame;
pub use grid::NeighborGrid;
pub use info::{ClusterInfo, MonomerEvent};
pub use matcher::{ClusterMatcher, FrameSummary};
pub use observer::{Observable, Observer, Snapshot, Value};
pub use tracker::{ClusterTracker, TrackerConfig};
