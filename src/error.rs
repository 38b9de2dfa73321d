use itertools::Itertools;
use std::fmt;

use crate::cluster::ClusterId;
use crate::observer::Observable;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackingError {
    InvalidDomain { axis: usize, lo: f64, hi: f64 },
    InvalidRadius(f64),
    RadiusExceedsDomain { axis: usize, size: f64, radius: f64 },
    UnsupportedDimension(usize),
    InvalidMinClusterSize(usize),
    OutOfBounds { body: usize, axis: usize, value: f64 },
    NonIncreasingFrame { previous: u64, current: u64 },
    UnsupportedObservable(String),
    MissingBondEntry(usize),
    AsymmetricBond(usize, usize),
    UndersizedCluster(usize),
    BodyIdMismatch { index: usize, id: usize },
    BodyCountMismatch { previous: usize, current: usize },
    BondCountMismatch { bonds: usize, bodies: usize },
    UnknownCluster(ClusterId),
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { axis, lo, hi } => {
                write!(f, "domain axis {axis} has non-positive extent [{lo}, {hi}]")
            }
            Self::InvalidRadius(r) => write!(f, "interaction radius must be positive, got {r}"),
            Self::InvalidMinClusterSize(n) => {
                write!(f, "minimum cluster size must be at least 2, got {n}")
            }
            Self::OutOfBounds { body, axis, value } => {
                write!(f, "body {body} is outside the domain on axis {axis}: {value}")
            }
            Self::NonIncreasingFrame { previous, current } => {
                write!(f, "frame {current} does not follow frame {previous}")
            }
            Self::RadiusExceedsDomain { axis, size, radius } => write!(
                f,
                "domain axis {axis} of size {size} is narrower than half the radius {radius}"
            ),
            Self::UnsupportedDimension(d) => {
                write!(f, "only 2D and 3D domains are supported, got {d}D")
            }
            Self::UnsupportedObservable(name) => write!(
                f,
                "observable '{name}' is not implemented, expected one of: {}",
                Observable::ALL.iter().map(Observable::name).join(", ")
            ),
            Self::MissingBondEntry(id) => write!(f, "body {id} has no bond dictionary entry"),
            Self::AsymmetricBond(a, b) => write!(f, "bond {a} -> {b} has no reverse entry"),
            Self::UndersizedCluster(n) => write!(f, "cluster of {n} bodies is below minimum size"),
            Self::BodyIdMismatch { index, id } => {
                write!(f, "body at index {index} carries id {id}")
            }
            Self::BodyCountMismatch { previous, current } => write!(
                f,
                "frame has {current} bodies, previous frame had {previous}"
            ),
            Self::BondCountMismatch { bonds, bodies } => write!(
                f,
                "bond dictionary has {bonds} entries for {bodies} bodies"
            ),
            Self::UnknownCluster(id) => write!(f, "no cluster record for id {id}"),
        }
    }
}

impl std::error::Error for TrackingError {}
