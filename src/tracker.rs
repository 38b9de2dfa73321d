use log::debug;
use std::collections::BTreeMap;

use crate::body::Body;
use crate::bonds::BondDict;
use crate::cluster::{ClusterId, MIN_CLUSTER_SIZE};
use crate::frame::Frame;
use crate::grid::NeighborGrid;
use crate::info::ClusterInfo;
use crate::matcher::{ClusterMatcher, FrameSummary};
use crate::observer::Observer;
use crate::TrackingError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub min_cluster_size: usize,
    pub observer: Observer,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: MIN_CLUSTER_SIZE,
            observer: Observer::default(),
        }
    }
}

/// Runs frames through grouping and id matching, one at a time.
///
/// A frame either goes through completely or is rejected before any state
/// changes.
#[derive(Debug, Clone)]
pub struct ClusterTracker<const D: usize> {
    min_cluster_size: usize,
    matcher: ClusterMatcher<D>,
    previous: Option<Frame<D>>,
    monomer_fractions: Vec<(u64, f64)>,
}

impl<const D: usize> ClusterTracker<D> {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackingError> {
        if config.min_cluster_size < MIN_CLUSTER_SIZE {
            return Err(TrackingError::InvalidMinClusterSize(config.min_cluster_size));
        }
        Ok(Self {
            min_cluster_size: config.min_cluster_size,
            matcher: ClusterMatcher::new(config.observer),
            previous: None,
            monomer_fractions: Vec::new(),
        })
    }

    pub fn process_frame(
        &mut self,
        frame_num: u64,
        bodies: Vec<Body<D>>,
        bonds: &BondDict,
    ) -> Result<FrameSummary, TrackingError> {
        if let Some(previous) = self.previous.as_ref() {
            if frame_num <= previous.frame_num() {
                return Err(TrackingError::NonIncreasingFrame {
                    previous: previous.frame_num(),
                    current: frame_num,
                });
            }
            if bodies.len() != previous.bodies().len() {
                return Err(TrackingError::BodyCountMismatch {
                    previous: previous.bodies().len(),
                    current: bodies.len(),
                });
            }
        }
        if let Some(missing) = (0..bodies.len()).find(|&i| bonds.neighbors(i).is_none()) {
            return Err(TrackingError::MissingBondEntry(missing));
        }
        if bonds.len() != bodies.len() {
            return Err(TrackingError::BondCountMismatch {
                bonds: bonds.len(),
                bodies: bodies.len(),
            });
        }
        bonds.validate()?;
        let groups = bonds.groups()?;
        let mut frame = Frame::new(frame_num, bodies)?;
        frame.form_clusters(&groups, self.min_cluster_size)?;

        let summary = self.matcher.resolve(self.previous.as_mut(), &mut frame);
        debug!(
            "frame {}: {} clusters, {} kept, {} born, {} died, {} merged, {} split, monomers {:.4}",
            summary.frame,
            summary.clusters,
            summary.continued,
            summary.births,
            summary.deaths,
            summary.merges,
            summary.splits,
            summary.monomer_fraction
        );
        self.monomer_fractions
            .push((frame_num, frame.monomer_fraction()));
        self.previous = Some(frame);
        Ok(summary)
    }

    /// Rebuilds `grid` from `bodies`, bonds every neighbor pair accepted by
    /// `criterion` and processes the frame.
    pub fn track_frame<F>(
        &mut self,
        grid: &mut NeighborGrid<D>,
        frame_num: u64,
        bodies: Vec<Body<D>>,
        criterion: F,
    ) -> Result<FrameSummary, TrackingError>
    where
        F: Fn(&Body<D>, &Body<D>) -> bool + Sync,
    {
        grid.update(&bodies)?;
        let bonds = grid.bond_dict(&bodies, criterion);
        self.process_frame(frame_num, bodies, &bonds)
    }

    pub fn current_frame(&self) -> Option<&Frame<D>> {
        self.previous.as_ref()
    }

    pub fn info(&self, id: ClusterId) -> Result<&ClusterInfo<D>, TrackingError> {
        self.matcher
            .infos()
            .get(&id)
            .ok_or(TrackingError::UnknownCluster(id))
    }

    pub fn infos(&self) -> &BTreeMap<ClusterId, ClusterInfo<D>> {
        self.matcher.infos()
    }

    pub fn into_infos(self) -> BTreeMap<ClusterId, ClusterInfo<D>> {
        self.matcher.into_infos()
    }

    pub fn monomer_fractions(&self) -> &[(u64, f64)] {
        &self.monomer_fractions
    }

    /// Id currently carried by the cluster containing `body`.
    pub fn cluster_of(&self, body: usize) -> Option<ClusterId> {
        self.previous
            .as_ref()
            .and_then(|frame| frame.bodies().get(body))
            .and_then(Body::cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use assert_float_eq::assert_f64_near;

    const N: usize = 6;

    fn bodies() -> Vec<Body<3>> {
        (0..N).map(|i| Body::from(i, [i as f64, 0.0, 0.0])).collect()
    }

    fn tracker() -> ClusterTracker<3> {
        ClusterTracker::new(TrackerConfig::default()).unwrap()
    }

    fn step(tracker: &mut ClusterTracker<3>, frame: u64, pairs: &[(usize, usize)]) -> FrameSummary {
        let bonds = BondDict::from_pairs(N, pairs.iter().copied());
        tracker.process_frame(frame, bodies(), &bonds).unwrap()
    }

    #[test]
    fn test_id_persistence() {
        let mut tracker = tracker();
        let summary = step(&mut tracker, 10, &[(1, 2), (3, 4), (4, 5)]);
        assert_eq!(summary.births, 2);
        let a = tracker.cluster_of(1).unwrap();
        let b = tracker.cluster_of(3).unwrap();
        assert_ne!(a, b);
        assert_eq!(tracker.cluster_of(0), None);
        for frame in 11..15 {
            let summary = step(&mut tracker, frame, &[(2, 1), (5, 4), (3, 4)]);
            assert_eq!(summary.continued, 2);
            assert_eq!(summary.births + summary.deaths, 0);
            assert_eq!(tracker.cluster_of(2), Some(a));
            assert_eq!(tracker.cluster_of(5), Some(b));
        }
        let info = tracker.info(a).unwrap();
        assert_eq!(info.birth_frame(), 10);
        assert!(!info.is_dead());
        assert_eq!(info.data().len(), 5);
        assert_eq!(info.last_updated(), Some(14));
        assert_eq!(tracker.infos().len(), 2);
    }

    #[test]
    fn test_merge() {
        let mut tracker = tracker();
        step(&mut tracker, 0, &[(1, 2), (3, 4)]);
        let a = tracker.cluster_of(1).unwrap();
        let b = tracker.cluster_of(3).unwrap();
        let summary = step(&mut tracker, 1, &[(1, 2), (2, 3), (3, 4)]);
        assert_eq!(summary.merges, 1);
        assert_eq!(summary.deaths, 1);
        assert_eq!(summary.clusters, 1);

        let merged = tracker.cluster_of(4).unwrap();
        assert_eq!(merged, a);
        assert!((1..=4).all(|i| tracker.cluster_of(i) == Some(merged)));
        let absorbed = tracker.info(b).unwrap();
        assert!(absorbed.is_dead());
        assert_eq!(absorbed.death_frame(), Some(1));
        assert_eq!(absorbed.lifetime(), Some(1));
        let survivor = tracker.info(a).unwrap();
        assert!(!survivor.is_dead());
        assert_eq!(survivor.data().last().unwrap().num_bodies(), Some(4));
    }

    #[test]
    fn test_merge_prefers_larger_predecessor() {
        let mut tracker = tracker();
        step(&mut tracker, 0, &[(0, 1), (2, 3), (3, 4)]);
        let small = tracker.cluster_of(0).unwrap();
        let large = tracker.cluster_of(2).unwrap();
        step(&mut tracker, 1, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        assert_eq!(tracker.cluster_of(0), Some(large));
        assert!(tracker.info(small).unwrap().is_dead());
    }

    #[test]
    fn test_split() {
        let mut tracker = tracker();
        step(&mut tracker, 4, &[(1, 2), (2, 3), (3, 4)]);
        let a = tracker.cluster_of(1).unwrap();
        let summary = step(&mut tracker, 5, &[(1, 2), (3, 4)]);
        assert_eq!(summary.splits, 1);
        assert_eq!(summary.continued, 1);
        assert_eq!(summary.births, 1);
        assert_eq!(summary.deaths, 0);

        assert_eq!(tracker.cluster_of(1), Some(a));
        assert_eq!(tracker.cluster_of(2), Some(a));
        let fresh = tracker.cluster_of(3).unwrap();
        assert_ne!(fresh, a);
        assert_eq!(tracker.cluster_of(4), Some(fresh));

        let info = tracker.info(fresh).unwrap();
        assert_eq!(info.birth_frame(), 5);
        assert!(info.has_parent());
        assert_eq!(info.data().len(), 2);
        assert_eq!(info.data()[0].num_bodies(), Some(4));
        assert_eq!(info.data()[1].num_bodies(), Some(2));
        assert!(!tracker.info(a).unwrap().has_parent());
    }

    #[test]
    fn test_split_keeps_id_in_larger_fragment() {
        let mut tracker = tracker();
        step(&mut tracker, 0, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let a = tracker.cluster_of(0).unwrap();
        step(&mut tracker, 1, &[(0, 1), (2, 3), (3, 4)]);
        assert_eq!(tracker.cluster_of(2), Some(a));
        assert_ne!(tracker.cluster_of(0), Some(a));
    }

    #[test]
    fn test_monomer_transitions() {
        let mut tracker = tracker();
        step(&mut tracker, 0, &[(1, 2)]);
        let a = tracker.cluster_of(1).unwrap();
        assert_f64_near!(tracker.monomer_fractions()[0].1, 4.0 / 6.0);

        step(&mut tracker, 1, &[(1, 2), (2, 0)]);
        assert_eq!(tracker.cluster_of(0), Some(a));
        let info = tracker.info(a).unwrap();
        let gain = &info.monomer_gain_data()[0];
        assert_eq!(gain.count, 1);
        assert_f64_near!(gain.snapshot.monomer_fraction.unwrap(), 4.0 / 6.0);
        assert_eq!(gain.snapshot.num_bodies(), Some(3));

        step(&mut tracker, 2, &[(1, 2)]);
        let info = tracker.info(a).unwrap();
        assert_eq!(info.monomer_loss_data().len(), 1);
        assert_eq!(info.monomer_loss_data()[0].count, 1);

        let summary = step(&mut tracker, 3, &[]);
        assert_eq!(summary.deaths, 1);
        assert_f64_near!(summary.monomer_fraction, 1.0);
        let info = tracker.info(a).unwrap();
        assert!(info.is_dead());
        assert_eq!(info.lifetime(), Some(3));
        assert_eq!(info.monomer_loss_data().len(), 2);
        assert_eq!(info.monomer_loss_data()[1].count, 2);
        assert_eq!(info.data().len(), 3);
    }

    #[test]
    fn test_birth_from_monomers() {
        let mut tracker = tracker();
        step(&mut tracker, 0, &[]);
        assert!(tracker.infos().is_empty());
        let summary = step(&mut tracker, 1, &[(4, 5)]);
        assert_eq!(summary.births, 1);
        let info = tracker.info(tracker.cluster_of(4).unwrap()).unwrap();
        assert_eq!(info.birth_frame(), 1);
        assert!(!info.is_dead());
        assert_eq!(info.monomer_gain_data()[0].count, 2);
        assert!(!info.has_parent());
    }

    #[test]
    fn test_rejected_frames_leave_state() {
        let mut tracker = tracker();
        step(&mut tracker, 3, &[(0, 1)]);
        let bonds = BondDict::from_pairs(N, [(0, 1)]);
        assert_eq!(
            tracker.process_frame(3, bodies(), &bonds),
            Err(TrackingError::NonIncreasingFrame {
                previous: 3,
                current: 3
            })
        );
        assert_eq!(
            tracker.process_frame(4, bodies()[..4].to_vec(), &bonds),
            Err(TrackingError::BodyCountMismatch {
                previous: 6,
                current: 4
            })
        );
        assert_eq!(
            tracker.process_frame(4, bodies(), &BondDict::new(4)),
            Err(TrackingError::MissingBondEntry(4))
        );
        assert_eq!(
            tracker.process_frame(4, bodies(), &BondDict::new(7)),
            Err(TrackingError::BondCountMismatch { bonds: 7, bodies: 6 })
        );
        assert_eq!(tracker.current_frame().unwrap().frame_num(), 3);
        assert_eq!(tracker.monomer_fractions().len(), 1);
        assert!(step(&mut tracker, 4, &[(0, 1)]).continued == 1);
    }

    #[test]
    fn test_min_cluster_size() {
        let config = TrackerConfig {
            min_cluster_size: 1,
            ..Default::default()
        };
        assert_eq!(
            ClusterTracker::<3>::new(config).unwrap_err(),
            TrackingError::InvalidMinClusterSize(1)
        );
        let config = TrackerConfig {
            min_cluster_size: 3,
            ..Default::default()
        };
        let mut tracker = ClusterTracker::new(config).unwrap();
        let summary = step(&mut tracker, 0, &[(0, 1), (2, 3), (3, 4)]);
        assert_eq!(summary.clusters, 1);
        assert_eq!(tracker.cluster_of(0), None);
        assert_f64_near!(summary.monomer_fraction, 0.5);
    }

    #[test]
    fn test_track_frame() {
        let domain = Domain::new([[0.0, 10.0]; 2], [true, true]).unwrap();
        let mut grid = NeighborGrid::new(domain.clone(), 1.0).unwrap();
        let config = TrackerConfig {
            observer: Observer::from_names(["num_bodies", "positions"]).unwrap(),
            ..Default::default()
        };
        let mut tracker = ClusterTracker::new(config).unwrap();
        let frames = [
            [[0.2, 5.0], [9.8, 5.0], [5.0, 5.0], [5.5, 5.0]],
            [[0.4, 5.0], [9.9, 5.0], [5.0, 2.0], [5.5, 8.0]],
        ];
        for (frame_num, coords) in frames.iter().enumerate() {
            let bodies = coords
                .iter()
                .enumerate()
                .map(|(i, c)| Body::from(i, *c))
                .collect();
            tracker
                .track_frame(&mut grid, frame_num as u64, bodies, |_, _| true)
                .unwrap();
        }
        let across = tracker.cluster_of(0).unwrap();
        assert_eq!(tracker.cluster_of(1), Some(across));
        assert_eq!(tracker.cluster_of(2), None);
        let info = tracker.info(across).unwrap();
        assert_eq!(info.data().len(), 2);
        assert_eq!(info.data()[1].positions().unwrap().len(), 2);
        assert_eq!(tracker.infos().values().filter(|i| i.is_dead()).count(), 1);

        let outside = vec![Body::from(0, [10.5, 5.0])];
        assert!(matches!(
            tracker.track_frame(&mut grid, 2, outside, |_, _| true),
            Err(TrackingError::OutOfBounds { body: 0, axis: 0, .. })
        ));
        assert_eq!(
            tracker.info(ClusterId(99)).unwrap_err(),
            TrackingError::UnknownCluster(ClusterId(99))
        );
    }
}
