use itertools::Itertools;
use log::trace;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::cluster::ClusterId;
use crate::frame::Frame;
use crate::info::ClusterInfo;
use crate::observer::Observer;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameSummary {
    pub frame: u64,
    pub clusters: usize,
    pub continued: usize,
    pub births: usize,
    pub deaths: usize,
    pub merges: usize,
    pub splits: usize,
    pub monomer_fraction: f64,
}

/// Assigns cluster ids across consecutive frames and keeps one
/// [`ClusterInfo`] per id ever handed out.
///
/// Every (current cluster, previous id) pair sharing members is a claim.
/// Claims are granted greedily in order of shared members, then previous
/// cluster size, then age, then id, then the current cluster's lowest body
/// id. Each id and each current cluster is granted at most once, which
/// decides both which fragment of a split keeps the id and which
/// predecessor of a merge lends it.
#[derive(Debug, Clone)]
pub struct ClusterMatcher<const D: usize> {
    observer: Arc<Observer>,
    infos: BTreeMap<ClusterId, ClusterInfo<D>>,
    next_id: u64,
}

impl<const D: usize> ClusterMatcher<D> {
    pub fn new(observer: Observer) -> Self {
        Self {
            observer: Arc::new(observer),
            infos: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn infos(&self) -> &BTreeMap<ClusterId, ClusterInfo<D>> {
        &self.infos
    }

    pub fn into_infos(self) -> BTreeMap<ClusterId, ClusterInfo<D>> {
        self.infos
    }

    fn birth(&mut self, current: &mut Frame<D>, k: usize) -> ClusterId {
        let id = ClusterId(self.next_id);
        self.next_id += 1;
        current.set_cluster_id(k, Some(id));
        let info = ClusterInfo::new(
            &current.clusters()[k],
            current.bodies(),
            current.frame_num(),
            current.monomer_fraction(),
            Arc::clone(&self.observer),
        );
        self.infos.insert(id, info);
        trace!("frame {}: cluster {id} born", current.frame_num());
        id
    }

    /// Labels the clusters of `current` against `previous` and records the
    /// transitions. Leaves `current` indexed by its new ids.
    pub fn resolve(
        &mut self,
        previous: Option<&mut Frame<D>>,
        current: &mut Frame<D>,
    ) -> FrameSummary {
        let frame_num = current.frame_num();
        let monomer_frac = current.monomer_fraction();
        let mut summary = FrameSummary {
            frame: frame_num,
            clusters: current.clusters().len(),
            monomer_fraction: monomer_frac,
            ..Default::default()
        };
        let Some(previous) = previous else {
            for k in 0..current.clusters().len() {
                self.birth(current, k);
            }
            summary.births = current.clusters().len();
            current.reindex();
            return summary;
        };

        let overlaps = current
            .clusters()
            .iter()
            .map(|c| c.overlaps(previous.bodies()))
            .collect::<Vec<_>>();
        let mut fragments: HashMap<ClusterId, usize> = HashMap::new();
        for overlap in overlaps.iter() {
            if overlap.len() > 1 {
                summary.merges += 1;
            }
            for &id in overlap.keys() {
                *fragments.entry(id).or_default() += 1;
            }
        }
        summary.splits = fragments.values().filter(|&&n| n > 1).count();

        let claims = overlaps
            .iter()
            .enumerate()
            .flat_map(|(k, overlap)| overlap.iter().map(move |(&id, &shared)| (k, id, shared)))
            .sorted_by_key(|&(k, id, shared)| {
                (
                    Reverse(shared),
                    Reverse(previous.cluster(id).map_or(0, |c| c.len())),
                    self.infos.get(&id).map_or(u64::MAX, ClusterInfo::birth_frame),
                    id,
                    current.clusters()[k].min_body_id(),
                )
            })
            .collect::<Vec<_>>();

        let mut claimed: Vec<Option<ClusterId>> = vec![None; current.clusters().len()];
        for (k, id, _) in claims {
            if claimed[k].is_some() {
                continue;
            }
            if let Some(victim) = previous.cluster_mut(id).filter(|c| c.id().is_some()) {
                current.steal_id(k, victim);
                claimed[k] = Some(id);
            }
        }

        let previous_frac = previous.monomer_fraction();
        for k in 0..current.clusters().len() {
            let id = match claimed[k] {
                Some(id) => {
                    summary.continued += 1;
                    if overlaps[k].len() > 1 {
                        trace!(
                            "frame {frame_num}: clusters {:?} merged into {id}",
                            overlaps[k].keys()
                        );
                    }
                    if let Some(info) = self.infos.get_mut(&id) {
                        let cluster = &current.clusters()[k];
                        info.update_data(cluster, current.bodies(), frame_num, monomer_frac);
                    }
                    id
                }
                None => {
                    let id = self.birth(current, k);
                    summary.births += 1;
                    let parent = overlaps[k]
                        .iter()
                        .max_by_key(|&(&pid, &shared)| (shared, Reverse(pid)))
                        .and_then(|(&pid, _)| previous.cluster(pid).map(|c| (pid, c)));
                    if let (Some((pid, parent)), Some(info)) = (parent, self.infos.get_mut(&id)) {
                        trace!("frame {frame_num}: cluster {id} split off {pid}");
                        info.set_parent(parent, previous.bodies());
                    }
                    id
                }
            };
            let cluster = &current.clusters()[k];
            let gained = cluster.monomers_gained(previous.bodies());
            if gained > 0 {
                if let Some(info) = self.infos.get_mut(&id) {
                    info.add_monomers(cluster, current.bodies(), frame_num, gained, previous_frac);
                }
            }
        }

        let granted = claimed
            .iter()
            .enumerate()
            .filter_map(|(k, id)| id.map(|id| (id, k)))
            .collect::<HashMap<_, _>>();
        for pid in previous.labeled_ids().sorted().collect::<Vec<_>>() {
            let Some(old) = previous.cluster(pid) else {
                continue;
            };
            let lost = old
                .body_ids()
                .iter()
                .filter(|&&i| current.bodies().get(i).is_some_and(|b| b.cluster().is_none()))
                .count();
            let Some(info) = self.infos.get_mut(&pid) else {
                continue;
            };
            match granted.get(&pid) {
                Some(&k) => {
                    if lost > 0 {
                        let cluster = &current.clusters()[k];
                        info.remove_monomers(cluster, current.bodies(), frame_num, lost);
                    }
                }
                None => {
                    if lost > 0 {
                        info.remove_monomers(old, previous.bodies(), frame_num, lost);
                    }
                    if info.kill(frame_num) {
                        summary.deaths += 1;
                        trace!("frame {frame_num}: cluster {pid} died");
                    }
                }
            }
        }

        current.reindex();
        summary
    }
}
