use crate::angular::{angular_distance, chord_length, energy_residual, unit_direction};
use crate::records::{Cluster, ClusterMcParticleLink, McParticle};
use kdtree::distance::squared_euclidean;
use log::{debug, warn};
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[cfg(feature = "parallel")]
pub(crate) mod parallel;
#[cfg(feature = "serial")]
pub(crate) mod serial;

/// Up to this many clusters, `Auto` scans every cluster for every particle.
pub(crate) const BRUTE_FORCE_N_CLUSTERS_LIMIT: usize = 64;

/// Added to the chord length of the cutoff when querying the k-d tree, so that rounding in the
/// unit vectors can never drop a cluster whose exact angle is below the cutoff.
const CHORD_SLACK: f64 = 1e-3;

/// The options for finding the closest cluster to a particle. All of them link the same
/// cluster to the same particle; they only differ in how many clusters are examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchAlgorithm {
    /// Selects the search based on the number of clusters and the cutoff angle.
    Auto,
    /// Computes the angle between the particle and every cluster.
    BruteForce,
    /// Indexes cluster directions in a k-d tree and only computes exact angles for the clusters
    /// close enough to possibly pass the cutoff.
    KdTree,
}

/// The closest cluster found for one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BestMatch<T> {
    pub(crate) cluster_index: usize,
    pub(crate) angle: T,
    pub(crate) residual: T,
}

/// Scans the candidate clusters, in the order given, keeping the one at the smallest angle.
/// The first of several clusters at the same angle wins. Clusters at an infinite angle are
/// never kept, so `None` means no cluster had a usable direction.
pub(crate) fn scan_candidates<T, I>(
    particle: &McParticle<T>,
    clusters: &[Cluster<T>],
    candidates: I,
) -> Option<BestMatch<T>>
where
    T: Float,
    I: IntoIterator<Item = usize>,
{
    let mut smallest_angle = T::max_value();
    let mut best = None;
    for index in candidates {
        let cluster = &clusters[index];
        let angle = angular_distance(&cluster.position, &particle.momentum);
        if angle < smallest_angle {
            smallest_angle = angle;
            best = Some(BestMatch {
                cluster_index: index,
                angle,
                residual: energy_residual(cluster.energy, particle.energy),
            });
        }
    }
    best
}

pub(crate) enum ClusterSearch<'a, T: Float> {
    BruteForce(BruteForce<'a, T>),
    KdTree(AngularKdTree<'a, T>),
}

impl<'a, T: Float> ClusterSearch<'a, T> {
    pub(crate) fn new(clusters: &'a [Cluster<T>], algo: SearchAlgorithm, cutoff: T) -> Self {
        let cutoff_beyond_pi = T::from(PI).map_or(true, |pi| cutoff >= pi);
        let search = match (algo, clusters.len()) {
            (SearchAlgorithm::Auto, usize::MIN..=BRUTE_FORCE_N_CLUSTERS_LIMIT) => {
                ClusterSearch::BruteForce(BruteForce { clusters })
            }
            (SearchAlgorithm::Auto, _) if cutoff_beyond_pi => {
                ClusterSearch::BruteForce(BruteForce { clusters })
            }
            (SearchAlgorithm::Auto, _) => {
                ClusterSearch::KdTree(AngularKdTree::new(clusters, cutoff))
            }
            (SearchAlgorithm::BruteForce, _) => ClusterSearch::BruteForce(BruteForce { clusters }),
            (SearchAlgorithm::KdTree, _) => {
                ClusterSearch::KdTree(AngularKdTree::new(clusters, cutoff))
            }
        };
        debug!(
            "Searching {} clusters with {:?} ({:?} requested)",
            clusters.len(),
            search.algorithm(),
            algo
        );
        search
    }

    pub(crate) fn algorithm(&self) -> SearchAlgorithm {
        match self {
            ClusterSearch::BruteForce(_) => SearchAlgorithm::BruteForce,
            ClusterSearch::KdTree(_) => SearchAlgorithm::KdTree,
        }
    }

    pub(crate) fn best_match(&self, particle: &McParticle<T>) -> Option<BestMatch<T>> {
        match self {
            ClusterSearch::BruteForce(brute_force) => brute_force.best_match(particle),
            ClusterSearch::KdTree(kd_tree) => kd_tree.best_match(particle),
        }
    }

    /// Decides the output row for one particle: the link and residual if the particle is a
    /// primary and its closest cluster lies strictly inside the cutoff, otherwise nothing.
    pub(crate) fn link_particle(
        &self,
        particle_index: usize,
        particle: &McParticle<T>,
        cutoff: T,
    ) -> Option<(ClusterMcParticleLink, T)> {
        // Skip secondary particles
        if !particle.is_primary() {
            return None;
        }
        let best = self.best_match(particle);
        match &best {
            Some(best) => debug!(
                "Best match angular distance {} for particle {particle_index}",
                best.angle.to_f64().unwrap_or(f64::NAN)
            ),
            None => debug!("No cluster with a usable direction for particle {particle_index}"),
        }
        best.filter(|best| best.angle < cutoff).map(|best| {
            (
                ClusterMcParticleLink::new(best.cluster_index, particle_index),
                best.residual,
            )
        })
    }
}

pub(crate) struct BruteForce<'a, T> {
    clusters: &'a [Cluster<T>],
}

impl<'a, T: Float> BruteForce<'a, T> {
    fn best_match(&self, particle: &McParticle<T>) -> Option<BestMatch<T>> {
        scan_candidates(particle, self.clusters, 0..self.clusters.len())
    }
}

pub(crate) struct AngularKdTree<'a, T: Float> {
    clusters: &'a [Cluster<T>],
    tree: kdtree::KdTree<T, usize, [T; 3]>,
    // Clusters without a usable unit direction, always rescanned
    unindexed: Vec<usize>,
    radius: T,
}

impl<'a, T: Float> AngularKdTree<'a, T> {
    fn new(clusters: &'a [Cluster<T>], cutoff: T) -> Self {
        let mut tree = kdtree::KdTree::new(3);
        let mut unindexed = Vec::new();
        for (n, cluster) in clusters.iter().enumerate() {
            let added = unit_direction(&cluster.position)
                .map_or(false, |direction| tree.add(direction, n).is_ok());
            if !added {
                unindexed.push(n);
            }
        }

        let max_angle = T::from(PI).map_or(cutoff, |pi| cutoff.min(pi));
        let slack = T::from(CHORD_SLACK).unwrap_or_else(T::epsilon);
        let chord = chord_length(max_angle) + slack;

        Self {
            clusters,
            tree,
            unindexed,
            radius: chord * chord,
        }
    }

    fn best_match(&self, particle: &McParticle<T>) -> Option<BestMatch<T>> {
        let brute_force = || scan_candidates(particle, self.clusters, 0..self.clusters.len());

        let direction = match unit_direction(&particle.momentum) {
            Some(direction) => direction,
            None => return brute_force(),
        };
        let mut candidates = if self.tree.size() == 0 {
            Vec::new()
        } else {
            match self.tree.within(&direction, self.radius, &squared_euclidean::<T>) {
                Ok(neighbours) => neighbours.into_iter().map(|(_dist, &n)| n).collect(),
                Err(err) => {
                    warn!("K-d tree query failed ({err:?}), scanning all clusters");
                    return brute_force();
                }
            }
        };
        candidates.extend_from_slice(&self.unindexed);
        // Input order decides ties, so rescan in index order
        candidates.sort_unstable();
        scan_candidates(particle, self.clusters, candidates)
    }
}
