#![cfg(feature = "parallel")]
use super::ClusterSearch;
use crate::records::{Cluster, LinkOutput, McParticle};
use crate::LinkerParams;
use num_traits::Float;
use rayon::prelude::*;

pub(crate) struct ParticleMatcherPar<'a, T: Float> {
    particles: &'a [McParticle<T>],
    search: ClusterSearch<'a, T>,
    cutoff: T,
    validation_active: bool,
}

impl<'a, T: Float + Send + Sync> ParticleMatcherPar<'a, T> {
    pub(crate) fn new(
        particles: &'a [McParticle<T>],
        clusters: &'a [Cluster<T>],
        params: &'a LinkerParams,
        cutoff: T,
    ) -> Self {
        Self {
            particles,
            search: ClusterSearch::new(clusters, params.search_algo, cutoff),
            cutoff,
            validation_active: params.produce_validation,
        }
    }

    /// Particles are independent of each other, so each one is decided on its own task. The
    /// indexed collect keeps the output in particle order.
    pub(crate) fn match_particles(&self) -> LinkOutput<T> {
        let matches: Vec<_> = self
            .particles
            .par_iter()
            .enumerate()
            .filter_map(|(n, particle)| self.search.link_particle(n, particle, self.cutoff))
            .collect();
        LinkOutput::from_matches(matches, self.validation_active)
    }
}
