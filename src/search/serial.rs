use super::ClusterSearch;
use crate::records::{Cluster, LinkOutput, McParticle};
use crate::LinkerParams;
use num_traits::Float;

pub(crate) struct ParticleMatcher<'a, T: Float> {
    particles: &'a [McParticle<T>],
    search: ClusterSearch<'a, T>,
    cutoff: T,
    validation_active: bool,
}

impl<'a, T: Float> ParticleMatcher<'a, T> {
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

    pub(crate) fn match_particles(&self) -> LinkOutput<T> {
        let mut output = LinkOutput::with_capacity(self.particles.len(), self.validation_active);
        for (n, particle) in self.particles.iter().enumerate() {
            if let Some((link, residual)) = self.search.link_particle(n, particle, self.cutoff) {
                output.push(link, residual);
            }
        }
        output
    }
}
