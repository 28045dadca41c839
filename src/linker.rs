#[cfg(feature = "parallel")]
use crate::search::parallel::ParticleMatcherPar;
#[cfg(feature = "serial")]
use crate::search::serial::ParticleMatcher;
use crate::{Cluster, LinkOutput, LinkerParams, McParticle};
use num_traits::Float;

/// Links calorimeter clusters to Monte Carlo truth particles by angular distance. Generic over
/// floating point numeric types.
///
/// For every primary particle the cluster whose position is at the smallest angle to the
/// particle momentum is found. If that angle is strictly below the cutoff, a link from the
/// cluster to the particle is produced along with the relative energy residual. Cluster
/// positions are taken as directions from the interaction point; the bending of charged
/// particles in a magnetic field is not accounted for.
#[derive(Debug, Clone, PartialEq)]
pub struct Linker<'a, T> {
    particles: &'a [McParticle<T>],
    clusters: &'a [Cluster<T>],
    params: LinkerParams,
}

impl<'a, T: Float + Send + Sync> Linker<'a, T> {
    /// Creates a linker over one event's collections using a custom parameter configuration.
    ///
    /// # Parameters
    /// * `particles` - the truth particles of the event.
    /// * `clusters` - the reconstructed clusters of the event. A cluster is identified by its
    ///                index in this slice.
    /// * `params` - the parameter configuration.
    ///
    /// # Returns
    /// * The linker instance.
    ///
    /// # Examples
    /// ```
    ///use calo_truth_linker::{Cluster, Linker, LinkerParams, McParticle, SearchAlgorithm};
    ///
    ///let particles = vec![McParticle::new(1, 10.0_f32, [0.0, 0.0, 1.0])];
    ///let clusters = vec![Cluster::new(9.0_f32, [0.0, 0.1, 1.0])];
    ///let params = LinkerParams::builder()
    ///    .cutoff_angle(0.05)
    ///    .search_algorithm(SearchAlgorithm::BruteForce)
    ///    .build();
    ///let linker = Linker::new(&particles, &clusters, params);
    /// ```
    pub fn new(
        particles: &'a [McParticle<T>],
        clusters: &'a [Cluster<T>],
        params: LinkerParams,
    ) -> Self {
        Linker {
            particles,
            clusters,
            params,
        }
    }

    /// Creates a linker over one event's collections using the default parameters: a cutoff
    /// of 0.2 radians, validation output enabled and automatic search selection.
    pub fn default_params(particles: &'a [McParticle<T>], clusters: &'a [Cluster<T>]) -> Self {
        Linker::new(particles, clusters, LinkerParams::default())
    }

    pub fn params(&self) -> &LinkerParams {
        &self.params
    }

    /// Links the clusters to the particles passed to the constructor.
    ///
    /// # Returns
    /// * The links and their energy residuals, index aligned. Secondary particles (generator
    ///   status 0) are skipped entirely. Particles without a cluster inside the cutoff produce
    ///   no entry, as do particles for which no angle can be computed because the momentum or
    ///   every cluster position has zero length. Linking never fails.
    ///
    /// # Examples
    /// ```
    ///use calo_truth_linker::{Cluster, Linker, McParticle};
    ///
    ///let particles = vec![McParticle::new(1, 10.0_f64, [0.0, 0.0, 1.0])];
    ///let clusters = vec![
    ///    Cluster::new(9.0, [0.0, 0.0, 1.0]),
    ///    Cluster::new(20.0, [1.0, 0.0, 0.0]),
    ///];
    ///let linker = Linker::default_params(&particles, &clusters);
    ///let output = linker.link();
    ///assert_eq!(1, output.len());
    ///assert_eq!(0, output.links()[0].from);
    ///assert_eq!(0, output.links()[0].to);
    ///assert!((output.residuals()[0] + 0.1).abs() < 1e-12);
    /// ```
    #[cfg(feature = "serial")]
    pub fn link(&self) -> LinkOutput<T> {
        let matcher =
            ParticleMatcher::new(self.particles, self.clusters, &self.params, self.cutoff());
        matcher.match_particles()
    }

    /// Links the clusters to the particles passed to the constructor, deciding particles in
    /// parallel. The output is identical to [`Linker::link`], in the same order. Only worth it
    /// for events with many particles and clusters.
    ///
    /// # Examples
    /// ```
    ///use calo_truth_linker::{Cluster, Linker, McParticle};
    ///
    ///let particles = vec![McParticle::new(1, 10.0_f64, [0.0, 0.0, 1.0])];
    ///let clusters = vec![Cluster::new(9.0, [0.0, 0.0, 1.0])];
    ///let output = Linker::default_params(&particles, &clusters).link_par();
    ///assert_eq!(1, output.len());
    /// ```
    #[cfg(feature = "parallel")]
    pub fn link_par(&self) -> LinkOutput<T> {
        let matcher =
            ParticleMatcherPar::new(self.particles, self.clusters, &self.params, self.cutoff());
        matcher.match_particles()
    }

    fn cutoff(&self) -> T {
        // A cutoff too large for T can only mean "accept every finite angle"
        T::from(self.params.cutoff_angle).unwrap_or_else(T::infinity)
    }
}
