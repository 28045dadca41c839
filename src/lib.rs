//! Association of reconstructed calorimeter clusters with simulated Monte Carlo truth
//! particles, by angular distance. Generic over floating point numeric types.
//!
//! For each primary truth particle in an event, the linker finds the cluster whose position
//! vector is at the smallest angle to the particle's momentum, `acos(p.x / |p||x|)`. When that
//! angle is strictly below a configurable cutoff, it produces:
//!  1. a link from the cluster to the particle, as indices into the input collections; and
//!  2. the relative energy residual of the pair, `(E_rec - E_gen) / E_gen`, index aligned with
//!     the links, which is the usual first look at calorimeter energy resolution.
//!
//! This is a reference matcher rather than a physically accurate one. A cluster's position is
//! taken as its direction from the interaction point, and the curvature of charged particles
//! in the magnetic field is ignored.
//!
//! Linking is a pure function of one event's collections. Degenerate input, such as a zero
//! momentum or a cluster at the origin, never matches rather than producing an error.
//!
//! # Examples
//! ```
//!use calo_truth_linker::{Cluster, Linker, LinkerParams, McParticle};
//!
//!let particles: Vec<McParticle<f32>> = vec![
//!    McParticle::new(1, 10.0, [0.0, 0.0, 1.0]),
//!    // Secondaries (generator status 0) are never linked
//!    McParticle::new(0, 3.0, [0.0, 0.0, 1.0]),
//!    McParticle::new(1, 5.0, [0.0, 1.0, 0.0]),
//!];
//!let clusters: Vec<Cluster<f32>> = vec![
//!    Cluster::new(9.0, [0.0, 0.0, 150.0]),
//!    Cluster::new(20.0, [150.0, 0.0, 0.0]),
//!];
//!let params = LinkerParams::builder().cutoff_angle(0.2).build();
//!let output = Linker::new(&particles, &clusters, params).link();
//!
//!assert_eq!(1, output.len());
//!assert_eq!((0, 0), (output.links()[0].from, output.links()[0].to));
//!assert!((output.residuals()[0] + 0.1).abs() < 1e-6);
//! ```

pub use crate::error::LinkerError;
pub use crate::linker::Linker;
pub use crate::params::{CollectionNames, LinkerParams, LinkerParamsBuilder};
pub use crate::records::{Cluster, ClusterMcParticleLink, LinkOutput, McParticle};
pub use crate::search::SearchAlgorithm;

mod angular;
mod error;
mod linker;
mod params;
mod records;
mod search;
