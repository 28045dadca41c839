use crate::LinkerError;
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A simulated truth particle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct McParticle<T> {
    /// Generator status. Zero marks a secondary (non-primary) particle, which is never linked.
    pub generator_status: i32,
    /// Energy of the particle. Expected to be strictly positive.
    pub energy: T,
    /// Momentum vector (px, py, pz).
    pub momentum: [T; 3],
}

impl<T: Float> McParticle<T> {
    pub fn new(generator_status: i32, energy: T, momentum: [T; 3]) -> Self {
        Self {
            generator_status,
            energy,
            momentum,
        }
    }

    /// Whether the particle takes part in matching at all.
    pub fn is_primary(&self) -> bool {
        self.generator_status != 0
    }
}

/// A reconstructed calorimeter cluster. Its index is its position in the input collection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster<T> {
    pub energy: T,
    /// Position of the cluster. Taken as its direction as seen from the interaction point.
    pub position: [T; 3],
}

impl<T: Float> Cluster<T> {
    pub fn new(energy: T, position: [T; 3]) -> Self {
        Self { energy, position }
    }
}

/// A non-owning relation from a cluster to the truth particle it was matched to. Both ends
/// are indices into the collections the link was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterMcParticleLink {
    pub from: usize,
    pub to: usize,
}

impl ClusterMcParticleLink {
    pub(crate) fn new(cluster_index: usize, particle_index: usize) -> Self {
        Self {
            from: cluster_index,
            to: particle_index,
        }
    }

    /// Looks up the records at both ends of the link.
    ///
    /// # Parameters
    /// * `particles` - the truth particles the link was produced from.
    /// * `clusters` - the clusters the link was produced from.
    ///
    /// # Returns
    /// * A result that, if successful, contains the linked cluster and particle. An error is
    ///   returned if either index falls outside the given collections, which happens when a link
    ///   is resolved against the collections of a different event.
    pub fn resolve<'a, T>(
        &self,
        particles: &'a [McParticle<T>],
        clusters: &'a [Cluster<T>],
    ) -> Result<(&'a Cluster<T>, &'a McParticle<T>), LinkerError> {
        match (clusters.get(self.from), particles.get(self.to)) {
            (Some(cluster), Some(particle)) => Ok((cluster, particle)),
            _ => Err(LinkerError::DanglingLink {
                cluster: self.from,
                particle: self.to,
            }),
        }
    }
}

/// The result of linking one event: the links and, index aligned with them, the relative
/// energy residual `(e_cluster - e_particle) / e_particle` of each link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "RawLinkOutput<T>",
        bound(deserialize = "T: Deserialize<'de>")
    )
)]
pub struct LinkOutput<T> {
    links: Vec<ClusterMcParticleLink>,
    residuals: Vec<T>,
    validation_active: bool,
}

/// Deserialised form of [`LinkOutput`], checked for alignment before it is accepted.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawLinkOutput<T> {
    links: Vec<ClusterMcParticleLink>,
    residuals: Vec<T>,
    validation_active: bool,
}

#[cfg(feature = "serde")]
impl<T> TryFrom<RawLinkOutput<T>> for LinkOutput<T> {
    type Error = LinkerError;

    fn try_from(raw: RawLinkOutput<T>) -> Result<Self, Self::Error> {
        if raw.links.len() != raw.residuals.len() {
            return Err(LinkerError::MisalignedOutput {
                links: raw.links.len(),
                residuals: raw.residuals.len(),
            });
        }
        Ok(Self {
            links: raw.links,
            residuals: raw.residuals,
            validation_active: raw.validation_active,
        })
    }
}

impl<T: Float> LinkOutput<T> {
    #[cfg(feature = "serial")]
    pub(crate) fn with_capacity(capacity: usize, validation_active: bool) -> Self {
        Self {
            links: Vec::with_capacity(capacity),
            residuals: Vec::with_capacity(capacity),
            validation_active,
        }
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn from_matches(
        matches: Vec<(ClusterMcParticleLink, T)>,
        validation_active: bool,
    ) -> Self {
        let (links, residuals) = matches.into_iter().unzip();
        Self {
            links,
            residuals,
            validation_active,
        }
    }

    #[cfg(feature = "serial")]
    pub(crate) fn push(&mut self, link: ClusterMcParticleLink, residual: T) {
        self.links.push(link);
        self.residuals.push(residual);
    }

    pub fn links(&self) -> &[ClusterMcParticleLink] {
        &self.links
    }

    pub fn residuals(&self) -> &[T] {
        &self.residuals
    }

    /// The residuals, if validation output was requested in the linker parameters. The
    /// residuals are computed either way; this only reports whether downstream consumers
    /// should treat them as an active output.
    pub fn validation_residuals(&self) -> Option<&[T]> {
        if self.validation_active {
            Some(&self.residuals)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Iterates over each link together with its residual.
    pub fn iter(&self) -> impl Iterator<Item = (&ClusterMcParticleLink, T)> + '_ {
        self.links.iter().zip(self.residuals.iter().copied())
    }

    /// Splits the output into the link and residual collections.
    pub fn into_parts(self) -> (Vec<ClusterMcParticleLink>, Vec<T>) {
        (self.links, self.residuals)
    }

    /// Resolves every link against the collections it was produced from.
    ///
    /// # Returns
    /// * A result that, if successful, contains the linked cluster, particle and residual of
    ///   every link, in output order. An error is returned for the first dangling link.
    pub fn resolve<'a>(
        &self,
        particles: &'a [McParticle<T>],
        clusters: &'a [Cluster<T>],
    ) -> Result<Vec<(&'a Cluster<T>, &'a McParticle<T>, T)>, LinkerError> {
        self.iter()
            .map(|(link, residual)| {
                link.resolve(particles, clusters)
                    .map(|(cluster, particle)| (cluster, particle, residual))
            })
            .collect()
    }
}
