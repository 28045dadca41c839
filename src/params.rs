use crate::search::SearchAlgorithm;
use crate::LinkerError;
use log::warn;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Defaults for parameters
const CUTOFF_ANGLE_DEFAULT: f64 = 0.2;
const PRODUCE_VALIDATION_DEFAULT: bool = true;
const SEARCH_ALGORITHM_DEFAULT: SearchAlgorithm = SearchAlgorithm::Auto;
const INPUT_PARTICLES_DEFAULT: &str = "MCParticles";
const INPUT_CLUSTERS_DEFAULT: &str = "CaloClusters";
const OUTPUT_LINKS_DEFAULT: &str = "CaloClusterMCParticleLink";
const OUTPUT_RESIDUALS_DEFAULT: &str = "ErecMinusEgenOverEgen";

// Valid minimums/left bounds of parameters
const CUTOFF_ANGLE_MINIMUM: f64 = 0.0;

// Property keys
const CUTOFF_ANGLE_KEY: &str = "CutoffAngleRadian";
const PRODUCE_VALIDATION_KEY: &str = "ProduceValidationDistributions";
const SEARCH_ALGORITHM_KEY: &str = "SearchAlgorithm";
const INPUT_PARTICLES_KEY: &str = "InputMCParticles";
const INPUT_CLUSTERS_KEY: &str = "InputCaloClusters";
const OUTPUT_LINKS_KEY: &str = "OutputCaloClusterMCParticleLink";
const OUTPUT_RESIDUALS_KEY: &str = "OutputErecMinusEgenOverEgen";

/// Names of the collections the linker reads and writes. The linker does not load or store
/// anything itself; the names are carried for the pipeline that hosts it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionNames {
    pub input_particles: String,
    pub input_clusters: String,
    pub output_links: String,
    pub output_residuals: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            input_particles: String::from(INPUT_PARTICLES_DEFAULT),
            input_clusters: String::from(INPUT_CLUSTERS_DEFAULT),
            output_links: String::from(OUTPUT_LINKS_DEFAULT),
            output_residuals: String::from(OUTPUT_RESIDUALS_DEFAULT),
        }
    }
}

/// The parameters of the cluster to truth particle linker. Read once per run and shared by
/// every event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawLinkerParams"))]
pub struct LinkerParams {
    pub(crate) cutoff_angle: f64,
    pub(crate) produce_validation: bool,
    pub(crate) search_algo: SearchAlgorithm,
    pub(crate) collections: CollectionNames,
}

/// Deserialised form of [`LinkerParams`], held to the same cutoff bounds as the properties.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawLinkerParams {
    cutoff_angle: f64,
    produce_validation: bool,
    search_algo: SearchAlgorithm,
    collections: CollectionNames,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLinkerParams> for LinkerParams {
    type Error = LinkerError;

    fn try_from(raw: RawLinkerParams) -> Result<Self, Self::Error> {
        Ok(Self {
            cutoff_angle: validate_cutoff_angle(raw.cutoff_angle, &raw.cutoff_angle.to_string())?,
            produce_validation: raw.produce_validation,
            search_algo: raw.search_algo,
            collections: raw.collections,
        })
    }
}

/// Builder object to set custom linker parameters.
#[derive(Debug, Clone, Default)]
pub struct LinkerParamsBuilder {
    cutoff_angle: Option<f64>,
    produce_validation: Option<bool>,
    search_algo: Option<SearchAlgorithm>,
    collections: CollectionNames,
}

impl Default for LinkerParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LinkerParams {
    /// Enters the builder pattern, allowing custom parameters to be set using various setter
    /// methods.
    ///
    /// # Returns
    /// * the parameter configuration builder
    pub fn builder() -> LinkerParamsBuilder {
        LinkerParamsBuilder::default()
    }

    /// Builds parameters from string key/value properties, as found in a job configuration.
    /// Keys not present keep their default values.
    ///
    /// # Parameters
    /// * `properties` - pairs of property name and value. Recognised names are
    ///   `CutoffAngleRadian`, `ProduceValidationDistributions`, `SearchAlgorithm`,
    ///   `InputMCParticles`, `InputCaloClusters`, `OutputCaloClusterMCParticleLink` and
    ///   `OutputErecMinusEgenOverEgen`.
    ///
    /// # Returns
    /// * A result that, if successful, contains the parameters. An error is returned for an
    ///   unrecognised name, or for a value that cannot be parsed or is out of range.
    ///
    /// # Examples
    /// ```
    ///use calo_truth_linker::LinkerParams;
    ///
    ///let params = LinkerParams::from_properties([
    ///    ("CutoffAngleRadian", "0.1"),
    ///    ("ProduceValidationDistributions", "False"),
    ///]).unwrap();
    ///assert_eq!(0.1, params.cutoff_angle());
    ///assert!(!params.produce_validation());
    /// ```
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self, LinkerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = Self::builder();
        for (key, value) in properties {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            builder = match key {
                CUTOFF_ANGLE_KEY => builder.cutoff_angle(parse_cutoff_angle(value)?),
                PRODUCE_VALIDATION_KEY => builder.produce_validation(parse_bool(key, value)?),
                SEARCH_ALGORITHM_KEY => builder.search_algorithm(parse_search_algorithm(value)?),
                INPUT_PARTICLES_KEY => builder.input_particles(value),
                INPUT_CLUSTERS_KEY => builder.input_clusters(value),
                OUTPUT_LINKS_KEY => builder.output_links(value),
                OUTPUT_RESIDUALS_KEY => builder.output_residuals(value),
                _ => return Err(LinkerError::UnknownProperty(key.to_string())),
            };
        }
        Ok(builder.build())
    }

    /// Maximum angular distance, in radians, for a cluster to be linked to a particle.
    pub fn cutoff_angle(&self) -> f64 {
        self.cutoff_angle
    }

    pub fn produce_validation(&self) -> bool {
        self.produce_validation
    }

    pub fn search_algorithm(&self) -> SearchAlgorithm {
        self.search_algo
    }

    pub fn collections(&self) -> &CollectionNames {
        &self.collections
    }
}

impl LinkerParamsBuilder {
    /// Sets the cutoff angle - the angular distance, in radians, below which the closest cluster
    /// is linked to a particle. A best match at exactly the cutoff is rejected.
    /// Negative values are raised to zero; NaN falls back to the default.
    /// Defaults to 0.2.
    ///
    /// # Parameters
    /// * cutoff_angle - the cutoff angle in radians
    ///
    /// # Returns
    /// * the parameter configuration builder
    pub fn cutoff_angle(mut self, cutoff_angle: f64) -> LinkerParamsBuilder {
        let valid_cutoff_angle = if cutoff_angle.is_nan() {
            warn!("cutoff_angle cannot be NaN. Set to {CUTOFF_ANGLE_DEFAULT}.");
            CUTOFF_ANGLE_DEFAULT
        } else {
            LinkerParamsBuilder::validate_input_left_bound(
                cutoff_angle,
                CUTOFF_ANGLE_MINIMUM,
                "cutoff_angle",
            )
        };
        self.cutoff_angle = Some(valid_cutoff_angle);
        self
    }

    /// Sets whether the residuals are an active validation output. Matching is unaffected.
    /// Defaults to true.
    pub fn produce_validation(mut self, produce_validation: bool) -> LinkerParamsBuilder {
        self.produce_validation = Some(produce_validation);
        self
    }

    /// Sets the search algorithm used to find the closest cluster. All options give identical
    /// results; the choice only matters for performance. Defaults to Auto, whereby the algorithm
    /// is chosen based on the number of clusters and the cutoff angle.
    pub fn search_algorithm(mut self, search_algorithm: SearchAlgorithm) -> LinkerParamsBuilder {
        self.search_algo = Some(search_algorithm);
        self
    }

    pub fn input_particles(mut self, name: &str) -> LinkerParamsBuilder {
        self.collections.input_particles = name.to_string();
        self
    }

    pub fn input_clusters(mut self, name: &str) -> LinkerParamsBuilder {
        self.collections.input_clusters = name.to_string();
        self
    }

    pub fn output_links(mut self, name: &str) -> LinkerParamsBuilder {
        self.collections.output_links = name.to_string();
        self
    }

    pub fn output_residuals(mut self, name: &str) -> LinkerParamsBuilder {
        self.collections.output_residuals = name.to_string();
        self
    }

    /// Finishes the building of the parameter configuration.
    ///
    /// # Returns
    /// * The completed linker parameters.
    pub fn build(self) -> LinkerParams {
        LinkerParams {
            cutoff_angle: self.cutoff_angle.unwrap_or(CUTOFF_ANGLE_DEFAULT),
            produce_validation: self.produce_validation.unwrap_or(PRODUCE_VALIDATION_DEFAULT),
            search_algo: self.search_algo.unwrap_or(SEARCH_ALGORITHM_DEFAULT),
            collections: self.collections,
        }
    }

    fn validate_input_left_bound(input_param: f64, left_bound: f64, param: &str) -> f64 {
        if input_param < left_bound {
            warn!("{param} ({input_param}) cannot be lower than {left_bound}. Set to {left_bound}.");
            left_bound
        } else {
            input_param
        }
    }
}

fn invalid(key: &str, value: &str) -> LinkerError {
    LinkerError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_cutoff_angle(value: &str) -> Result<f64, LinkerError> {
    let angle = value
        .parse::<f64>()
        .map_err(|_| invalid(CUTOFF_ANGLE_KEY, value))?;
    validate_cutoff_angle(angle, value)
}

fn validate_cutoff_angle(angle: f64, value: &str) -> Result<f64, LinkerError> {
    // NaN fails the comparison too
    if angle >= CUTOFF_ANGLE_MINIMUM {
        Ok(angle)
    } else {
        Err(invalid(CUTOFF_ANGLE_KEY, value))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, LinkerError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_search_algorithm(value: &str) -> Result<SearchAlgorithm, LinkerError> {
    match value.to_ascii_lowercase().as_str() {
        "auto" => Ok(SearchAlgorithm::Auto),
        "bruteforce" | "brute_force" => Ok(SearchAlgorithm::BruteForce),
        "kdtree" | "kd_tree" => Ok(SearchAlgorithm::KdTree),
        _ => Err(invalid(SEARCH_ALGORITHM_KEY, value)),
    }
}
