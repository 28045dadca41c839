use thiserror::Error;

/// Possible errors that arise when configuring the linker or when resolving its output
/// against collections. Matching itself never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkerError {
    #[error("Unknown linker property: {0}")]
    UnknownProperty(String),
    #[error("Invalid value for property {key}: {value}")]
    InvalidProperty { key: String, value: String },
    #[error("Link from cluster {cluster} to particle {particle} points outside the given collections")]
    DanglingLink { cluster: usize, particle: usize },
    #[error("Link output has {links} links but {residuals} residuals")]
    MisalignedOutput { links: usize, residuals: usize },
}
