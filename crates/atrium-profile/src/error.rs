//! Error types for atrium profile loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use toml::de;

/// Errors that can occur when loading or validating a metadata profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Failed to read a profile file.
    #[error("failed to read profile file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML profile definition.
    #[error("failed to parse profile file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// A profile element was declared more than once.
    #[error("duplicate element in profile '{profile}': {element}")]
    DuplicateElement {
        /// Name of the profile containing the duplicate.
        profile: String,
        /// The duplicated element name.
        element: String,
    },

    /// An element carries a weight that is zero or negative.
    #[error("element '{element}' has non-positive weight {weight}")]
    InvalidWeight {
        /// The offending element name.
        element: String,
        /// The rejected weight value.
        weight: f32,
    },
}
