//! Error types for run files and sensor profiles.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filesystem operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    /// Reading a run file or profile.
    Read,
    /// Writing a run file.
    Write,
    /// Creating a configuration directory.
    CreateDir,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileOp::Read => "read",
            FileOp::Write => "write",
            FileOp::CreateDir => "create directory",
        })
    }
}

/// Errors raised while loading, saving or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A run file, profile or directory could not be accessed.
    #[error("cannot {op} '{}': {source}", path.display())]
    File {
        /// Operation that failed.
        op: FileOp,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML in a run file or profile
    #[error("malformed TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A run file could not be encoded
    #[error("cannot encode TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// No factory, inline or user profile carries this name
    #[error("unknown sensor profile: {0}")]
    UnknownSensor(String),

    /// The run file failed validation
    #[error("invalid run file: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    fn file(op: FileOp, path: &Path, source: std::io::Error) -> Self {
        ConfigError::File {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// `path` could not be read.
    pub fn read_file(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::file(FileOp::Read, path.as_ref(), source)
    }

    /// `path` could not be written.
    pub fn write_file(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::file(FileOp::Write, path.as_ref(), source)
    }

    /// Directory `path` could not be created.
    pub fn create_dir(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::file(FileOp::CreateDir, path.as_ref(), source)
    }

    /// Path of a failed filesystem operation.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::File { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn not_found() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn file_errors_name_operation_and_path() {
        let err = ConfigError::read_file("/a/run.toml", not_found());
        assert_eq!(err.to_string(), "cannot read '/a/run.toml': mock");
        assert_eq!(err.path(), Some(Path::new("/a/run.toml")));
        assert!(err.source().is_some());

        let err = ConfigError::create_dir("/cfg/sensors", not_found());
        assert!(err.to_string().starts_with("cannot create directory '/cfg/sensors'"));
        assert!(matches!(err, ConfigError::File { op: FileOp::CreateDir, .. }));

        let err = ConfigError::write_file("/a/out.toml", not_found());
        assert!(matches!(err, ConfigError::File { op: FileOp::Write, .. }));
    }

    #[test]
    fn unknown_sensor_has_no_path() {
        let err = ConfigError::UnknownSensor("CMG-3T".to_string());
        assert_eq!(err.to_string(), "unknown sensor profile: CMG-3T");
        assert!(err.path().is_none());
        assert!(err.source().is_none());
    }

    #[test]
    fn validation_keeps_cause() {
        let err = ConfigError::from(crate::validation::ValidationError::UnknownSensor(
            "x".to_string(),
        ));
        assert!(err.to_string().starts_with("invalid run file"));
        assert!(err.source().is_some());
    }
}
