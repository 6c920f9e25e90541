//! Error types for scene loading

use thiserror::Error;

/// Errors that can occur while loading a scene
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported scene format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Scene {path} contains no obstacles")]
    Empty { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SceneError {
    /// Line number of a parse error, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            SceneError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<SceneError> for hapticfield_core::Error {
    fn from(e: SceneError) -> Self {
        hapticfield_core::Error::Scene(e.to_string())
    }
}
