use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure of a single pipeline stage for one input file.
///
/// Every variant carries the path it concerns so a log line is enough to
/// locate the problem.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("could not load '{}': {message}", path.display())]
    FileLoad { path: PathBuf, message: String },

    #[error("could not parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("could not render '{}': {message}", path.display())]
    Render { path: PathBuf, message: String },

    #[error("could not archive '{}': {message}", path.display())]
    Archive { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn file_load(path: &Path, message: impl Into<String>) -> Self {
        Self::FileLoad {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn render(path: &Path, message: impl Into<String>) -> Self {
        Self::Render {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn archive(path: &Path, message: impl Into<String>) -> Self {
        Self::Archive {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Process exit code used when this error ends a one-shot run.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. } | Self::FileLoad { .. } => 2,
            Self::Parse { .. } => 3,
            Self::Render { .. } => 4,
            Self::Archive { .. } => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
