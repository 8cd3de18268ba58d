//! Application errors
use std::{fmt, path::PathBuf};

use jackc::prelude::JackError;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
}

impl std::error::Error for AppError {}

#[derive(Debug)]
pub enum ErrorKind {
    Jack(JackError),
    Io(std::io::Error),
    Config(serde_yaml::Error),
    /// Directory given on the command line holds no source files.
    NoSources(PathBuf),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jack(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::NoSources(path) => write!(f, "no .jack files in {}", path.display()),
        }
    }
}

impl From<JackError> for AppError {
    fn from(err: JackError) -> Self {
        Self {
            kind: ErrorKind::Jack(err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io(err),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self {
            kind: ErrorKind::Config(err),
        }
    }
}
