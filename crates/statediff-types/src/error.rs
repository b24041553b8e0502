use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("module name cannot be empty")]
    EmptyModuleName,

    #[error("module name {0:?} cannot contain '/'")]
    InvalidModuleName(String),
}
