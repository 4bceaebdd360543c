//! Error types for chain construction and evaluation.
//!
//! This module provides the unified error type [`ChainError`] and a
//! convenient [`Result`] alias. Mathematical degeneracies (an undefined
//! ZMP, for instance) are expressed as `Option` return values, not errors.

use std::fmt;

/// Main error type for chain operations.
#[derive(Debug)]
pub enum ChainError {
    /// An operation was invoked on a chain with no links.
    EmptyChain,
    /// A user-supplied vector or matrix does not match the joint size.
    SizeMismatch { expected: usize, actual: usize },
    /// A joint kind name did not resolve at configuration time.
    UnknownJointKind(String),
    /// A link name did not resolve at configuration time.
    UnknownLink(String),
    /// A shape name did not resolve at configuration time.
    UnknownShape(String),
    /// A motor name did not resolve at configuration time.
    UnknownMotor(String),
    /// A chain description could not be parsed.
    Parse { line: usize, message: String },
    /// An I/O operation failed while reading or writing a chain file.
    Io(std::io::Error),
    /// An internal invariant was violated; the current call is aborted.
    Fatal(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyChain => write!(f, "chain has no links"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::UnknownJointKind(name) => write!(f, "unknown joint kind: {name}"),
            Self::UnknownLink(name) => write!(f, "unknown link: {name}"),
            Self::UnknownShape(name) => write!(f, "unknown shape: {name}"),
            Self::UnknownMotor(name) => write!(f, "unknown motor: {name}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::Fatal(msg) => write!(f, "fatal: {msg}"),
        }
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Convenient Result type alias for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
