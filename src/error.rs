//! Crate-level error types.

use std::fmt;

use crate::schema::ResourceKind;

/// Why a values record failed to satisfy its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// No value bound under the schema name.
    Missing,
    /// A value is bound but its type differs from the schema entry.
    WrongType {
        /// Type the schema entry expects.
        expected: &'static str,
        /// Type of the bound value.
        found: &'static str,
    },
    /// A string define holds a value outside its declared option set.
    InvalidOption(String),
    /// Texture payload length does not match its declared dimensions.
    TextureSize {
        /// Expected number of texel components.
        expected: usize,
        /// Actual number of texel components.
        found: usize,
    },
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing value"),
            Self::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::InvalidOption(value) => {
                write!(f, "'{value}' is not a declared option")
            }
            Self::TextureSize { expected, found } => write!(
                f,
                "texture holds {found} components, dimensions need {expected}"
            ),
        }
    }
}

/// Errors produced by the viso-repr crate.
#[derive(Debug)]
pub enum ReprError {
    /// Two partial schemas declare the same name with different resource
    /// kinds.
    SchemaConflict {
        /// Colliding schema name.
        name: &'static str,
        /// Kind declared first.
        existing: ResourceKind,
        /// Kind declared by the later schema.
        incoming: ResourceKind,
    },
    /// A values record does not satisfy the schema it is bound against.
    SchemaMismatch {
        /// Offending schema name.
        name: &'static str,
        /// What is wrong with the bound value.
        reason: MismatchReason,
    },
    /// The device lacks a capability the requested geometry path needs.
    UnsupportedCapability(&'static str),
    /// A geometry build was abandoned through its cancellation token.
    Cancelled,
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Generic I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for ReprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaConflict {
                name,
                existing,
                incoming,
            } => write!(
                f,
                "schema conflict on '{name}': {existing:?} vs {incoming:?}"
            ),
            Self::SchemaMismatch { name, reason } => {
                write!(f, "schema mismatch on '{name}': {reason}")
            }
            Self::UnsupportedCapability(what) => {
                write!(f, "device does not support {what}")
            }
            Self::Cancelled => write!(f, "geometry build cancelled"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ReprError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReprError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
