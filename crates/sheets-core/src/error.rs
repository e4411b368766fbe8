#![forbid(unsafe_code)]

//! Error taxonomy for overlay control calls.
//!
//! | Error | Cause |
//! |-------|-------|
//! | `EmptyStack` | Operation needs at least one sheet (two for navigation) |
//! | `Boundary` | `next`/`back` past the stack edge |
//! | `NoActiveSheet` | Navigation with no active pointer |
//! | `Unbound` | Control call on a key with no bound instance |
//! | `InvalidState` | Structural invariant violated (implementation bug or torn-down instance) |
//! | `Abandoned` | Completion signal dropped before it fired |
//! | `Handled` | Error was routed to the global error handler instead |

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModalError>;

/// Navigation direction within a sheet stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the top of the stack (`next`).
    Forward,
    /// Towards the bottom of the stack (`back`).
    Backward,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Backward => f.write_str("backward"),
        }
    }
}

/// Errors surfaced by control calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModalError {
    #[error("sheet stack is empty")]
    EmptyStack,

    #[error("cannot move {direction}: already at the edge of the stack")]
    Boundary { direction: Direction },

    #[error("no sheet is active")]
    NoActiveSheet,

    #[error("no modal instance is bound to key {key:?}")]
    Unbound { key: String },

    #[error("invalid modal state: {0}")]
    InvalidState(String),

    #[error("operation abandoned before completion")]
    Abandoned,

    #[error("error delivered to the global error handler")]
    Handled,
}

/// Copyable discriminant of [`ModalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyStack,
    Boundary,
    NoActiveSheet,
    Unbound,
    InvalidState,
    Abandoned,
    Handled,
}

impl ModalError {
    /// Build an [`ModalError::InvalidState`] from any message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Build an [`ModalError::Unbound`] for `key`.
    #[must_use]
    pub fn unbound(key: impl Into<String>) -> Self {
        Self::Unbound { key: key.into() }
    }

    /// The error's discriminant.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyStack => ErrorKind::EmptyStack,
            Self::Boundary { .. } => ErrorKind::Boundary,
            Self::NoActiveSheet => ErrorKind::NoActiveSheet,
            Self::Unbound { .. } => ErrorKind::Unbound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Abandoned => ErrorKind::Abandoned,
            Self::Handled => ErrorKind::Handled,
        }
    }

    /// Whether the error signals a caller mistake rather than an engine bug.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EmptyStack
                | ErrorKind::Boundary
                | ErrorKind::NoActiveSheet
                | ErrorKind::Unbound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_descriptive() {
        assert_eq!(ModalError::EmptyStack.to_string(), "sheet stack is empty");
        assert_eq!(
            ModalError::Boundary {
                direction: Direction::Backward
            }
            .to_string(),
            "cannot move backward: already at the edge of the stack"
        );
        assert_eq!(
            ModalError::unbound("settings").to_string(),
            "no modal instance is bound to key \"settings\""
        );
    }

    #[test]
    fn kinds_and_usage_classification() {
        assert_eq!(ModalError::NoActiveSheet.kind(), ErrorKind::NoActiveSheet);
        assert!(ModalError::EmptyStack.is_usage_error());
        assert!(ModalError::unbound("x").is_usage_error());
        assert!(!ModalError::invalid("missing element").is_usage_error());
        assert!(!ModalError::Abandoned.is_usage_error());
    }
}
