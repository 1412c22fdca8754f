use serde::{Deserialize, Serialize};
use std::fmt;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Definition,
    Validation,
    Access,
    Structure,
    Expression,
    Path,
    Call,
    Host,
}

/// Numeric error code (E100–E899).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Definition errors (E100–E199) ──
    pub const MALFORMED_DEFINITION: Self = Self(100);

    // ── Validation errors (E200–E299) ──
    pub const INVALID_VALUE: Self = Self(200);

    // ── Access errors (E300–E399) ──
    pub const UNINITIALIZED_ACCESS: Self = Self(300);

    // ── Structure errors (E400–E499) ──
    pub const STRUCTURAL_VIOLATION: Self = Self(400);

    // ── Expression errors (E500–E599) ──
    pub const UNKNOWN_EXPRESSION: Self = Self(500);

    // ── Path errors (E600–E699) ──
    pub const UNKNOWN_PATH: Self = Self(600);

    // ── Call errors (E700–E799) ──
    pub const NOT_CALLABLE: Self = Self(700);

    // ── Host evaluator errors (E800–E899) ──
    pub const HOST_FAILURE: Self = Self(800);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Definition,
            200..=299 => ErrorCategory::Validation,
            300..=399 => ErrorCategory::Access,
            400..=499 => ErrorCategory::Structure,
            500..=599 => ErrorCategory::Expression,
            600..=699 => ErrorCategory::Path,
            700..=799 => ErrorCategory::Call,
            _ => ErrorCategory::Host,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Definition => write!(f, "definition"),
            Self::Validation => write!(f, "validation"),
            Self::Access => write!(f, "access"),
            Self::Structure => write!(f, "structure"),
            Self::Expression => write!(f, "expression"),
            Self::Path => write!(f, "path"),
            Self::Call => write!(f, "call"),
            Self::Host => write!(f, "host"),
        }
    }
}

/// Every failure the runtime can report.
///
/// Errors are raised where they are detected and unwind the current
/// resolve/run chain through `?`. Loop and function control flow is not
/// modelled here; see `Flow` in `sprog-eval`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SprogError {
    /// Malformed item definition (unknown type, non-boolean flag, bad default).
    #[error("definition error: {0}")]
    Definition(String),
    /// Value rejected on set or init (type, nullable, required, readonly).
    #[error("validation error: {0}")]
    Validation(String),
    /// Container or scope used before `init`.
    #[error("uninitialized access: {0}")]
    UninitializedAccess(String),
    /// Key added twice, removed from a struct, layered map re-parented, ...
    #[error("structural error: {0}")]
    Structural(String),
    /// Node names an operation missing from the registry.
    #[error("unknown expression: {0}")]
    UnknownExpression(String),
    /// Path segment could not be resolved during deep get/set.
    #[error("unknown path: {0}")]
    UnknownPath(String),
    /// Invocation of a value that is not a function.
    #[error("not callable: {0}")]
    NotCallable(String),
    /// Failure reported by (or absence of) the host-code evaluator.
    #[error("host evaluation failed: {0}")]
    Host(String),
}

impl SprogError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Definition(_) => ErrorCode::MALFORMED_DEFINITION,
            Self::Validation(_) => ErrorCode::INVALID_VALUE,
            Self::UninitializedAccess(_) => ErrorCode::UNINITIALIZED_ACCESS,
            Self::Structural(_) => ErrorCode::STRUCTURAL_VIOLATION,
            Self::UnknownExpression(_) => ErrorCode::UNKNOWN_EXPRESSION,
            Self::UnknownPath(_) => ErrorCode::UNKNOWN_PATH,
            Self::NotCallable(_) => ErrorCode::NOT_CALLABLE,
            Self::Host(_) => ErrorCode::HOST_FAILURE,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// The human-readable part, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Definition(msg)
            | Self::Validation(msg)
            | Self::UninitializedAccess(msg)
            | Self::Structural(msg)
            | Self::UnknownExpression(msg)
            | Self::UnknownPath(msg)
            | Self::NotCallable(msg)
            | Self::Host(msg) => msg,
        }
    }
}

/// Structured form of an error, for hosts that forward failures as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&SprogError> for ErrorReport {
    fn from(err: &SprogError) -> Self {
        Self {
            code: err.code(),
            category: err.category(),
            message: err.message().to_string(),
        }
    }
}
