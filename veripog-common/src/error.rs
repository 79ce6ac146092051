//! Fatal-error carrier
//!
//! Every failure is fatal: the checker reports a single diagnostic line and
//! exits with status 1. Fallible operations return `Result<T>`; `main` owns
//! the final print-and-exit.

use thiserror::Error;

/// Classification of a fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Tokenization, header, or command-syntax failure.
    Parse,
    /// Clause id at or below the last assigned one.
    DuplicateClauseId,
    /// Reference to a clause id that was never stored.
    UnknownClauseId,
    /// Deletion of a clause that is a hole or already deleted.
    AlreadyDeleted,
    /// Literal magnitude beyond the current variable limit.
    VariableOutOfRange,
    /// Non-disjoint or ill-typed node children.
    DependencyViolation,
    /// Unit propagation over the hints did not behave as required.
    RupFailure,
    /// Sum children failed the mutual-exclusion proof.
    MutexFailure,
    /// Reverse implication did not reach a conflict for an input clause.
    ImplicitDeletionFailed,
    /// A structural end-of-proof condition was violated.
    IntegrityFailure,
    /// Ill-formed or contradictory weight declarations.
    Weight,
    /// Operating-system level input failure.
    Io,
}

/// A fatal checker failure with input-position context.
#[derive(Debug, Error)]
#[error("ERROR. File {file}. Line {line}. Function {function}. {message}")]
pub struct CheckFailure {
    pub kind: FailureKind,
    /// The input file being processed when the failure occurred.
    pub file: String,
    /// The input line being processed when the failure occurred.
    pub line: usize,
    /// The checker routine that detected the failure.
    pub function: &'static str,
    pub message: String,
}

impl CheckFailure {
    pub fn new(
        kind: FailureKind,
        file: &str,
        line: usize,
        function: &'static str,
        message: String,
    ) -> CheckFailure {
        CheckFailure {
            kind,
            file: file.to_string(),
            line,
            function,
            message,
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckFailure>;
