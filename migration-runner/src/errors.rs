use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic, WriteExecutor};

/// Error kinds for migration runner operations.
///
/// Kinds that concern a single change-unit carry the unit's name so callers
/// can report which file needs fixing before re-running.
///
/// # Examples
///
/// ```rust
/// use migration_runner::errors::{ErrorKind, RunnerError, RunnerResult};
///
/// fn example() -> RunnerResult<()> {
///     Err(RunnerError::new(
///         "no revert operation",
///         ErrorKind::NoRevertDefined("001_create_users.sql".to_string()),
///     ))
/// }
///
/// assert!(example().is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The runner was configured with a bad directory or conflicting settings.
    ConfigError,
    /// A change-unit has no apply operation.
    MalformedUnit(String),
    /// The apply operation or the ledger insert failed; the transaction was rolled back.
    ApplyFailed(String),
    /// Rollback was requested for a unit without a revert operation.
    NoRevertDefined(String),
    /// The revert operation or the ledger delete failed; the transaction was rolled back.
    RevertFailed(String),
    /// The ledger references a unit whose source file is gone.
    MissingUnitFile(String),

    /// Error reported by the database collaborator.
    BackendError,
    /// Generic IO error
    IOError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl ErrorKind {
    /// Returns the change-unit this error concerns, if any.
    pub fn unit(&self) -> Option<&str> {
        match self {
            ErrorKind::MalformedUnit(unit)
            | ErrorKind::ApplyFailed(unit)
            | ErrorKind::NoRevertDefined(unit)
            | ErrorKind::RevertFailed(unit)
            | ErrorKind::MissingUnitFile(unit) => Some(unit),
            _ => None,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ConfigError => write!(f, "Configuration error"),
            ErrorKind::MalformedUnit(unit) => write!(f, "Malformed unit {}", unit),
            ErrorKind::ApplyFailed(unit) => write!(f, "Apply failed for {}", unit),
            ErrorKind::NoRevertDefined(unit) => write!(f, "No revert defined for {}", unit),
            ErrorKind::RevertFailed(unit) => write!(f, "Revert failed for {}", unit),
            ErrorKind::MissingUnitFile(unit) => write!(f, "Missing unit file {}", unit),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of the migration runner.
///
/// `RunnerError` carries a message, an [`ErrorKind`] and an optional cause,
/// so a failed apply keeps the backend error that triggered it.
///
/// # Examples
///
/// ```rust
/// use migration_runner::errors::{ErrorKind, RunnerError};
///
/// let cause = RunnerError::new("no such table: users", ErrorKind::BackendError);
/// let err = RunnerError::new_with_cause(
///     "Failed to apply 002_add_email.sql",
///     ErrorKind::ApplyFailed("002_add_email.sql".to_string()),
///     cause,
/// );
/// assert_eq!(err.kind().unit(), Some("002_add_email.sql"));
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct RunnerError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<RunnerError>>,
    backtrace: Atomic<Backtrace>,
}

impl RunnerError {
    /// Creates a new `RunnerError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        RunnerError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new_unresolved()),
        }
    }

    /// Creates a new `RunnerError` that wraps the error which caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: RunnerError) -> Self {
        RunnerError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new_unresolved()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&RunnerError> {
        self.cause.as_deref()
    }
}

impl Display for RunnerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for RunnerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let trace = self.backtrace.write_with(|bt| {
                    bt.resolve();
                    format!("{:?}", bt)
                });
                write!(f, "{}\n{}", self.message, trace)
            }
        }
    }
}

impl Error for RunnerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for migration runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}
