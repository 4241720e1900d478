//! Error types for the tape crate.

use thiserror::Error;

use crate::queue::ObjectId;
use crate::wires::Wire;

/// Errors that can occur while recording, assembling or expanding tapes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TapeError {
    /// The same object identity was recorded twice in one session.
    #[error("Object {id} ({name}) is already recorded in the active queue")]
    DuplicateEntry {
        /// Identity of the object.
        id: ObjectId,
        /// Kind tag of the object.
        name: String,
    },

    /// A measurement was given both an observable and explicit wires.
    #[error("Cannot set the wires if an observable is provided")]
    ObservableWithWires,

    /// A measurement was given both an observable and explicit eigenvalues.
    #[error("Cannot set the eigenvalues if an observable is provided")]
    ObservableWithEigvals,

    /// More than one state measurement in a tape.
    #[error("Only a single state measurement can be returned, got {0}")]
    MultipleStateMeasurements(usize),

    /// A state measurement mixed with statistics.
    #[error("The state cannot be returned in combination with other return types")]
    StateWithOtherMeasurements,

    /// A statistic was requested for something that is not an observable.
    #[error("{0} is not an observable")]
    NotAnObservable(String),

    /// Measurement has no observable to diagonalize.
    #[error("Cannot expand a measurement process with no observable")]
    CannotExpand,

    /// Operation requires a different number of wires.
    #[error("'{name}' requires {expected} wires, got {got}")]
    WireCountMismatch {
        /// Kind tag of the operation.
        name: String,
        /// Expected number of wires.
        expected: usize,
        /// Actual number of wires provided.
        got: usize,
    },

    /// The same wire appears twice in one operation.
    #[error("Duplicate wire {wire}{}", format_name_context(.name))]
    DuplicateWire {
        /// The duplicated wire.
        wire: Wire,
        /// Optional kind tag for context.
        name: Option<String>,
    },

    /// Explicit eigenvalues do not match the number of measured wires.
    #[error("Expected {expected} eigenvalues, got {got}")]
    EigvalCountMismatch {
        /// `2^|wires|`.
        expected: usize,
        /// Number provided.
        got: usize,
    },

    /// Matrix has the wrong shape for the wires it acts on.
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),

    /// Matrix passed as an observable is not Hermitian.
    #[error("Observable must be Hermitian (max deviation {deviation:.3e})")]
    NotHermitian {
        /// Largest `|A[i][j] - conj(A[j][i])|` found.
        deviation: f64,
    },

    /// Two expanded measurements would rotate the same wire.
    #[error("Measurements on wire {0} cannot be diagonalized simultaneously")]
    NonCommutingMeasurements(Wire),

    /// Template weights have the wrong shape.
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}

/// Coarse classification of [`TapeError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Eager construction-time validation failure.
    Validation,
    /// An identity was recorded twice.
    DuplicateEntry,
    /// The requested transformation is not available for this object.
    NotImplemented,
}

impl TapeError {
    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TapeError::DuplicateEntry { .. } => ErrorCategory::DuplicateEntry,
            TapeError::CannotExpand => ErrorCategory::NotImplemented,
            _ => ErrorCategory::Validation,
        }
    }
}

#[allow(clippy::ref_option)]
fn format_name_context(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" (in {name})"),
        None => String::new(),
    }
}

/// Result type for tape operations.
pub type TapeResult<T> = Result<T, TapeError>;
