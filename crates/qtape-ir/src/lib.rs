//! qtape Recording Intermediate Representation
//!
//! This crate records quantum programs as tapes: constructing a gate, an
//! observable or a measurement while a session is active appends it to that
//! session, and finishing the session yields a [`Tape`] of operations
//! followed by measurements.
//!
//! # Core Components
//!
//! - **Sessions**: [`AnnotatedQueue`] and its [`QueueGuard`], a thread-local
//!   stack of recording queues with ownership annotations
//! - **Wires**: [`Wire`] labels (integers or strings) and ordered [`Wires`]
//! - **Operations**: [`Operation`] applying a [`Gate`] to wires
//! - **Observables**: [`PrimitiveObservable`], [`Tensor`] and the
//!   [`ObservableOps`] capability trait
//! - **Measurements**: [`MeasurementProcess`] and the statistics functions
//!   [`expval`], [`var`], [`sample`], [`probs`] and [`state`]
//! - **Tapes**: [`Tape`] assembly, validation and measurement expansion
//! - **Graph**: [`CircuitGraph`] wire-dependency DAG of a tape
//!
//! # Example: Recording a Tape
//!
//! ```rust
//! use qtape_ir::prelude::*;
//!
//! let tape = Tape::record(|| {
//!     Operation::h(0);
//!     Operation::cnot(0, 1)?;
//!     expval(PrimitiveObservable::pauli_x(0).tensor(PrimitiveObservable::pauli_y(1)))?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(tape.operations().len(), 2);
//! assert_eq!(tape.observables().len(), 1);
//! ```
//!
//! # Example: Expanding a Measurement
//!
//! ```rust
//! use qtape_ir::prelude::*;
//!
//! let obs = PrimitiveObservable::pauli_x(0).tensor(PrimitiveObservable::pauli_y(1));
//! let tape = expval(obs).unwrap().expand().unwrap();
//!
//! // H on wire 0, then Z, S, H on wire 1
//! assert_eq!(tape.operations().len(), 4);
//! assert_eq!(tape.measurements()[0].eigvals(), Some(vec![1.0, -1.0, -1.0, 1.0]));
//! ```

pub mod error;
pub mod gate;
pub mod graph;
pub mod linalg;
pub mod measure;
pub mod observable;
pub mod operation;
pub mod queue;
pub mod tape;
pub mod templates;
pub mod wires;

pub use error::{ErrorCategory, TapeError, TapeResult};
pub use gate::{Gate, UnitaryMatrix};
pub use graph::{CircuitGraph, GraphNode, NodeIndex};
pub use measure::{MeasurementProcess, ReturnType, expval, probs, sample, state, var};
pub use observable::{
    HERMITIAN_TOLERANCE, HermitianMatrix, IntoObservable, Observable, ObservableKind,
    ObservableOps, PrimitiveObservable, Tensor,
};
pub use operation::Operation;
pub use queue::{
    AnnotatedQueue, Annotation, ObjectId, QueueEntry, QueueGuard, Queueable, QueuedObject,
};
pub use tape::{Tape, TapeSpecs};
pub use wires::{Wire, Wires};

/// Common imports for recording tapes.
pub mod prelude {
    pub use crate::error::{TapeError, TapeResult};
    pub use crate::measure::{MeasurementProcess, ReturnType, expval, probs, sample, state, var};
    pub use crate::observable::{
        HermitianMatrix, IntoObservable, Observable, ObservableOps, PrimitiveObservable, Tensor,
    };
    pub use crate::operation::Operation;
    pub use crate::queue::{AnnotatedQueue, Queueable};
    pub use crate::tape::Tape;
    pub use crate::wires::{Wire, Wires};
}
