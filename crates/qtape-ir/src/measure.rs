//! Terminal measurements.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{TapeError, TapeResult};
use crate::observable::{IntoObservable, Observable, ObservableOps};
use crate::queue::{self, AnnotatedQueue, ObjectId, Queueable, QueuedObject};
use crate::tape::Tape;
use crate::wires::{Wire, Wires};

/// The statistic a measurement produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnType {
    /// Expectation value of an observable.
    Expectation,
    /// Variance of an observable.
    Variance,
    /// Samples of an observable's eigenvalues.
    Sample,
    /// Computational-basis probabilities.
    Probability,
    /// The full state.
    State,
}

impl ReturnType {
    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ReturnType::Expectation => "expval",
            ReturnType::Variance => "var",
            ReturnType::Sample => "sample",
            ReturnType::Probability => "probs",
            ReturnType::State => "state",
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A terminal measurement, optionally of an observable.
///
/// Either `obs` is set, in which case wires and eigenvalues come from the
/// observable, or the measurement carries explicit wires and eigenvalues.
/// The two forms cannot be mixed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementProcess {
    id: ObjectId,
    return_type: ReturnType,
    obs: Option<Observable>,
    wires: Wires,
    eigvals: Option<Vec<f64>>,
}

impl MeasurementProcess {
    /// Create a measurement.
    ///
    /// Inside a session the measurement is recorded and becomes the owner
    /// of its observable.
    ///
    /// Explicit wires must be distinct, and explicit eigenvalues must number
    /// `2^|wires|`. A tensor observable must not repeat a wire across its
    /// factors.
    pub fn new(
        return_type: ReturnType,
        obs: Option<Observable>,
        wires: Option<Wires>,
        eigvals: Option<Vec<f64>>,
    ) -> TapeResult<Self> {
        let duplicate = match &obs {
            Some(obs) => {
                if wires.is_some() {
                    return Err(TapeError::ObservableWithWires);
                }
                if eigvals.is_some() {
                    return Err(TapeError::ObservableWithEigvals);
                }
                overlapping_factor_wire(obs).map(|w| (w, "Tensor"))
            }
            None => wires
                .as_ref()
                .and_then(Wires::first_duplicate)
                .map(|w| (w.clone(), return_type.name())),
        };
        if let Some((wire, name)) = duplicate {
            return Err(TapeError::DuplicateWire {
                wire,
                name: Some(name.to_string()),
            });
        }

        let wires = wires.unwrap_or_default();
        if let Some(eigvals) = &eigvals {
            let expected = u32::try_from(wires.len())
                .ok()
                .and_then(|n| 1_usize.checked_shl(n))
                .unwrap_or(usize::MAX);
            if eigvals.len() != expected {
                return Err(TapeError::EigvalCountMismatch {
                    expected,
                    got: eigvals.len(),
                });
            }
        }

        Ok(Self::build(return_type, obs, wires, eigvals))
    }

    fn build(
        return_type: ReturnType,
        obs: Option<Observable>,
        wires: Wires,
        eigvals: Option<Vec<f64>>,
    ) -> Self {
        let m = Self {
            id: ObjectId::fresh(),
            return_type,
            obs,
            wires,
            eigvals,
        };
        queue::register(|| QueuedObject::Measurement(m.clone()));
        if let Some(obs) = &m.obs {
            queue::link(m.id, &[obs.id()]);
        }
        m
    }

    /// Measure an observable.
    pub fn with_observable(
        return_type: ReturnType,
        obs: impl Into<Observable>,
    ) -> TapeResult<Self> {
        Self::new(return_type, Some(obs.into()), None, None)
    }

    /// Measure wires directly, with no observable.
    pub fn with_wires(return_type: ReturnType, wires: impl Into<Wires>) -> TapeResult<Self> {
        Self::new(return_type, None, Some(wires.into()), None)
    }

    /// The statistic produced.
    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    /// The measured observable, if any.
    pub fn observable(&self) -> Option<&Observable> {
        self.obs.as_ref()
    }

    /// Mutable access to the measured observable.
    ///
    /// Changes are visible through [`MeasurementProcess::wires`] and
    /// [`MeasurementProcess::eigvals`].
    pub fn observable_mut(&mut self) -> Option<&mut Observable> {
        self.obs.as_mut()
    }

    /// Eigenvalues of the measured quantity, if known.
    pub fn eigvals(&self) -> Option<Vec<f64>> {
        match &self.obs {
            Some(obs) => obs.eigvals(),
            None => self.eigvals.clone(),
        }
    }

    /// Rewrite this measurement as basis rotations followed by a
    /// computational-basis measurement.
    ///
    /// The expansion is recorded in a private session, so an enclosing
    /// session sees none of the intermediate objects.
    #[instrument(level = "debug", skip(self), fields(id = %self.id, return_type = %self.return_type))]
    pub fn expand(&self) -> TapeResult<Tape> {
        let obs = self.obs.as_ref().ok_or(TapeError::CannotExpand)?;

        let session = AnnotatedQueue::begin();
        let (gates, eigvals) = obs.diagonalize()?;
        debug!(gates = gates.len(), "Diagonalized {}", obs.name());
        MeasurementProcess::new(self.return_type, None, Some(obs.wires().clone()), eigvals)?;
        Tape::from_queue(session.end())
    }
}

impl Queueable for MeasurementProcess {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn name(&self) -> &str {
        self.return_type.name()
    }

    fn wires(&self) -> &Wires {
        match &self.obs {
            Some(obs) => obs.wires(),
            None => &self.wires,
        }
    }

    fn parameters(&self) -> Vec<f64> {
        vec![]
    }

    fn to_queued(&self) -> QueuedObject {
        QueuedObject::Measurement(self.clone())
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Expectation value of an observable.
pub fn expval(obs: impl IntoObservable) -> TapeResult<MeasurementProcess> {
    MeasurementProcess::with_observable(ReturnType::Expectation, obs.into_observable()?)
}

/// Variance of an observable.
pub fn var(obs: impl IntoObservable) -> TapeResult<MeasurementProcess> {
    MeasurementProcess::with_observable(ReturnType::Variance, obs.into_observable()?)
}

/// Samples of an observable.
pub fn sample(obs: impl IntoObservable) -> TapeResult<MeasurementProcess> {
    MeasurementProcess::with_observable(ReturnType::Sample, obs.into_observable()?)
}

/// Computational-basis probabilities of `wires`.
pub fn probs(wires: impl Into<Wires>) -> TapeResult<MeasurementProcess> {
    MeasurementProcess::with_wires(ReturnType::Probability, wires)
}

/// The full state.
pub fn state() -> MeasurementProcess {
    MeasurementProcess::build(ReturnType::State, None, Wires::empty(), None)
}

/// First wire shared by two factors of a tensor observable.
fn overlapping_factor_wire(obs: &Observable) -> Option<Wire> {
    let tensor = obs.as_tensor()?;
    let mut seen = Wires::empty();
    for factor in tensor.factors() {
        if let Some(w) = factor.wires().shared_with(&seen) {
            return Some(w.clone());
        }
        seen = Wires::union([&seen, factor.wires()]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::{HermitianMatrix, PrimitiveObservable};
    use crate::operation::Operation;

    #[test]
    fn test_observable_excludes_wires_and_eigvals() {
        let obs = Observable::from(PrimitiveObservable::pauli_z(0));
        let err = MeasurementProcess::new(
            ReturnType::Expectation,
            Some(obs.clone()),
            Some(Wires::from([0])),
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Cannot set the wires if an observable is provided");

        let err = MeasurementProcess::new(
            ReturnType::Expectation,
            Some(obs),
            None,
            Some(vec![1.0, -1.0]),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot set the eigenvalues if an observable is provided"
        );
    }

    #[test]
    fn test_explicit_wires_and_eigvals() {
        let m = MeasurementProcess::new(
            ReturnType::Sample,
            None,
            Some(Wires::from(["a", "b"])),
            Some(vec![1.0, 2.0, 3.0, 4.0]),
        )
        .unwrap();
        assert_eq!(m.wires(), &Wires::from(["a", "b"]));
        assert_eq!(m.eigvals(), Some(vec![1.0, 2.0, 3.0, 4.0]));
        assert!(m.observable().is_none());
    }

    #[test]
    fn test_explicit_wires_must_be_distinct() {
        let err = probs([0, 0]).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate wire 0 (in probs)");

        let err = MeasurementProcess::new(
            ReturnType::Sample,
            None,
            Some(Wires::from(["a", "b", "a"])),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TapeError::DuplicateWire { .. }));
    }

    #[test]
    fn test_eigval_count_must_match_wires() {
        let err = MeasurementProcess::new(
            ReturnType::Sample,
            None,
            Some(Wires::from([0, 1])),
            Some(vec![1.0, -1.0]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TapeError::EigvalCountMismatch {
                expected: 4,
                got: 2
            }
        ));
    }

    #[test]
    fn test_overlapping_tensor_factors_rejected() {
        let t = PrimitiveObservable::pauli_x(0)
            .tensor(PrimitiveObservable::pauli_y(1))
            .tensor(PrimitiveObservable::pauli_z(0));
        let err = expval(t).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate wire 0 (in Tensor)");
    }

    #[test]
    fn test_live_eigvals() {
        let h = HermitianMatrix::diag(&[1.0, 2.0]).unwrap();
        let mut m = expval(PrimitiveObservable::hermitian(h, [0]).unwrap()).unwrap();
        assert_eq!(m.eigvals().map(|e| e.len()), Some(2));

        m.observable_mut()
            .and_then(Observable::as_primitive_mut)
            .unwrap()
            .set_matrix(HermitianMatrix::diag(&[-3.0, 9.0]).unwrap())
            .unwrap();
        let e = m.eigvals().unwrap();
        assert!((e[0] + 3.0).abs() < 1e-10);
        assert!((e[1] - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_non_observable_operation() {
        let err = expval(Operation::rx(0.3, 0)).unwrap_err();
        assert_eq!(err.to_string(), "RX is not an observable");
    }

    #[test]
    fn test_expand_without_observable() {
        let err = probs([0, 1]).unwrap().expand().unwrap_err();
        assert!(matches!(err, TapeError::CannotExpand));
        assert_eq!(
            err.to_string(),
            "Cannot expand a measurement process with no observable"
        );
    }

    #[test]
    fn test_expand_pauli_x() {
        let tape = var(PrimitiveObservable::pauli_x(2)).unwrap().expand().unwrap();
        assert_eq!(tape.operations().len(), 1);
        assert_eq!(tape.operations()[0].name(), "Hadamard");

        let m = &tape.measurements()[0];
        assert_eq!(m.return_type(), ReturnType::Variance);
        assert!(m.observable().is_none());
        assert_eq!(m.wires(), &Wires::from([2]));
        assert_eq!(m.eigvals(), Some(vec![1.0, -1.0]));
    }

    #[test]
    fn test_return_type_names() {
        assert_eq!(state().name(), "state");
        assert_eq!(ReturnType::Expectation.to_string(), "expval");
    }
}
