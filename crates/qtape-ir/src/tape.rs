//! Tapes: ordered operations followed by terminal measurements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::error::{TapeError, TapeResult};
use crate::graph::CircuitGraph;
use crate::measure::{MeasurementProcess, ReturnType};
use crate::observable::Observable;
use crate::operation::Operation;
use crate::queue::{AnnotatedQueue, Queueable, QueuedObject};
use crate::wires::Wires;

/// A recorded quantum program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tape {
    operations: Vec<Operation>,
    measurements: Vec<MeasurementProcess>,
}

impl Tape {
    /// Assemble a tape, checking the state-measurement rules.
    pub fn new(
        operations: Vec<Operation>,
        measurements: Vec<MeasurementProcess>,
    ) -> TapeResult<Self> {
        let states = measurements
            .iter()
            .filter(|m| m.return_type() == ReturnType::State)
            .count();
        if states > 1 {
            return Err(TapeError::MultipleStateMeasurements(states));
        }
        if states == 1 && measurements.len() > 1 {
            return Err(TapeError::StateWithOtherMeasurements);
        }
        Ok(Self {
            operations,
            measurements,
        })
    }

    /// Assemble a tape from a finished recording session.
    ///
    /// Operations owned by another object (for example a gate used as an
    /// observable) are not part of the circuit. Observables reach the tape
    /// through their measurement; unowned ones are dropped.
    pub fn from_queue(queue: AnnotatedQueue) -> TapeResult<Self> {
        let mut operations = vec![];
        let mut measurements = vec![];

        for entry in queue.into_entries() {
            let owner = entry.annotation.owner;
            match entry.object {
                QueuedObject::Operation(op) if owner.is_none() => operations.push(op),
                QueuedObject::Operation(op) => {
                    trace!(id = %op.id(), "Skipping owned operation {}", op.name());
                }
                QueuedObject::Measurement(m) => measurements.push(m),
                QueuedObject::Observable(_) | QueuedObject::Tensor(_) if owner.is_some() => {}
                other => {
                    debug!(id = %other.id(), "Ignoring unmeasured observable {}", other.name());
                }
            }
        }

        debug!(
            operations = operations.len(),
            measurements = measurements.len(),
            "Assembled tape"
        );
        Self::new(operations, measurements)
    }

    /// Record everything `f` constructs and assemble it into a tape.
    pub fn record(f: impl FnOnce() -> TapeResult<()>) -> TapeResult<Self> {
        let session = AnnotatedQueue::begin();
        f()?;
        Self::from_queue(session.end())
    }

    /// Operations in order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Measurements in order.
    pub fn measurements(&self) -> &[MeasurementProcess] {
        &self.measurements
    }

    /// Observables of the measurements that have one, in order.
    pub fn observables(&self) -> Vec<&Observable> {
        self.measurements
            .iter()
            .filter_map(MeasurementProcess::observable)
            .collect()
    }

    /// Every wire touched, in order of first use.
    pub fn wires(&self) -> Wires {
        Wires::union(
            self.operations
                .iter()
                .map(Queueable::wires)
                .chain(self.measurements.iter().map(Queueable::wires)),
        )
    }

    /// Number of distinct wires.
    pub fn num_wires(&self) -> usize {
        self.wires().len()
    }

    /// Operation parameters, flattened in order.
    pub fn parameters(&self) -> Vec<f64> {
        self.operations
            .iter()
            .flat_map(Queueable::parameters)
            .collect()
    }

    /// Dependency graph of the tape.
    pub fn graph(&self) -> CircuitGraph {
        CircuitGraph::from_tape(self)
    }

    /// Summary statistics.
    pub fn specs(&self) -> TapeSpecs {
        let mut gate_counts = BTreeMap::new();
        for op in &self.operations {
            *gate_counts.entry(op.name().to_string()).or_insert(0) += 1;
        }
        TapeSpecs {
            num_operations: self.operations.len(),
            num_measurements: self.measurements.len(),
            num_wires: self.num_wires(),
            depth: self.graph().depth(),
            gate_counts,
        }
    }

    /// Expand every measurement that has an observable.
    pub fn expand_measurements(&self) -> TapeResult<Tape> {
        self.expand_where(|_| true)
    }

    /// Expand the measurements selected by `pred`.
    ///
    /// Diagonalizing gates are appended after the existing operations, and
    /// each expanded measurement is replaced by its computational-basis
    /// counterpart. Measurements of the same observable on the same wires
    /// share one set of rotations. Fails with
    /// [`TapeError::NonCommutingMeasurements`] if a rotation would touch a
    /// wire that another measurement reads in a different basis.
    #[instrument(level = "debug", skip_all, fields(measurements = self.measurements.len()))]
    pub fn expand_where(&self, pred: impl Fn(&MeasurementProcess) -> bool) -> TapeResult<Tape> {
        let mut operations = self.operations.clone();
        let mut measurements = Vec::with_capacity(self.measurements.len());
        let mut rotated: Vec<&Observable> = vec![];

        for (i, m) in self.measurements.iter().enumerate() {
            let Some(obs) = m.observable().filter(|_| pred(m)) else {
                measurements.push(m.clone());
                continue;
            };
            let expanded = m.expand()?;
            measurements.extend(expanded.measurements);

            if rotated.iter().any(|r| r.same_basis(obs)) {
                continue;
            }
            let gate_wires = Wires::union(expanded.operations.iter().map(Queueable::wires));
            for (j, other) in self.measurements.iter().enumerate() {
                if j == i || other.observable().is_some_and(|o| o.same_basis(obs)) {
                    continue;
                }
                if let Some(wire) = gate_wires.shared_with(other.wires()) {
                    return Err(TapeError::NonCommutingMeasurements(wire.clone()));
                }
            }
            operations.extend(expanded.operations);
            rotated.push(obs);
        }

        debug!(
            added = operations.len() - self.operations.len(),
            "Expanded measurements"
        );
        Tape::new(operations, measurements)
    }
}

/// Summary of a tape's resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeSpecs {
    /// Number of operations.
    pub num_operations: usize,
    /// Number of measurements.
    pub num_measurements: usize,
    /// Number of distinct wires.
    pub num_wires: usize,
    /// Longest chain of operations sharing wires.
    pub depth: usize,
    /// Operation count per gate name.
    pub gate_counts: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{expval, probs, state, var};
    use crate::observable::PrimitiveObservable;

    #[test]
    fn test_from_queue_splits_operations_and_measurements() {
        let tape = Tape::record(|| {
            Operation::h(0);
            Operation::cnot(0, 1)?;
            expval(PrimitiveObservable::pauli_z(1))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(tape.operations().len(), 2);
        assert_eq!(tape.measurements().len(), 1);
        assert_eq!(tape.observables()[0].name(), "PauliZ");
        assert_eq!(tape.wires(), Wires::from([0, 1]));
    }

    #[test]
    fn test_gate_used_as_observable_is_not_an_operation() {
        let tape = Tape::record(|| {
            Operation::rx(0.2, 0);
            expval(Operation::x(0))?;
            Ok(())
        })
        .unwrap();
        assert_eq!(tape.operations().len(), 1);
        assert_eq!(tape.operations()[0].name(), "RX");
    }

    #[test]
    fn test_unmeasured_observable_is_ignored() {
        let tape = Tape::record(|| {
            PrimitiveObservable::pauli_x(0);
            Ok(())
        })
        .unwrap();
        assert!(tape.measurements().is_empty());
        assert!(tape.operations().is_empty());
    }

    #[test]
    fn test_state_rules() {
        let err = Tape::record(|| {
            state();
            state();
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, TapeError::MultipleStateMeasurements(2)));

        let err = Tape::record(|| {
            state();
            probs([0])?;
            Ok(())
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The state cannot be returned in combination with other return types"
        );

        assert!(Tape::new(vec![], vec![state()]).is_ok());
    }

    #[test]
    fn test_parameters_and_specs() {
        let tape = Tape::record(|| {
            Operation::rx(0.5, 0);
            Operation::rot(0.1, 0.2, 0.3, 1);
            Operation::cnot(0, 1)?;
            Operation::h(1);
            probs([0, 1])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(tape.parameters(), vec![0.5, 0.1, 0.2, 0.3]);

        let specs = tape.specs();
        assert_eq!(specs.num_operations, 4);
        assert_eq!(specs.num_wires, 2);
        assert_eq!(specs.depth, 3);
        assert_eq!(specs.gate_counts.get("CNOT"), Some(&1));
    }

    #[test]
    fn test_expand_measurements_appends_rotations() {
        let tape = Tape::record(|| {
            Operation::h(0);
            expval(PrimitiveObservable::pauli_x(0))?;
            var(PrimitiveObservable::pauli_y(1))?;
            Ok(())
        })
        .unwrap();
        let expanded = tape.expand_measurements().unwrap();

        let names: Vec<_> = expanded.operations().iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["Hadamard", "Hadamard", "PauliZ", "S", "Hadamard"]);
        assert!(expanded.observables().is_empty());
        assert_eq!(expanded.measurements()[1].return_type(), ReturnType::Variance);
    }

    #[test]
    fn test_shared_basis_rotates_once() {
        let tape = Tape::record(|| {
            expval(PrimitiveObservable::pauli_x(0))?;
            var(PrimitiveObservable::pauli_x(0))?;
            Ok(())
        })
        .unwrap();
        let expanded = tape.expand_measurements().unwrap();
        assert_eq!(expanded.operations().len(), 1);
        assert_eq!(expanded.measurements().len(), 2);
    }

    #[test]
    fn test_non_commuting_measurements() {
        let tape = Tape::record(|| {
            expval(PrimitiveObservable::pauli_x(0))?;
            expval(PrimitiveObservable::pauli_z(0))?;
            Ok(())
        })
        .unwrap();
        let err = tape.expand_measurements().unwrap_err();
        assert!(matches!(err, TapeError::NonCommutingMeasurements(_)));
    }
}
