//! Gate instructions applied to wires.

use crate::error::{TapeError, TapeResult};
use crate::gate::{Gate, UnitaryMatrix};
use crate::queue::{self, ObjectId, Queueable, QueuedObject};
use crate::wires::{Wire, Wires};

/// A gate applied to specific wires.
///
/// Constructing an operation records it into the active session.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    id: ObjectId,
    gate: Gate,
    wires: Wires,
}

impl Operation {
    /// Create an operation, checking the wire count and rejecting
    /// repeated wires.
    pub fn new(gate: Gate, wires: impl Into<Wires>) -> TapeResult<Self> {
        let wires = wires.into();
        if wires.len() != gate.num_wires() {
            return Err(TapeError::WireCountMismatch {
                name: gate.name().to_string(),
                expected: gate.num_wires(),
                got: wires.len(),
            });
        }
        if let Some(wire) = wires.first_duplicate() {
            return Err(TapeError::DuplicateWire {
                wire: wire.clone(),
                name: Some(gate.name().to_string()),
            });
        }
        Ok(Self::build(gate, wires))
    }

    fn single(gate: Gate, wire: impl Into<Wire>) -> Self {
        Self::build(gate, Wires::from(wire.into()))
    }

    fn build(gate: Gate, wires: Wires) -> Self {
        let op = Self {
            id: ObjectId::fresh(),
            gate,
            wires,
        };
        queue::register(|| QueuedObject::Operation(op.clone()));
        op
    }

    /// The gate.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Split into identity, gate and wires without recording anything.
    pub(crate) fn into_parts(self) -> (ObjectId, Gate, Wires) {
        (self.id, self.gate, self.wires)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Identity gate.
    pub fn identity(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::I, wire)
    }

    /// Hadamard gate.
    pub fn h(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::H, wire)
    }

    /// Pauli-X gate.
    pub fn x(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::X, wire)
    }

    /// Pauli-Y gate.
    pub fn y(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::Y, wire)
    }

    /// Pauli-Z gate.
    pub fn z(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::Z, wire)
    }

    /// S gate.
    pub fn s(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::S, wire)
    }

    /// S-dagger gate.
    pub fn sdg(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::Sdg, wire)
    }

    /// T gate.
    pub fn t(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::T, wire)
    }

    /// T-dagger gate.
    pub fn tdg(wire: impl Into<Wire>) -> Self {
        Self::single(Gate::Tdg, wire)
    }

    /// Rx rotation.
    pub fn rx(theta: f64, wire: impl Into<Wire>) -> Self {
        Self::single(Gate::Rx(theta), wire)
    }

    /// Ry rotation.
    pub fn ry(theta: f64, wire: impl Into<Wire>) -> Self {
        Self::single(Gate::Ry(theta), wire)
    }

    /// Rz rotation.
    pub fn rz(theta: f64, wire: impl Into<Wire>) -> Self {
        Self::single(Gate::Rz(theta), wire)
    }

    /// Arbitrary rotation Rot(φ, θ, ω).
    pub fn rot(phi: f64, theta: f64, omega: f64, wire: impl Into<Wire>) -> Self {
        Self::single(Gate::Rot(phi, theta, omega), wire)
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// CNOT gate.
    pub fn cnot(control: impl Into<Wire>, target: impl Into<Wire>) -> TapeResult<Self> {
        Self::new(Gate::CX, Wires::new([control.into(), target.into()]))
    }

    /// Controlled-Z gate.
    pub fn cz(control: impl Into<Wire>, target: impl Into<Wire>) -> TapeResult<Self> {
        Self::new(Gate::CZ, Wires::new([control.into(), target.into()]))
    }

    /// SWAP gate.
    pub fn swap(a: impl Into<Wire>, b: impl Into<Wire>) -> TapeResult<Self> {
        Self::new(Gate::Swap, Wires::new([a.into(), b.into()]))
    }

    /// Arbitrary unitary on `wires`.
    pub fn qubit_unitary(matrix: UnitaryMatrix, wires: impl Into<Wires>) -> TapeResult<Self> {
        Self::new(Gate::QubitUnitary(matrix), wires)
    }
}

impl Queueable for Operation {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn name(&self) -> &str {
        self.gate.name()
    }

    fn wires(&self) -> &Wires {
        &self.wires
    }

    fn parameters(&self) -> Vec<f64> {
        self.gate.parameters()
    }

    fn to_queued(&self) -> QueuedObject {
        QueuedObject::Operation(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_qubit_operation() {
        let op = Operation::h(0);
        assert_eq!(op.name(), "Hadamard");
        assert_eq!(op.wires(), &Wires::from([0]));
        assert!(op.parameters().is_empty());
    }

    #[test]
    fn test_identity_not_structural() {
        let a = Operation::rx(0.5, "a");
        let b = Operation::rx(0.5, "a");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.gate(), b.gate());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_wire_count_mismatch() {
        let err = Operation::new(Gate::CX, [0]).unwrap_err();
        assert!(matches!(
            err,
            TapeError::WireCountMismatch { expected: 2, got: 1, .. }
        ));
    }

    #[test]
    fn test_duplicate_wire() {
        let err = Operation::cnot(1, 1).unwrap_err();
        assert!(matches!(err, TapeError::DuplicateWire { .. }));
        assert_eq!(err.to_string(), "Duplicate wire 1 (in CNOT)");
    }

    #[test]
    fn test_rot_parameters() {
        let op = Operation::rot(0.1, 0.2, 0.3, 4);
        assert_eq!(op.parameters(), vec![0.1, 0.2, 0.3]);
        assert_eq!(op.name(), "Rot");
    }
}
