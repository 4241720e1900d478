//! Observables and their diagonalizing gates.
//!
//! Every observable exposes the same capability set through
//! [`ObservableOps`]: its wires, its eigenvalues when they are known, and a
//! gate sequence that rotates it into the computational basis.
//!
//! | Kind | Eigenvalues | Diagonalizing gates |
//! |------|-------------|---------------------|
//! | `Identity` | `[1, 1]` | none |
//! | `PauliX` | `[1, -1]` | `Hadamard` |
//! | `PauliY` | `[1, -1]` | `PauliZ`, `S`, `Hadamard` |
//! | `PauliZ` | `[1, -1]` | none |
//! | `Hadamard` | `[1, -1]` | `RY(-π/4)` |
//! | `Hermitian` | numeric, ascending | `QubitUnitary(U†)` |
//! | `NumberOperator` | undefined | none |
//!
//! A [`Tensor`] combines factors: wires are the ordered union, eigenvalues
//! the Kronecker product, gates the concatenation in factor order.

use std::f64::consts::FRAC_PI_4;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{TapeError, TapeResult};
use crate::gate::{Gate, UnitaryMatrix, square_dim};
use crate::linalg::{self, Eigh};
use crate::operation::Operation;
use crate::queue::{self, ObjectId, Queueable, QueuedObject};
use crate::wires::{Wire, Wires};

/// Maximum `|A - A†|` entry accepted for a Hermitian observable.
pub const HERMITIAN_TOLERANCE: f64 = 1e-8;

/// A Hermitian matrix stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HermitianMatrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl HermitianMatrix {
    /// Validate and wrap a row-major matrix.
    pub fn new(data: Vec<Complex64>) -> TapeResult<Self> {
        let dim = square_dim(data.len())?;
        let deviation = linalg::hermitian_deviation(dim, &data);
        if deviation > HERMITIAN_TOLERANCE {
            return Err(TapeError::NotHermitian { deviation });
        }
        Ok(Self { dim, data })
    }

    /// Build from real-valued rows.
    pub fn from_real_rows(rows: &[Vec<f64>]) -> TapeResult<Self> {
        let dim = rows.len();
        if rows.iter().any(|r| r.len() != dim) {
            return Err(TapeError::InvalidMatrix(format!(
                "expected {dim} columns in every row"
            )));
        }
        Self::new(
            rows.iter()
                .flatten()
                .map(|&x| Complex64::new(x, 0.0))
                .collect(),
        )
    }

    /// A real diagonal matrix.
    pub fn diag(values: &[f64]) -> TapeResult<Self> {
        let n = values.len();
        let mut data = vec![Complex64::new(0.0, 0.0); n * n];
        for (i, &v) in values.iter().enumerate() {
            data[i * n + i] = Complex64::new(v, 0.0);
        }
        Self::new(data)
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of wires the matrix acts on.
    pub fn num_wires(&self) -> usize {
        self.dim.trailing_zeros() as usize
    }

    /// Row-major entries.
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    /// Numeric eigendecomposition.
    pub fn eigh(&self) -> Eigh {
        linalg::eigh(self.dim, &self.data)
    }
}

/// Elementary observable kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservableKind {
    /// Identity.
    Identity,
    /// Pauli-X.
    PauliX,
    /// Pauli-Y.
    PauliY,
    /// Pauli-Z.
    PauliZ,
    /// Hadamard.
    Hadamard,
    /// Arbitrary Hermitian matrix.
    Hermitian(HermitianMatrix),
    /// Photon-number operator; its spectrum is unbounded.
    NumberOperator,
}

impl ObservableKind {
    /// Kind tag.
    pub fn name(&self) -> &'static str {
        match self {
            ObservableKind::Identity => "Identity",
            ObservableKind::PauliX => "PauliX",
            ObservableKind::PauliY => "PauliY",
            ObservableKind::PauliZ => "PauliZ",
            ObservableKind::Hadamard => "Hadamard",
            ObservableKind::Hermitian(_) => "Hermitian",
            ObservableKind::NumberOperator => "NumberOperator",
        }
    }

    /// Number of wires the observable acts on.
    pub fn num_wires(&self) -> usize {
        match self {
            ObservableKind::Hermitian(m) => m.num_wires(),
            _ => 1,
        }
    }

    fn from_gate(gate: &Gate) -> Option<Self> {
        match gate {
            Gate::I => Some(ObservableKind::Identity),
            Gate::X => Some(ObservableKind::PauliX),
            Gate::Y => Some(ObservableKind::PauliY),
            Gate::Z => Some(ObservableKind::PauliZ),
            Gate::H => Some(ObservableKind::Hadamard),
            _ => None,
        }
    }
}

/// Capabilities shared by every observable.
pub trait ObservableOps: Queueable {
    /// Eigenvalues, if defined.
    ///
    /// Computed on every call so that later changes to the observable are
    /// reflected.
    fn eigvals(&self) -> Option<Vec<f64>>;

    /// Gates that rotate the observable into the computational basis.
    ///
    /// The gates are constructed, so they are recorded into the active
    /// session.
    fn diagonalizing_gates(&self) -> TapeResult<Vec<Operation>>;

    /// Diagonalizing gates together with eigenvalues in the matching order.
    fn diagonalize(&self) -> TapeResult<(Vec<Operation>, Option<Vec<f64>>)> {
        Ok((self.diagonalizing_gates()?, self.eigvals()))
    }
}

// =============================================================================
// Primitive observables
// =============================================================================

/// An elementary observable on specific wires.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveObservable {
    id: ObjectId,
    kind: ObservableKind,
    wires: Wires,
}

impl PrimitiveObservable {
    /// Create an observable, checking its wires against its kind.
    pub fn new(kind: ObservableKind, wires: impl Into<Wires>) -> TapeResult<Self> {
        let wires = wires.into();
        if wires.len() != kind.num_wires() {
            return Err(TapeError::WireCountMismatch {
                name: kind.name().to_string(),
                expected: kind.num_wires(),
                got: wires.len(),
            });
        }
        if let Some(wire) = wires.first_duplicate() {
            return Err(TapeError::DuplicateWire {
                wire: wire.clone(),
                name: Some(kind.name().to_string()),
            });
        }
        Ok(Self::build(kind, wires))
    }

    fn single(kind: ObservableKind, wire: impl Into<Wire>) -> Self {
        Self::build(kind, Wires::from(wire.into()))
    }

    fn build(kind: ObservableKind, wires: Wires) -> Self {
        let obs = Self {
            id: ObjectId::fresh(),
            kind,
            wires,
        };
        queue::register(|| QueuedObject::Observable(obs.clone()));
        obs
    }

    /// Identity observable.
    pub fn identity(wire: impl Into<Wire>) -> Self {
        Self::single(ObservableKind::Identity, wire)
    }

    /// Pauli-X observable.
    pub fn pauli_x(wire: impl Into<Wire>) -> Self {
        Self::single(ObservableKind::PauliX, wire)
    }

    /// Pauli-Y observable.
    pub fn pauli_y(wire: impl Into<Wire>) -> Self {
        Self::single(ObservableKind::PauliY, wire)
    }

    /// Pauli-Z observable.
    pub fn pauli_z(wire: impl Into<Wire>) -> Self {
        Self::single(ObservableKind::PauliZ, wire)
    }

    /// Hadamard observable.
    pub fn hadamard(wire: impl Into<Wire>) -> Self {
        Self::single(ObservableKind::Hadamard, wire)
    }

    /// Number operator.
    pub fn number_operator(wire: impl Into<Wire>) -> Self {
        Self::single(ObservableKind::NumberOperator, wire)
    }

    /// Hermitian matrix observable.
    pub fn hermitian(matrix: HermitianMatrix, wires: impl Into<Wires>) -> TapeResult<Self> {
        Self::new(ObservableKind::Hermitian(matrix), wires)
    }

    /// The observable kind.
    pub fn kind(&self) -> &ObservableKind {
        &self.kind
    }

    /// Replace the matrix of a Hermitian observable.
    ///
    /// The new matrix must act on the same number of wires.
    pub fn set_matrix(&mut self, matrix: HermitianMatrix) -> TapeResult<()> {
        match &mut self.kind {
            ObservableKind::Hermitian(current) if current.dim() == matrix.dim() => {
                *current = matrix;
                Ok(())
            }
            ObservableKind::Hermitian(current) => Err(TapeError::InvalidMatrix(format!(
                "expected a {0}x{0} matrix, got {1}x{1}",
                current.dim(),
                matrix.dim()
            ))),
            other => Err(TapeError::InvalidMatrix(format!(
                "{} has no matrix data",
                other.name()
            ))),
        }
    }

    /// Tensor product with another observable.
    pub fn tensor(self, other: impl Into<Observable>) -> Tensor {
        Tensor::new([Observable::Primitive(self), other.into()])
    }

    fn gate_on_wire(&self, gate: Gate) -> TapeResult<Operation> {
        Operation::new(gate, self.wires.clone())
    }
}

impl Queueable for PrimitiveObservable {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn name(&self) -> &str {
        self.kind.name()
    }

    fn wires(&self) -> &Wires {
        &self.wires
    }

    fn parameters(&self) -> Vec<f64> {
        match &self.kind {
            ObservableKind::Hermitian(m) => m.data.iter().flat_map(|c| [c.re, c.im]).collect(),
            _ => vec![],
        }
    }

    fn to_queued(&self) -> QueuedObject {
        QueuedObject::Observable(self.clone())
    }
}

impl ObservableOps for PrimitiveObservable {
    fn eigvals(&self) -> Option<Vec<f64>> {
        match &self.kind {
            ObservableKind::Identity => Some(vec![1.0, 1.0]),
            ObservableKind::PauliX
            | ObservableKind::PauliY
            | ObservableKind::PauliZ
            | ObservableKind::Hadamard => Some(vec![1.0, -1.0]),
            ObservableKind::Hermitian(m) => Some(m.eigh().eigvals),
            ObservableKind::NumberOperator => None,
        }
    }

    fn diagonalizing_gates(&self) -> TapeResult<Vec<Operation>> {
        Ok(self.diagonalize()?.0)
    }

    fn diagonalize(&self) -> TapeResult<(Vec<Operation>, Option<Vec<f64>>)> {
        let gates = match &self.kind {
            ObservableKind::Identity | ObservableKind::PauliZ | ObservableKind::NumberOperator => {
                vec![]
            }
            ObservableKind::PauliX => vec![self.gate_on_wire(Gate::H)?],
            ObservableKind::PauliY => vec![
                self.gate_on_wire(Gate::Z)?,
                self.gate_on_wire(Gate::S)?,
                self.gate_on_wire(Gate::H)?,
            ],
            ObservableKind::Hadamard => vec![self.gate_on_wire(Gate::Ry(-FRAC_PI_4))?],
            ObservableKind::Hermitian(m) => {
                let eigh = m.eigh();
                let u = UnitaryMatrix::new(eigh.diagonalizing_unitary())?;
                let op = Operation::qubit_unitary(u, self.wires.clone())?;
                return Ok((vec![op], Some(eigh.eigvals)));
            }
        };
        Ok((gates, self.eigvals()))
    }
}

// =============================================================================
// Tensor products
// =============================================================================

/// An ordered tensor product of elementary observables.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    id: ObjectId,
    factors: Vec<PrimitiveObservable>,
    wires: Wires,
}

impl Tensor {
    /// Build a tensor product; nested tensors are flattened.
    ///
    /// Inside a session the tensor is recorded after its factors and owns
    /// them. A flattened tensor gives up its factors and is left unowned.
    ///
    /// Factors may share wires here; measuring such a tensor fails with
    /// [`TapeError::DuplicateWire`](crate::error::TapeError::DuplicateWire).
    pub fn new(factors: impl IntoIterator<Item = Observable>) -> Self {
        let factors: Vec<PrimitiveObservable> = factors.into_iter().flat_map(absorb).collect();
        let tensor = Self {
            id: ObjectId::fresh(),
            wires: factor_wires(&factors),
            factors,
        };
        queue::register(|| QueuedObject::Tensor(tensor.clone()));
        queue::link(tensor.id, &tensor.factor_ids());
        tensor
    }

    /// Append another observable, keeping this tensor's identity.
    pub fn tensor(mut self, other: impl Into<Observable>) -> Self {
        self.factors.extend(absorb(other.into()));
        self.wires = factor_wires(&self.factors);
        queue::refresh(|| QueuedObject::Tensor(self.clone()));
        queue::link(self.id, &self.factor_ids());
        self
    }

    /// Factors in order.
    pub fn factors(&self) -> &[PrimitiveObservable] {
        &self.factors
    }

    /// Mutable access to the factors.
    pub fn factors_mut(&mut self) -> &mut [PrimitiveObservable] {
        &mut self.factors
    }

    fn factor_ids(&self) -> Vec<ObjectId> {
        self.factors.iter().map(Queueable::id).collect()
    }
}

/// Take the factors of `obs`, releasing them from a tensor that owned them.
fn absorb(obs: Observable) -> Vec<PrimitiveObservable> {
    if let Observable::Tensor(t) = &obs {
        queue::disown(t.id);
    }
    obs.into_factors()
}

fn factor_wires(factors: &[PrimitiveObservable]) -> Wires {
    Wires::union(factors.iter().map(|f| &f.wires))
}

impl Queueable for Tensor {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn name(&self) -> &str {
        "Tensor"
    }

    fn wires(&self) -> &Wires {
        &self.wires
    }

    fn parameters(&self) -> Vec<f64> {
        self.factors.iter().flat_map(Queueable::parameters).collect()
    }

    fn to_queued(&self) -> QueuedObject {
        QueuedObject::Tensor(self.clone())
    }
}

impl ObservableOps for Tensor {
    fn eigvals(&self) -> Option<Vec<f64>> {
        self.factors
            .iter()
            .try_fold(vec![1.0], |acc, f| Some(linalg::kron(&acc, &f.eigvals()?)))
    }

    fn diagonalizing_gates(&self) -> TapeResult<Vec<Operation>> {
        Ok(self.diagonalize()?.0)
    }

    fn diagonalize(&self) -> TapeResult<(Vec<Operation>, Option<Vec<f64>>)> {
        let mut gates = vec![];
        let mut eigvals = Some(vec![1.0]);
        for factor in &self.factors {
            let (g, e) = factor.diagonalize()?;
            gates.extend(g);
            eigvals = match (eigvals, e) {
                (Some(acc), Some(e)) => Some(linalg::kron(&acc, &e)),
                _ => None,
            };
        }
        Ok((gates, eigvals))
    }
}

// =============================================================================
// Observable union
// =============================================================================

/// Either an elementary observable or a tensor product.
#[derive(Debug, Clone, PartialEq)]
pub enum Observable {
    /// Elementary observable.
    Primitive(PrimitiveObservable),
    /// Tensor product.
    Tensor(Tensor),
}

impl Observable {
    fn inner(&self) -> &dyn ObservableOps {
        match self {
            Observable::Primitive(o) => o,
            Observable::Tensor(t) => t,
        }
    }

    /// True for tensor products.
    pub fn is_tensor(&self) -> bool {
        matches!(self, Observable::Tensor(_))
    }

    /// The elementary observable, if this is one.
    pub fn as_primitive(&self) -> Option<&PrimitiveObservable> {
        match self {
            Observable::Primitive(o) => Some(o),
            Observable::Tensor(_) => None,
        }
    }

    /// Mutable access to the elementary observable.
    pub fn as_primitive_mut(&mut self) -> Option<&mut PrimitiveObservable> {
        match self {
            Observable::Primitive(o) => Some(o),
            Observable::Tensor(_) => None,
        }
    }

    /// The tensor product, if this is one.
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Observable::Tensor(t) => Some(t),
            Observable::Primitive(_) => None,
        }
    }

    /// True if both observables have the same factors on the same wires,
    /// regardless of identity. Such observables share diagonalizing gates.
    pub fn same_basis(&self, other: &Observable) -> bool {
        let same = |x: &PrimitiveObservable, y: &PrimitiveObservable| {
            x.kind == y.kind && x.wires == y.wires
        };
        match (self, other) {
            (Observable::Primitive(a), Observable::Primitive(b)) => same(a, b),
            (Observable::Tensor(a), Observable::Tensor(b)) => {
                a.factors.len() == b.factors.len()
                    && a.factors.iter().zip(&b.factors).all(|(x, y)| same(x, y))
            }
            _ => false,
        }
    }

    /// Elementary factors (a single one for a primitive observable).
    pub fn into_factors(self) -> Vec<PrimitiveObservable> {
        match self {
            Observable::Primitive(o) => vec![o],
            Observable::Tensor(t) => t.factors,
        }
    }

    /// Tensor product with another observable.
    pub fn tensor(self, other: impl Into<Observable>) -> Tensor {
        match self {
            Observable::Tensor(t) => t.tensor(other),
            Observable::Primitive(o) => o.tensor(other),
        }
    }
}

impl From<PrimitiveObservable> for Observable {
    fn from(o: PrimitiveObservable) -> Self {
        Observable::Primitive(o)
    }
}

impl From<Tensor> for Observable {
    fn from(t: Tensor) -> Self {
        Observable::Tensor(t)
    }
}

impl Queueable for Observable {
    fn id(&self) -> ObjectId {
        self.inner().id()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn wires(&self) -> &Wires {
        self.inner().wires()
    }

    fn parameters(&self) -> Vec<f64> {
        self.inner().parameters()
    }

    fn to_queued(&self) -> QueuedObject {
        self.inner().to_queued()
    }
}

impl ObservableOps for Observable {
    fn eigvals(&self) -> Option<Vec<f64>> {
        self.inner().eigvals()
    }

    fn diagonalizing_gates(&self) -> TapeResult<Vec<Operation>> {
        self.inner().diagonalizing_gates()
    }

    fn diagonalize(&self) -> TapeResult<(Vec<Operation>, Option<Vec<f64>>)> {
        self.inner().diagonalize()
    }
}

/// Conversion into an observable for the statistics functions.
pub trait IntoObservable {
    /// Convert, failing if the value is not a valid observable.
    fn into_observable(self) -> TapeResult<Observable>;
}

impl IntoObservable for Observable {
    fn into_observable(self) -> TapeResult<Observable> {
        Ok(self)
    }
}

impl IntoObservable for PrimitiveObservable {
    fn into_observable(self) -> TapeResult<Observable> {
        Ok(Observable::Primitive(self))
    }
}

impl IntoObservable for Tensor {
    fn into_observable(self) -> TapeResult<Observable> {
        Ok(Observable::Tensor(self))
    }
}

/// Gates that double as observables keep their identity, so the recorded
/// operation becomes owned by the measurement.
impl IntoObservable for Operation {
    fn into_observable(self) -> TapeResult<Observable> {
        let (id, gate, wires) = self.into_parts();
        let kind = ObservableKind::from_gate(&gate)
            .ok_or_else(|| TapeError::NotAnObservable(gate.name().to_string()))?;
        Ok(Observable::Primitive(PrimitiveObservable { id, kind, wires }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::queue::AnnotatedQueue;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_pauli_eigvals() {
        assert_eq!(PrimitiveObservable::pauli_x(0).eigvals(), Some(vec![1.0, -1.0]));
        assert_eq!(PrimitiveObservable::identity(0).eigvals(), Some(vec![1.0, 1.0]));
        assert_eq!(PrimitiveObservable::number_operator(0).eigvals(), None);
    }

    #[test]
    fn test_pauli_y_diagonalizing_gates() {
        let gates = PrimitiveObservable::pauli_y(3).diagonalizing_gates().unwrap();
        let names: Vec<_> = gates.iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["PauliZ", "S", "Hadamard"]);
        assert!(gates.iter().all(|g| g.wires() == &Wires::from([3])));
    }

    #[test]
    fn test_hadamard_diagonalizing_gate() {
        let gates = PrimitiveObservable::hadamard(0).diagonalizing_gates().unwrap();
        assert_eq!(gates.len(), 1);
        assert_eq!(gates[0].gate(), &Gate::Ry(-FRAC_PI_4));
    }

    #[test]
    fn test_hermitian_validation() {
        assert!(matches!(
            HermitianMatrix::from_real_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]),
            Err(TapeError::NotHermitian { .. })
        ));
        let m = HermitianMatrix::diag(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(matches!(
            PrimitiveObservable::hermitian(m, [0]),
            Err(TapeError::WireCountMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_set_matrix_changes_eigvals() {
        let m = HermitianMatrix::diag(&[1.0, 2.0]).unwrap();
        let mut obs = PrimitiveObservable::hermitian(m, ["a"]).unwrap();
        obs.set_matrix(HermitianMatrix::diag(&[7.0, 5.0]).unwrap())
            .unwrap();
        let e = obs.eigvals().unwrap();
        assert!((e[0] - 5.0).abs() < TOL && (e[1] - 7.0).abs() < TOL);

        let wrong = HermitianMatrix::diag(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(obs.set_matrix(wrong).is_err());
        assert!(PrimitiveObservable::pauli_z(0)
            .set_matrix(HermitianMatrix::diag(&[1.0, 2.0]).unwrap())
            .is_err());
    }

    #[test]
    fn test_tensor_flattens_and_combines() {
        let t = PrimitiveObservable::pauli_x(0)
            .tensor(PrimitiveObservable::pauli_z(2))
            .tensor(PrimitiveObservable::pauli_y(1));
        assert_eq!(t.factors().len(), 3);
        assert_eq!(t.wires(), &Wires::from([0, 2, 1]));
        assert_eq!(t.eigvals().unwrap().len(), 8);
    }

    #[test]
    fn test_flattened_tensor_releases_factors() {
        let session = AnnotatedQueue::begin();
        let inner = PrimitiveObservable::pauli_x(0).tensor(PrimitiveObservable::pauli_z(1));
        let outer = Tensor::new([
            Observable::from(inner.clone()),
            Observable::from(PrimitiveObservable::pauli_y(2)),
        ]);
        let queue = session.end();

        assert!(queue.get_annotation(inner.id()).is_empty());
        let owns = queue.get_annotation(outer.id()).owns;
        assert_eq!(owns.len(), 3);
        for id in owns {
            assert_eq!(queue.get_annotation(id).owner, Some(outer.id()));
        }
    }

    #[test]
    fn test_observable_gates() {
        assert_eq!(
            ObservableKind::from_gate(&Gate::H),
            Some(ObservableKind::Hadamard)
        );
        assert_eq!(ObservableKind::from_gate(&Gate::I), Some(ObservableKind::Identity));
        assert_eq!(ObservableKind::from_gate(&Gate::CX), None);
        assert_eq!(ObservableKind::from_gate(&Gate::S), None);
    }

    #[test]
    fn test_tensor_without_eigvals() {
        let t = PrimitiveObservable::pauli_x(0).tensor(PrimitiveObservable::number_operator(1));
        assert_eq!(t.eigvals(), None);
    }

    #[test]
    fn test_operation_into_observable() {
        let op = Operation::x(0);
        let id = op.id();
        let obs = op.into_observable().unwrap();
        assert_eq!(obs.id(), id);
        assert_eq!(obs.name(), "PauliX");

        let err = Operation::cnot(0, 1).unwrap().into_observable().unwrap_err();
        assert_eq!(err.to_string(), "CNOT is not an observable");
    }
}
