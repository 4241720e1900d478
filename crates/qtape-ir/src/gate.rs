//! Elementary gate catalogue.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{TapeError, TapeResult};

/// Elementary instructions known to the tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Arbitrary rotation Rot(φ, θ, ω) = RZ(ω) · RY(θ) · RZ(φ).
    Rot(f64, f64, f64),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,

    /// Arbitrary unitary given as a row-major `2^n × 2^n` matrix.
    QubitUnitary(UnitaryMatrix),
}

impl Gate {
    /// Kind tag of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::I => "Identity",
            Gate::X => "PauliX",
            Gate::Y => "PauliY",
            Gate::Z => "PauliZ",
            Gate::H => "Hadamard",
            Gate::S => "S",
            Gate::Sdg => "Sdg",
            Gate::T => "T",
            Gate::Tdg => "Tdg",
            Gate::Rx(_) => "RX",
            Gate::Ry(_) => "RY",
            Gate::Rz(_) => "RZ",
            Gate::Rot(_, _, _) => "Rot",
            Gate::CX => "CNOT",
            Gate::CZ => "CZ",
            Gate::Swap => "SWAP",
            Gate::QubitUnitary(_) => "QubitUnitary",
        }
    }

    /// Number of wires this gate acts on.
    #[inline]
    pub fn num_wires(&self) -> usize {
        match self {
            Gate::I
            | Gate::X
            | Gate::Y
            | Gate::Z
            | Gate::H
            | Gate::S
            | Gate::Sdg
            | Gate::T
            | Gate::Tdg
            | Gate::Rx(_)
            | Gate::Ry(_)
            | Gate::Rz(_)
            | Gate::Rot(_, _, _) => 1,

            Gate::CX | Gate::CZ | Gate::Swap => 2,

            Gate::QubitUnitary(u) => u.num_wires(),
        }
    }

    /// Numeric parameters of this gate.
    ///
    /// For `QubitUnitary` these are the real and imaginary parts of the
    /// matrix, interleaved in row-major order.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Gate::Rx(p) | Gate::Ry(p) | Gate::Rz(p) => vec![*p],
            Gate::Rot(phi, theta, omega) => vec![*phi, *theta, *omega],
            Gate::QubitUnitary(u) => u.data.iter().flat_map(|c| [c.re, c.im]).collect(),
            _ => vec![],
        }
    }
}

/// A square complex matrix acting on `n` wires, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitaryMatrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl UnitaryMatrix {
    /// Wrap a row-major matrix.
    ///
    /// The length must be `dim²` with `dim` a power of two.
    pub fn new(data: Vec<Complex64>) -> TapeResult<Self> {
        let dim = square_dim(data.len())?;
        Ok(Self { dim, data })
    }

    /// Build from row vectors.
    pub fn from_rows(rows: &[Vec<Complex64>]) -> TapeResult<Self> {
        let dim = rows.len();
        if rows.iter().any(|r| r.len() != dim) {
            return Err(TapeError::InvalidMatrix(format!(
                "expected {dim} columns in every row"
            )));
        }
        Self::new(rows.concat())
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
}

/// Validate a row-major buffer length and return the matrix dimension.
pub(crate) fn square_dim(len: usize) -> TapeResult<usize> {
    let dim = (len as f64).sqrt().round() as usize;
    if dim == 0 || dim * dim != len {
        return Err(TapeError::InvalidMatrix(format!(
            "{len} entries do not form a square matrix"
        )));
    }
    if !dim.is_power_of_two() || dim < 2 {
        return Err(TapeError::InvalidMatrix(format!(
            "dimension {dim} does not match any number of wires"
        )));
    }
    Ok(dim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_gate_properties() {
        assert_eq!(Gate::H.num_wires(), 1);
        assert_eq!(Gate::CX.num_wires(), 2);
        assert_eq!(Gate::CX.name(), "CNOT");
        assert_eq!(Gate::Rot(0.1, 0.2, 0.3).parameters(), vec![0.1, 0.2, 0.3]);
        assert!(Gate::Ry(PI).parameters().len() == 1);
        assert!(Gate::H.parameters().is_empty());
    }

    #[test]
    fn test_unitary_matrix_shape() {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let u = UnitaryMatrix::new(vec![one, zero, zero, one]).unwrap();
        assert_eq!(u.dim(), 2);
        assert_eq!(u.num_wires(), 1);
        assert_eq!(Gate::QubitUnitary(u).num_wires(), 1);

        assert!(UnitaryMatrix::new(vec![one; 3]).is_err());
        assert!(UnitaryMatrix::new(vec![one; 9]).is_err());
        assert!(UnitaryMatrix::from_rows(&[vec![one, zero], vec![one]]).is_err());
    }
}
