//! Classifier tapes for demos.
//!
//! Each tape encodes input features with `Rx` rotations, applies a
//! circuit-centric classifier, and measures a Pauli tensor on the first two
//! wires plus a Hadamard observable on the last wire.

use anyhow::{Result, bail};
use qtape_ir::prelude::*;
use qtape_ir::templates::circuit_centric_classifier;

/// Deterministic classifier weights: `blocks` blocks of `n_wires` rows.
pub fn classifier_weights(n_wires: usize, blocks: usize) -> Vec<Vec<[f64; 3]>> {
    (0..blocks)
        .map(|b| {
            (0..n_wires)
                .map(|i| {
                    let phase = (b * n_wires + i) as f64;
                    [0.1 * phase, 0.5 - 0.05 * phase, -0.2]
                })
                .collect()
        })
        .collect()
}

/// Record a classifier tape.
///
/// # Arguments
/// * `n_wires` - Number of wires, at least 2
/// * `blocks` - Number of classifier blocks
/// * `data` - Input features, one per wire
pub fn classifier_tape(n_wires: usize, blocks: usize, data: &[f64]) -> Result<Tape> {
    if n_wires < 2 {
        bail!("classifier needs at least 2 wires, got {n_wires}");
    }
    if data.len() != n_wires {
        bail!("expected one feature per wire ({n_wires}), got {}", data.len());
    }
    let wires: Wires = (0..n_wires).collect();
    let weights = classifier_weights(n_wires, blocks);

    let tape = Tape::record(|| {
        for (wire, &x) in wires.iter().zip(data) {
            Operation::rx(x, wire);
        }
        circuit_centric_classifier(&weights, true, None, &wires)?;

        expval(PrimitiveObservable::pauli_x(0).tensor(PrimitiveObservable::pauli_y(1)))?;
        if n_wires > 2 {
            var(PrimitiveObservable::hadamard(n_wires - 1))?;
        }
        Ok(())
    })?;
    Ok(tape)
}
