//! Reusable circuit layouts.
//!
//! Templates only construct operations, so inside a session they are
//! recorded like hand-written gates.

use crate::error::{TapeError, TapeResult};
use crate::operation::Operation;
use crate::wires::Wires;

/// Circuit-centric classifier: one [`circuit_centric_classifier_block`] per
/// entry of `weights`.
///
/// `ranges[b]` is the CNOT range of block `b`; `None` uses range 1 for
/// every block.
pub fn circuit_centric_classifier(
    weights: &[Vec<[f64; 3]>],
    periodic: bool,
    ranges: Option<&[usize]>,
    wires: &Wires,
) -> TapeResult<Vec<Operation>> {
    if let Some(ranges) = ranges {
        if ranges.len() != weights.len() {
            return Err(TapeError::InvalidWeights(format!(
                "{} blocks of weights but {} ranges",
                weights.len(),
                ranges.len()
            )));
        }
    }

    let mut ops = vec![];
    for (b, block) in weights.iter().enumerate() {
        let r = ranges.map_or(1, |r| r[b]);
        ops.extend(circuit_centric_classifier_block(block, periodic, r, wires)?);
    }
    Ok(ops)
}

/// One classifier block: a `Rot` on every wire followed by a ring of CNOTs
/// from `wires[i]` to `wires[(i + r) % n]`.
///
/// Without `periodic` the last wire does not wrap around. A range that is
/// a multiple of the wire count targets the control itself and fails with
/// [`TapeError::DuplicateWire`].
pub fn circuit_centric_classifier_block(
    weights: &[[f64; 3]],
    periodic: bool,
    r: usize,
    wires: &Wires,
) -> TapeResult<Vec<Operation>> {
    let n = wires.len();
    if weights.len() != n {
        return Err(TapeError::InvalidWeights(format!(
            "expected {n} rows of 3 angles, got {}",
            weights.len()
        )));
    }

    let mut ops: Vec<Operation> = wires
        .iter()
        .zip(weights)
        .map(|(wire, &[phi, theta, omega])| Operation::rot(phi, theta, omega, wire))
        .collect();

    let pairs = if periodic { n } else { n.saturating_sub(1) };
    for i in 0..pairs {
        let control = &wires.as_slice()[i];
        let target = &wires.as_slice()[(i + r) % n];
        ops.push(Operation::cnot(control, target)?);
    }
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Queueable;
    use crate::tape::Tape;

    fn weights(n: usize) -> Vec<[f64; 3]> {
        (0..n).map(|i| [i as f64, 0.5, -0.5]).collect()
    }

    #[test]
    fn test_periodic_block() {
        let ops = circuit_centric_classifier_block(&weights(3), true, 1, &Wires::from([0, 1, 2]))
            .unwrap();
        let names: Vec<_> = ops.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["Rot", "Rot", "Rot", "CNOT", "CNOT", "CNOT"]);
        assert_eq!(ops[5].wires(), &Wires::from([2, 0]));
        assert_eq!(ops[1].parameters(), vec![1.0, 0.5, -0.5]);
    }

    #[test]
    fn test_open_block_with_range() {
        let ops = circuit_centric_classifier_block(
            &weights(4),
            false,
            2,
            &Wires::from(["a", "b", "c", "d"]),
        )
        .unwrap();
        assert_eq!(ops.len(), 7);
        assert_eq!(ops[4].wires(), &Wires::from(["a", "c"]));
        assert_eq!(ops[6].wires(), &Wires::from(["c", "a"]));
    }

    #[test]
    fn test_bad_weight_shape() {
        let err = circuit_centric_classifier_block(&weights(2), true, 1, &Wires::from([0, 1, 2]))
            .unwrap_err();
        assert!(matches!(err, TapeError::InvalidWeights(_)));

        let err = circuit_centric_classifier(
            &[weights(2), weights(2)],
            true,
            Some(&[1]),
            &Wires::from([0, 1]),
        )
        .unwrap_err();
        assert!(matches!(err, TapeError::InvalidWeights(_)));
    }

    #[test]
    fn test_classifier_is_recorded() {
        let wires = Wires::from([0, 1]);
        let tape = Tape::record(|| {
            circuit_centric_classifier(&[weights(2), weights(2)], false, None, &wires)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(tape.operations().len(), 6);
        assert_eq!(tape.parameters().len(), 12);
    }
}
