//! The device trait and a configurable reference device.
//!
//! # Lifecycle
//!
//! ```text
//!   capabilities() ──→ check_validity() ──→ prepare()
//! ```
//!
//! Tapes are built without knowledge of any device. Capability errors are
//! raised when a tape is handed to a device, never during recording.

use tracing::{debug, instrument};

use qtape_ir::{MeasurementProcess, Observable, Queueable, ReturnType, Tape};

use crate::capability::Capabilities;
use crate::error::{CapabilityError, DeviceResult};

/// A consumer of tapes.
///
/// # Contract
///
/// - `capabilities()` is infallible and returns a cached descriptor.
/// - `check_validity()` rejects tapes that need anything the capabilities
///   do not declare.
/// - `prepare()` expands what can be expanded and validates the result.
pub trait Device {
    /// Get the capabilities of this device.
    fn capabilities(&self) -> &Capabilities;

    /// Get the name of this device.
    fn name(&self) -> &str {
        &self.capabilities().name
    }

    /// Check a tape against the device capabilities without changing it.
    fn check_validity(&self, tape: &Tape) -> DeviceResult<()> {
        let caps = self.capabilities();

        if let Some(available) = caps.num_wires {
            let required = tape.num_wires();
            if required > available {
                return Err(CapabilityError::TooManyWires {
                    required,
                    available,
                    device: caps.name.clone(),
                }
                .into());
            }
        }

        for m in tape.measurements() {
            if m.return_type() == ReturnType::State && !caps.returns_state {
                return Err(CapabilityError::StateNotSupported.into());
            }
            match m.observable() {
                Some(Observable::Tensor(t)) => {
                    if !caps.supports_tensor_observables {
                        return Err(
                            CapabilityError::TensorObservablesNotSupported(caps.name.clone()).into(),
                        );
                    }
                    for f in t.factors() {
                        check_observable(caps, f.name())?;
                    }
                }
                Some(obs) => check_observable(caps, obs.name())?,
                None => {}
            }
        }
        Ok(())
    }

    /// Check if a measurement must be expanded before this device can run it.
    fn expand_needed(&self, m: &MeasurementProcess) -> bool {
        let caps = self.capabilities();
        match m.observable() {
            Some(Observable::Tensor(t)) => {
                !caps.supports_tensor_observables || !caps.supports_all(t.factors())
            }
            Some(Observable::Primitive(o)) => !caps.supports(o.kind()),
            None => false,
        }
    }

    /// Produce the tape this device would execute.
    ///
    /// Measurements of unsupported observables are expanded into basis
    /// rotations followed by computational-basis measurements.
    #[instrument(level = "debug", skip_all, fields(device = %self.name()))]
    fn prepare(&self, tape: &Tape) -> DeviceResult<Tape> {
        let expanded = if tape.measurements().iter().any(|m| self.expand_needed(m)) {
            tape.expand_where(|m| self.expand_needed(m))?
        } else {
            tape.clone()
        };
        self.check_validity(&expanded)?;
        debug!(
            operations = expanded.operations().len(),
            measurements = expanded.measurements().len(),
            "Prepared tape"
        );
        Ok(expanded)
    }
}

fn check_observable(caps: &Capabilities, name: &str) -> Result<(), CapabilityError> {
    if caps.supported_observables.iter().any(|s| s == name) {
        Ok(())
    } else {
        Err(CapabilityError::UnsupportedObservable {
            observable: name.to_string(),
            device: caps.name.clone(),
        })
    }
}

/// A device defined entirely by its capabilities.
#[derive(Debug, Clone)]
pub struct ReferenceDevice {
    capabilities: Capabilities,
}

impl ReferenceDevice {
    /// Create a device with the given capabilities.
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// A state-vector device with `num_wires` wires.
    pub fn statevector(num_wires: usize) -> Self {
        Self::new(Capabilities::statevector("reference.statevector").with_num_wires(num_wires))
    }

    /// A sampling device with `num_wires` wires.
    pub fn sampling(num_wires: usize) -> Self {
        Self::new(Capabilities::sampling("reference.sampling").with_num_wires(num_wires))
    }
}

impl Device for ReferenceDevice {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use qtape_ir::prelude::*;

    fn tape_with(f: impl FnOnce() -> TapeResult<()>) -> Tape {
        Tape::record(f).unwrap()
    }

    #[test]
    fn test_state_not_supported() {
        let tape = tape_with(|| {
            Operation::h(0);
            state();
            Ok(())
        });
        let err = ReferenceDevice::sampling(2).prepare(&tape).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Capability(CapabilityError::StateNotSupported)
        ));
        assert_eq!(
            err.to_string(),
            "The current device is not capable of returning the state"
        );
        assert!(ReferenceDevice::statevector(2).prepare(&tape).is_ok());
    }

    #[test]
    fn test_too_many_wires() {
        let tape = tape_with(|| {
            Operation::cnot(0, 1)?;
            Operation::cnot(1, 2)?;
            Ok(())
        });
        let err = ReferenceDevice::statevector(2).check_validity(&tape).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Capability(CapabilityError::TooManyWires { required: 3, available: 2, .. })
        ));
    }

    #[test]
    fn test_expand_needed() {
        let device = ReferenceDevice::sampling(2);
        assert!(device.expand_needed(&expval(PrimitiveObservable::pauli_x(0)).unwrap()));
        assert!(!device.expand_needed(&expval(PrimitiveObservable::pauli_z(0)).unwrap()));
        assert!(!device.expand_needed(&probs([0]).unwrap()));

        let z_only = PrimitiveObservable::pauli_z(0).tensor(PrimitiveObservable::pauli_z(1));
        assert!(!device.expand_needed(&expval(z_only.clone()).unwrap()));

        let no_tensor = ReferenceDevice::new(
            Capabilities::sampling("flat").with_tensor_observables(false),
        );
        assert!(no_tensor.expand_needed(&expval(z_only).unwrap()));
    }

    #[test]
    fn test_prepare_expands_unsupported() {
        let tape = tape_with(|| {
            Operation::h(0);
            expval(PrimitiveObservable::pauli_x(0))?;
            expval(PrimitiveObservable::pauli_z(1))?;
            Ok(())
        });
        let prepared = ReferenceDevice::sampling(2).prepare(&tape).unwrap();
        assert_eq!(prepared.operations().len(), 2);
        assert!(prepared.measurements()[0].observable().is_none());
        assert!(prepared.measurements()[1].observable().is_some());
    }

    #[test]
    fn test_check_validity_rejects_unsupported_observable() {
        let tape = tape_with(|| {
            expval(PrimitiveObservable::hadamard(0))?;
            Ok(())
        });
        let err = ReferenceDevice::sampling(1).check_validity(&tape).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Observable Hadamard not supported on device 'reference.sampling'"
        );
    }
}
