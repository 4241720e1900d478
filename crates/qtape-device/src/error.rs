//! Error types for the device crate.

use thiserror::Error;

use qtape_ir::TapeError;

/// A tape asks for something the device cannot do.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CapabilityError {
    /// State measurement on a device that cannot return the state.
    #[error("The current device is not capable of returning the state")]
    StateNotSupported,

    /// Tensor observable on a device without native support.
    #[error("Tensor observables not supported on device '{0}'")]
    TensorObservablesNotSupported(String),

    /// Observable kind not measured natively.
    #[error("Observable {observable} not supported on device '{device}'")]
    UnsupportedObservable {
        /// Kind tag of the observable.
        observable: String,
        /// Name of the device.
        device: String,
    },

    /// Tape is wider than the device.
    #[error("Tape uses {required} wires but device '{device}' has {available}")]
    TooManyWires {
        /// Wires used by the tape.
        required: usize,
        /// Wires available on the device.
        available: usize,
        /// Name of the device.
        device: String,
    },
}

/// Errors that can occur while preparing a tape for a device.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeviceError {
    /// Tape construction or expansion failed.
    #[error(transparent)]
    Tape(#[from] TapeError),

    /// The device cannot run the tape.
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
