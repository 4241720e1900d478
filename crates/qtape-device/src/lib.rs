//! qtape Device Contract
//!
//! This crate describes what a tape consumer can do and turns recorded
//! tapes into tapes it can run.
//!
//! # Overview
//!
//! - [`Capabilities`] describe the device: wire count, state support, and
//!   the observables it measures natively
//! - The [`Device`] trait validates tapes and expands unsupported
//!   measurements into basis rotations
//! - [`ReferenceDevice`] is a device defined only by its capabilities
//!
//! # Example
//!
//! ```rust
//! use qtape_device::{Device, ReferenceDevice};
//! use qtape_ir::prelude::*;
//!
//! let tape = Tape::record(|| {
//!     Operation::h(0);
//!     expval(PrimitiveObservable::pauli_x(0))?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! // A sampling device only measures in the computational basis.
//! let prepared = ReferenceDevice::sampling(1).prepare(&tape).unwrap();
//! assert_eq!(prepared.operations().len(), 2);
//! assert!(prepared.observables().is_empty());
//! ```

pub mod capability;
pub mod device;
pub mod error;

pub use capability::Capabilities;
pub use device::{Device, ReferenceDevice};
pub use error::{CapabilityError, DeviceError, DeviceResult};
