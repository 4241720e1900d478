//! Device capability descriptors.
//!
//! [`Capabilities`] describe which tapes a device can consume directly:
//! how many wires it has, whether it can return the full state, and which
//! observables it measures natively. Everything else must be expanded into
//! computational-basis measurements before execution.

use serde::{Deserialize, Serialize};

use qtape_ir::{ObservableKind, PrimitiveObservable};

/// Capabilities of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the device.
    pub name: String,
    /// Number of wires available. `None` means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_wires: Option<usize>,
    /// Whether a state measurement can be returned.
    pub returns_state: bool,
    /// Whether tensor-product observables are measured natively.
    pub supports_tensor_observables: bool,
    /// Observable kind tags measured natively (`"PauliZ"`, `"Hermitian"`, ...).
    #[serde(default)]
    pub supported_observables: Vec<String>,
}

impl Capabilities {
    /// A state-vector simulator: returns the state and measures every qubit
    /// observable natively.
    pub fn statevector(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_wires: None,
            returns_state: true,
            supports_tensor_observables: true,
            supported_observables: [
                "Identity",
                "PauliX",
                "PauliY",
                "PauliZ",
                "Hadamard",
                "Hermitian",
            ]
            .map(String::from)
            .into(),
        }
    }

    /// A sampling device: only computational-basis measurements, no state.
    pub fn sampling(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_wires: None,
            returns_state: false,
            supports_tensor_observables: true,
            supported_observables: ["Identity", "PauliZ"].map(String::from).into(),
        }
    }

    /// Limit the number of wires.
    pub fn with_num_wires(mut self, num_wires: usize) -> Self {
        self.num_wires = Some(num_wires);
        self
    }

    /// Set whether the state can be returned.
    pub fn with_returns_state(mut self, returns_state: bool) -> Self {
        self.returns_state = returns_state;
        self
    }

    /// Set whether tensor observables are measured natively.
    pub fn with_tensor_observables(mut self, supported: bool) -> Self {
        self.supports_tensor_observables = supported;
        self
    }

    /// Replace the natively supported observables.
    pub fn with_observables<S: Into<String>>(
        mut self,
        observables: impl IntoIterator<Item = S>,
    ) -> Self {
        self.supported_observables = observables.into_iter().map(Into::into).collect();
        self
    }

    /// Check if an observable kind is measured natively.
    pub fn supports(&self, kind: &ObservableKind) -> bool {
        self.supported_observables.iter().any(|s| s == kind.name())
    }

    /// Check if every factor is measured natively.
    pub fn supports_all<'a>(
        &self,
        factors: impl IntoIterator<Item = &'a PrimitiveObservable>,
    ) -> bool {
        factors.into_iter().all(|f| self.supports(f.kind()))
    }
}
