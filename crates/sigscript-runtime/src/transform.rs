use numpy::PyArray1;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::namespace::Namespace;

/// Whether the user function receives time-domain samples or their spectrum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    Signal,
    Spectrum,
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Domain::Signal => write!(f, "signal"),
            Domain::Spectrum => write!(f, "spectrum"),
        }
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signal" => Ok(Domain::Signal),
            "spectrum" => Ok(Domain::Spectrum),
            other => Err(format!("unknown domain '{other}' (expected signal or spectrum)")),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub domain: Domain,
    /// Taper the block with a Hann window before the spectrum is taken.
    /// Ignored in the signal domain.
    pub apply_window: bool,
}

impl TransformOptions {
    pub fn signal() -> Self {
        Self {
            domain: Domain::Signal,
            apply_window: false,
        }
    }

    pub fn spectrum(apply_window: bool) -> Self {
        Self {
            domain: Domain::Spectrum,
            apply_window,
        }
    }
}

/// Copy `buffer` into a fresh `float32` array owned by the interpreter.
pub fn to_array<'py>(
    py: Python<'py>,
    namespace: &Namespace,
    buffer: &[f32],
) -> Result<Bound<'py, PyAny>, BridgeError> {
    let copied = PyArray1::from_slice(py, buffer);
    namespace
        .helpers()
        .asarray
        .bind(py)
        .call1((copied, "float32"))
        .map_err(|e| BridgeError::Conversion(e.to_string()))
}

/// `buffer` multiplied element-wise by a Hann window of the same length.
pub fn apply_window<'py>(
    py: Python<'py>,
    namespace: &Namespace,
    buffer: &[f32],
) -> Result<Bound<'py, PyAny>, BridgeError> {
    let array = to_array(py, namespace, buffer)?;
    namespace
        .helpers()
        .apply_window
        .bind(py)
        .call1((array,))
        .map_err(|e| BridgeError::Transform(e.to_string()))
}

/// Real-input DFT of `buffer`: `len / 2 + 1` complex bins.
pub fn compute_spectrum<'py>(
    py: Python<'py>,
    namespace: &Namespace,
    buffer: &[f32],
    apply_window: bool,
) -> Result<Bound<'py, PyAny>, BridgeError> {
    let array = to_array(py, namespace, buffer)?;
    namespace
        .helpers()
        .compute_spectrum
        .bind(py)
        .call1((array, apply_window))
        .map_err(|e| BridgeError::Transform(e.to_string()))
}

/// Produce the positional data argument for the user function.
pub fn transform_signal<'py>(
    py: Python<'py>,
    namespace: &Namespace,
    buffer: &[f32],
    options: TransformOptions,
) -> Result<Bound<'py, PyAny>, BridgeError> {
    tracing::debug!(
        samples = buffer.len(),
        domain = %options.domain,
        window = options.apply_window,
        "Transforming signal"
    );
    match options.domain {
        Domain::Signal => to_array(py, namespace, buffer),
        Domain::Spectrum => compute_spectrum(py, namespace, buffer, options.apply_window),
    }
}
