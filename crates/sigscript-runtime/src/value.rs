use pyo3::prelude::*;

use crate::error::BridgeError;
use crate::marshal::py_to_json;

/// A value returned by the user function, still owned by the interpreter.
///
/// The bridge does not interpret results; hosts convert them as they see
/// fit, either directly through [`ScriptValue::bind`] or via
/// [`ScriptValue::to_json`].
pub struct ScriptValue {
    inner: Py<PyAny>,
}

impl ScriptValue {
    pub(crate) fn new(inner: Py<PyAny>) -> Self {
        Self { inner }
    }

    pub fn bind<'py>(&self, py: Python<'py>) -> &Bound<'py, PyAny> {
        self.inner.bind(py)
    }

    /// JSON rendition: arrays become lists, complex numbers `[re, im]` pairs.
    pub fn to_json(&self) -> Result<serde_json::Value, BridgeError> {
        Python::attach(|py| {
            py_to_json(self.inner.bind(py)).map_err(|e| BridgeError::Conversion(e.to_string()))
        })
    }

    pub fn repr(&self) -> String {
        Python::attach(|py| match self.inner.bind(py).repr() {
            Ok(s) => s.to_string(),
            Err(e) => format!("<unrepresentable: {e}>"),
        })
    }

    pub fn into_inner(self) -> Py<PyAny> {
        self.inner
    }
}

impl std::fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ScriptValue").field(&self.repr()).finish()
    }
}
