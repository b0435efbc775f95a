use std::ffi::CString;

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::BridgeError;

/// Marker that user-selectable bindings must not start with.
pub const RESERVED_PREFIX: &str = "_";

/// Helper definitions loaded into every namespace before user code runs.
pub const HELPER_NAMES: [&str; 4] = [
    "_inspect_parameters",
    "_asarray",
    "_apply_window",
    "_compute_spectrum",
];

const BOOTSTRAP_SOURCE: &str = include_str!("bootstrap.py");

/// The bootstrap helpers.
///
/// The bootstrap script runs in a private scope and only the helper
/// functions are copied into the user-visible namespace, so a user script
/// rebinding a reserved name (or anything the helpers import) cannot change
/// what the bridge calls.
pub(crate) struct Helpers {
    scope: Py<PyDict>,
    pub inspect_parameters: Py<PyAny>,
    pub asarray: Py<PyAny>,
    pub apply_window: Py<PyAny>,
    pub compute_spectrum: Py<PyAny>,
    /// Out-of-band "no default / no annotation" marker.
    pub empty: Py<PyAny>,
}

/// One mutable global scope inside the embedded interpreter.
pub struct Namespace {
    globals: Py<PyDict>,
    helpers: Helpers,
}

impl Namespace {
    pub(crate) fn bootstrap<'py>(py: Python<'py>) -> Result<Self, BridgeError> {
        let scope = PyDict::new(py);
        let source = CString::new(BOOTSTRAP_SOURCE)
            .map_err(|e| BridgeError::SessionInit(format!("helper source: {e}")))?;
        py.run(&source, Some(&scope), None)
            .map_err(|e| BridgeError::SessionInit(format!("helper bootstrap failed: {e}")))?;

        let helper = |name: &str| -> Result<Bound<'py, PyAny>, BridgeError> {
            scope
                .get_item(name)
                .map_err(|e| BridgeError::SessionInit(e.to_string()))?
                .ok_or_else(|| BridgeError::SessionInit(format!("bootstrap did not define {name}")))
        };

        let globals = PyDict::new(py);
        for name in HELPER_NAMES {
            globals
                .set_item(name, helper(name)?)
                .map_err(|e| BridgeError::SessionInit(e.to_string()))?;
        }

        let helpers = Helpers {
            inspect_parameters: helper("_inspect_parameters")?.unbind(),
            asarray: helper("_asarray")?.unbind(),
            apply_window: helper("_apply_window")?.unbind(),
            compute_spectrum: helper("_compute_spectrum")?.unbind(),
            empty: helper("_EMPTY")?.unbind(),
            scope: scope.unbind(),
        };

        tracing::debug!(bindings = globals.len(), "Namespace bootstrapped");

        Ok(Self {
            globals: globals.unbind(),
            helpers,
        })
    }

    /// Execute source text with this namespace as its globals.
    pub fn run(&self, code: &str) -> Result<(), BridgeError> {
        let source = CString::new(code)
            .map_err(|_| BridgeError::Script("script contains a NUL byte".into()))?;
        Python::attach(|py| {
            py.run(&source, Some(self.globals.bind(py)), None)
                .map_err(|e| BridgeError::Script(e.to_string()))
        })
    }

    /// Names currently bound, in definition order.
    pub fn binding_names(&self) -> Vec<String> {
        Python::attach(|py| {
            self.globals
                .bind(py)
                .keys()
                .iter()
                .filter_map(|key| key.extract::<String>().ok())
                .collect()
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        Python::attach(|py| self.globals.bind(py).contains(name).unwrap_or(false))
    }

    pub(crate) fn globals<'py>(&self, py: Python<'py>) -> &Bound<'py, PyDict> {
        self.globals.bind(py)
    }

    pub(crate) fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    /// Drop every binding, user definitions and helpers alike.
    ///
    /// Functions hold a reference back to their defining dict through
    /// `__globals__`; clearing breaks that cycle so the interpreter can free
    /// them without waiting for its cycle collector.
    pub(crate) fn clear(&self) {
        Python::attach(|py| {
            self.globals.bind(py).clear();
            self.helpers.scope.bind(py).clear();
        });
    }
}

/// True when `name` is reserved for bridge internals.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}
