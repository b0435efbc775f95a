use pyo3::prelude::*;

use crate::error::BridgeError;
use crate::loader::{self, ScriptCallable};
use crate::marshal::{Kwargs, kwargs_to_dict};
use crate::namespace::Namespace;
use crate::session::RuntimeSession;
use crate::signature::{self, FunctionSignature};
use crate::transform::{self, TransformOptions};
use crate::value::ScriptValue;

/// A user script loaded into its own namespace, with its entry point bound.
///
/// `FunctionExecutor` owns every interpreter object it creates. Dropping it
/// clears the namespace and releases the entry point. If the script defines
/// no usable function, [`FunctionExecutor::load`] fails and the caller has to
/// start over with different source text.
///
/// # Threading
///
/// All methods take the GIL for their whole duration; calls are serialized
/// by the interpreter. A user function that never returns blocks every other
/// caller of the same interpreter.
pub struct FunctionExecutor {
    code: String,
    namespace: Namespace,
    entry: ScriptCallable,
}

impl FunctionExecutor {
    /// Execute `code` in a fresh namespace and bind its entry point.
    pub fn load(session: &RuntimeSession, code: impl Into<String>) -> Result<Self, BridgeError> {
        let code = code.into();
        let namespace = session.namespace()?;

        tracing::debug!(bytes = code.len(), "Loading user script");
        let entry = match loader::load(&namespace, &code) {
            Ok(entry) => entry,
            Err(e) => {
                namespace.clear();
                tracing::debug!(error = %e, "User script rejected");
                return Err(e);
            }
        };

        tracing::info!(entry_point = %entry.binding, "User function loaded");
        Ok(Self {
            code,
            namespace,
            entry,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Name the entry point is bound to in the namespace.
    pub fn entry_point(&self) -> &str {
        &self.entry.binding
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Describe the entry point's parameters. Does not change any state.
    pub fn inspect(&self) -> Result<FunctionSignature, BridgeError> {
        signature::inspect(&self.namespace, &self.entry)
    }

    /// Call the entry point with the transformed `buffer` as its only
    /// positional argument and `kwargs` as keyword arguments.
    pub fn invoke(
        &self,
        buffer: &[f32],
        options: TransformOptions,
        kwargs: &Kwargs,
    ) -> Result<ScriptValue, BridgeError> {
        Python::attach(|py| -> Result<ScriptValue, BridgeError> {
            let data = transform::transform_signal(py, &self.namespace, buffer, options)?;
            let kwargs = kwargs_to_dict(py, kwargs)
                .map_err(|e| BridgeError::Conversion(format!("keyword arguments: {e}")))?;

            tracing::debug!(
                entry_point = %self.entry.binding,
                kwargs = kwargs.len(),
                "Invoking user function"
            );

            let result = self
                .entry
                .callable
                .bind(py)
                .call((data,), Some(&kwargs))
                .map_err(|e| BridgeError::Invocation(e.to_string()))?;

            Ok(ScriptValue::new(result.unbind()))
        })
    }
}

impl std::fmt::Debug for FunctionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionExecutor")
            .field("entry_point", &self.entry.binding)
            .field("code_bytes", &self.code.len())
            .finish()
    }
}

impl Drop for FunctionExecutor {
    fn drop(&mut self) {
        Python::attach(|py| {
            let entry = std::mem::replace(&mut self.entry.callable, py.None());
            drop(entry);
            self.namespace.clear();
        });
        tracing::debug!(entry_point = %self.entry.binding, "User function released");
    }
}
