//! Embedded Python function bridge for sigscript.
//!
//! Loads user-supplied Python source into a fresh namespace of a
//! process-wide interpreter, picks the function to run, describes its
//! parameters and calls it on signal data, optionally moved to the
//! frequency domain first.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use sigscript_runtime::{FunctionExecutor, Kwargs, RuntimeSession, TransformOptions};
//!
//! # async fn run() -> Result<(), sigscript_runtime::BridgeError> {
//! let session = RuntimeSession::create().await?;
//!
//! let code = "def gain(signal, factor=1.0):\n    return signal * factor\n";
//! let executor = FunctionExecutor::load(session, code)?;
//!
//! let signature = executor.inspect()?;
//! assert_eq!(signature.name, "gain");
//!
//! let mut kwargs = Kwargs::new();
//! kwargs.insert("factor".into(), serde_json::json!(2));
//! let result = executor.invoke(&[1.0, 2.0, 3.0], TransformOptions::signal(), &kwargs)?;
//! assert_eq!(result.to_json()?, serde_json::json!([2.0, 4.0, 6.0]));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod executor;
pub mod loader;
pub mod marshal;
pub mod namespace;
pub mod session;
pub mod signature;
pub mod transform;
pub mod value;

pub use error::BridgeError;
pub use executor::FunctionExecutor;
pub use loader::{ScriptCallable, select_entry_point};
pub use marshal::Kwargs;
pub use namespace::{HELPER_NAMES, Namespace, RESERVED_PREFIX};
pub use session::RuntimeSession;
pub use signature::{Annotation, FunctionParameter, FunctionSignature, ParamDefault, ParameterKind};
pub use transform::{Domain, TransformOptions};
pub use value::ScriptValue;
