use pyo3::prelude::*;
use tokio::sync::OnceCell;

use crate::error::BridgeError;
use crate::namespace::Namespace;

/// Boot outcome, memoized for the life of the process. A failed boot is kept
/// as its root-cause message so every later caller sees the same error.
static SESSION: OnceCell<Result<RuntimeSession, String>> = OnceCell::const_new();

#[cfg(test)]
static BOOTS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// The process-wide embedded Python interpreter.
///
/// Booting the interpreter and loading numpy happen once; every
/// [`Namespace`] handed out afterwards shares this interpreter. The runtime
/// is effectively single threaded: all calls into it hold the GIL via
/// `Python::attach`.
#[derive(Debug)]
pub struct RuntimeSession {
    python_version: String,
    numpy_version: String,
}

impl RuntimeSession {
    /// Return the process-wide session, booting it on first use.
    ///
    /// Concurrent callers before the first boot completes all await the same
    /// in-flight initialization.
    pub async fn create() -> Result<&'static RuntimeSession, BridgeError> {
        let booted = SESSION
            .get_or_init(|| async {
                tokio::task::spawn_blocking(RuntimeSession::boot)
                    .await
                    .unwrap_or_else(|e| Err(format!("interpreter boot task failed: {e}")))
            })
            .await;

        booted
            .as_ref()
            .map_err(|cause| BridgeError::SessionInit(cause.clone()))
    }

    fn boot() -> Result<RuntimeSession, String> {
        #[cfg(test)]
        BOOTS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        tracing::info!("Booting embedded Python interpreter");
        Python::initialize();

        let session = Python::attach(|py| -> Result<RuntimeSession, String> {
            let numpy = py
                .import("numpy")
                .map_err(|e| format!("cannot load numpy: {e}"))?;
            let numpy_version = numpy
                .getattr("__version__")
                .map_err(|e| e.to_string())?
                .extract::<String>()
                .map_err(|e| e.to_string())?;

            Ok(RuntimeSession {
                python_version: py.version().to_string(),
                numpy_version,
            })
        });

        match &session {
            Ok(s) => tracing::info!(
                python = %s.python_version,
                numpy = %s.numpy_version,
                "Embedded interpreter ready"
            ),
            Err(e) => tracing::error!(error = %e, "Embedded interpreter failed to boot"),
        }
        session
    }

    /// Create a fresh execution namespace with the helper vocabulary loaded.
    pub fn namespace(&self) -> Result<Namespace, BridgeError> {
        Python::attach(Namespace::bootstrap)
    }

    pub fn python_version(&self) -> &str {
        &self.python_version
    }

    pub fn numpy_version(&self) -> &str {
        &self.numpy_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_create_boots_once() {
        let handles: Vec<_> = (0..8)
            .map(|_| tokio::spawn(RuntimeSession::create()))
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(BOOTS.load(Ordering::SeqCst), 1);

        match &results[0] {
            Ok(first) => {
                for result in &results {
                    let session = result.as_ref().unwrap();
                    assert!(std::ptr::eq(*first, *session));
                }
            }
            Err(first) => {
                // A failed boot is memoized: everyone sees the same root cause.
                for result in &results {
                    assert_eq!(result.as_ref().unwrap_err(), first);
                }
                assert!(matches!(first, BridgeError::SessionInit(_)));
            }
        }
    }

    #[tokio::test]
    async fn create_after_boot_returns_memoized_result() {
        let first = RuntimeSession::create().await;
        let second = RuntimeSession::create().await;
        match (first, second) {
            (Ok(a), Ok(b)) => {
                assert!(std::ptr::eq(a, b));
                assert!(!a.numpy_version().is_empty());
                assert!(!a.python_version().is_empty());
            }
            (Err(a), Err(b)) => assert_eq!(a, b),
            _ => panic!("memoized session changed between calls"),
        }
    }
}
