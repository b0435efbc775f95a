use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("Session initialization failed: {0}")]
    SessionInit(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("No function defined")]
    NoFunctionDefined,

    #[error("Introspection failed: {0}")]
    Introspection(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Invocation failed: {0}")]
    Invocation(String),
}
