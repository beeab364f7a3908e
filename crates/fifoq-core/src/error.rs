use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

/// Returned by a blocking queue operation (or a cancellable sleep) whose
/// token fired before it could complete. Nothing was stored or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled while waiting on the queue")]
pub struct Cancelled;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Error with context chain for better debugging
    #[error("Error in {context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Add context to an error, creating an error chain.
    ///
    /// # Example
    /// ```rust,no_run
    /// use fifoq_core::error::Error;
    /// let err = Error::Config("capacity must be at least 1".into());
    /// let err = err.with_context("while loading scenario.yaml");
    /// ```
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self) as Box<dyn std::error::Error + Send + Sync>,
        }
    }

    /// Get suggestions for common errors.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::Config(msg) => {
                let mut out = Vec::new();
                if msg.contains("capacity") {
                    out.push("Capacity must be a positive integer (1 or more)".into());
                    out.push("Check FIFOQ_CAPACITY if it is set in the environment".into());
                }
                if msg.contains("label") {
                    out.push("Give every producer and consumer a distinct, non-empty label".into());
                }
                if msg.contains("delay") {
                    out.push("Randomized delays need min_ms <= max_ms".into());
                }
                out
            }
            Error::Parse(_) => vec![
                "Check the scenario file is valid YAML".into(),
                "Delays are written as {fixed_ms: N} or {min_ms: A, max_ms: B}".into(),
            ],
            Error::Cancelled(_) => vec![
                "The actor was asked to stop while blocked; this is expected during shutdown".into(),
            ],
            _ => vec![],
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
