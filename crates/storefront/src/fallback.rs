//! Ordered fallback across storage backends.
//!
//! An operation is described as a list of named attempts. Attempts run in
//! order; the first success wins and later attempts are never polled. When
//! every attempt fails the caller gets all failures, in order, so the log
//! line explains the whole chain.
//!
//! ```rust,ignore
//! let resolved = FallbackChain::new("site_config.read")
//!     .attempt("remote", self.read_remote())
//!     .attempt("snapshot", self.snapshot.read())
//!     .run()
//!     .await?;
//! tracing::info!(backend = resolved.backend, "configuration resolved");
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;

type AttemptFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A value together with the backend that produced it.
#[derive(Debug)]
pub struct Resolved<T> {
    pub value: T,
    pub backend: &'static str,
}

/// Every attempt failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub operation: &'static str,
    pub failures: Vec<(&'static str, E)>,
}

impl<E> Exhausted<E> {
    /// Whether no backend was even configured.
    #[must_use]
    pub fn is_unconfigured(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "{}: no backend configured", self.operation);
        }

        write!(f, "{}: every backend failed (", self.operation)?;
        for (i, (backend, error)) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{backend}: {error}")?;
        }
        f.write_str(")")
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Exhausted<E> {}

/// Ordered list of backends to try for one operation.
pub struct FallbackChain<'a, T, E> {
    operation: &'static str,
    attempts: Vec<(&'static str, AttemptFuture<'a, T, E>)>,
}

impl<'a, T, E> FallbackChain<'a, T, E>
where
    E: fmt::Display,
{
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            attempts: Vec::new(),
        }
    }

    /// Append a backend. The future is not polled until its turn.
    #[must_use]
    pub fn attempt<F>(mut self, backend: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
    {
        self.attempts.push((backend, Box::pin(future)));
        self
    }

    /// Append a backend only when it is configured.
    #[must_use]
    pub fn attempt_if<F>(self, configured: bool, backend: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
    {
        if configured {
            self.attempt(backend, future)
        } else {
            tracing::debug!(
                operation = self.operation,
                backend,
                "Backend not configured, skipping"
            );
            self
        }
    }

    /// Number of attempts in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Run attempts in order until one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Exhausted`] with every failure when no attempt succeeds.
    pub async fn run(self) -> Result<Resolved<T>, Exhausted<E>> {
        let operation = self.operation;
        let mut failures = Vec::new();

        for (backend, future) in self.attempts {
            match future.await {
                Ok(value) => {
                    if !failures.is_empty() {
                        tracing::info!(operation, backend, "Resolved by fallback backend");
                    }
                    return Ok(Resolved { value, backend });
                }
                Err(error) => {
                    tracing::warn!(operation, backend, error = %error, "Backend failed, trying next");
                    failures.push((backend, error));
                }
            }
        }

        Err(Exhausted {
            operation,
            failures,
        })
    }
}
