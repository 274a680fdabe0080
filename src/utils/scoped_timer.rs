use tokio::time::Instant;
use tracing::trace;

/// Traces how long one store operation took, attempts and backoff included,
/// when it goes out of scope.
pub(crate) struct ScopedTimer<'a> {
    started: Instant,
    operation: &'static str,
    key: &'a str,
}

impl<'a> ScopedTimer<'a> {
    pub(crate) fn new(
        operation: &'static str,
        key: &'a str,
    ) -> Self {
        Self {
            started: Instant::now(),
            operation,
            key,
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        trace!(
            target: "dogu_registry::timing",
            operation = self.operation,
            key = self.key,
            elapsed_ms,
            "store operation finished"
        );
    }
}
