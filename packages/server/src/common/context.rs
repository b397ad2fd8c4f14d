//! Per-request cancellation and deadline.
//!
//! Every service and repository call takes a [`RequestContext`]. Stores run
//! their storage future through [`RequestContext::run`], so a cancelled or
//! expired request abandons the in-flight call (dropping the sqlx future
//! aborts the query) and surfaces as an `Internal` error instead of hanging.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domains::providers::errors::{Interruption, ProviderError, ProviderResult};

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// No deadline, never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    /// Derive a context that is also cancelled when `parent` is.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            deadline: None,
            cancel: parent.child_token(),
        }
    }

    pub fn deadline_after(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drive `operation` unless the context is cancelled or its deadline passes first.
    pub async fn run<T, F>(&self, operation: F) -> ProviderResult<T>
    where
        F: Future<Output = ProviderResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ProviderError::Interrupted(Interruption::Cancelled));
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProviderError::Interrupted(Interruption::Cancelled)),
            _ = deadline => Err(ProviderError::Interrupted(Interruption::DeadlineExceeded)),
            result = operation => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::providers::errors::ErrorKind;

    #[tokio::test]
    async fn completes_operation_within_deadline() {
        let ctx = RequestContext::with_timeout(Duration::from_secs(5));

        let value = ctx.run(async { Ok::<_, ProviderError>(42) }).await.unwrap();

        assert_eq!(value, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_interrupts_slow_operation() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(100));

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, ProviderError>(())
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.interruption(), Some(Interruption::DeadlineExceeded));
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() {
        let ctx = RequestContext::background();
        ctx.cancel();

        let err = ctx
            .run(async { Ok::<_, ProviderError>(()) })
            .await
            .unwrap_err();

        assert_eq!(err.interruption(), Some(Interruption::Cancelled));
    }

    #[tokio::test]
    async fn parent_cancellation_reaches_child() {
        let parent = CancellationToken::new();
        let ctx = RequestContext::child_of(&parent);

        let pending = ctx.run(std::future::pending::<ProviderResult<()>>());
        parent.cancel();

        assert_eq!(
            pending.await.unwrap_err().interruption(),
            Some(Interruption::Cancelled)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn child_keeps_its_own_deadline() {
        let parent = CancellationToken::new();
        let ctx = RequestContext::child_of(&parent).deadline_after(Duration::from_millis(50));

        let err = ctx
            .run(std::future::pending::<ProviderResult<()>>())
            .await
            .unwrap_err();

        assert_eq!(err.interruption(), Some(Interruption::DeadlineExceeded));
        assert!(!parent.is_cancelled());
    }
}
