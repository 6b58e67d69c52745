//! Caller-supplied cancellation and deadline for pipeline operations.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{RagEngineError, Stage};

/// Cancellation signal plus optional deadline, threaded through every remote
/// call of one operation.
///
/// Cloning shares the token: cancelling any clone cancels them all.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Runs `fut` unless the token fires or the deadline passes first.
    ///
    /// On cancellation the in-flight future is dropped and
    /// [`RagEngineError::Cancelled`] is returned for `stage`.
    pub async fn run<F, T>(&self, stage: Stage, fut: F) -> Result<T, RagEngineError>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return Err(RagEngineError::Cancelled { stage });
        }

        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!(%stage, "cancelled by caller");
                Err(RagEngineError::Cancelled { stage })
            }
            _ = deadline => {
                debug!(%stage, "deadline exceeded");
                Err(RagEngineError::Cancelled { stage })
            }
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let ctx = CallContext::background();
        let v = ctx.run(Stage::Search, async { 7 }).await.unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = CallContext::new(token);
        let err = ctx
            .run(Stage::Embedding, async { 1 })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagEngineError::Cancelled {
                stage: Stage::Embedding
            }
        ));
    }

    #[tokio::test]
    async fn cancel_drops_in_flight_call() {
        let token = CancellationToken::new();
        let ctx = CallContext::new(token.clone());
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let err = ctx
            .run(Stage::Completion, std::future::pending::<()>())
            .await
            .unwrap_err();
        trigger.await.unwrap();
        assert!(matches!(
            err,
            RagEngineError::Cancelled {
                stage: Stage::Completion
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires() {
        let ctx = CallContext::background().with_timeout(Duration::from_secs(5));
        let err = ctx
            .run(Stage::StoreWrite, std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagEngineError::Cancelled {
                stage: Stage::StoreWrite
            }
        ));
    }
}
