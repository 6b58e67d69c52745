use std::time::Duration;

use rag_engine::CallContext;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Cancellation scope of one HTTP request.
///
/// Axum drops the handler future when the client goes away; dropping the
/// scope with it cancels the token, so in-flight provider calls stop.
pub struct RequestScope {
    ctx: CallContext,
    _guard: DropGuard,
}

impl RequestScope {
    pub fn new(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let ctx = CallContext::new(token.clone()).with_timeout(timeout);
        Self {
            ctx,
            _guard: token.drop_guard(),
        }
    }

    pub fn ctx(&self) -> &CallContext {
        &self.ctx
    }
}
