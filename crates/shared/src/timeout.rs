//! Timeout helpers with cancellation awareness.

use crate::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::future::Future;
use std::time::Duration;

/// Await a future with an optional deadline, honoring request cancellation.
///
/// `None` waits indefinitely (cancellation still applies).
pub async fn timeout_with_context<T, F>(
    ctx: &RequestContext,
    timeout: Option<Duration>,
    operation: &'static str,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    ctx.ensure_not_cancelled(operation)?;

    match timeout {
        Some(limit) => tokio::select! {
            () = ctx.cancelled() => Err(cancelled_error(operation)),
            res = tokio::time::timeout(limit, fut) => {
                res.unwrap_or_else(|_| Err(timeout_error(operation, limit)))
            }
        },
        None => tokio::select! {
            () = ctx.cancelled() => Err(cancelled_error(operation)),
            res = fut => res,
        },
    }
}

fn timeout_error(operation: &'static str, limit: Duration) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::timeout(),
        format!("operation timed out after {}s: {operation}", limit.as_secs()),
    )
    .with_metadata("operation", operation)
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_triggers() {
        let ctx = RequestContext::new_run();
        let fut = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ErrorEnvelope>(())
        };

        let result = timeout_with_context(&ctx, Some(Duration::from_millis(10)), "test", fut).await;
        assert!(matches!(result, Err(ref error) if error.code == ErrorCode::timeout()));
    }

    #[tokio::test]
    async fn no_deadline_waits_for_completion() {
        let ctx = RequestContext::new_run();
        let fut = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, ErrorEnvelope>(7)
        };

        let result = timeout_with_context(&ctx, None, "test", fut).await;
        assert!(matches!(result, Ok(7)));
    }

    #[tokio::test]
    async fn cancellation_triggers() {
        let ctx = RequestContext::new_run();
        let token = ctx.cancellation_token();
        let fut = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ErrorEnvelope>(())
        };

        let task = tokio::spawn(async move { timeout_with_context(&ctx, None, "test_cancel", fut).await });

        tokio::task::yield_now().await;
        token.cancel();
        let result = task.await.expect("join");
        assert!(matches!(result, Err(ref error) if error.is_cancelled()));
    }
}
