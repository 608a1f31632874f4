//! Runtime bootstrap for blocking CLI entrypoints.

use crate::{InfraError, InfraResult};
use ledger_ops_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use std::future::Future;
use tokio::task::JoinHandle;

/// Run `op` on a current-thread runtime, cancelling `ctx` on Ctrl-C.
///
/// The interrupt watcher lives only as long as `op`.
pub fn run_with_interrupt<F, T>(
    ctx: RequestContext,
    op: impl FnOnce(RequestContext) -> F,
) -> InfraResult<T>
where
    F: Future<Output = InfraResult<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(async {
        let watcher = spawn_interrupt_watcher(&ctx);
        let result = op(ctx).await;
        finalize_watcher(watcher).await?;
        result
    })
}

fn spawn_interrupt_watcher(ctx: &RequestContext) -> JoinHandle<()> {
    let token = ctx.cancellation_token();
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {},
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    tracing::warn!("interrupt received, cancelling run");
                    token.cancel();
                },
                Err(error) => {
                    tracing::debug!(%error, "interrupt handler unavailable");
                },
            },
        }
    })
}

async fn finalize_watcher(handle: JoinHandle<()>) -> InfraResult<()> {
    handle.abort();
    if let Err(error) = handle.await
        && error.is_panic()
    {
        return Err(ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("interrupt watcher failed: {error}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_the_operation_result() -> InfraResult<()> {
        let value = run_with_interrupt(RequestContext::new_run(), |ctx| async move {
            ctx.ensure_not_cancelled("runtime.test")?;
            Ok(7)
        })?;
        assert_eq!(value, 7);
        Ok(())
    }

    #[test]
    fn cancelled_context_surfaces_as_cancelled_error() {
        let ctx = RequestContext::new_run();
        ctx.cancel();

        let result = run_with_interrupt(ctx, |ctx| async move {
            ctx.ensure_not_cancelled("runtime.test")
        });

        assert!(matches!(result, Err(ref error) if error.is_cancelled()));
    }
}
