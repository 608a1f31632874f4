//! Local wiring for the reverse-proxy entrypoint.

use crate::observability::{logger_from_env, scope_logger};
use crate::runtime::run_with_interrupt;
use crate::{InfraResult, validate_proxy_env};
use ledger_ops_adapters::{ExecHandoff, LocalWorkspace};
use ledger_ops_app::{
    RenderProxyConfigDeps, RenderProxyConfigInput, RenderProxyConfigOutput, render_proxy_config,
};
use ledger_ops_config::ProxyOptions;
use ledger_ops_ports::HandoffSpec;
use ledger_ops_shared::RequestContext;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Render the proxy config from `env` and hand off to the server.
///
/// The environment is validated before anything touches the config file. On
/// unix a successful hand-off replaces this process, so the function only
/// returns when `render_only` is set, when the platform waited on the server,
/// or on error.
pub fn run_proxy_entrypoint(
    env: &BTreeMap<String, String>,
    options: &ProxyOptions,
    render_only: bool,
) -> InfraResult<RenderProxyConfigOutput> {
    let proxy_env = validate_proxy_env(env)?;
    let logger = logger_from_env(env);
    let ctx = RequestContext::new_run();
    let deps = RenderProxyConfigDeps {
        workspace: Arc::new(LocalWorkspace::new()),
        handoff: Arc::new(ExecHandoff::new()),
        logger: Some(scope_logger(logger.as_ref(), &ctx)),
    };
    let input = RenderProxyConfigInput {
        env: proxy_env,
        config_file: options.config_file.clone(),
        server: HandoffSpec {
            program: options.server_program.as_str().into(),
            args: options
                .server_args()
                .into_iter()
                .map(String::into_boxed_str)
                .collect(),
        },
        hand_off: !render_only,
    };

    run_with_interrupt(ctx, |ctx| async move {
        render_proxy_config(&ctx, &deps, input).await
    })
}
