//! Render the reverse-proxy config from the environment, then hand off.

use ledger_ops_config::{PROXY_ENV_VARS, ProxyEnv};
use ledger_ops_domain::{TokenReplacement, remaining_tokens, render_placeholders};
use ledger_ops_ports::{
    HandoffOutcome, HandoffSpec, LogFields, LoggerPort, ProcessHandoffPort, WorkspacePort,
};
use ledger_ops_shared::{ErrorEnvelope, RequestContext, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Input payload for rendering the proxy config.
#[derive(Debug, Clone)]
pub struct RenderProxyConfigInput {
    /// Validated environment.
    pub env: ProxyEnv,
    /// File rendered in place.
    pub config_file: PathBuf,
    /// Server that takes over afterwards.
    pub server: HandoffSpec,
    /// Skip the hand-off when false.
    pub hand_off: bool,
}

/// Dependencies required by render-proxy-config.
#[derive(Clone)]
pub struct RenderProxyConfigDeps {
    /// Config file access.
    pub workspace: Arc<dyn WorkspacePort>,
    /// Replaces this process with the server.
    pub handoff: Arc<dyn ProcessHandoffPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Render summary. Only returned when the hand-off was skipped or the
/// platform could not replace the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderProxyConfigOutput {
    /// Rendered file.
    pub config_file: PathBuf,
    /// Per-token replacement counts, in substitution order.
    pub replacements: Vec<TokenReplacement>,
    /// Whether the file contents changed.
    pub changed: bool,
    /// Successor outcome, when a hand-off ran and returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff: Option<HandoffOutcome>,
}

impl RenderProxyConfigOutput {
    /// Total replacements across all tokens.
    #[must_use]
    pub fn total_replacements(&self) -> usize {
        self.replacements.iter().map(|entry| entry.count).sum()
    }
}

/// Substitute every placeholder in the config file, write it back, and hand
/// control to the server.
#[tracing::instrument(
    name = "render_proxy_config",
    skip_all,
    fields(config_file = %input.config_file.display(), hand_off = input.hand_off)
)]
pub async fn render_proxy_config(
    ctx: &RequestContext,
    deps: &RenderProxyConfigDeps,
    input: RenderProxyConfigInput,
) -> Result<RenderProxyConfigOutput> {
    let started_at = Instant::now();
    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            "proxy.render.start",
            "Proxy config render started",
            Some(log_fields_start(&input)),
        );
    }

    let result = render_in_place(ctx, deps, &input).await;
    let mut output = match result {
        Ok(output) => output,
        Err(error) => {
            if let Some(logger) = deps.logger.as_ref() {
                logger.error(
                    "proxy.render.failed",
                    "Proxy config render failed",
                    Some(log_fields_error(&input, &error)),
                );
            }
            return Err(error);
        },
    };

    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            "proxy.render.completed",
            "Proxy config rendered",
            Some(log_fields_completed(&output, started_at)),
        );
    }

    if input.hand_off {
        ctx.ensure_not_cancelled("proxy.hand_off")?;
        if let Some(logger) = deps.logger.as_ref() {
            let mut fields = LogFields::new();
            fields.insert("program".into(), Value::from(input.server.program.as_ref()));
            logger.info("proxy.handoff.start", "Handing off to proxy server", Some(fields));
        }
        output.handoff = Some(deps.handoff.hand_off(ctx, input.server).await?);
    }

    Ok(output)
}

async fn render_in_place(
    ctx: &RequestContext,
    deps: &RenderProxyConfigDeps,
    input: &RenderProxyConfigInput,
) -> Result<RenderProxyConfigOutput> {
    ctx.ensure_not_cancelled("proxy.render")?;
    let original = deps
        .workspace
        .read_text(ctx, input.config_file.clone())
        .await?;
    let rendered = render_placeholders(&original, input.env.substitutions());

    let leftover = remaining_tokens(&rendered.text, &PROXY_ENV_VARS);
    if !leftover.is_empty() {
        tracing::debug!(tokens = ?leftover, "placeholders reintroduced by substituted values");
    }

    let changed = rendered.text != original;
    if changed {
        deps.workspace
            .write_text(ctx, input.config_file.clone(), rendered.text)
            .await?;
    }

    Ok(RenderProxyConfigOutput {
        config_file: input.config_file.clone(),
        replacements: rendered.replacements,
        changed,
        handoff: None,
    })
}

fn log_fields_start(input: &RenderProxyConfigInput) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert(
        "configFile".into(),
        Value::String(input.config_file.to_string_lossy().into_owned()),
    );
    fields.insert("handOff".into(), Value::Bool(input.hand_off));
    fields
}

fn log_fields_completed(output: &RenderProxyConfigOutput, started_at: Instant) -> LogFields {
    let mut fields = LogFields::new();
    let counts: serde_json::Map<String, Value> = output
        .replacements
        .iter()
        .map(|entry| (entry.token.to_string(), Value::from(entry.count)))
        .collect();
    let unmatched: Vec<Value> = output
        .replacements
        .iter()
        .filter(|entry| entry.count == 0)
        .map(|entry| Value::from(entry.token.as_ref()))
        .collect();
    fields.insert("replacements".into(), Value::Object(counts));
    fields.insert("unmatchedTokens".into(), Value::Array(unmatched));
    fields.insert("changed".into(), Value::Bool(output.changed));
    fields.insert(
        "durationMs".into(),
        Value::from(u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)),
    );
    fields
}

fn log_fields_error(input: &RenderProxyConfigInput, error: &ErrorEnvelope) -> LogFields {
    let mut fields = log_fields_start(input);
    fields.insert("errorCode".into(), Value::String(error.code.to_string()));
    fields.insert("error".into(), Value::String(error.message.clone()));
    fields
}
