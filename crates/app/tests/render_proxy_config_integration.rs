//! Integration tests for the proxy config render use case.

use ledger_ops_adapters::LocalWorkspace;
use ledger_ops_app::{RenderProxyConfigDeps, RenderProxyConfigInput, render_proxy_config};
use ledger_ops_config::{PROXY_ENV_VARS, ProxyEnv};
use ledger_ops_domain::remaining_tokens;
use ledger_ops_ports::{HandoffOutcome, HandoffSpec};
use ledger_ops_shared::{ErrorCode, RequestContext};
use ledger_ops_testkit::fixtures::{proxy_env_fixture, proxy_template_fixture};
use ledger_ops_testkit::in_memory::{InMemoryWorkspace, RecordingHandoff};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

const CONFIG_FILE: &str = "/etc/nginx/nginx.conf";

fn proxy_env() -> Result<ProxyEnv, Box<dyn Error>> {
    Ok(ProxyEnv::from_map(&proxy_env_fixture()?)?)
}

fn nginx() -> HandoffSpec {
    HandoffSpec {
        program: "nginx".into(),
        args: vec!["-c".into(), CONFIG_FILE.into()],
    }
}

fn input(env: ProxyEnv, hand_off: bool) -> RenderProxyConfigInput {
    RenderProxyConfigInput {
        env,
        config_file: PathBuf::from(CONFIG_FILE),
        server: nginx(),
        hand_off,
    }
}

#[tokio::test]
async fn every_placeholder_is_replaced_then_handed_off() -> Result<(), Box<dyn Error>> {
    let ctx = RequestContext::new_run();
    let workspace = InMemoryWorkspace::new().with_file(CONFIG_FILE, proxy_template_fixture()?);
    let handoff = RecordingHandoff::new();
    let deps = RenderProxyConfigDeps {
        workspace: Arc::new(workspace.clone()),
        handoff: Arc::new(handoff.clone()),
        logger: None,
    };

    let output = render_proxy_config(&ctx, &deps, input(proxy_env()?, true)).await?;

    let rendered = workspace.contents(CONFIG_FILE).unwrap_or_default();
    assert!(remaining_tokens(&rendered, &PROXY_ENV_VARS).is_empty());
    assert!(rendered.contains("proxy_pass http://bdb-instance-0:9984;"));
    assert!(rendered.contains("resolver 127.0.0.11 valid=20s;"));
    assert!(output.changed);
    assert!(output.replacements.iter().all(|entry| entry.count > 0));
    assert_eq!(output.handoff, Some(HandoffOutcome::Exited(0)));
    assert_eq!(handoff.calls(), vec![nginx()]);
    Ok(())
}

#[tokio::test]
async fn template_without_placeholders_is_untouched_and_still_hands_off()
-> Result<(), Box<dyn Error>> {
    let ctx = RequestContext::new_run();
    let plain = "events {}\nhttp { server { listen 80; } }\n";
    let workspace = InMemoryWorkspace::new().with_file(CONFIG_FILE, plain);
    let handoff = RecordingHandoff::new();
    let deps = RenderProxyConfigDeps {
        workspace: Arc::new(workspace.clone()),
        handoff: Arc::new(handoff.clone()),
        logger: None,
    };

    let output = render_proxy_config(&ctx, &deps, input(proxy_env()?, true)).await?;

    assert_eq!(workspace.contents(CONFIG_FILE).as_deref(), Some(plain));
    assert!(!output.changed);
    assert_eq!(output.total_replacements(), 0);
    assert_eq!(handoff.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_config_file_fails_without_handoff() -> Result<(), Box<dyn Error>> {
    let ctx = RequestContext::new_run();
    let handoff = RecordingHandoff::new();
    let deps = RenderProxyConfigDeps {
        workspace: Arc::new(InMemoryWorkspace::new()),
        handoff: Arc::new(handoff.clone()),
        logger: None,
    };

    let error = render_proxy_config(&ctx, &deps, input(proxy_env()?, true))
        .await
        .err();

    assert!(matches!(error, Some(ref envelope) if envelope.code == ErrorCode::not_found()));
    assert!(handoff.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn render_only_skips_handoff() -> Result<(), Box<dyn Error>> {
    let ctx = RequestContext::new_run();
    let workspace = InMemoryWorkspace::new().with_file(CONFIG_FILE, proxy_template_fixture()?);
    let handoff = RecordingHandoff::new();
    let deps = RenderProxyConfigDeps {
        workspace: Arc::new(workspace),
        handoff: Arc::new(handoff.clone()),
        logger: None,
    };

    let output = render_proxy_config(&ctx, &deps, input(proxy_env()?, false)).await?;

    assert_eq!(output.handoff, None);
    assert!(handoff.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn renders_real_file_in_place() -> Result<(), Box<dyn Error>> {
    let dir = std::env::temp_dir().join(format!(
        "ledger-ops-render-{}",
        ctx_suffix(&RequestContext::new_run())
    ));
    std::fs::create_dir_all(&dir)?;
    let config_file = dir.join("nginx.conf");
    std::fs::write(&config_file, "listen CLUSTER_FRONTEND_PORT;\nlisten HEALTH_CHECK_PORT;\n")?;

    let ctx = RequestContext::new_run();
    let deps = RenderProxyConfigDeps {
        workspace: Arc::new(LocalWorkspace::new()),
        handoff: Arc::new(RecordingHandoff::new()),
        logger: None,
    };
    let mut request = input(proxy_env()?, false);
    request.config_file.clone_from(&config_file);

    render_proxy_config(&ctx, &deps, request).await?;

    assert_eq!(
        std::fs::read_to_string(&config_file)?,
        "listen 80;\nlisten 8888;\n"
    );
    std::fs::remove_dir_all(dir).ok();
    Ok(())
}

fn ctx_suffix(ctx: &RequestContext) -> String {
    ctx.correlation_id().as_str().to_owned()
}
