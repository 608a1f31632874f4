//! Integration coverage for bootstrap descriptors and membership parsing.

use ledger_ops_domain::{
    ClusterDescriptor, MembershipError, PrimitiveError, genesis_host, render_placeholders,
};
use ledger_ops_shared::ErrorEnvelope;

#[test]
fn descriptor_errors_map_into_usage_envelopes() -> Result<(), PrimitiveError> {
    let Err(error) = ClusterDescriptor::from_args(Some("v1"), Some("")) else {
        return Err(PrimitiveError::MissingNodeCount);
    };

    let envelope: ErrorEnvelope = error.into();
    assert_eq!(envelope.code.namespace(), "bootstrap");
    assert_eq!(envelope.code.code(), "usage");
    Ok(())
}

#[test]
fn descriptor_keeps_raw_values() -> Result<(), PrimitiveError> {
    let descriptor = ClusterDescriptor::from_args(Some("v1"), Some("3"))?;
    assert_eq!(descriptor.tag.as_str(), "v1");
    assert_eq!(descriptor.node_count.as_str(), "3");
    Ok(())
}

#[test]
fn assembled_config_yields_genesis_host() -> Result<(), MembershipError> {
    let template = "# storage template\nbind=all\n";
    let fragment = "join=ec2-54-0-0-1.compute-1.amazonaws.com:29015\njoin=ec2-54-0-0-2.compute-1.amazonaws.com:29015\n";
    let assembled = format!("{template}{fragment}");

    let host = genesis_host(&assembled)?;
    assert_eq!(host.as_str(), "ec2-54-0-0-2.compute-1.amazonaws.com");
    Ok(())
}

#[test]
fn proxy_style_template_renders_all_tokens() {
    let template = "server_name _;\nlisten CLUSTER_FRONTEND_PORT;\nresolver DNS_SERVER valid=20s;\nproxy_pass http://BIGCHAINDB_BACKEND_HOST:BIGCHAINDB_API_PORT;\n";
    let rendered = render_placeholders(
        template,
        [
            ("CLUSTER_FRONTEND_PORT", "80"),
            ("DNS_SERVER", "127.0.0.11"),
            ("BIGCHAINDB_BACKEND_HOST", "bdb-svc"),
            ("BIGCHAINDB_API_PORT", "9984"),
        ],
    );

    assert!(rendered.text.contains("listen 80;"));
    assert!(rendered.text.contains("proxy_pass http://bdb-svc:9984;"));
    assert_eq!(rendered.total_replacements(), 4);
}
