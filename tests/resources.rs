mod common;
use common::{session, RecordingTransport};

use fgt_api::errors::FgtErrorKind;
use fgt_api::managers::policy::MovePosition;
use fgt_api::services::filter::{Combinator, FilterSpec};
use fgt_api::services::params::ParamValue;
use reqwest::Method;
use serde_json::json;

const ADDRESSES: &str = "https://fw.example:8443/api/v2/cmdb/firewall/address/";
const POLICIES: &str = "https://fw.example:8443/api/v2/cmdb/firewall/policy/";

#[tokio::test]
async fn address_verbs_hit_the_address_collection() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());

    session.show_addresses().await.expect("list");
    session.get_address("web/24").await.expect("get");
    session
        .add_address(json!({ "name": "web", "subnet": "10.0.0.0 255.255.255.0" }))
        .await
        .expect("add");
    session.delete_address("web").await.expect("delete");

    let requests = transport.requests();
    let calls: Vec<(Method, &str)> = requests
        .iter()
        .map(|req| (req.method.clone(), req.url.as_str()))
        .collect();
    assert_eq!(
        calls,
        vec![
            (Method::GET, ADDRESSES),
            (Method::GET, "https://fw.example:8443/api/v2/cmdb/firewall/address/web%2F24"),
            (Method::POST, ADDRESSES),
            (Method::DELETE, "https://fw.example:8443/api/v2/cmdb/firewall/address/web"),
        ]
    );
    assert_eq!(
        requests[2].body,
        Some(json!({ "name": "web", "subnet": "10.0.0.0 255.255.255.0" }))
    );
}

#[tokio::test]
async fn add_requires_a_json_object() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());

    let err = session
        .add_address(json!(["not", "an", "object"]))
        .await
        .expect_err("array body");
    assert_eq!(err.kind, FgtErrorKind::InvalidConfig);
    let err = session.add_policy(json!("deny")).await.expect_err("string body");
    assert_eq!(err.kind, FgtErrorKind::InvalidConfig);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn empty_address_name_is_rejected() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());

    assert!(session.get_address("").await.is_err());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn policy_verbs_build_item_urls() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());

    session.show_policies().await.expect("list");
    session.get_policy(12).await.expect("get");
    session.add_policy(json!({ "name": "allow-web" })).await.expect("add");
    session.delete_policy(12).await.expect("delete");

    let urls: Vec<String> = transport.requests().into_iter().map(|req| req.url).collect();
    assert_eq!(
        urls,
        vec![
            POLICIES.to_string(),
            format!("{}12", POLICIES),
            POLICIES.to_string(),
            format!("{}12", POLICIES),
        ]
    );
}

#[tokio::test]
async fn search_sends_filter_once_and_removes_it() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());
    session
        .context_mut()
        .set_clear_policy(fgt_api::ClearPolicy {
            clear_filter: false,
            ..fgt_api::ClearPolicy::default()
        });

    let filter = FilterSpec::new()
        .term("srcintf==port1", Combinator::None)
        .term("srcintf==port2", "or");
    session.search_policies(&filter).await.expect("search");

    let sent = transport.last();
    assert_eq!(
        sent.param("filter"),
        Some(&ParamValue::from("filter=srcintf==port1,filter=srcintf==port2"))
    );
    assert!(sent
        .full_url()
        .expect("url")
        .ends_with("&filter=srcintf%3D%3Dport1,filter=srcintf%3D%3Dport2"));
    assert!(session.context().params().get("filter").is_none());
}

#[tokio::test]
async fn move_sends_action_params_then_drops_them() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());

    session
        .move_policy(7, 3, MovePosition::After)
        .await
        .expect("move");

    let sent = transport.last();
    assert_eq!(sent.method, Method::PUT);
    assert_eq!(sent.url, format!("{}7", POLICIES));
    assert!(sent.body.is_none());
    assert_eq!(sent.param("action"), Some(&ParamValue::from("move")));
    assert_eq!(sent.param("after"), Some(&ParamValue::from(3u64)));
    assert!(sent.param("before").is_none());

    let params = session.context().params();
    assert!(!params.contains("action"));
    assert!(!params.contains("after"));
    assert!(params.contains("vdom"));
}

#[tokio::test]
async fn monitor_verbs_use_the_monitor_branch() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());

    session.policy_stats().await.expect("stats");
    session.firmware().await.expect("firmware");

    let urls: Vec<String> = transport.requests().into_iter().map(|req| req.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://fw.example:8443/api/v2/monitor/firewall/policy/".to_string(),
            "https://fw.example:8443/api/v2/monitor/system/firmware/".to_string(),
        ]
    );
}

#[tokio::test]
async fn endpoint_changes_rebuild_resource_urls() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());

    session
        .context_mut()
        .set_protocol(fgt_api::Protocol::Http)
        .expect("protocol");
    session.context_mut().set_host("10.0.0.1").expect("host");
    session.show_addresses().await.expect("list");

    assert_eq!(
        transport.last().url,
        "http://10.0.0.1:8443/api/v2/cmdb/firewall/address/"
    );
}

#[tokio::test]
async fn item_urls_keep_the_default_https_port() {
    let transport = RecordingTransport::new();
    let mut session = session(transport.clone());
    session.context_mut().set_port(443).expect("port");

    session.get_policy(5).await.expect("get");
    session.delete_address("lan").await.expect("delete");

    let urls: Vec<String> = transport.requests().into_iter().map(|req| req.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://fw.example:443/api/v2/cmdb/firewall/policy/5".to_string(),
            "https://fw.example:443/api/v2/cmdb/firewall/address/lan".to_string(),
        ]
    );
}
