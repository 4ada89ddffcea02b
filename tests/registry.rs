//! End-to-end tests against a mock Consul agent

use consul_zombie::api::ClientCache;
use consul_zombie::deregister::{deregister, DeregisterOptions};
use consul_zombie::discover::discover;
use consul_zombie::models::{AgentService, CheckStatus, HealthCheck, Node, ServiceInstance};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn health_entry(node: &str, node_addr: &str, id: &str, name: &str, status: &str) -> serde_json::Value {
    json!({
        "Node": { "Node": node, "Address": node_addr },
        "Service": { "ID": id, "Service": name, "Address": node_addr, "Port": 8080, "Tags": [] },
        "Checks": [
            { "Name": "serfHealth", "Status": "passing" },
            { "Name": format!("service:{}", id), "Status": status }
        ]
    })
}

fn instance(node_addr: &str, id: &str, status: Option<CheckStatus>) -> ServiceInstance {
    ServiceInstance {
        node: Node {
            name: "node-1".to_string(),
            address: node_addr.to_string(),
        },
        service: AgentService {
            id: id.to_string(),
            service: "web".to_string(),
            address: node_addr.to_string(),
            port: 8080,
            tags: vec![],
        },
        checks: status
            .map(|s| {
                vec![HealthCheck {
                    name: "liveness".to_string(),
                    status: s,
                }]
            })
            .unwrap_or_default(),
    }
}

fn sorted_ids(instances: &[ServiceInstance]) -> Vec<String> {
    let mut ids: Vec<String> = instances.iter().map(|se| se.service.id.clone()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn discover_walks_catalog_and_merges_duplicates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "web": [], "web-alias": [] })),
        )
        .mount(&server)
        .await;

    // The same (node, service id) shows up under both catalog names; the
    // merged result must contain it once.
    let shared = health_entry("n1", "10.0.0.1", "web-1", "web", "passing");
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            shared.clone(),
            health_entry("n2", "10.0.0.2", "web-2", "web", "critical")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web-alias"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([shared])))
        .mount(&server)
        .await;

    let cache = ClientCache::new();
    let found = discover(&cache, &server.uri(), "", "", "").await.unwrap();
    assert_eq!(sorted_ids(&found), vec!["web-1", "web-2"]);
}

#[tokio::test]
async fn discover_filters_by_id_or_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mixed": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/health/service/mixed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            // matches the pattern only through its ID
            health_entry("n1", "10.0.0.1", "web-front-1", "frontend", "passing"),
            // matches only through its name
            health_entry("n2", "10.0.0.2", "svc-2", "webapp", "passing"),
            // matches neither
            health_entry("n3", "10.0.0.3", "db-1", "postgres", "passing")
        ])))
        .mount(&server)
        .await;

    let cache = ClientCache::new();
    let found = discover(&cache, &server.uri(), "", "web", "").await.unwrap();
    assert_eq!(sorted_ids(&found), vec!["svc-2", "web-front-1"]);
}

#[tokio::test]
async fn discover_forwards_tag_and_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .and(header("X-Consul-Token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "web": ["primary"] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web"))
        .and(query_param("tag", "primary"))
        .and(header("X-Consul-Token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([health_entry(
            "n1", "10.0.0.1", "web-1", "web", "passing"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let cache = ClientCache::new();
    let found = discover(&cache, &server.uri(), "secret", "", "primary")
        .await
        .unwrap();
    assert_eq!(sorted_ids(&found), vec!["web-1"]);
}

#[tokio::test]
async fn discover_fails_the_whole_run_on_health_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "web": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web"))
        .respond_with(ResponseTemplate::new(500).set_body_string("registry on fire"))
        .mount(&server)
        .await;

    let cache = ClientCache::new();
    let err = discover(&cache, &server.uri(), "", "", "").await.unwrap_err();
    assert!(err.to_string().contains("web"));
}

#[tokio::test]
async fn deregister_skips_healthy_and_survives_call_failures() {
    let server = MockServer::start().await;
    let agent_port = server.address().port();

    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/dead-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    // One call fails; the run must still reach dead-2.
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/gone-already"))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown service"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/dead-2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/ok-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let instances = vec![
        instance("127.0.0.1", "dead-1", None),
        instance("127.0.0.1", "ok-1", Some(CheckStatus::Passing)),
        instance("127.0.0.1", "gone-already", Some(CheckStatus::Critical)),
        instance("127.0.0.1", "dead-2", None),
    ];

    let cache = ClientCache::new();
    let opts = DeregisterOptions {
        remote_port: agent_port,
        token: String::new(),
        force: false,
        rate_per_minute: 0,
    };
    let outcome = deregister(&cache, &instances, &opts).await.unwrap();
    assert_eq!(outcome.deregistered, vec!["dead-1", "dead-2"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, "gone-already");
}

#[tokio::test]
async fn force_deregisters_healthy_instances_too() {
    let server = MockServer::start().await;
    let agent_port = server.address().port();

    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/ok-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/dead-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let instances = vec![
        instance("127.0.0.1", "ok-1", Some(CheckStatus::Passing)),
        instance("127.0.0.1", "dead-1", None),
    ];

    let cache = ClientCache::new();
    let opts = DeregisterOptions {
        remote_port: agent_port,
        token: String::new(),
        force: true,
        rate_per_minute: 0,
    };
    let outcome = deregister(&cache, &instances, &opts).await.unwrap();
    assert_eq!(outcome.deregistered.len(), 2);
    assert!(outcome.failed.is_empty());
}

#[tokio::test]
async fn connection_failure_aborts_the_batch() {
    let server = MockServer::start().await;
    let agent_port = server.address().port();

    // The second instance would succeed, but the batch must stop at the
    // unusable agent address before it.
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/dead-2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let instances = vec![
        instance("not a host name", "dead-1", None),
        instance("127.0.0.1", "dead-2", None),
    ];

    let cache = ClientCache::new();
    let opts = DeregisterOptions {
        remote_port: agent_port,
        token: String::new(),
        force: false,
        rate_per_minute: 0,
    };
    assert!(deregister(&cache, &instances, &opts).await.is_err());
}
