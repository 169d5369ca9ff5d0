//! Integration tests for task discovery: ordering, bounded retry,
//! short-circuit on success, and shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use amf_descriptor::GroupDescriptor;
use amf_framework::marathon::http_client;
use amf_framework::{MarathonClient, TaskDiscovery};
use amf_reconcile::RetryPolicy;
use amf_testing::{app_body, cluster_spec, missing_app_body, task};
use rstest::rstest;
use tokio::sync::watch;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APP: &str = "/c1/servers/coordinators";
const APP_PATH: &str = "/v2/apps/c1/servers/coordinators";

fn discovery(server: &MockServer, attempts: u32, shutdown: watch::Receiver<bool>) -> TaskDiscovery {
    let client = MarathonClient::new(http_client(Duration::from_secs(5)).unwrap(), server.uri());
    TaskDiscovery::new(
        client,
        RetryPolicy::fixed(attempts, Duration::from_millis(5)),
        shutdown,
    )
}

/// A local URL nothing listens on.
fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}", listener.local_addr().unwrap())
}

#[tokio::test]
async fn test_tasks_returned_in_order() {
    let server = MockServer::start().await;
    let body = app_body(
        APP,
        vec![
            task("10.0.0.7", &[31005, 31006], "coord.1", "agent-a"),
            task("10.0.0.3", &[31010], "coord.2", "agent-b"),
        ],
    );
    Mock::given(method("GET"))
        .and(path(APP_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let (_tx, rx) = watch::channel(false);
    let tasks = discovery(&server, 10, rx).discover(APP).await;

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id(), "coord.1");
    assert_eq!(tasks[0].host(), "10.0.0.7");
    assert_eq!(tasks[0].ports(), &[31005, 31006]);
    assert_eq!(tasks[0].owner_id(), "agent-a");
    assert_eq!(tasks[1].id(), "coord.2");
    assert_eq!(tasks[1].primary_port(), 31010);
}

#[tokio::test]
async fn test_empty_task_list_returns_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(APP_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(app_body(APP, vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let (_tx, rx) = watch::channel(false);
    assert!(discovery(&server, 10, rx).discover(APP).await.is_empty());
}

#[rstest]
#[case::server_error(ResponseTemplate::new(500))]
#[case::missing_app(ResponseTemplate::new(404).set_body_json(missing_app_body(APP)))]
#[case::not_json(ResponseTemplate::new(200).set_body_string("<html>"))]
#[case::task_without_host(ResponseTemplate::new(200).set_body_json(serde_json::json!({
    "app": {"tasks": [{"id": "t1", "ports": [1], "slaveId": "s1"}]}
})))]
#[tokio::test]
async fn test_failing_orchestrator_exhausts_exact_attempts(#[case] response: ResponseTemplate) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(APP_PATH))
        .respond_with(response)
        .expect(4)
        .mount(&server)
        .await;

    let (_tx, rx) = watch::channel(false);
    assert!(discovery(&server, 4, rx).discover(APP).await.is_empty());
}

#[tokio::test]
async fn test_success_on_third_attempt_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(APP_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(APP_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(app_body(APP, vec![task("h1", &[8529], "t1", "s1")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (_tx, rx) = watch::channel(false);
    let tasks = discovery(&server, 10, rx).discover(APP).await;

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id(), "t1");
}

#[tokio::test]
async fn test_unreachable_orchestrator_yields_empty() {
    let (_tx, rx) = watch::channel(false);
    let client = MarathonClient::new(http_client(Duration::from_secs(5)).unwrap(), closed_port_uri());
    let discovery = TaskDiscovery::new(client, RetryPolicy::fixed(3, Duration::from_millis(1)), rx);

    assert!(discovery.discover(APP).await.is_empty());
}

#[tokio::test]
async fn test_shutdown_interrupts_retry_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(APP_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (tx, rx) = watch::channel(false);
    let client = MarathonClient::new(http_client(Duration::from_secs(5)).unwrap(), server.uri());
    let discovery = TaskDiscovery::new(
        client,
        RetryPolicy::fixed(300, Duration::from_secs(3600)),
        rx,
    );

    let handle = tokio::spawn(async move { discovery.discover(APP).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(true).unwrap();

    let tasks = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("discovery did not stop on shutdown")
        .unwrap();
    assert!(tasks.is_empty());
}

/// Counts error-level events.
#[derive(Clone, Default)]
struct ErrorEvents(Arc<AtomicUsize>);

impl ErrorEvents {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test]
async fn test_missing_app_is_not_logged_as_error() {
    let errors = ErrorEvents::default();
    let _guard = tracing_subscriber::registry()
        .with(errors.clone())
        .set_default();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(APP_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(missing_app_body(APP)))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/groups"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let (_tx, rx) = watch::channel(false);
    assert!(discovery(&server, 3, rx).discover(APP).await.is_empty());
    assert_eq!(errors.count(), 0);

    // A rejected group submission is still an error.
    let client = MarathonClient::new(http_client(Duration::from_secs(5)).unwrap(), server.uri());
    let spec = cluster_spec("c1", &server.uri(), 3, 2, 2);
    assert!(client
        .create_group(&GroupDescriptor::for_cluster(&spec))
        .await
        .is_err());
    assert_eq!(errors.count(), 1);
}
