//! Message router
//!
//! Maps message names to handlers. The table is built once; each dispatched
//! message runs on its own task so a slow handler (a publish, a branch list)
//! never holds up the next message. Unknown names are ignored.

pub mod messages;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::coordinator::LogicalConfig;
use crate::github::branch::BranchHandler;

pub use messages::{names, Inbound, Outbound};
pub use session::Session;

/// A message handler
pub type Handler = fn(Arc<Session>, Option<Value>) -> BoxFuture<'static, ()>;

/// Static name → handler table
pub struct Router {
    routes: HashMap<&'static str, Handler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        let table: [(&'static str, Handler); 8] = [
            (names::NOTIFY, handle_notify),
            (names::CLOSE, handle_close),
            (names::GET_VARIABLES, handle_get_variables),
            (names::SEND_TO_GITHUB, handle_send_to_github),
            (names::SAVE_CONFIG, handle_save_config),
            (names::GET_CONFIG, handle_get_config),
            (names::GET_BRANCHES, handle_get_branches),
            (names::PUBLISH, handle_publish),
        ];

        Self {
            routes: table.into_iter().collect(),
        }
    }

    /// Start handling a message
    ///
    /// Returns the handler task, or `None` when no handler is registered.
    pub fn dispatch(&self, session: Arc<Session>, message: Inbound) -> Option<JoinHandle<()>> {
        match self.routes.get(message.name.as_str()) {
            Some(handler) => {
                debug!(name = %message.name, "dispatching message");
                Some(tokio::spawn(handler(session, message.content)))
            }
            None => {
                debug!(name = %message.name, "ignoring unknown message");
                None
            }
        }
    }
}

fn handle_notify(session: Arc<Session>, content: Option<Value>) -> BoxFuture<'static, ()> {
    async move {
        let text = match content {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => return,
        };
        session.notify(text).await;
    }
    .boxed()
}

fn handle_close(session: Arc<Session>, _content: Option<Value>) -> BoxFuture<'static, ()> {
    async move {
        session.emit(Outbound::Close).await;
    }
    .boxed()
}

fn handle_get_variables(session: Arc<Session>, _content: Option<Value>) -> BoxFuture<'static, ()> {
    async move {
        match session.export_snapshot() {
            Ok(json) => session.emit(Outbound::Variables(json)).await,
            Err(e) => session.notify(format!("Export failed: {}", e)).await,
        }
    }
    .boxed()
}

fn handle_send_to_github(session: Arc<Session>, _content: Option<Value>) -> BoxFuture<'static, ()> {
    async move {
        match session.export_snapshot() {
            Ok(json) => session.emit(Outbound::ToGitHub(json)).await,
            Err(e) => session.notify(format!("Export failed: {}", e)).await,
        }
    }
    .boxed()
}

fn handle_save_config(session: Arc<Session>, content: Option<Value>) -> BoxFuture<'static, ()> {
    async move {
        let config: LogicalConfig = match serde_json::from_value(content.unwrap_or(Value::Null)) {
            Ok(config) => config,
            Err(e) => {
                warn!("rejected save-config payload: {}", e);
                session
                    .notify(format!("Invalid configuration: {}", e))
                    .await;
                return;
            }
        };

        match session.coordinator.save(&config) {
            Ok(()) => session.notify("Data saved!").await,
            Err(e) => session.notify(format!("Saving failed: {}", e)).await,
        }
    }
    .boxed()
}

fn handle_get_config(session: Arc<Session>, _content: Option<Value>) -> BoxFuture<'static, ()> {
    async move {
        let config = session.coordinator.load();
        session.emit(Outbound::ReceiveConfig(config)).await;
    }
    .boxed()
}

fn handle_get_branches(session: Arc<Session>, _content: Option<Value>) -> BoxFuture<'static, ()> {
    async move {
        if !session.coordinator.load().missing_required().is_empty() {
            session.notify("Owner, repo, or auth token missing.").await;
            return;
        }

        let remote = match session.connect() {
            Ok(remote) => remote,
            Err(e) => {
                session.notify(format!("Error fetching branches: {}", e)).await;
                return;
            }
        };

        match BranchHandler::new(remote.as_ref()).names().await {
            Ok(branches) => {
                session.emit(Outbound::Branches(branches)).await;
                session.notify("Branches updated.").await;
            }
            Err(e) => {
                warn!("branch listing failed: {}", e);
                session.notify(format!("Error fetching branches: {}", e)).await;
            }
        }
    }
    .boxed()
}

fn handle_publish(session: Arc<Session>, _content: Option<Value>) -> BoxFuture<'static, ()> {
    async move {
        session.notify("Sending to GitHub...").await;

        let payload = match session.export_snapshot() {
            Ok(json) => json,
            Err(e) => {
                session.notify(format!("Export failed: {}", e)).await;
                return;
            }
        };

        let config = session.coordinator.load();
        let report = session.publisher.publish(&config, &payload).await;
        let message = report.message();

        session.emit(Outbound::Published(report)).await;
        session.notify(message).await;
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use crate::core::config::Settings;
    use crate::core::coordinator::{ConfigCoordinator, Secret};
    use crate::core::snapshot::{ResolvedType, Variable, VariableCollection, VariableSource};
    use crate::core::storage::MemoryStorage;
    use crate::error::{FigsyncError, Result};
    use crate::github::contents::{
        CommitRef, FileWrite, MockRemoteRepository, RemoteConnector, RemoteRepository,
    };

    struct OneCollection;

    impl VariableSource for OneCollection {
        fn local_variables(&self) -> Result<Vec<Variable>> {
            Ok(vec![Variable {
                id: "v1".into(),
                name: "spacing/sm".into(),
                key: String::new(),
                variable_collection_id: "c1".into(),
                resolved_type: ResolvedType::Float,
                description: String::new(),
                hidden_from_publishing: false,
                remote: false,
                scopes: vec![],
                code_syntax: BTreeMap::new(),
                values_by_mode: BTreeMap::new(),
            }])
        }

        fn local_collections(&self) -> Result<Vec<VariableCollection>> {
            Ok(vec![VariableCollection {
                id: "c1".into(),
                name: "Spacing".into(),
                key: String::new(),
                default_mode_id: String::new(),
                hidden_from_publishing: false,
                remote: false,
                modes: vec![],
                variable_ids: vec!["v1".into()],
            }])
        }
    }

    /// Connector that builds a fresh mock per connection
    struct MockConnector {
        factory: fn() -> MockRemoteRepository,
        connects: AtomicUsize,
    }

    impl RemoteConnector for MockConnector {
        fn connect(&self, _config: &LogicalConfig) -> Result<Arc<dyn RemoteRepository>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new((self.factory)()))
        }
    }

    fn unused_remote() -> MockRemoteRepository {
        MockRemoteRepository::new()
    }

    fn session_with(
        factory: fn() -> MockRemoteRepository,
    ) -> (Arc<Session>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(16);
        let coordinator = ConfigCoordinator::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        );
        let connector = Arc::new(MockConnector {
            factory,
            connects: AtomicUsize::new(0),
        });
        let session = Session::new(
            coordinator,
            Arc::new(OneCollection),
            connector,
            &Settings::default(),
            tx,
        );
        (Arc::new(session), rx)
    }

    async fn run(router: &Router, session: &Arc<Session>, name: &str, content: Option<Value>) {
        router
            .dispatch(session.clone(), Inbound::new(name, content))
            .expect("handler registered")
            .await
            .unwrap();
    }

    fn save_connection(session: &Session) {
        let config = LogicalConfig {
            owner: "acme".into(),
            repo: "tokens".into(),
            secret: Secret::new("tok"),
            ..LogicalConfig::default()
        };
        session.coordinator.save(&config).unwrap();
    }

    fn expect_notify(message: Option<Outbound>, expected: &str) {
        match message {
            Some(Outbound::Notify(text)) => assert_eq!(text, expected),
            other => panic!("expected notify '{}', got {:?}", expected, other),
        }
    }

    #[tokio::test]
    async fn test_unknown_message_is_ignored() {
        let (session, mut rx) = session_with(unused_remote);
        let router = Router::new();

        assert!(router
            .dispatch(session, Inbound::new("no-such-message", None))
            .is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_save_then_get_config() {
        let (session, mut rx) = session_with(unused_remote);
        let router = Router::new();

        run(
            &router,
            &session,
            names::SAVE_CONFIG,
            Some(serde_json::json!({
                "owner": "acme",
                "repo": "design-tokens",
                "path": "tokens.json",
                "branch": "",
                "auth": "tok_123"
            })),
        )
        .await;
        expect_notify(rx.recv().await, "Data saved!");

        run(&router, &session, names::GET_CONFIG, None).await;
        match rx.recv().await {
            Some(Outbound::ReceiveConfig(config)) => {
                assert_eq!(config.owner, "acme");
                assert_eq!(config.path, "tokens.json");
                assert_eq!(config.secret.expose(), "tok_123");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_config_with_null_fields_keeps_the_rest() {
        let (session, mut rx) = session_with(unused_remote);
        let router = Router::new();
        let form = serde_json::json!({
            "owner": "acme",
            "repo": "tokens",
            "path": null,
            "branch": null,
            "auth": "tok"
        });

        run(&router, &session, names::SAVE_CONFIG, Some(form)).await;
        expect_notify(rx.recv().await, "Data saved!");

        let config = session.coordinator.load();
        assert_eq!(config.owner, "acme");
        assert_eq!(config.repo, "tokens");
        assert_eq!(config.path, "");
        assert_eq!(config.secret.expose(), "tok");
    }

    #[tokio::test]
    async fn test_get_variables_and_send_to_github_emit_same_snapshot() {
        let (session, mut rx) = session_with(unused_remote);
        let router = Router::new();

        run(&router, &session, names::GET_VARIABLES, None).await;
        run(&router, &session, names::SEND_TO_GITHUB, None).await;

        let variables = match rx.recv().await {
            Some(Outbound::Variables(json)) => json,
            other => panic!("unexpected message: {:?}", other),
        };
        let to_github = match rx.recv().await {
            Some(Outbound::ToGitHub(json)) => json,
            other => panic!("unexpected message: {:?}", other),
        };
        assert_eq!(variables, to_github);
        assert!(variables.contains("spacing/sm"));
    }

    #[tokio::test]
    async fn test_notify_and_close_pass_through() {
        let (session, mut rx) = session_with(unused_remote);
        let router = Router::new();

        run(&router, &session, names::NOTIFY, Some(Value::from("hello"))).await;
        expect_notify(rx.recv().await, "hello");

        run(&router, &session, names::CLOSE, None).await;
        assert!(matches!(rx.recv().await, Some(Outbound::Close)));
    }

    #[tokio::test]
    async fn test_get_branches_requires_config() {
        let (session, mut rx) = session_with(unused_remote);
        let router = Router::new();

        run(&router, &session, names::GET_BRANCHES, None).await;
        expect_notify(rx.recv().await, "Owner, repo, or auth token missing.");
    }

    fn branch_remote() -> MockRemoteRepository {
        let mut remote = MockRemoteRepository::new();
        remote
            .expect_default_branch()
            .returning(|| Ok("main".to_string()));
        remote
            .expect_list_branches()
            .returning(|| Ok(vec!["dev".to_string(), "main".to_string()]));
        remote
    }

    #[tokio::test]
    async fn test_get_branches_lists_default_first() {
        let (session, mut rx) = session_with(branch_remote);
        let router = Router::new();
        save_connection(&session);

        run(&router, &session, names::GET_BRANCHES, None).await;
        match rx.recv().await {
            Some(Outbound::Branches(names)) => assert_eq!(names, vec!["main", "dev"]),
            other => panic!("unexpected message: {:?}", other),
        }
        expect_notify(rx.recv().await, "Branches updated.");
    }

    fn publish_remote() -> MockRemoteRepository {
        let mut remote = MockRemoteRepository::new();
        remote
            .expect_default_branch()
            .returning(|| Ok("main".to_string()));
        remote.expect_get_file().returning(|_, _| Ok(None));
        remote.expect_put_file().returning(|write: &FileWrite| {
            assert_eq!(write.path, "figma.json");
            assert!(write.sha.is_none());
            Ok(CommitRef {
                sha: "abc".into(),
                html_url: "https://github.com/acme/tokens/commit/abc".into(),
            })
        });
        remote
    }

    #[tokio::test]
    async fn test_publish_reports_and_notifies() {
        let (session, mut rx) = session_with(publish_remote);
        let router = Router::new();
        save_connection(&session);

        run(&router, &session, names::PUBLISH, None).await;

        expect_notify(rx.recv().await, "Sending to GitHub...");
        match rx.recv().await {
            Some(Outbound::Published(report)) => assert_eq!(report.status(), "created"),
            other => panic!("unexpected message: {:?}", other),
        }
        expect_notify(
            rx.recv().await,
            "Created via https://github.com/acme/tokens/commit/abc",
        );
    }

    #[tokio::test]
    async fn test_publish_without_config_fails_cleanly() {
        let (session, mut rx) = session_with(unused_remote);
        let router = Router::new();

        run(&router, &session, names::PUBLISH, None).await;

        expect_notify(rx.recv().await, "Sending to GitHub...");
        match rx.recv().await {
            Some(Outbound::Published(report)) => {
                assert_eq!(report.error().map(|e| e.kind()), Some("config_incomplete"))
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    fn slow_remote() -> MockRemoteRepository {
        let mut remote = MockRemoteRepository::new();
        remote.expect_default_branch().returning(|| {
            std::thread::sleep(Duration::from_millis(300));
            Err(FigsyncError::GitHubApi("slow failure".into()))
        });
        remote
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_handler_does_not_block_others() {
        let (session, mut rx) = session_with(slow_remote);
        let router = Router::new();
        save_connection(&session);

        let slow = router
            .dispatch(session.clone(), Inbound::new(names::GET_BRANCHES, None))
            .unwrap();
        run(&router, &session, names::NOTIFY, Some(Value::from("fast"))).await;

        expect_notify(rx.recv().await, "fast");
        slow.await.unwrap();
    }
}
