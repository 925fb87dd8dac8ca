//! Serve command: the message router over stdin/stdout
//!
//! Each input line is one `{"name", "content"}` message; each output line is
//! one outbound message. The session ends on `close` or end of input, after
//! in-flight handlers have finished.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::config::Settings;
use crate::error::{FigsyncError, Result};
use crate::github::contents::{GitHubConnector, RemoteConnector};
use crate::router::{names, Inbound, Outbound, Router, Session};

const OUTBOUND_CAPACITY: usize = 64;

/// Handle the serve command
pub async fn handle_serve(document: &Path) -> Result<()> {
    let settings = Settings::load()?;
    let document = super::open_document(document);
    let coordinator = super::coordinator_for(document.clone());
    let connector: Arc<dyn RemoteConnector> =
        Arc::new(GitHubConnector::new(settings.api_base_url.clone()));

    let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let session = Session::new(coordinator, document, connector, &settings, tx);

    run_session(session, rx, tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}

/// Drive one session until `close` or end of input
///
/// The document selection is reported on start and re-checked before each
/// message. Returns the output sink once every message has been written.
pub async fn run_session<R, W>(
    session: Session,
    rx: mpsc::Receiver<Outbound>,
    input: R,
    output: W,
) -> Result<W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = tokio::spawn(write_messages(rx, output));
    let session = Arc::new(session);
    let router = Router::new();

    session.refresh_selection().await;

    let mut lines = BufReader::new(input).lines();
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message = match Inbound::from_line(line) {
            Ok(message) => message,
            Err(e) => {
                warn!("skipping malformed message: {}", e);
                continue;
            }
        };

        session.refresh_selection().await;

        let closing = message.name == names::CLOSE;
        if let Some(handle) = router.dispatch(session.clone(), message) {
            in_flight.push(handle);
        }
        in_flight.retain(|handle| !handle.is_finished());

        if closing {
            debug!("close requested, stopping input");
            break;
        }
    }

    for handle in in_flight {
        if let Err(e) = handle.await {
            warn!("message handler failed: {}", e);
        }
    }

    // Last sender goes away here, which ends the writer
    drop(session);

    writer
        .await
        .map_err(|e| FigsyncError::Custom(format!("Output writer failed: {}", e)))?
}

async fn write_messages<W>(mut rx: mpsc::Receiver<Outbound>, mut output: W) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_string(&message.to_wire()?)?;
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinator::ConfigCoordinator;
    use crate::core::document::DocumentFile;
    use crate::core::storage::{MemoryStorage, StorageTier};
    use serde_json::{json, Value};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::io::{duplex, DuplexStream, Lines};

    struct Harness {
        shared: Arc<MemoryStorage>,
        private: Arc<MemoryStorage>,
        dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                shared: Arc::new(MemoryStorage::new()),
                private: Arc::new(MemoryStorage::new()),
                dir: TempDir::new().unwrap(),
            }
        }

        fn document_path(&self) -> PathBuf {
            self.dir.path().join("doc.json")
        }

        fn coordinator(&self) -> ConfigCoordinator {
            let shared: Arc<dyn StorageTier> = self.shared.clone();
            let private: Arc<dyn StorageTier> = self.private.clone();
            ConfigCoordinator::new(shared, private)
        }

        fn session(&self) -> (Session, mpsc::Receiver<Outbound>) {
            let document = Arc::new(DocumentFile::open(self.document_path()));
            let connector: Arc<dyn RemoteConnector> =
                Arc::new(GitHubConnector::new("http://127.0.0.1:9"));
            let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
            let session = Session::new(
                self.coordinator(),
                document,
                connector,
                &Settings::default(),
                tx,
            );
            (session, rx)
        }

        async fn run(&self, input: &str) -> Vec<Value> {
            let (session, rx) = self.session();
            let output = run_session(session, rx, input.as_bytes(), Vec::new())
                .await
                .unwrap();

            String::from_utf8(output)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }

        fn write_selection(&self, selection: Value) {
            let document = json!({ "selection": selection });
            fs::write(self.document_path(), document.to_string()).unwrap();
        }
    }

    async fn next_message(lines: &mut Lines<BufReader<DuplexStream>>) -> Value {
        let line = lines.next_line().await.unwrap().expect("output ended early");
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_selection_changed_is_first() {
        let harness = Harness::new();
        harness.write_selection(json!([{ "id": "1:2" }]));
        let out = harness.run("").await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["name"], "SelectionChanged");
        assert_eq!(out[0]["content"][0]["id"], "1:2");
    }

    #[tokio::test]
    async fn test_unchanged_selection_is_not_repeated() {
        let harness = Harness::new();
        let out = harness
            .run("{\"name\":\"get-config\"}\n{\"name\":\"get-config\"}\n")
            .await;

        let seen: Vec<&str> = out.iter().filter_map(|m| m["name"].as_str()).collect();
        assert_eq!(
            seen,
            vec!["SelectionChanged", "RECEIVE-CONFIG", "RECEIVE-CONFIG"]
        );
    }

    #[tokio::test]
    async fn test_selection_edit_mid_session_is_reported() {
        let harness = Harness::new();
        harness.write_selection(json!([]));

        let (session, rx) = harness.session();
        let (mut input, input_end) = duplex(4096);
        let (output_end, output) = duplex(4096);
        let running = tokio::spawn(run_session(session, rx, input_end, output_end));
        let mut lines = BufReader::new(output).lines();

        assert_eq!(next_message(&mut lines).await["name"], "SelectionChanged");

        input.write_all(b"{\"name\":\"get-config\"}\n").await.unwrap();
        assert_eq!(next_message(&mut lines).await["name"], "RECEIVE-CONFIG");

        harness.write_selection(json!([{ "id": "4:2", "type": "FRAME" }]));
        input.write_all(b"{\"name\":\"get-config\"}\n").await.unwrap();

        let changed = next_message(&mut lines).await;
        assert_eq!(changed["name"], "SelectionChanged");
        assert_eq!(changed["content"][0]["id"], "4:2");
        assert_eq!(next_message(&mut lines).await["name"], "RECEIVE-CONFIG");

        drop(input);
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_save_config_persists_and_notifies() {
        let harness = Harness::new();
        let input = concat!(
            r#"{"name":"save-config","content":{"owner":"acme","repo":"tokens","#,
            r#""path":"","branch":"","auth":"tok_1"}}"#,
            "\n",
        );

        let out = harness.run(input).await;
        assert_eq!(out[1]["name"], "notify");
        assert_eq!(out[1]["content"], "Data saved!");

        let config = harness.coordinator().load();
        assert_eq!(config.owner, "acme");
        assert_eq!(config.secret.expose(), "tok_1");
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_lines_are_skipped() {
        let harness = Harness::new();
        let input = "not json\n\n{\"name\":\"bogus\"}\n{\"name\":\"get-config\"}\n";

        let out = harness.run(input).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[1]["name"], "RECEIVE-CONFIG");
        assert_eq!(out[1]["content"]["owner"], "");
    }

    #[tokio::test]
    async fn test_close_stops_reading() {
        let harness = Harness::new();
        let input = "{\"name\":\"close\"}\n{\"name\":\"get-config\"}\n";

        let out = harness.run(input).await;
        let seen: Vec<&str> = out.iter().filter_map(|m| m["name"].as_str()).collect();
        assert_eq!(seen, vec!["SelectionChanged", "close"]);
    }
}
