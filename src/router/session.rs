//! Per-panel session context
//!
//! Every handler receives the session explicitly instead of reading global
//! state. Configuration is reloaded from storage on each use.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::config::Settings;
use crate::core::coordinator::ConfigCoordinator;
use crate::core::snapshot::{SnapshotExporter, VariableSource};
use crate::error::Result;
use crate::github::contents::{RemoteConnector, RemoteRepository};
use crate::github::publish::Publisher;
use crate::router::messages::Outbound;

/// Everything a message handler can reach
pub struct Session {
    pub coordinator: ConfigCoordinator,
    pub publisher: Publisher,
    source: Arc<dyn VariableSource>,
    connector: Arc<dyn RemoteConnector>,
    outbound: mpsc::Sender<Outbound>,
    /// Selection last reported to the UI
    last_selection: Mutex<Option<Value>>,
}

impl Session {
    pub fn new(
        coordinator: ConfigCoordinator,
        source: Arc<dyn VariableSource>,
        connector: Arc<dyn RemoteConnector>,
        settings: &Settings,
        outbound: mpsc::Sender<Outbound>,
    ) -> Self {
        Self {
            coordinator,
            publisher: Publisher::new(connector.clone(), settings),
            source,
            connector,
            outbound,
            last_selection: Mutex::new(None),
        }
    }

    /// Send a message to the UI or host
    ///
    /// A closed channel means the panel is gone; the message is dropped.
    pub async fn emit(&self, message: Outbound) {
        let name = message.name();
        if self.outbound.send(message).await.is_err() {
            debug!(name, "outbound channel closed, dropping message");
        }
    }

    /// Show text to the user
    pub async fn notify(&self, text: impl Into<String>) {
        self.emit(Outbound::Notify(text.into())).await;
    }

    /// Report the document selection if it differs from the last report
    ///
    /// The first call always reports.
    pub async fn refresh_selection(&self) {
        let selection = match self.source.selection() {
            Ok(selection) => selection,
            Err(e) => {
                warn!("could not read selection: {}", e);
                return;
            }
        };

        if self.record_selection(&selection) {
            self.emit(Outbound::SelectionChanged(selection)).await;
        }
    }

    /// Remember `selection`; true when it differs from the previous one
    fn record_selection(&self, selection: &Value) -> bool {
        let Ok(mut last) = self.last_selection.lock() else {
            warn!("selection state poisoned");
            return false;
        };
        if last.as_ref() == Some(selection) {
            return false;
        }
        *last = Some(selection.clone());
        true
    }

    /// Export the current document as canonical snapshot JSON
    pub fn export_snapshot(&self) -> Result<String> {
        SnapshotExporter::export_json(self.source.as_ref())
    }

    /// Open the remote for the currently saved configuration
    pub fn connect(&self) -> Result<Arc<dyn RemoteRepository>> {
        let config = self.coordinator.load();
        self.connector.connect(&config)
    }
}
