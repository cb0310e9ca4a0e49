use std::sync::Arc;
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;
use anyhow::Result;
use serde_json::Value;
use crate::error::MonitorError;
use crate::runtime::config::MonitorConfig;
use crate::runtime::elements::GraphSnapshot;
use crate::runtime::layout::{LayoutDirection, LayoutEngine};
use crate::runtime::pipeline::Pipeline;
use crate::runtime::session::{ConnectionState, MonitorSession, UpdateOutcome};
use crate::runtime::source::SampleSource;
use tracing::{debug, info, warn};

/// A raw transport message addressed to one session.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub session_id: Uuid,
    pub text: String,
}

/// Hosts any number of independent monitor sessions over one shared layout
/// backend. Messages are applied one at a time by `run_worker`.
pub struct Engine {
    config: MonitorConfig,
    pipeline: Arc<Pipeline>,

    sessions: DashMap<Uuid, MonitorSession>,

    message_sender: mpsc::Sender<InboundMessage>,
    message_receiver: Mutex<mpsc::Receiver<InboundMessage>>,
}

impl Engine {
    pub fn new(config: MonitorConfig) -> Self {
        let pipeline = Pipeline::from_config(&config);
        Self::with_pipeline(config, pipeline)
    }

    pub fn with_layout(config: MonitorConfig, layout: Arc<dyn LayoutEngine>) -> Self {
        Self::with_pipeline(config, Pipeline::new(layout))
    }

    fn with_pipeline(config: MonitorConfig, pipeline: Pipeline) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        Self {
            config,
            pipeline: Arc::new(pipeline),
            sessions: DashMap::new(),
            message_sender: tx,
            message_receiver: Mutex::new(rx),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn open_session(&self) -> Uuid {
        let session = MonitorSession::new(self.config.clone(), self.pipeline.clone());
        let id = session.id();
        self.sessions.insert(id, session);
        debug!(session = %id, "Session opened");
        id
    }

    pub fn close_session(&self, session_id: Uuid) -> bool {
        self.sessions.remove(&session_id).is_some()
    }

    fn with_session<T>(&self, session_id: Uuid, f: impl FnOnce(&mut MonitorSession) -> Result<T, MonitorError>) -> Result<T, MonitorError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(MonitorError::SessionNotFound(session_id))?;
        f(session.value_mut())
    }

    pub fn sender(&self) -> mpsc::Sender<InboundMessage> {
        self.message_sender.clone()
    }

    pub fn connect(&self, session_id: Uuid) -> Result<Value, MonitorError> {
        self.with_session(session_id, |s| s.connect())
    }

    pub fn on_open(&self, session_id: Uuid) -> Result<(), MonitorError> {
        self.with_session(session_id, |s| s.on_open())
    }

    pub fn disconnect(&self, session_id: Uuid) -> Result<Value, MonitorError> {
        self.with_session(session_id, |s| s.disconnect())
    }

    pub fn on_close(&self, session_id: Uuid) -> Result<(), MonitorError> {
        self.with_session(session_id, |s| {
            s.on_close();
            Ok(())
        })
    }

    pub fn apply(&self, session_id: Uuid, text: &str) -> Result<UpdateOutcome, MonitorError> {
        self.with_session(session_id, |s| s.apply_message(text))
    }

    /// Shows a static batch, e.g. a fixture while no stream is connected.
    pub fn load_batch(&self, session_id: Uuid, raw: &str) -> Result<UpdateOutcome, MonitorError> {
        self.with_session(session_id, |s| s.apply_batch(raw))
    }

    pub fn relayout(&self, session_id: Uuid, direction: LayoutDirection) -> Result<(), MonitorError> {
        self.with_session(session_id, |s| s.relayout(direction))
    }

    pub fn snapshot(&self, session_id: Uuid) -> Option<Arc<GraphSnapshot>> {
        self.sessions.get(&session_id).and_then(|s| s.snapshot())
    }

    pub fn state(&self, session_id: Uuid) -> Option<ConnectionState> {
        self.sessions.get(&session_id).map(|s| s.state())
    }

    pub fn notice(&self, session_id: Uuid) -> Option<String> {
        self.sessions
            .get(&session_id)
            .and_then(|s| s.notice().map(str::to_string))
    }

    /// Returns true when the graph changed.
    fn handle(&self, session_id: Uuid, text: &str) -> bool {
        match self.apply(session_id, text) {
            Ok(UpdateOutcome::Updated { revision, skipped_connections, layout_frozen }) => {
                debug!(session = %session_id, revision, skipped_connections, layout_frozen, "Graph updated");
                true
            }
            Ok(outcome) => {
                debug!(session = %session_id, ?outcome, "No graph change");
                false
            }
            Err(e) => {
                warn!(session = %session_id, error = %e, "Update dropped");
                false
            }
        }
    }

    /// Applies queued messages for the lifetime of the engine. The engine
    /// holds a sender itself, so callers stop the loop by dropping its future.
    pub async fn run_worker(&self) {
        let mut rx = self.message_receiver.lock().await;
        info!("Worker started.");

        while let Some(message) = rx.recv().await {
            self.handle(message.session_id, &message.text);
        }
    }

    /// Drains a source into one session. Returns how many updates changed
    /// the graph.
    pub async fn pump(&self, session_id: Uuid, source: &mut dyn SampleSource) -> Result<usize> {
        let mut updated = 0;
        while let Some(text) = source.next_message().await? {
            if self.handle(session_id, &text) {
                updated += 1;
            }
        }
        Ok(updated)
    }
}
