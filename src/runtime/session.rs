use crate::error::MonitorError;
use crate::runtime::config::MonitorConfig;
use crate::runtime::elements::GraphSnapshot;
use crate::runtime::envelope::{end_stream_request, extract_sample, start_stream_request};
use crate::runtime::layout::LayoutDirection;
use crate::runtime::pipeline::Pipeline;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const MALFORMED_NOTICE: &str = "graph data malformed";

/// 传输连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated {
        revision: u64,
        skipped_connections: usize,
        layout_frozen: bool,
    },
    /// Same data as the current snapshot.
    Unchanged,
    /// Not a stream batch, or the session is not accepting live data.
    Ignored,
}

/// 一个 UI 实例的监控会话
///
/// Owns the last good snapshot. Every failure leaves that snapshot in place.
pub struct MonitorSession {
    id: Uuid,
    config: MonitorConfig,
    pipeline: Arc<Pipeline>,
    state: ConnectionState,
    direction: LayoutDirection,
    snapshot: Option<Arc<GraphSnapshot>>,
    last_data: Option<String>,
    notice: Option<String>,
    next_request_id: u64,
}

impl MonitorSession {
    pub fn new(config: MonitorConfig, pipeline: Arc<Pipeline>) -> Self {
        Self {
            id: Uuid::new_v4(),
            direction: config.direction,
            config,
            pipeline,
            state: ConnectionState::Disconnected,
            snapshot: None,
            last_data: None,
            notice: None,
            next_request_id: 1,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    pub fn snapshot(&self) -> Option<Arc<GraphSnapshot>> {
        self.snapshot.clone()
    }

    /// User-visible message left by the last failed update.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Returns the start-stream request to send once the socket is open.
    pub fn connect(&mut self) -> Result<Value, MonitorError> {
        if self.state != ConnectionState::Disconnected {
            return Err(MonitorError::InvalidTransition { action: "connect", state: self.state });
        }
        self.state = ConnectionState::Connecting;
        let request_id = self.request_id();
        Ok(start_stream_request(&self.config, request_id))
    }

    pub fn on_open(&mut self) -> Result<(), MonitorError> {
        if self.state != ConnectionState::Connecting {
            return Err(MonitorError::InvalidTransition { action: "open", state: self.state });
        }
        self.state = ConnectionState::Connected;
        info!(session = %self.id, stream_id = %self.config.stream_id, "Stream connected");
        Ok(())
    }

    /// Transport error: drop to disconnected, keep the graph.
    pub fn on_error(&mut self) {
        warn!(session = %self.id, state = ?self.state, "Transport error, freezing graph");
        self.state = ConnectionState::Disconnected;
    }

    /// Returns the end-stream request. The current snapshot stays frozen and
    /// live messages are ignored until the next `connect`.
    pub fn disconnect(&mut self) -> Result<Value, MonitorError> {
        match self.state {
            ConnectionState::Connected | ConnectionState::Connecting => {
                self.state = ConnectionState::Disconnecting;
                let request_id = self.request_id();
                Ok(end_stream_request(&self.config, request_id))
            }
            state => Err(MonitorError::InvalidTransition { action: "disconnect", state }),
        }
    }

    pub fn on_close(&mut self) {
        self.state = ConnectionState::Disconnected;
        info!(
            session = %self.id,
            revision = ?self.snapshot.as_ref().map(|s| s.revision),
            "Stream closed, keeping last graph"
        );
    }

    /// Applies one raw transport message.
    pub fn apply_message(&mut self, text: &str) -> Result<UpdateOutcome, MonitorError> {
        if self.state != ConnectionState::Connected {
            debug!(session = %self.id, state = ?self.state, "Ignoring message while not connected");
            return Ok(UpdateOutcome::Ignored);
        }

        let data = match extract_sample(text, &self.config) {
            Ok(Some(data)) => data,
            Ok(None) => return Ok(UpdateOutcome::Ignored),
            Err(e) => {
                warn!(session = %self.id, error = %e, "Malformed stream message");
                self.notice = Some(MALFORMED_NOTICE.to_string());
                return Err(e.into());
            }
        };
        self.apply_batch(data.get())
    }

    /// Applies the wire text of a batch directly, whatever the connection
    /// state. Used for static fixtures as well as live samples.
    pub fn apply_batch(&mut self, raw: &str) -> Result<UpdateOutcome, MonitorError> {
        // A frozen layout is retried even for the same data.
        let positioned = self.snapshot.as_ref().is_some_and(|s| s.positioned);
        if positioned && self.last_data.as_deref() == Some(raw) {
            return Ok(UpdateOutcome::Unchanged);
        }

        let output = match self.pipeline.run(raw, self.direction, self.snapshot.as_deref()) {
            Ok(output) => output,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Dropping malformed batch");
                self.notice = Some(MALFORMED_NOTICE.to_string());
                return Err(e.into());
            }
        };

        self.notice = None;
        self.last_data = Some(raw.to_string());

        let outcome = UpdateOutcome::Updated {
            revision: output.snapshot.revision,
            skipped_connections: output.missing.len(),
            layout_frozen: output.layout_error.is_some(),
        };
        self.snapshot = Some(Arc::new(output.snapshot));
        Ok(outcome)
    }

    /// Switches direction and lays out the current graph again. On failure
    /// the previous snapshot stays.
    pub fn relayout(&mut self, direction: LayoutDirection) -> Result<(), MonitorError> {
        self.direction = direction;
        let Some(current) = self.snapshot.as_ref() else {
            return Ok(());
        };
        let next = self.pipeline.relayout(current, direction)?;
        self.snapshot = Some(Arc::new(next));
        Ok(())
    }
}
