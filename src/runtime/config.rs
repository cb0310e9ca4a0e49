use crate::runtime::layout::{LayeredLayout, LayoutDirection};
use serde::{Serialize, Deserialize};

/// 监控配置 (YAML / JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Stream the monitor subscribes to. The batch key is its lowercase form.
    pub stream_id: String,
    pub api_version: String,
    pub direction: LayoutDirection,
    pub node_width: f64,
    pub node_height: f64,
    pub rank_sep: f64,
    pub node_sep: f64,
    /// Capacity of the engine's inbound message channel.
    pub channel_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let layout = LayeredLayout::default();
        Self {
            stream_id: "LABGRAPH.MONITOR".to_string(),
            api_version: "0.1".to_string(),
            direction: LayoutDirection::Vertical,
            node_width: layout.node_width,
            node_height: layout.node_height,
            rank_sep: layout.rank_sep,
            node_sep: layout.node_sep,
            channel_capacity: 100,
        }
    }
}

impl MonitorConfig {
    pub fn layered_layout(&self) -> LayeredLayout {
        LayeredLayout {
            node_width: self.node_width,
            node_height: self.node_height,
            rank_sep: self.rank_sep,
            node_sep: self.node_sep,
        }
    }

    /// Key of this stream inside a `stream_batch` object.
    pub fn stream_key(&self) -> String {
        self.stream_id.to_lowercase()
    }
}
