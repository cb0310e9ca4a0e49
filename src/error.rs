use thiserror::Error;

use crate::runtime::session::ConnectionState;

/// 批次结构错误：pair-entry 形状不合法或描述符无法解析
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("batch must be an array of pair-entries")]
    NotABatch,
    #[error("pair-entry {index} is not an array")]
    NotAPair { index: usize },
    #[error("pair-entry {index} has {len} elements, expected 2")]
    PairArity { index: usize, len: usize },
    #[error("pair-entry {index} element {position} is not an object")]
    NotAnObject { index: usize, position: usize },
    #[error("pair-entry {index} element {position} has {keys} keys, expected exactly 1")]
    KeyCount { index: usize, position: usize, keys: usize },
    #[error("descriptor for '{name}' is invalid: {reason}")]
    InvalidDescriptor { name: String, reason: String },
}

/// A group's `connections` map names a node that no pair-entry declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("group '{group}' wires '{upstream}' -> '{downstream}' but '{missing}' has no descriptor")]
pub struct MissingDescriptorError {
    pub group: String,
    pub upstream: String,
    pub downstream: String,
    pub missing: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("node '{0}' appears more than once")]
    DuplicateNode(String),
    #[error("edge '{edge}' references unknown node '{node}'")]
    UnknownEndpoint { edge: String, node: String },
    #[error("layout returned no position for node '{0}'")]
    Incomplete(String),
    #[error("layout backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("message is not valid JSON: {0}")]
    Json(String),
    #[error("stream batch has no entry for stream '{0}'")]
    MissingStream(String),
    #[error("stream '{0}' delivered a batch with no samples")]
    NoSamples(String),
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("cannot {action} while {state:?}")]
    InvalidTransition { action: &'static str, state: ConnectionState },
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
}
