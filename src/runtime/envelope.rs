//! Wire envelopes exchanged with the monitor stream endpoint.
//!
//! Incoming messages carry the graph description as
//! `{"stream_batch": {"<stream>": {"samples": [{"data": <batch>}]}}}`.
//! Outgoing control requests open and close that stream; neither is
//! acknowledged.

use crate::error::EnvelopeError;
use crate::runtime::config::MonitorConfig;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct StreamMessage {
    #[serde(default)]
    /// Streams other than ours are never parsed.
    pub stream_batch: Option<HashMap<String, Box<RawValue>>>,
}

#[derive(Debug, Deserialize)]
pub struct StreamBatch {
    #[serde(default)]
    pub batch_num: Option<u64>,
    #[serde(default)]
    pub samples: Vec<StreamSample>,
}

#[derive(Debug, Deserialize)]
pub struct StreamSample {
    /// Left unparsed so the decoder sees duplicate keys as sent.
    pub data: Box<RawValue>,
}

/// Pulls the first sample's data for this stream out of a raw message.
///
/// Returns `Ok(None)` for messages that are not stream batches. Any samples
/// after the first are ignored.
pub fn extract_sample(text: &str, config: &MonitorConfig) -> Result<Option<Box<RawValue>>, EnvelopeError> {
    let message: StreamMessage =
        serde_json::from_str(text).map_err(|e| EnvelopeError::Json(e.to_string()))?;
    let Some(mut batches) = message.stream_batch else {
        return Ok(None);
    };

    let raw = batches
        .remove(&config.stream_id)
        .or_else(|| batches.remove(&config.stream_key()))
        .ok_or_else(|| EnvelopeError::MissingStream(config.stream_id.clone()))?;
    let batch: StreamBatch =
        serde_json::from_str(raw.get()).map_err(|e| EnvelopeError::Json(e.to_string()))?;

    if batch.samples.len() > 1 {
        debug!(
            stream_id = %config.stream_id,
            batch_num = ?batch.batch_num,
            "Ignoring {} extra samples",
            batch.samples.len() - 1
        );
    }

    let sample = batch
        .samples
        .into_iter()
        .next()
        .ok_or_else(|| EnvelopeError::NoSamples(config.stream_id.clone()))?;
    Ok(Some(sample.data))
}

fn control_request(kind: &str, config: &MonitorConfig, request_id: u64) -> Value {
    let mut stream = Map::new();
    stream.insert("stream_id".to_string(), json!(config.stream_id));
    stream.insert(config.stream_key(), json!({}));

    let mut request = Map::new();
    request.insert("request_id".to_string(), json!(request_id));
    request.insert(kind.to_string(), Value::Object(stream));

    json!({
        "api_version": config.api_version,
        "api_request": request,
    })
}

pub fn start_stream_request(config: &MonitorConfig, request_id: u64) -> Value {
    control_request("start_stream_request", config, request_id)
}

pub fn end_stream_request(config: &MonitorConfig, request_id: u64) -> Value {
    control_request("end_stream_request", config, request_id)
}
