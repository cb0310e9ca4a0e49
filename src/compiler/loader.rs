use anyhow::{Result, Context as AnyhowContext, anyhow};
use std::fs;
use std::path::Path;
use serde_json::Value;
use crate::runtime::config::MonitorConfig;
use crate::runtime::envelope::extract_sample;

fn is_yaml(file_path: &str) -> bool {
    matches!(
        Path::new(file_path).extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Reads a batch fixture and returns its wire JSON text.
///
/// Accepts either a bare batch or a full `stream_batch` message, in JSON or
/// YAML. JSON files are passed through untouched so duplicate keys survive.
pub fn load_batch_from_file(file_path: &str, config: &MonitorConfig) -> Result<String> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read batch file from {}", file_path))?;

    let text = if is_yaml(file_path) {
        let value: Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to deserialize YAML content from {}", file_path))?;
        serde_json::to_string(&value)?
    } else {
        content
    };

    if !text.trim_start().starts_with('{') {
        return Ok(text);
    }

    let sample = extract_sample(&text, config)
        .with_context(|| format!("Failed to read stream message from {}", file_path))?
        .ok_or_else(|| anyhow!("{} is an object but has no stream_batch", file_path))?;
    Ok(sample.get().to_string())
}

pub fn load_config_from_file(file_path: &str) -> Result<MonitorConfig> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read config file from {}", file_path))?;

    let config: MonitorConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to deserialize config from {}", file_path))?;

    Ok(config)
}
