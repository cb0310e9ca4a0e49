use lgmon::compiler::core::Compiler;
use lgmon::compiler::loader;
use lgmon::runtime::config::MonitorConfig;
use lgmon::runtime::layout::LayoutDirection;
use std::fs;

#[test]
fn test_load_json_batch_keeps_text() {
    let content = r#"[[{"A": {}}, {"G": {"type": "Group", "connections": {"A": "B", "A": "C"}}}]]"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("batch.json");
    fs::write(&file_path, content).expect("Failed to write temp file");

    let loaded = loader::load_batch_from_file(&file_path.to_string_lossy(), &MonitorConfig::default())
        .expect("Failed to load batch");

    assert_eq!(loaded, content);

    temp_dir.close().expect("Failed to close temp dir");
}

#[test]
fn test_load_yaml_batch() {
    let yaml_content = r#"
- - NoiseGenerator: {}
  - RollingAverager:
      type: Node
      inputs: [RandomMessage]
- - RollingAverager: {}
  - Plot:
      state: PlotState
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("batch.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let loaded = loader::load_batch_from_file(&file_path.to_string_lossy(), &MonitorConfig::default())
        .expect("Failed to load batch");
    let compiled = Compiler::new().compile_str(&loaded).expect("Compilation failed");

    let keys: Vec<&str> = compiled.adjacency.iter().map(|(name, _)| name).collect();
    assert_eq!(keys, vec!["NoiseGenerator", "RollingAverager"]);
    // 后写入的描述符覆盖先前的
    let rolling = compiled.descriptors.get("RollingAverager").expect("descriptor");
    assert!(rolling.inputs.is_empty());
}

#[test]
fn test_load_recorded_stream_message() {
    let content = r#"{"stream_batch": {"labgraph.monitor": {"batch_num": 3, "samples": [
        {"data": [[{"N": {}}, {"R": {}}]]}
    ]}}}"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("message.json");
    fs::write(&file_path, content).expect("Failed to write temp file");

    let loaded = loader::load_batch_from_file(&file_path.to_string_lossy(), &MonitorConfig::default())
        .expect("Failed to load batch");

    assert_eq!(loaded, r#"[[{"N": {}}, {"R": {}}]]"#);
}

#[test]
fn test_load_object_without_stream_batch_fails() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("response.json");
    fs::write(&file_path, r#"{"api_response": {}}"#).expect("Failed to write temp file");

    let result = loader::load_batch_from_file(&file_path.to_string_lossy(), &MonitorConfig::default());

    assert!(result.is_err());
}

#[test]
fn test_load_missing_file_fails() {
    let result = loader::load_batch_from_file("/nonexistent/batch.json", &MonitorConfig::default());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to read batch file"));
}

#[test]
fn test_load_config() {
    let yaml_content = r#"
stream_id: "LABGRAPH.TOPOLOGY"
direction: horizontal
node_width: 200.0
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("monitor.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let config = loader::load_config_from_file(&file_path.to_string_lossy())
        .expect("Failed to load config");

    assert_eq!(config.stream_id, "LABGRAPH.TOPOLOGY");
    assert_eq!(config.stream_key(), "labgraph.topology");
    assert_eq!(config.direction, LayoutDirection::Horizontal);
    assert_eq!(config.node_width, 200.0);
    // 未给出的字段取默认值
    assert_eq!(config.node_height, 150.0);
    assert_eq!(config.api_version, "0.1");
    assert_eq!(config.channel_capacity, 100);
}
