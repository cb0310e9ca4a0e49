use lgmon::compiler::decoder::decode_batch;
use lgmon::dsl::builder::BatchBuilder;
use lgmon::dsl::{NodeDescriptor, NodeKind, SchemaSpec};
use serde_json::json;

#[test]
fn test_build_batch_with_group() {
    let batch = BatchBuilder::new()
        .node("NoiseGenerator")
            .config(SchemaSpec::named("NoiseGeneratorConfig", &[("sample_rate", "float")]))
            .output("RandomMessage", &[("timestamp", "float"), ("data", "np.ndarray")])
            .build()
        .group("AveragedNoise")
            .connect("NoiseGenerator", "RollingAverager")
            .connect("RollingAverager", "AveragedNoise")
            .build()
        .pair("NoiseGenerator", "RollingAverager")
        .pair("RollingAverager", "AveragedNoise")
        .build();

    assert_eq!(batch.entries.len(), 2);

    // 未声明的节点使用默认描述符
    let rolling = &batch.entries[0].downstream;
    assert_eq!(rolling.name, "RollingAverager");
    assert_eq!(rolling.kind, NodeKind::Node);
    assert!(rolling.outputs.is_empty());

    let group = &batch.entries[1].downstream;
    assert_eq!(group.kind, NodeKind::Group);
    let wiring: Vec<(&str, &str)> = group.group_connections().expect("group has connections").iter().collect();
    assert_eq!(
        wiring,
        vec![("NoiseGenerator", "RollingAverager"), ("RollingAverager", "AveragedNoise")]
    );
}

#[test]
fn test_schema_forms() {
    let descriptor: NodeDescriptor = serde_json::from_value(json!({
        "type": "Node",
        "state": "PlotState",
        "config": { "RollingConfig": { "window": "float" } },
        "inputs": ["RandomMessage"],
        "outputs": [{ "RandomMessage": { "timestamp": "float" } }]
    }))
    .expect("descriptor should parse");

    assert_eq!(descriptor.state, Some(SchemaSpec::reference("PlotState")));
    assert_eq!(descriptor.config, Some(SchemaSpec::named("RollingConfig", &[("window", "float")])));
    assert_eq!(descriptor.inputs, vec![SchemaSpec::reference("RandomMessage")]);
    assert_eq!(descriptor.outputs[0].name(), "RandomMessage");
    assert_eq!(descriptor.connections, None);
}

#[test]
fn test_schema_with_two_names_is_rejected() {
    let result = serde_json::from_value::<NodeDescriptor>(json!({
        "config": { "A": {}, "B": {} }
    }));
    assert!(result.is_err());
}

#[test]
fn test_defaults_for_sparse_descriptor() {
    let descriptor: NodeDescriptor = serde_json::from_value(json!({})).expect("empty descriptor should parse");
    assert_eq!(descriptor.kind, NodeKind::Node);
    assert!(descriptor.inputs.is_empty());
    assert!(descriptor.outputs.is_empty());
    assert!(descriptor.group_connections().is_none());
}

#[test]
fn test_connections_keep_duplicate_keys() {
    // serde_json::Value 会合并重复键，所以直接从文本解析
    let descriptor: NodeDescriptor = serde_json::from_str(
        r#"{
            "type": "Group",
            "connections": {
                "RollingAverager": "Node4",
                "RollingAverager": "Node5",
                "Node2": ["Node6", "Node7"]
            }
        }"#,
    )
    .expect("descriptor should parse");

    let wiring: Vec<(&str, &str)> = descriptor.group_connections().expect("connections").iter().collect();
    assert_eq!(
        wiring,
        vec![
            ("RollingAverager", "Node4"),
            ("RollingAverager", "Node5"),
            ("Node2", "Node6"),
            ("Node2", "Node7"),
        ]
    );
}

#[test]
fn test_connections_on_plain_node_are_not_wiring() {
    let descriptor: NodeDescriptor = serde_json::from_value(json!({
        "type": "Node",
        "connections": { "A": "B" }
    }))
    .expect("descriptor should parse");

    assert!(descriptor.connections.is_some());
    assert!(descriptor.group_connections().is_none());
}

#[test]
fn test_built_batch_decodes_to_same_entries() {
    let batch = BatchBuilder::new()
        .group("G")
            .connect("A", "B")
            .connect("A", "C")
            .build()
        .pair("A", "G")
        .build();

    let text = batch.to_json().expect("serialize failed");
    let decoded = decode_batch(&text).expect("decode failed");

    assert_eq!(decoded, batch);
}
