use lgmon::compiler::adjacency::AdjacencyTable;
use lgmon::compiler::core::{extract_connections, Compiler};
use lgmon::compiler::decoder::{decode_batch, decode_descriptors, DescriptorTable};
use lgmon::dsl::builder::BatchBuilder;
use lgmon::error::DecodeError;

const SIMPLE_VIZ: &str = include_str!("fixtures/simple_viz.json");

fn successors<'a>(table: &'a AdjacencyTable, name: &str) -> Vec<&'a str> {
    table
        .successors(name)
        .map(|s| s.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

#[test]
fn test_single_pair() {
    // [[{N:{}},{R:{}}]] -> {N:[R]}
    let compiled = Compiler::new()
        .compile_str(r#"[[{"N": {}}, {"R": {}}]]"#)
        .expect("Compilation failed");

    assert_eq!(compiled.adjacency, AdjacencyTable::from([("N", &["R"][..])]));
    assert!(compiled.missing.is_empty());
    assert_eq!(compiled.descriptors.len(), 2);
}

#[test]
fn test_group_connections_do_not_duplicate_pairs() {
    let batch = BatchBuilder::new()
        .group("AveragedNoise")
            .connect("N", "R")
            .connect("R", "Averaged")
            .build()
        .pair("N", "R")
        .pair("R", "Averaged")
        .pair("Averaged", "AveragedNoise")
        .build();

    let compiled = Compiler::new().compile(&batch);

    assert_eq!(successors(&compiled.adjacency, "N"), vec!["R"]);
    assert_eq!(successors(&compiled.adjacency, "R"), vec!["Averaged"]);
    assert_eq!(successors(&compiled.adjacency, "Averaged"), vec!["AveragedNoise"]);
    assert!(compiled.missing.is_empty());
}

#[test]
fn test_undeclared_node_is_skipped() {
    let batch = BatchBuilder::new()
        .group("G")
            .connect("A", "Ghost")
            .connect("A", "B")
            .build()
        .pair("A", "G")
        .pair("G", "B")
        .build();

    let compiled = Compiler::new().compile(&batch);

    assert_eq!(successors(&compiled.adjacency, "A"), vec!["G", "B"]);
    assert!(!compiled.adjacency.contains("Ghost"));
    assert!(compiled.adjacency.edges().all(|(_, d)| d != "Ghost"));

    assert_eq!(compiled.missing.len(), 1);
    let missing = &compiled.missing[0];
    assert_eq!(missing.group, "G");
    assert_eq!(missing.missing, "Ghost");
}

#[test]
fn test_repeated_upstream_appends() {
    // 同一上游在多个 pair-entry 和 Group 中出现，全部后继都要保留
    let raw = r#"[
        [{"RollingAverager": {}}, {"Node4": {}}],
        [{"RollingAverager": {}}, {"Node5": {}}],
        [{"Node5": {}}, {"Hub": {
            "type": "Group",
            "connections": {
                "RollingAverager": "Node2",
                "RollingAverager": "Node4",
                "Node2": ["Node6", "Node7"]
            }
        }}],
        [{"Node2": {}}, {"Node6": {}}],
        [{"Node6": {}}, {"Node7": {}}]
    ]"#;

    let compiled = Compiler::new().compile_str(raw).expect("Compilation failed");

    assert_eq!(
        successors(&compiled.adjacency, "RollingAverager"),
        vec!["Node4", "Node5", "Node2"]
    );
    assert_eq!(successors(&compiled.adjacency, "Node2"), vec!["Node6", "Node7"]);
    assert!(compiled.missing.is_empty());
}

#[test]
fn test_simple_viz_fixture() {
    let compiled = Compiler::new().compile_str(SIMPLE_VIZ).expect("Compilation failed");

    let keys: Vec<&str> = compiled.adjacency.iter().map(|(name, _)| name).collect();
    assert_eq!(keys, vec!["NoiseGenerator", "RollingAverager", "AveragedNoise"]);
    assert_eq!(successors(&compiled.adjacency, "AveragedNoise"), vec!["Plot"]);
    assert_eq!(compiled.adjacency.edges().count(), 3);

    let plot = compiled.descriptors.get("Plot").expect("Plot descriptor");
    assert_eq!(plot.state.as_ref().map(|s| s.name()), Some("PlotState"));
}

#[test]
fn test_decode_is_idempotent() {
    let first = decode_descriptors(SIMPLE_VIZ).expect("decode failed");
    let second = decode_descriptors(SIMPLE_VIZ).expect("decode failed");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize failed"),
        serde_json::to_string(&second).expect("serialize failed")
    );
}

#[test]
fn test_extract_connections_matches_compiler() {
    let batch = decode_batch(SIMPLE_VIZ).expect("decode failed");
    let descriptors = DescriptorTable::from_batch(&batch);

    let (adjacency, missing) = extract_connections(&batch, &descriptors);
    let compiled = Compiler::new().compile(&batch);

    assert_eq!(adjacency, compiled.adjacency);
    assert_eq!(missing, compiled.missing);
}

#[test]
fn test_malformed_batch_fails() {
    let err = Compiler::new()
        .compile_str(r#"[[{"N": {}}, {"R": {}}, {"X": {}}]]"#)
        .unwrap_err();
    assert_eq!(err, DecodeError::PairArity { index: 0, len: 3 });
}
