use lgmon::compiler::adjacency::AdjacencyTable;
use lgmon::compiler::core::Compiler;
use lgmon::compiler::materializer::materialize;
use lgmon::runtime::elements::{EdgeElement, GraphElement, NodeElement, Position};
use std::collections::HashSet;

fn edges(elements: &[GraphElement]) -> Vec<&EdgeElement> {
    elements.iter().filter_map(GraphElement::as_edge).collect()
}

fn node_ids(elements: &[GraphElement]) -> Vec<&str> {
    elements.iter().filter_map(GraphElement::as_node).map(|n| n.id.as_str()).collect()
}

#[test]
fn test_materialize_single_pair() {
    let table = AdjacencyTable::from([("N", &["R"][..])]);

    let elements = materialize(&table);

    assert_eq!(
        elements,
        vec![
            GraphElement::Node(NodeElement {
                id: "N".to_string(),
                label: "N".to_string(),
                position: Position::new(0.0, 0.0),
            }),
            GraphElement::Node(NodeElement {
                id: "R".to_string(),
                label: "R".to_string(),
                position: Position::new(0.0, 0.0),
            }),
            GraphElement::Edge(EdgeElement {
                id: "e-N-R".to_string(),
                source: "N".to_string(),
                target: "R".to_string(),
                animated: true,
            }),
        ]
    );
}

#[test]
fn test_every_successor_becomes_a_node() {
    let table = AdjacencyTable::from([
        ("A", &["B", "C"][..]),
        ("B", &["D"][..]),
    ]);

    let elements = materialize(&table);
    let ids: HashSet<&str> = node_ids(&elements).into_iter().collect();

    for edge in edges(&elements) {
        assert!(ids.contains(edge.source.as_str()), "dangling source {}", edge.source);
        assert!(ids.contains(edge.target.as_str()), "dangling target {}", edge.target);
    }
    assert_eq!(node_ids(&elements), vec!["A", "B", "C", "D"]);
}

#[test]
fn test_only_roots_animate() {
    // A -> B -> C, X -> C
    let table = AdjacencyTable::from([
        ("A", &["B"][..]),
        ("B", &["C"][..]),
        ("X", &["C"][..]),
    ]);

    let elements = materialize(&table);
    let animated: Vec<(&str, bool)> = edges(&elements)
        .iter()
        .map(|e| (e.id.as_str(), e.animated))
        .collect();

    assert_eq!(
        animated,
        vec![("e-A-B", true), ("e-B-C", false), ("e-X-C", true)]
    );
}

#[test]
fn test_no_duplicates_and_stable_output() {
    let compiled = Compiler::new()
        .compile_str(include_str!("fixtures/simple_viz.json"))
        .expect("Compilation failed");

    let first = materialize(&compiled.adjacency);
    let second = materialize(&compiled.adjacency);
    assert_eq!(first, second);

    let ids = node_ids(&first);
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());

    let pairs: Vec<(&str, &str)> = edges(&first)
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    let unique_pairs: HashSet<(&str, &str)> = pairs.iter().copied().collect();
    assert_eq!(pairs.len(), unique_pairs.len());

    assert_eq!(ids, vec!["NoiseGenerator", "RollingAverager", "AveragedNoise", "Plot"]);
    assert_eq!(
        pairs,
        vec![
            ("NoiseGenerator", "RollingAverager"),
            ("RollingAverager", "AveragedNoise"),
            ("AveragedNoise", "Plot"),
        ]
    );
}

#[test]
fn test_elements_serialize_for_ui() {
    let elements = materialize(&AdjacencyTable::from([("N", &["R"][..])]));

    let json = serde_json::to_value(&elements).expect("serialize failed");

    assert_eq!(json[0]["id"], "N");
    assert_eq!(json[0]["position"]["x"], 0.0);
    assert_eq!(json[2]["id"], "e-N-R");
    assert_eq!(json[2]["animated"], true);
    assert!(json[2].get("position").is_none());
}
