use crate::compiler::adjacency::AdjacencyTable;
use crate::runtime::elements::{edge_id, EdgeElement, GraphElement, NodeElement, Position};
use std::collections::HashSet;

/// Expands an adjacency table into node elements followed by edge elements.
///
/// Nodes come out keys first, then successor-only names, each once. Edges come
/// out upstream-then-successor order. Output depends only on the table's own
/// ordering, never on hash iteration.
pub fn materialize(adjacency: &AdjacencyTable) -> Vec<GraphElement> {
    // 1. Node set
    let mut seen: HashSet<&str> = HashSet::new();
    let mut names: Vec<&str> = Vec::new();
    for (name, _) in adjacency.iter() {
        if seen.insert(name) {
            names.push(name);
        }
    }
    for (_, successors) in adjacency.iter() {
        for successor in successors {
            if seen.insert(successor) {
                names.push(successor);
            }
        }
    }

    // 2. Nodes with an upstream, computed once for the whole pass
    let has_predecessor: HashSet<&str> = adjacency
        .edges()
        .filter(|(upstream, downstream)| upstream != downstream)
        .map(|(_, downstream)| downstream)
        .collect();

    let mut elements = Vec::with_capacity(names.len() + has_predecessor.len());
    for name in names {
        elements.push(GraphElement::Node(NodeElement {
            id: name.to_string(),
            label: name.to_string(),
            position: Position::default(),
        }));
    }

    // 3. Edges
    for (upstream, downstream) in adjacency.edges() {
        elements.push(GraphElement::Edge(EdgeElement {
            id: edge_id(upstream, downstream),
            source: upstream.to_string(),
            target: downstream.to_string(),
            animated: !has_predecessor.contains(upstream),
        }));
    }

    elements
}
