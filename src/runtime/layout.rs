use crate::error::LayoutError;
use crate::runtime::elements::{GraphElement, GraphSnapshot, Position};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent};
use serde::{Serialize, Deserialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// 布局方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDirection {
    /// Ranks run top to bottom.
    #[default]
    Vertical,
    /// Ranks run left to right.
    Horizontal,
}

impl FromStr for LayoutDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vertical" | "tb" => Ok(LayoutDirection::Vertical),
            "horizontal" | "lr" => Ok(LayoutDirection::Horizontal),
            other => Err(format!("unknown layout direction '{}', expected vertical or horizontal", other)),
        }
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutDirection::Vertical => f.write_str("vertical"),
            LayoutDirection::Horizontal => f.write_str("horizontal"),
        }
    }
}

pub type Positions = HashMap<String, Position>;

/// 布局后端接口
///
/// Implementations must not keep graph state between calls; the same engine
/// is shared by every session.
pub trait LayoutEngine: Send + Sync {
    fn name(&self) -> &str;
    fn layout(&self, elements: &[GraphElement], direction: LayoutDirection) -> Result<Positions, LayoutError>;
}

/// Layered placement: back edges found by a depth-first walk are ignored,
/// ranks are the longest path from a root, nodes within a rank keep input
/// order and are centred against the widest rank. Positions are node centres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayeredLayout {
    pub node_width: f64,
    pub node_height: f64,
    pub rank_sep: f64,
    pub node_sep: f64,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            node_width: 250.0,
            node_height: 150.0,
            rank_sep: 50.0,
            node_sep: 50.0,
        }
    }
}

impl LayeredLayout {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_graph<'a>(&self, elements: &'a [GraphElement]) -> Result<DiGraph<&'a str, ()>, LayoutError> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();

        for node in elements.iter().filter_map(GraphElement::as_node) {
            if index.contains_key(node.id.as_str()) {
                return Err(LayoutError::DuplicateNode(node.id.clone()));
            }
            index.insert(&node.id, graph.add_node(&node.id));
        }

        for edge in elements.iter().filter_map(GraphElement::as_edge) {
            let endpoint = |name: &str| {
                index.get(name).copied().ok_or_else(|| LayoutError::UnknownEndpoint {
                    edge: edge.id.clone(),
                    node: name.to_string(),
                })
            };
            let source = endpoint(edge.source.as_str())?;
            let target = endpoint(edge.target.as_str())?;
            if source != target {
                graph.add_edge(source, target, ());
            }
        }

        Ok(graph)
    }
}

impl LayoutEngine for LayeredLayout {
    fn name(&self) -> &str {
        "layered"
    }

    fn layout(&self, elements: &[GraphElement], direction: LayoutDirection) -> Result<Positions, LayoutError> {
        if !(self.node_width > 0.0 && self.node_height > 0.0) {
            return Err(LayoutError::Backend(format!(
                "node size must be positive, got {}x{}",
                self.node_width, self.node_height
            )));
        }

        // 1. Fresh graph for this call only
        let graph = self.build_graph(elements)?;

        // 2. Break cycles
        let mut back_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        depth_first_search(&graph, graph.node_indices(), |event| {
            if let DfsEvent::BackEdge(u, v) = event {
                back_edges.insert((u, v));
            }
        });
        let acyclic = graph.filter_map(
            |_, name| Some(*name),
            |e, _| match graph.edge_endpoints(e) {
                Some(endpoints) if back_edges.contains(&endpoints) => None,
                _ => Some(()),
            },
        );

        // 3. Ranks
        let order = toposort(&acyclic, None).map_err(|cycle| {
            LayoutError::Backend(format!("cycle remains at '{}'", acyclic[cycle.node_id()]))
        })?;
        let mut rank = vec![0usize; acyclic.node_count()];
        for &n in &order {
            for succ in acyclic.neighbors(n) {
                rank[succ.index()] = rank[succ.index()].max(rank[n.index()] + 1);
            }
        }

        let rank_count = rank.iter().max().map_or(0, |r| r + 1);
        let mut layers: Vec<Vec<NodeIndex>> = vec![Vec::new(); rank_count];
        for n in acyclic.node_indices() {
            layers[rank[n.index()]].push(n);
        }

        // 4. Coordinates
        let (rank_extent, cross_extent) = match direction {
            LayoutDirection::Vertical => (self.node_height, self.node_width),
            LayoutDirection::Horizontal => (self.node_width, self.node_height),
        };
        let widest = layers.iter().map(Vec::len).max().unwrap_or(0);
        let cross_step = cross_extent + self.node_sep;

        let mut positions = Positions::with_capacity(acyclic.node_count());
        for (r, layer) in layers.iter().enumerate() {
            let along = r as f64 * (rank_extent + self.rank_sep) + rank_extent / 2.0;
            let offset = (widest - layer.len()) as f64 * cross_step / 2.0;
            for (i, &n) in layer.iter().enumerate() {
                let across = offset + i as f64 * cross_step + cross_extent / 2.0;
                let position = match direction {
                    LayoutDirection::Vertical => Position::new(across, along),
                    LayoutDirection::Horizontal => Position::new(along, across),
                };
                positions.insert(acyclic[n].to_string(), position);
            }
        }

        Ok(positions)
    }
}

/// Writes positions into the node elements. Nothing is written unless every
/// node has a position.
pub fn apply_layout(elements: &mut [GraphElement], positions: &Positions) -> Result<(), LayoutError> {
    if let Some(node) = elements
        .iter()
        .filter_map(GraphElement::as_node)
        .find(|n| !positions.contains_key(&n.id))
    {
        return Err(LayoutError::Incomplete(node.id.clone()));
    }

    for element in elements.iter_mut() {
        if let GraphElement::Node(node) = element {
            if let Some(position) = positions.get(&node.id) {
                node.position = *position;
            }
        }
    }
    Ok(())
}

/// Reuses positions from `previous` for nodes it knew; new nodes stay at the
/// origin.
pub fn carry_positions(elements: &mut [GraphElement], previous: Option<&GraphSnapshot>) {
    let known: HashMap<&str, Position> = previous
        .map(|snapshot| snapshot.nodes().map(|n| (n.id.as_str(), n.position)).collect())
        .unwrap_or_default();

    for element in elements.iter_mut() {
        if let GraphElement::Node(node) = element {
            node.position = known.get(node.id.as_str()).copied().unwrap_or_default();
        }
    }
}
