use serde::{Serialize, Deserialize};

use crate::compiler::adjacency::AdjacencyTable;
use crate::compiler::decoder::DescriptorTable;
use crate::runtime::layout::LayoutDirection;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
    pub id: String,
    pub label: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeElement {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Set when the source has no upstream of its own.
    pub animated: bool,
}

/// 交给 UI 渲染的元素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphElement {
    Node(NodeElement),
    Edge(EdgeElement),
}

impl GraphElement {
    pub fn id(&self) -> &str {
        match self {
            GraphElement::Node(node) => &node.id,
            GraphElement::Edge(edge) => &edge.id,
        }
    }

    pub fn as_node(&self) -> Option<&NodeElement> {
        match self {
            GraphElement::Node(node) => Some(node),
            GraphElement::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&EdgeElement> {
        match self {
            GraphElement::Edge(edge) => Some(edge),
            GraphElement::Node(_) => None,
        }
    }
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("e-{}-{}", source, target)
}

/// 一次更新的完整渲染结果，每次更新整体替换
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub revision: u64,
    pub direction: LayoutDirection,
    /// False while positions are carried over from an earlier layout.
    pub positioned: bool,
    pub descriptors: DescriptorTable,
    pub adjacency: AdjacencyTable,
    pub elements: Vec<GraphElement>,
}

impl GraphSnapshot {
    pub fn nodes(&self) -> impl Iterator<Item = &NodeElement> {
        self.elements.iter().filter_map(GraphElement::as_node)
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeElement> {
        self.elements.iter().filter_map(GraphElement::as_edge)
    }

    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.nodes().find(|n| n.id == id).map(|n| n.position)
    }
}
