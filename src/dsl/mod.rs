pub mod builder;

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize, Serializer, Deserializer};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};

/// 字段名 -> 语义类型 (e.g. "timestamp" -> "float")
pub type FieldTypes = BTreeMap<String, String>;

/// 节点类型：普通节点或组合节点 (Group)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Node,
    Group,
}

/// Schema 引用：要么是带字段定义的命名 schema，要么只是一个名字
///
/// Wire forms: `{"RollingConfig": {"window": "float"}}` or `"RollingConfig"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSpec {
    Named { name: String, fields: FieldTypes },
    Reference(String),
}

/// Message types on inputs/outputs share the schema wire forms.
pub type MessageRef = SchemaSpec;

impl SchemaSpec {
    pub fn named(name: &str, fields: &[(&str, &str)]) -> Self {
        SchemaSpec::Named {
            name: name.to_string(),
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    pub fn reference(name: &str) -> Self {
        SchemaSpec::Reference(name.to_string())
    }

    pub fn name(&self) -> &str {
        match self {
            SchemaSpec::Named { name, .. } => name,
            SchemaSpec::Reference(name) => name,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSchema {
    Reference(String),
    Named(BTreeMap<String, FieldTypes>),
}

impl<'de> Deserialize<'de> for SchemaSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawSchema::deserialize(deserializer)? {
            RawSchema::Reference(name) => Ok(SchemaSpec::Reference(name)),
            RawSchema::Named(map) => {
                if map.len() != 1 {
                    return Err(de::Error::custom(format!(
                        "expected exactly one schema name, found {}",
                        map.len()
                    )));
                }
                let (name, fields) = map
                    .into_iter()
                    .next()
                    .ok_or_else(|| de::Error::custom("empty schema"))?;
                Ok(SchemaSpec::Named { name, fields })
            }
        }
    }
}

impl Serialize for SchemaSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SchemaSpec::Reference(name) => serializer.serialize_str(name),
            SchemaSpec::Named { name, fields } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, fields)?;
                map.end()
            }
        }
    }
}

/// Group 内部连线：上游 -> 下游 的有序多重映射
///
/// The wire form is a JSON object, but the same upstream key may legitimately
/// repeat with different downstream names, so every entry is kept in order.
/// A value may also be an array of downstream names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connections(Vec<(String, String)>);

impl Connections {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, upstream: &str, downstream: &str) {
        self.0.push((upstream.to_string(), downstream.to_string()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(u, d)| (u.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Connections {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut connections = Connections::new();
        for (upstream, downstream) in pairs {
            connections.push(upstream, downstream);
        }
        connections
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Downstream {
    One(String),
    Many(Vec<String>),
}

struct ConnectionsVisitor;

impl<'de> Visitor<'de> for ConnectionsVisitor {
    type Value = Connections;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map from upstream node name to downstream node name(s)")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Connections, A::Error> {
        let mut pairs = Vec::new();
        while let Some((upstream, downstream)) = access.next_entry::<String, Downstream>()? {
            match downstream {
                Downstream::One(target) => pairs.push((upstream, target)),
                Downstream::Many(targets) => {
                    for target in targets {
                        pairs.push((upstream.clone(), target));
                    }
                }
            }
        }
        Ok(Connections(pairs))
    }
}

impl<'de> Deserialize<'de> for Connections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ConnectionsVisitor)
    }
}

impl Serialize for Connections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (upstream, downstream) in &self.0 {
            map.serialize_entry(upstream, downstream)?;
        }
        map.end()
    }
}

/// 节点描述符 (一个数据流阶段)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Filled in from the key the descriptor was listed under.
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SchemaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SchemaSpec>,
    #[serde(default)]
    pub inputs: Vec<MessageRef>,
    #[serde(default)]
    pub outputs: Vec<MessageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Connections>,
}

impl NodeDescriptor {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ..Default::default()
        }
    }

    /// Internal wiring, only meaningful on groups.
    pub fn group_connections(&self) -> Option<&Connections> {
        match self.kind {
            NodeKind::Group => self.connections.as_ref(),
            NodeKind::Node => None,
        }
    }
}

/// 一条 pair-entry: 第一个节点是第二个节点的上游
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEntry {
    pub upstream: NodeDescriptor,
    pub downstream: NodeDescriptor,
}

struct Keyed<'a>(&'a NodeDescriptor);

impl Serialize for Keyed<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.0.name, self.0)?;
        map.end()
    }
}

impl Serialize for PairEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&Keyed(&self.upstream))?;
        seq.serialize_element(&Keyed(&self.downstream))?;
        seq.end()
    }
}

/// 一次更新收到的批次 (decoded pair-entries in wire order)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Batch {
    pub entries: Vec<PairEntry>,
}

impl Batch {
    /// Wire JSON, duplicate connection keys included.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
