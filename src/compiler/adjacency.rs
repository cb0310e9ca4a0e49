use std::collections::HashMap;
use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;

/// 邻接表：节点名 -> 直接后继列表
///
/// Keys keep first-insertion order and successor lists keep first-append
/// order, so iteration is reproducible across runs. Successor lists never
/// hold the same name twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyTable {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl AdjacencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.entries.len();
        self.index.insert(name.to_string(), i);
        self.entries.push((name.to_string(), Vec::new()));
        i
    }

    /// Registers `name` with an empty successor list if it is not a key yet.
    pub fn ensure_node(&mut self, name: &str) {
        self.slot(name);
    }

    /// Appends `downstream` to `upstream`'s successors. Returns false when the
    /// pair was already present.
    pub fn add_edge(&mut self, upstream: &str, downstream: &str) -> bool {
        let i = self.slot(upstream);
        let successors = &mut self.entries[i].1;
        if successors.iter().any(|s| s == downstream) {
            return false;
        }
        successors.push(downstream.to_string());
        true
    }

    pub fn successors(&self, name: &str) -> Option<&[String]> {
        self.index.get(name).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Makes every successor a key, leaves get an empty list.
    pub fn close(&mut self) {
        let dangling: Vec<String> = self
            .entries
            .iter()
            .flat_map(|(_, successors)| successors.iter())
            .filter(|s| !self.index.contains_key(s.as_str()))
            .cloned()
            .collect();
        for name in dangling {
            self.slot(&name);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, successors)| (name.as_str(), successors.as_slice()))
    }

    /// Every `(upstream, downstream)` pair, upstream-then-successor order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .flat_map(|(upstream, successors)| successors.iter().map(move |s| (upstream, s.as_str())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, const N: usize> From<[(&'a str, &'a [&'a str]); N]> for AdjacencyTable {
    fn from(rows: [(&'a str, &'a [&'a str]); N]) -> Self {
        let mut table = AdjacencyTable::new();
        for (upstream, successors) in rows {
            table.ensure_node(upstream);
            for downstream in successors {
                table.add_edge(upstream, downstream);
            }
        }
        table
    }
}

impl Serialize for AdjacencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, successors) in &self.entries {
            map.serialize_entry(name, successors)?;
        }
        map.end()
    }
}
