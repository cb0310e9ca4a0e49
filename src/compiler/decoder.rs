use crate::dsl::{Batch, NodeDescriptor, PairEntry};
use crate::error::DecodeError;
use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde_json::Value;
use serde_json::value::RawValue;

/// A pair-entry element before its descriptor is parsed. Descriptors stay as
/// raw text so duplicate `connections` keys survive until `NodeDescriptor`
/// deserialization.
enum RawElement {
    Object(Vec<(String, Box<RawValue>)>),
    Other,
}

struct RawElementVisitor;

impl<'de> Visitor<'de> for RawElementVisitor {
    type Value = RawElement;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawElement, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = access.next_entry::<String, Box<RawValue>>()? {
            entries.push(entry);
        }
        Ok(RawElement::Object(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawElement, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawElement::Other)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<RawElement, E> {
        Ok(RawElement::Other)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawElement, E> {
        Ok(RawElement::Other)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<RawElement, E> {
        Ok(RawElement::Other)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<RawElement, E> {
        Ok(RawElement::Other)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<RawElement, E> {
        Ok(RawElement::Other)
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawElement, E> {
        Ok(RawElement::Other)
    }
}

impl<'de> Deserialize<'de> for RawElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawElementVisitor)
    }
}

/// Parses the wire form of a batch (`[[{A: {...}}, {B: {...}}], ...]`).
pub fn decode_batch(raw: &str) -> Result<Batch, DecodeError> {
    let entries: Vec<Box<RawValue>> =
        serde_json::from_str(raw).map_err(|_| DecodeError::NotABatch)?;

    let mut decoded = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let elements: Vec<RawElement> =
            serde_json::from_str(entry.get()).map_err(|_| DecodeError::NotAPair { index })?;
        let [first, second]: [RawElement; 2] = elements
            .try_into()
            .map_err(|rest: Vec<RawElement>| DecodeError::PairArity { index, len: rest.len() })?;

        decoded.push(PairEntry {
            upstream: decode_element(index, 0, first)?,
            downstream: decode_element(index, 1, second)?,
        });
    }

    Ok(Batch { entries: decoded })
}

/// Same as [`decode_batch`] for an already parsed value. Duplicate object keys
/// were collapsed by the JSON parser before this point.
pub fn decode_value(value: &Value) -> Result<Batch, DecodeError> {
    let raw = serde_json::to_string(value).map_err(|_| DecodeError::NotABatch)?;
    decode_batch(&raw)
}

fn decode_element(index: usize, position: usize, element: RawElement) -> Result<NodeDescriptor, DecodeError> {
    let mut entries = match element {
        RawElement::Object(entries) => entries,
        RawElement::Other => return Err(DecodeError::NotAnObject { index, position }),
    };
    if entries.len() != 1 {
        return Err(DecodeError::KeyCount { index, position, keys: entries.len() });
    }
    let (name, raw) = entries.remove(0);

    let mut descriptor: NodeDescriptor = serde_json::from_str(raw.get())
        .map_err(|e| DecodeError::InvalidDescriptor { name: name.clone(), reason: e.to_string() })?;
    descriptor.name = name;
    Ok(descriptor)
}

/// 名字 -> 描述符 的扁平表，保持首次出现的顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorTable {
    entries: Vec<NodeDescriptor>,
    index: HashMap<String, usize>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_batch(batch: &Batch) -> Self {
        let mut table = Self::new();
        for entry in &batch.entries {
            table.insert(entry.upstream.clone());
            table.insert(entry.downstream.clone());
        }
        table
    }

    /// Last write wins on the descriptor; the name keeps its first position.
    pub fn insert(&mut self, descriptor: NodeDescriptor) {
        match self.index.get(&descriptor.name) {
            Some(&i) => self.entries[i] = descriptor,
            None => {
                self.index.insert(descriptor.name.clone(), self.entries.len());
                self.entries.push(descriptor);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&NodeDescriptor> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for DescriptorTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for descriptor in &self.entries {
            map.serialize_entry(&descriptor.name, descriptor)?;
        }
        map.end()
    }
}

pub fn decode_descriptors(raw: &str) -> Result<DescriptorTable, DecodeError> {
    let batch = decode_batch(raw)?;
    Ok(DescriptorTable::from_batch(&batch))
}
