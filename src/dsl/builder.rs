use crate::dsl::{Batch, Connections, NodeDescriptor, NodeKind, PairEntry, SchemaSpec};
use std::collections::HashMap;

pub struct BatchBuilder {
    descriptors: HashMap<String, NodeDescriptor>,
    pairs: Vec<(String, String)>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
            pairs: Vec::new(),
        }
    }

    pub fn node(self, name: &str) -> DescriptorBuilder {
        DescriptorBuilder {
            batch_builder: self,
            descriptor: NodeDescriptor::new(name, NodeKind::Node),
        }
    }

    pub fn group(self, name: &str) -> DescriptorBuilder {
        DescriptorBuilder {
            batch_builder: self,
            descriptor: NodeDescriptor::new(name, NodeKind::Group),
        }
    }

    /// 添加 pair-entry；未声明的节点使用默认描述符
    pub fn pair(mut self, upstream: &str, downstream: &str) -> Self {
        self.pairs.push((upstream.to_string(), downstream.to_string()));
        self
    }

    fn descriptor(&self, name: &str) -> NodeDescriptor {
        self.descriptors
            .get(name)
            .cloned()
            .unwrap_or_else(|| NodeDescriptor::new(name, NodeKind::Node))
    }

    pub fn build(self) -> Batch {
        let entries = self
            .pairs
            .iter()
            .map(|(upstream, downstream)| PairEntry {
                upstream: self.descriptor(upstream),
                downstream: self.descriptor(downstream),
            })
            .collect();
        Batch { entries }
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DescriptorBuilder {
    batch_builder: BatchBuilder,
    descriptor: NodeDescriptor,
}

impl DescriptorBuilder {
    pub fn input(mut self, message: &str, fields: &[(&str, &str)]) -> Self {
        self.descriptor.inputs.push(SchemaSpec::named(message, fields));
        self
    }

    pub fn output(mut self, message: &str, fields: &[(&str, &str)]) -> Self {
        self.descriptor.outputs.push(SchemaSpec::named(message, fields));
        self
    }

    pub fn config(mut self, schema: SchemaSpec) -> Self {
        self.descriptor.config = Some(schema);
        self
    }

    pub fn state(mut self, schema: SchemaSpec) -> Self {
        self.descriptor.state = Some(schema);
        self
    }

    pub fn connect(mut self, upstream: &str, downstream: &str) -> Self {
        self.descriptor
            .connections
            .get_or_insert_with(Connections::new)
            .push(upstream, downstream);
        self
    }

    pub fn build(mut self) -> BatchBuilder {
        let name = self.descriptor.name.clone();
        self.batch_builder.descriptors.insert(name, self.descriptor);
        self.batch_builder
    }
}
