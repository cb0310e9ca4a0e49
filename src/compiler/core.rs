use crate::compiler::adjacency::AdjacencyTable;
use crate::compiler::decoder::{self, DescriptorTable};
use crate::compiler::expander::Expander;
use crate::dsl::Batch;
use crate::error::{DecodeError, MissingDescriptorError};
use tracing::debug;

/// 编译结果：描述符表 + 邻接表 + 被跳过的连线
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGraph {
    pub descriptors: DescriptorTable,
    pub adjacency: AdjacencyTable,
    pub missing: Vec<MissingDescriptorError>,
}

pub struct Compiler {
    expander: Expander,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            expander: Expander::new(),
        }
    }

    /// Decodes the wire text of one batch and derives its adjacency.
    pub fn compile_str(&self, raw: &str) -> Result<CompiledGraph, DecodeError> {
        let batch = decoder::decode_batch(raw)?;
        Ok(self.compile(&batch))
    }

    pub fn compile(&self, batch: &Batch) -> CompiledGraph {
        // 1. Pass 1: Descriptors
        let descriptors = DescriptorTable::from_batch(batch);

        // 2. Pass 2: Connections
        let (adjacency, missing) = self.extract(batch, &descriptors);

        debug!(
            descriptors = descriptors.len(),
            nodes = adjacency.len(),
            skipped = missing.len(),
            "Compiled batch"
        );

        CompiledGraph {
            descriptors,
            adjacency,
            missing,
        }
    }

    fn extract(&self, batch: &Batch, descriptors: &DescriptorTable) -> (AdjacencyTable, Vec<MissingDescriptorError>) {
        let mut adjacency = AdjacencyTable::new();

        for entry in &batch.entries {
            adjacency.add_edge(&entry.upstream.name, &entry.downstream.name);
        }

        let missing = self.expander.expand(descriptors, &mut adjacency);
        (adjacency, missing)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Pair-entry edges plus every group's internal wiring.
pub fn extract_connections(batch: &Batch, descriptors: &DescriptorTable) -> (AdjacencyTable, Vec<MissingDescriptorError>) {
    Compiler::new().extract(batch, descriptors)
}
