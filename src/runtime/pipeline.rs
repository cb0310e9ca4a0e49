use crate::compiler::core::{CompiledGraph, Compiler};
use crate::compiler::materializer::materialize;
use crate::dsl::Batch;
use crate::error::{DecodeError, LayoutError, MissingDescriptorError};
use crate::runtime::config::MonitorConfig;
use crate::runtime::elements::{GraphElement, GraphSnapshot};
use crate::runtime::layout::{apply_layout, carry_positions, LayoutDirection, LayoutEngine};
use std::sync::Arc;
use tracing::{debug, warn};

/// 一次更新的产物
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub snapshot: GraphSnapshot,
    /// Group connections dropped because a node was undeclared.
    pub missing: Vec<MissingDescriptorError>,
    /// Set when positions were carried over instead of computed.
    pub layout_error: Option<LayoutError>,
}

/// Decoder -> extractor -> materializer -> layout, run synchronously per
/// sample. Holds no per-update state.
pub struct Pipeline {
    compiler: Compiler,
    layout: Arc<dyn LayoutEngine>,
}

impl Pipeline {
    pub fn new(layout: Arc<dyn LayoutEngine>) -> Self {
        Self {
            compiler: Compiler::new(),
            layout,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(Arc::new(config.layered_layout()))
    }

    /// Runs the whole pipeline over the wire text of one batch. Only a
    /// malformed batch fails; layout failures keep `previous` positions.
    pub fn run(&self, raw: &str, direction: LayoutDirection, previous: Option<&GraphSnapshot>) -> Result<PipelineOutput, DecodeError> {
        let compiled = self.compiler.compile_str(raw)?;
        Ok(self.render(compiled, direction, previous))
    }

    pub fn run_batch(&self, batch: &Batch, direction: LayoutDirection, previous: Option<&GraphSnapshot>) -> PipelineOutput {
        self.render(self.compiler.compile(batch), direction, previous)
    }

    fn render(&self, compiled: CompiledGraph, direction: LayoutDirection, previous: Option<&GraphSnapshot>) -> PipelineOutput {
        let CompiledGraph { descriptors, mut adjacency, missing } = compiled;
        adjacency.close();

        let mut elements = materialize(&adjacency);
        let layout_error = match self.position(&mut elements, direction) {
            Ok(()) => None,
            Err(e) => {
                warn!(layout = self.layout.name(), error = %e, "Layout failed, keeping previous positions");
                carry_positions(&mut elements, previous);
                Some(e)
            }
        };

        let revision = previous.map_or(1, |p| p.revision + 1);
        debug!(revision, elements = elements.len(), %direction, "Rendered graph");

        PipelineOutput {
            snapshot: GraphSnapshot {
                revision,
                direction,
                positioned: layout_error.is_none(),
                descriptors,
                adjacency,
                elements,
            },
            missing,
            layout_error,
        }
    }

    pub fn position(&self, elements: &mut [GraphElement], direction: LayoutDirection) -> Result<(), LayoutError> {
        let positions = self.layout.layout(elements, direction)?;
        apply_layout(elements, &positions)
    }

    /// Lays out an existing snapshot again, e.g. after a direction change.
    pub fn relayout(&self, snapshot: &GraphSnapshot, direction: LayoutDirection) -> Result<GraphSnapshot, LayoutError> {
        let mut elements = snapshot.elements.clone();
        self.position(&mut elements, direction)?;
        Ok(GraphSnapshot {
            revision: snapshot.revision + 1,
            direction,
            positioned: true,
            descriptors: snapshot.descriptors.clone(),
            adjacency: snapshot.adjacency.clone(),
            elements,
        })
    }
}
