use crate::compiler::adjacency::AdjacencyTable;
use crate::compiler::decoder::DescriptorTable;
use crate::error::MissingDescriptorError;
use tracing::{debug, warn};

/// 将 Group 节点的内部连线展开进邻接表
pub struct Expander {}

impl Expander {
    pub fn new() -> Self {
        Self {}
    }

    /// Folds every group's `connections` into `adjacency`. Pairs naming an
    /// undeclared node are skipped and returned; the rest still land.
    pub fn expand(&self, descriptors: &DescriptorTable, adjacency: &mut AdjacencyTable) -> Vec<MissingDescriptorError> {
        let mut missing = Vec::new();

        for group in descriptors.iter() {
            let Some(connections) = group.group_connections() else {
                continue;
            };

            for (upstream, downstream) in connections.iter() {
                if let Some(absent) = [upstream, downstream].into_iter().find(|n| !descriptors.contains(n)) {
                    warn!(
                        group = %group.name,
                        upstream,
                        downstream,
                        "Skipping connection, no descriptor for '{}'",
                        absent
                    );
                    missing.push(MissingDescriptorError {
                        group: group.name.clone(),
                        upstream: upstream.to_string(),
                        downstream: downstream.to_string(),
                        missing: absent.to_string(),
                    });
                    continue;
                }

                if !adjacency.add_edge(upstream, downstream) {
                    debug!(group = %group.name, upstream, downstream, "Connection already present");
                }
            }
        }

        missing
    }
}

impl Default for Expander {
    fn default() -> Self {
        Self::new()
    }
}
