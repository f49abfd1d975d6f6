// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Analytic memory accounting.
//!
//! The size of every region a node owns is derived from the network shape
//! alone, before any region is written. The region writer later checks that
//! what it wrote matches these sizes exactly.

use std::fmt;

use log::debug;
use pdp_model::accounting_error;
use pdp_model::types::PdpResult;
use pdp_topology::channel::NUM_CHANNEL_KINDS;

use crate::blocks::{
    EVENT_SCHEMA, EXAMPLE_SCHEMA, EXAMPLE_SET_SCHEMA, NETWORK_SCHEMA, STAGE_SCHEMA, SYSTEM_SCHEMA,
};
use crate::regions::RegionId;
use crate::vertex::Vertex;

/// Memory a node needs: a fixed part and a part that grows with the number
/// of recorded ticks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeResources {
    pub fixed_bytes: u64,
    pub variable_bytes_per_tick: u64,
}

impl NodeResources {
    #[must_use]
    pub fn total_bytes(&self, ticks: u32) -> u64 {
        self.fixed_bytes + self.variable_bytes_per_tick * u64::from(ticks)
    }
}

impl fmt::Display for NodeResources {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} bytes + {} bytes/tick",
            self.fixed_bytes, self.variable_bytes_per_tick
        )
    }
}

/// Placement of one region in a node's memory image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegionPlan {
    pub id: RegionId,
    pub offset: u64,
    pub size: u64,
    /// Position among the regions written at load time, `None` for regions
    /// only reserved for the runtime.
    pub write_order: Option<usize>,
}

/// Bytes a vertex needs for one region.
#[must_use]
pub fn region_size(vertex: &dyn Vertex, id: RegionId) -> u64 {
    let example_set = vertex.network().example_set();
    let size = match id {
        RegionId::System => SYSTEM_SCHEMA.size(),
        RegionId::Network => NETWORK_SCHEMA.size(),
        RegionId::Core => vertex.core_schema().size(),
        RegionId::ExampleSet => EXAMPLE_SET_SCHEMA.size(),
        RegionId::Examples => EXAMPLE_SCHEMA.size() * example_set.num_examples(),
        RegionId::Events => EVENT_SCHEMA.size() * example_set.num_events(),
        RegionId::Routing => 4 * NUM_CHANNEL_KINDS,
        RegionId::Stage => STAGE_SCHEMA.size(),
        RegionId::RecordingInfo => vertex
            .recording()
            .map_or(0, |plan| plan.descriptor_size() as usize),
        RegionId::Inputs
        | RegionId::Targets
        | RegionId::Weights
        | RegionId::History
        | RegionId::Recording => return vertex.data_size(id),
    };
    size as u64
}

/// Lay out the regions of a vertex contiguously from offset 0. Regions with
/// nothing to hold, such as the events of an empty example set, are skipped.
#[must_use]
pub fn plan(vertex: &dyn Vertex) -> Vec<RegionPlan> {
    let mut offset = 0;
    let mut write_order = 0;
    vertex
        .regions()
        .into_iter()
        .filter_map(|id| {
            let size = region_size(vertex, id);
            if size == 0 {
                return None;
            }
            let order = if id.is_reserved() {
                None
            } else {
                write_order += 1;
                Some(write_order - 1)
            };
            let region = RegionPlan {
                id,
                offset,
                size,
                write_order: order,
            };
            offset += size;
            Some(region)
        })
        .collect()
}

/// Memory needs of a vertex, checked against the network's per-node limit.
pub fn resources(vertex: &dyn Vertex) -> PdpResult<NodeResources> {
    let resources = NodeResources {
        fixed_bytes: plan(vertex).iter().map(|r| r.size).sum(),
        variable_bytes_per_tick: vertex
            .recording()
            .map_or(0, |plan| plan.variable_bytes_per_tick()),
    };

    if let Some(limit) = vertex.network().params().node_memory_limit {
        if resources.fixed_bytes > limit {
            return accounting_error!(format!(
                "{} needs {} bytes but nodes have {limit}",
                vertex.node().label,
                resources.fixed_bytes
            ));
        }
    }
    debug!("{}: {resources}", vertex.node().label);
    Ok(resources)
}

/// Receives the memory needs of every node, normally the placement service.
pub trait ResourceSink {
    fn declare(&mut self, label: &str, resources: NodeResources) -> PdpResult;
}

/// Collects declared resources for reporting.
#[derive(Debug, Default)]
pub struct ResourceTable {
    entries: Vec<(String, NodeResources)>,
}

impl ResourceTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, NodeResources)] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&NodeResources> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, r)| r)
    }

    /// Memory of all nodes for a run of `ticks`.
    #[must_use]
    pub fn total_bytes(&self, ticks: u32) -> u64 {
        self.entries.iter().map(|(_, r)| r.total_bytes(ticks)).sum()
    }
}

impl ResourceSink for ResourceTable {
    fn declare(&mut self, label: &str, resources: NodeResources) -> PdpResult {
        if self.get(label).is_some() {
            return accounting_error!(format!("Resources of {label} declared twice"));
        }
        self.entries.push((label.to_string(), resources));
        Ok(())
    }
}

impl fmt::Display for ResourceTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|(l, _)| l.len())
            .max()
            .unwrap_or(0);
        for (label, resources) in &self.entries {
            writeln!(
                f,
                "{label:<width$}  {:>10}  {:>6}/tick",
                resources.fixed_bytes, resources.variable_bytes_per_tick
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_grows_with_ticks() {
        let resources = NodeResources {
            fixed_bytes: 100,
            variable_bytes_per_tick: 36,
        };
        assert_eq!(resources.total_bytes(0), 100);
        assert_eq!(resources.total_bytes(10), 460);
    }

    #[test]
    #[should_panic(expected = "Resources of t_core2/0 declared twice")]
    fn declared_twice() {
        let mut table = ResourceTable::new();
        table
            .declare("t_core2/0", NodeResources::default())
            .unwrap();
        table
            .declare("t_core2/0", NodeResources::default())
            .unwrap();
    }
}
