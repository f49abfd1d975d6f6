// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Per-role node behaviour.
//!
//! Each node role has one concrete vertex type. A vertex knows which memory
//! regions its node owns, how to encode its core configuration block and how
//! to produce its role-specific data regions. Regions common to all roles
//! are written by the [regions](crate::regions) module.

use std::fmt::Display;
use std::rc::Rc;

use pdp_model::encoding_error;
use pdp_model::network::Network;
use pdp_model::types::PdpResult;
use pdp_topology::node::{Node, Role};

use crate::recording::RecordingPlan;
use crate::regions::RegionId;
use crate::schema::Schema;

pub mod input;
pub mod sum;
pub mod threshold;
pub mod weight;

pub use input::InputVertex;
pub use sum::SumVertex;
pub use threshold::ThresholdVertex;
pub use weight::WeightVertex;

pub trait Vertex: Display {
    fn node(&self) -> &Node;

    fn network(&self) -> &Network;

    /// Number of units the node computes for.
    fn units(&self) -> u32;

    fn core_schema(&self) -> &'static Schema;

    fn core_block(&self) -> PdpResult<Vec<u8>>;

    /// Regions owned by the node, in region id order.
    fn regions(&self) -> Vec<RegionId>;

    /// Size of a role-specific data region.
    fn data_size(&self, id: RegionId) -> u64 {
        let _ = id;
        0
    }

    /// Content of a role-specific data region.
    fn data(&self, id: RegionId) -> PdpResult<Vec<u8>> {
        encoding_error!(format!("{} has no {id} data", self.node().label))
    }

    /// Recording channels, for nodes that record.
    fn recording(&self) -> Option<RecordingPlan> {
        None
    }
}

/// Create the vertex that implements a node's role.
#[must_use]
pub fn create(network: &Rc<Network>, node: &Node) -> Rc<dyn Vertex> {
    match node.role {
        Role::Weight => Rc::new(WeightVertex::new(network.clone(), node.clone())),
        Role::Sum => Rc::new(SumVertex::new(network.clone(), node.clone())),
        Role::Input => Rc::new(InputVertex::new(network.clone(), node.clone())),
        Role::Threshold => Rc::new(ThresholdVertex::new(network.clone(), node.clone())),
    }
}

/// Regions every role starts with.
pub(crate) fn config_regions(with_events: bool) -> Vec<RegionId> {
    let mut regions = vec![
        RegionId::System,
        RegionId::Network,
        RegionId::Core,
        RegionId::ExampleSet,
        RegionId::Examples,
    ];
    if with_events {
        regions.push(RegionId::Events);
    }
    regions
}

/// Size of a per-event, per-unit matrix of 32-bit values.
pub(crate) fn event_matrix_size(network: &Network, units: u32) -> u64 {
    4 * u64::from(units) * network.example_set().num_events() as u64
}
