// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;
use std::rc::Rc;

use pdp_model::encoding_error;
use pdp_model::fixed::FixedKind;
use pdp_model::group::{Group, Subgroup};
use pdp_model::network::Network;
use pdp_model::types::PdpResult;
use pdp_topology::node::Node;

use crate::blocks::{INPUT_SCHEMA, InputBlock, encode_rows};
use crate::regions::RegionId;
use crate::schema::Schema;
use crate::vertex::{Vertex, config_regions, event_matrix_size};

/// Applies the input processes of an input group to the nets from its Sum
/// node before they reach the Threshold.
pub struct InputVertex {
    network: Rc<Network>,
    node: Node,
}

impl InputVertex {
    #[must_use]
    pub fn new(network: Rc<Network>, node: Node) -> Self {
        Self { network, node }
    }

    fn group(&self) -> &Group {
        self.network.group(self.node.at.group)
    }

    fn subgroup(&self) -> &Subgroup {
        &self.group().subgroups()[self.node.at.subgroup]
    }

    #[must_use]
    pub fn block(&self) -> InputBlock {
        let group = self.group();
        InputBlock {
            output_grp: group.is_output,
            input_grp: group.is_input,
            num_units: self.units(),
            in_procs: group.in_procs.clone(),
            in_integr_dt: 1.0 / f64::from(self.network.params().ticks_per_interval),
            soft_clamp_strength: group.soft_clamp_strength,
            init_nets: group.init_net,
        }
    }
}

impl Vertex for InputVertex {
    fn node(&self) -> &Node {
        &self.node
    }

    fn network(&self) -> &Network {
        &self.network
    }

    fn units(&self) -> u32 {
        self.subgroup().units
    }

    fn core_schema(&self) -> &'static Schema {
        &INPUT_SCHEMA
    }

    fn core_block(&self) -> PdpResult<Vec<u8>> {
        self.block().encode()
    }

    fn regions(&self) -> Vec<RegionId> {
        let mut regions = config_regions(true);
        regions.extend([RegionId::Inputs, RegionId::Routing, RegionId::Stage]);
        regions
    }

    fn data_size(&self, id: RegionId) -> u64 {
        match id {
            RegionId::Inputs => event_matrix_size(&self.network, self.units()),
            _ => 0,
        }
    }

    fn data(&self, id: RegionId) -> PdpResult<Vec<u8>> {
        match id {
            RegionId::Inputs => {
                let subgroup = self.subgroup();
                let rows = self.network.example_set().input_rows(
                    self.group(),
                    subgroup.first_unit,
                    subgroup.units,
                );
                encode_rows(&rows, FixedKind::Activation)
            }
            _ => encoding_error!(format!("{} has no {id} data", self.node.label)),
        }
    }
}

impl fmt::Display for InputVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.node.label)
    }
}
