// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;
use std::rc::Rc;

use pdp_model::network::Network;
use pdp_model::types::PdpResult;
use pdp_topology::node::Node;
use pdp_topology::scoreboard::sum_expect;

use crate::blocks::{SUM_SCHEMA, SumBlock};
use crate::regions::RegionId;
use crate::schema::Schema;
use crate::vertex::{Vertex, config_regions};

/// Accumulates partial nets on the forward pass and partial errors on the
/// backward pass.
pub struct SumVertex {
    network: Rc<Network>,
    node: Node,
}

impl SumVertex {
    #[must_use]
    pub fn new(network: Rc<Network>, node: Node) -> Self {
        Self { network, node }
    }

    pub fn block(&self) -> PdpResult<SumBlock> {
        let expect = sum_expect(&self.network, self.node.at)?;
        Ok(SumBlock {
            num_units: self.units(),
            fwd_expect: expect.fwd,
            bkp_expect: expect.bkp,
            lds_expect: expect.lds,
            is_first_group: self.node.at.group == self.network.first_group().id,
        })
    }
}

impl Vertex for SumVertex {
    fn node(&self) -> &Node {
        &self.node
    }

    fn network(&self) -> &Network {
        &self.network
    }

    fn units(&self) -> u32 {
        self.network.group(self.node.at.group).subgroups()[self.node.at.subgroup].units
    }

    fn core_schema(&self) -> &'static Schema {
        &SUM_SCHEMA
    }

    fn core_block(&self) -> PdpResult<Vec<u8>> {
        self.block()?.encode()
    }

    fn regions(&self) -> Vec<RegionId> {
        let mut regions = config_regions(false);
        regions.extend([RegionId::Routing, RegionId::Stage]);
        regions
    }
}

impl fmt::Display for SumVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.node.label)
    }
}
