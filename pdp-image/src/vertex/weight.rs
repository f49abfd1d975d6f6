// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;
use std::rc::Rc;

use log::trace;
use pdp_model::fixed::FixedKind;
use pdp_model::group::Subgroup;
use pdp_model::network::{Link, Network};
use pdp_model::types::PdpResult;
use pdp_model::{encoding_error, topology_error};
use pdp_topology::node::{Node, SubgroupRef};

use crate::blocks::{WEIGHT_SCHEMA, WeightBlock, count_u32, encode_rows};
use crate::regions::RegionId;
use crate::schema::Schema;
use crate::vertex::{Vertex, config_regions};

/// Holds the block of a link's weight matrix between one source subgroup
/// (rows) and one destination subgroup (columns).
pub struct WeightVertex {
    network: Rc<Network>,
    node: Node,
}

impl WeightVertex {
    #[must_use]
    pub fn new(network: Rc<Network>, node: Node) -> Self {
        Self { network, node }
    }

    fn subgroup(&self, at: SubgroupRef) -> &Subgroup {
        &self.network.group(at.group).subgroups()[at.subgroup]
    }

    fn from(&self) -> PdpResult<SubgroupRef> {
        match self.node.from {
            Some(from) => Ok(from),
            None => topology_error!(format!("{} has no source subgroup", self.node.label)),
        }
    }

    fn link(&self) -> PdpResult<&Link> {
        match self.node.link.and_then(|id| self.network.links().get(id)) {
            Some(link) => Ok(link),
            None => topology_error!(format!("{} has no link", self.node.label)),
        }
    }

    pub fn block(&self) -> PdpResult<WeightBlock> {
        let from = self.from()?;
        let params = self.network.params();
        Ok(WeightBlock {
            num_rows: self.subgroup(from).units,
            num_cols: self.units(),
            row_blk: count_u32("row_blk", from.subgroup)?,
            col_blk: count_u32("col_blk", self.node.at.subgroup)?,
            init_output: self.network.group(from.group).init_output,
            learning_rate: params.learning_rate,
            weight_decay: params.weight_decay,
            momentum: params.momentum,
        })
    }

    /// This node's slice of the link's initial weights, source units by
    /// destination units.
    pub fn weights(&self) -> PdpResult<Vec<Vec<Option<f64>>>> {
        let from = self.subgroup(self.from()?);
        let to = self.subgroup(self.node.at);
        let matrix = self.network.initial_weights(self.link()?);

        let rows = from.first_unit as usize..(from.first_unit + from.units) as usize;
        let cols = to.first_unit as usize..(to.first_unit + to.units) as usize;
        let Some(block) = matrix.get(rows.clone()) else {
            return encoding_error!(format!(
                "Weights of {} do not cover rows {rows:?}",
                self.node.label
            ));
        };

        let mut weights = Vec::with_capacity(block.len());
        for row in block {
            match row.get(cols.clone()) {
                Some(values) => weights.push(values.to_vec()),
                None => {
                    return encoding_error!(format!(
                        "Weights of {} do not cover columns {cols:?}",
                        self.node.label
                    ));
                }
            }
        }
        trace!(
            "{} holds {}x{} weights",
            self.node.label,
            from.units,
            to.units
        );
        Ok(weights)
    }
}

impl Vertex for WeightVertex {
    fn node(&self) -> &Node {
        &self.node
    }

    fn network(&self) -> &Network {
        &self.network
    }

    fn units(&self) -> u32 {
        self.subgroup(self.node.at).units
    }

    fn core_schema(&self) -> &'static Schema {
        &WEIGHT_SCHEMA
    }

    fn core_block(&self) -> PdpResult<Vec<u8>> {
        self.block()?.encode()
    }

    fn regions(&self) -> Vec<RegionId> {
        let mut regions = config_regions(true);
        regions.extend([RegionId::Weights, RegionId::Routing, RegionId::Stage]);
        regions
    }

    fn data_size(&self, id: RegionId) -> u64 {
        match (id, self.node.from) {
            (RegionId::Weights, Some(from)) => {
                4 * u64::from(self.subgroup(from).units) * u64::from(self.units())
            }
            _ => 0,
        }
    }

    fn data(&self, id: RegionId) -> PdpResult<Vec<u8>> {
        match id {
            RegionId::Weights => encode_rows(&self.weights()?, FixedKind::Weight),
            _ => encoding_error!(format!("{} has no {id} data", self.node.label)),
        }
    }
}

impl fmt::Display for WeightVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.node.label)
    }
}
