// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;
use std::rc::Rc;

use pdp_model::encoding_error;
use pdp_model::fixed::FixedKind;
use pdp_model::group::{Group, Subgroup};
use pdp_model::network::Network;
use pdp_model::types::PdpResult;
use pdp_topology::node::Node;
use pdp_topology::scoreboard::crit_expected;

use crate::blocks::{THRESHOLD_SCHEMA, ThresholdBlock, encode_rows};
use crate::recording::RecordingPlan;
use crate::regions::RegionId;
use crate::schema::Schema;
use crate::vertex::{Vertex, config_regions, event_matrix_size};

/// Bytes of history kept per unit per tick: target (4), output derivative
/// (8), net (4) and output (4).
pub const HISTORY_BYTES_PER_UNIT_TICK: u64 = 20;

/// Applies the output processes of a subgroup, computes errors against the
/// targets and takes part in the convergence check.
pub struct ThresholdVertex {
    network: Rc<Network>,
    node: Node,
}

impl ThresholdVertex {
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

    fn is_last_subgroup(&self) -> bool {
        self.group().is_last_subgroup(self.node.at.subgroup)
    }

    pub fn block(&self) -> PdpResult<ThresholdBlock> {
        let group = self.group();
        let params = self.network.params();
        Ok(ThresholdBlock {
            output_grp: group.is_output,
            input_grp: group.is_input,
            is_last_sgrp: self.is_last_subgroup(),
            num_units: self.units(),
            out_procs: group.out_procs.clone(),
            out_integr_dt: 1.0 / f64::from(params.ticks_per_interval),
            weak_clamp_strength: group.weak_clamp_strength,
            init_output: group.init_output,
            tst_group_criterion: group
                .test_criterion
                .or(params.test_group_crit)
                .unwrap_or(0.0),
            trn_group_criterion: group
                .train_criterion
                .or(params.train_group_crit)
                .unwrap_or(0.0),
            crit_expected: crit_expected(&self.network, self.node.at)?,
            criterion_function: group.criterion_function,
            is_first_output: self.network.is_first_output_group(group.id)
                && self.node.at.subgroup == 0,
            is_last_output: self.network.is_last_output_group(group.id)
                && self.is_last_subgroup(),
            error_function: group.error_function,
        })
    }
}

impl Vertex for ThresholdVertex {
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
        &THRESHOLD_SCHEMA
    }

    fn core_block(&self) -> PdpResult<Vec<u8>> {
        self.block()?.encode()
    }

    fn regions(&self) -> Vec<RegionId> {
        let group = self.group();
        let mut regions = config_regions(true);
        if group.is_input {
            regions.push(RegionId::Inputs);
        }
        if group.is_output {
            regions.push(RegionId::Targets);
        }
        regions.extend([RegionId::Routing, RegionId::Stage]);
        if group.is_output {
            regions.push(RegionId::RecordingInfo);
        }
        regions.push(RegionId::History);
        if group.is_output {
            regions.push(RegionId::Recording);
        }
        regions
    }

    fn data_size(&self, id: RegionId) -> u64 {
        match id {
            RegionId::Inputs | RegionId::Targets => {
                event_matrix_size(&self.network, self.units())
            }
            RegionId::History => {
                HISTORY_BYTES_PER_UNIT_TICK
                    * u64::from(self.units())
                    * u64::from(self.network.global_max_ticks())
            }
            RegionId::Recording => self.recording().map_or(0, |plan| plan.fixed_bytes()),
            _ => 0,
        }
    }

    fn data(&self, id: RegionId) -> PdpResult<Vec<u8>> {
        let subgroup = self.subgroup();
        let example_set = self.network.example_set();
        let rows = match id {
            RegionId::Inputs => {
                example_set.input_rows(self.group(), subgroup.first_unit, subgroup.units)
            }
            RegionId::Targets => {
                example_set.target_rows(self.group(), subgroup.first_unit, subgroup.units)
            }
            _ => return encoding_error!(format!("{} has no {id} data", self.node.label)),
        };
        encode_rows(&rows, FixedKind::Activation)
    }

    fn recording(&self) -> Option<RecordingPlan> {
        let group = self.group();
        group.is_output.then(|| RecordingPlan {
            units: self.units(),
            first_output: self.network.is_first_output_group(group.id)
                && self.node.at.subgroup == 0,
        })
    }
}

impl fmt::Display for ThresholdVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.node.label)
    }
}
