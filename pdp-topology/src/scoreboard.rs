// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Static barrier counts.
//!
//! A node only advances a phase once it has seen the expected number of
//! messages on the corresponding channel. These counts are derived here from
//! the network shape alone, and [verify] checks them against the in-degrees
//! of a built [Topology]: an undercount lets a node run on stale data and an
//! overcount hangs it forever.

use log::debug;
use pdp_model::network::Network;
use pdp_model::{encoding_error, topology_error};
use pdp_model::types::PdpResult;

use crate::builder::Topology;
use crate::channel::ChannelKind;
use crate::node::{Role, SubgroupRef};

/// Barrier counts of a Sum node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SumExpect {
    pub fwd: u32,
    pub bkp: u32,
    pub lds: u32,
}

fn count(n: usize) -> PdpResult<u32> {
    match u32::try_from(n) {
        Ok(n) => Ok(n),
        Err(_) => encoding_error!(format!("Barrier count {n} does not fit in 32 bits")),
    }
}

/// Number of Weight nodes whose destination is subgroup `at`.
pub fn weights_feeding(network: &Network, at: SubgroupRef) -> PdpResult<u32> {
    count(
        network
            .links_into(at.group)
            .map(|l| network.group(l.from).num_subgroups())
            .sum(),
    )
}

/// Number of Weight nodes whose source is subgroup `at`.
pub fn weights_fed(network: &Network, at: SubgroupRef) -> PdpResult<u32> {
    count(
        network
            .links()
            .iter()
            .filter(|l| l.from == at.group)
            .map(|l| network.group(l.to).num_subgroups())
            .sum(),
    )
}

pub fn sum_expect(network: &Network, at: SubgroupRef) -> PdpResult<SumExpect> {
    let fwd = weights_feeding(network, at)?;
    let bkp = weights_fed(network, at)?;

    let mut lds = fwd;
    if at.subgroup == 0 {
        // every other subgroup of the group
        lds = add(lds, network.group(at.group).num_subgroups() - 1)?;
        if at.group == network.first_group().id {
            // every other group
            lds = add(lds, network.num_groups() - 1)?;
        }
    }
    Ok(SumExpect { fwd, bkp, lds })
}

fn add(total: u32, n: usize) -> PdpResult<u32> {
    match total.checked_add(count(n)?) {
        Some(total) => Ok(total),
        None => encoding_error!(format!("Barrier count {total} + {n} does not fit in 32 bits")),
    }
}

/// Convergence messages a Threshold node collects before deciding.
pub fn crit_expected(network: &Network, at: SubgroupRef) -> PdpResult<u32> {
    let group = network.group(at.group);
    if !group.is_last_subgroup(at.subgroup) {
        return Ok(0);
    }

    let mut expected = count(group.num_subgroups() - 1)?;
    if network.is_last_output_group(at.group) {
        expected = add(expected, network.output_chain().len() - 1)?;
    }
    Ok(expected)
}

/// Check every computed barrier count against the built topology, and the
/// stop broadcast against its single-originator rule.
pub fn verify(network: &Network, topology: &Topology) -> PdpResult {
    let mut errors = Vec::new();

    for node in topology.nodes() {
        let mut check = |kind: ChannelKind, expected: u32| {
            let actual = topology.in_degree(node.id, kind);
            if actual != expected as usize {
                errors.push(format!(
                    "{} expects {expected} {kind} messages but has {actual} senders",
                    node.label
                ));
            }
        };

        match node.role {
            Role::Sum => {
                let expect = sum_expect(network, node.at)?;
                check(ChannelKind::Forward, expect.fwd);
                check(ChannelKind::Backprop, expect.bkp);
                check(ChannelKind::LocalDeltaSum, expect.lds);
            }
            Role::Threshold => {
                check(ChannelKind::Criterion, crit_expected(network, node.at)?);
            }
            Role::Weight | Role::Input => {}
        }

        let expected_stop = if node.id == topology.stop_node() { 0 } else { 1 };
        check(ChannelKind::Stop, expected_stop);

        let stop_out = topology.out_degree(node.id, ChannelKind::Stop);
        if node.id == topology.stop_node() {
            if stop_out != topology.num_nodes() - 1 {
                errors.push(format!(
                    "{} sends stop to {stop_out} of {} other nodes",
                    node.label,
                    topology.num_nodes() - 1
                ));
            }
        } else if stop_out != 0 {
            errors.push(format!("{} is not the stop node but sends stop", node.label));
        }
    }

    if !errors.is_empty() {
        return topology_error!(format!(
            "Failed to verify scoreboards:\n{}",
            errors.join("\n")
        ));
    }
    debug!("Verified scoreboards of {} nodes", topology.num_nodes());
    Ok(())
}
