// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::collections::HashSet;

use pdp_model::test_helpers::{chain_network, recurrent_chain_network, wide_network};
use pdp_topology::builder::Topology;
use pdp_topology::channel::ChannelKind;
use pdp_topology::node::{Role, SubgroupRef};

fn at(group: usize, subgroup: usize) -> SubgroupRef {
    SubgroupRef { group, subgroup }
}

#[test]
fn chain_node_counts() {
    let topology = Topology::build(&chain_network()).unwrap();
    assert_eq!(topology.num_nodes_with_role(Role::Weight), 2);
    assert_eq!(topology.num_nodes_with_role(Role::Sum), 3);
    assert_eq!(topology.num_nodes_with_role(Role::Threshold), 3);
    assert_eq!(topology.num_nodes_with_role(Role::Input), 1);
    assert_eq!(topology.num_nodes(), 9);

    let labels: Vec<&str> = topology.nodes().iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "s_core0/0",
            "i_core0/0",
            "t_core0/0",
            "w_core1/0_0/0",
            "s_core1/0",
            "t_core1/0",
            "w_core2/0_1/0",
            "s_core2/0",
            "t_core2/0",
        ]
    );
}

#[test]
fn recurrent_chain_has_ten_nodes_and_one_stop_originator() {
    let topology = Topology::build(&recurrent_chain_network()).unwrap();
    assert_eq!(topology.num_nodes_with_role(Role::Weight), 3);
    assert_eq!(topology.num_nodes(), 10);

    let stop = topology.stop_node();
    assert_eq!(topology.node(stop).label, "t_core2/0");
    assert_eq!(topology.node(stop).role, Role::Threshold);

    let receivers: HashSet<_> = topology
        .out_edges(stop, ChannelKind::Stop)
        .map(|e| e.dst)
        .collect();
    assert_eq!(receivers.len(), 9);
    assert_eq!(topology.out_degree(stop, ChannelKind::Stop), 9);
    assert!(!receivers.contains(&stop));

    for node in topology.nodes() {
        if node.id != stop {
            assert_eq!(topology.out_degree(node.id, ChannelKind::Stop), 0);
            assert_eq!(topology.in_degree(node.id, ChannelKind::Stop), 1);
        }
    }
}

#[test]
fn forward_path_through_input_node() {
    let topology = Topology::build(&chain_network()).unwrap();
    let s0 = topology.sum(at(0, 0));
    let i0 = topology.input(at(0, 0)).unwrap();
    let t0 = topology.threshold(at(0, 0));

    let dsts: Vec<_> = topology
        .out_edges(s0, ChannelKind::Forward)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![i0]);
    let dsts: Vec<_> = topology
        .out_edges(i0, ChannelKind::Forward)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![t0]);

    // The hidden threshold feeds the output weight node
    let t1 = topology.threshold(at(1, 0));
    let w = topology.weights_from(at(1, 0))[0];
    assert_eq!(topology.node(w).label, "w_core2/0_1/0");
    let dsts: Vec<_> = topology
        .out_edges(t1, ChannelKind::Forward)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![w]);
    assert!(topology.input(at(1, 0)).is_none());
}

#[test]
fn backprop_mirrors_forward() {
    let topology = Topology::build(&chain_network()).unwrap();

    // Output threshold has no input node, so errors go straight to its
    // weights
    let t2 = topology.threshold(at(2, 0));
    let w2 = topology.weights_into(at(2, 0))[0];
    let dsts: Vec<_> = topology
        .out_edges(t2, ChannelKind::Backprop)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![w2]);

    // Weight node sends deltas to the sum of its source subgroup and syncs
    // the threshold that fed it
    let s1 = topology.sum(at(1, 0));
    let t1 = topology.threshold(at(1, 0));
    let dsts: Vec<_> = topology
        .out_edges(w2, ChannelKind::Backprop)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![s1]);
    let dsts: Vec<_> = topology
        .out_edges(w2, ChannelKind::ForwardSync)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![t1]);

    // The input group has no incoming weights, so its input node ends the
    // backprop path
    let i0 = topology.input(at(0, 0)).unwrap();
    assert_eq!(topology.in_degree(i0, ChannelKind::Backprop), 1);
    assert!(!topology.originates(i0, ChannelKind::Backprop));
}

#[test]
fn local_delta_sum_reduces_to_first_group() {
    let topology = Topology::build(&wide_network()).unwrap();
    let root = topology.sum(at(0, 0));

    let dsts: Vec<_> = topology
        .out_edges(topology.sum(at(0, 1)), ChannelKind::LocalDeltaSum)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![root]);

    let dsts: Vec<_> = topology
        .out_edges(topology.sum(at(1, 2)), ChannelKind::LocalDeltaSum)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![topology.sum(at(1, 0))]);

    // The root broadcasts the total to all weight nodes
    assert_eq!(
        topology.out_degree(root, ChannelKind::LocalDeltaSum),
        topology.num_nodes_with_role(Role::Weight)
    );
}

#[test]
fn wide_network_nodes_and_stop_node() {
    let topology = Topology::build(&wide_network()).unwrap();
    assert_eq!(topology.num_nodes_with_role(Role::Weight), 15);
    assert_eq!(topology.num_nodes_with_role(Role::Sum), 8);
    assert_eq!(topology.num_nodes_with_role(Role::Input), 2);
    assert_eq!(topology.num_nodes_with_role(Role::Threshold), 8);

    // OutA is last in the output chain and has a single subgroup
    let stop = topology.stop_node();
    assert_eq!(topology.node(stop).label, "t_core2/0");

    // OutB's last subgroup reports to the stop node
    let out_b_last = topology.threshold(at(3, 1));
    let dsts: Vec<_> = topology
        .out_edges(out_b_last, ChannelKind::Criterion)
        .map(|e| e.dst)
        .collect();
    assert_eq!(dsts, vec![stop]);
    assert_eq!(topology.in_degree(out_b_last, ChannelKind::Criterion), 1);
}

#[test]
fn endpoints_are_unique() {
    let topology = Topology::build(&wide_network()).unwrap();
    let partitions = topology.partitions();
    let names: HashSet<String> = partitions
        .iter()
        .map(|(id, kind)| topology.node(*id).endpoint(*kind))
        .collect();
    assert_eq!(names.len(), partitions.len());
    assert!(names.contains("stp_t2/0"));
    assert!(!names.contains("stp_t3/1"));
}

#[test]
fn rebuild_is_identical() {
    let network = recurrent_chain_network();
    let first = Topology::build(&network).unwrap();
    let second = Topology::build(&network).unwrap();
    assert_eq!(first.nodes(), second.nodes());
    assert_eq!(first.edges(), second.edges());
}

#[test]
#[should_panic(expected = "No node 'w_core9/9_0/0'")]
fn unknown_node_label() {
    let topology = Topology::build(&chain_network()).unwrap();
    topology.node_from_label("w_core9/9_0/0").unwrap();
}
