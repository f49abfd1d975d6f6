// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Derive the nodes of a mapped network and the channels between them.
//!
//! Nodes are created in a fixed order: for every group and every subgroup,
//! the Weight nodes that feed the subgroup (by link, then by source
//! subgroup), then its Sum, Input (input groups only) and Threshold nodes.
//! Rebuilding from the same [Network] therefore gives the same node ids,
//! labels and endpoint names.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use log::{debug, info, trace};
use pdp_model::network::Network;
use pdp_model::topology_error;
use pdp_model::types::PdpResult;

use crate::channel::{ChannelKind, Edge, NUM_CHANNEL_KINDS};
use crate::node::{Node, NodeId, Role, SubgroupRef};

type Degrees = [usize; NUM_CHANNEL_KINDS];

pub struct Topology {
    nodes: Vec<Node>,
    node_idx_by_label: HashMap<String, usize>,
    edges: Vec<Edge>,
    in_degrees: Vec<Degrees>,
    out_degrees: Vec<Degrees>,
    sums: Vec<Vec<NodeId>>,
    inputs: Vec<Vec<NodeId>>,
    thresholds: Vec<Vec<NodeId>>,
    weights_into: Vec<Vec<Vec<NodeId>>>,
    weights_from: Vec<Vec<Vec<NodeId>>>,
    stop_node: NodeId,
}

impl Topology {
    pub fn build(network: &Network) -> PdpResult<Self> {
        let Some(&last_output) = network.output_chain().last() else {
            return topology_error!("Output chain is empty");
        };

        let mut topology = Topology {
            nodes: Vec::new(),
            node_idx_by_label: HashMap::new(),
            edges: Vec::new(),
            in_degrees: Vec::new(),
            out_degrees: Vec::new(),
            sums: Vec::new(),
            inputs: Vec::new(),
            thresholds: Vec::new(),
            weights_into: Vec::new(),
            weights_from: Vec::new(),
            stop_node: NodeId(0),
        };
        topology.create_nodes(network)?;

        let last_output = network.group(last_output);
        topology.stop_node = topology.threshold(SubgroupRef {
            group: last_output.id,
            subgroup: last_output.num_subgroups() - 1,
        });

        topology.connect_forward(network);
        topology.connect_backprop(network);
        topology.connect_forward_sync();
        topology.connect_local_delta_sum(network);
        topology.connect_criterion(network);
        topology.connect_stop();

        info!("{topology}");
        Ok(topology)
    }

    fn create_nodes(&mut self, network: &Network) -> PdpResult {
        for group in network.groups() {
            let num_subgroups = group.num_subgroups();
            self.sums.push(Vec::with_capacity(num_subgroups));
            self.inputs.push(Vec::new());
            self.thresholds.push(Vec::with_capacity(num_subgroups));
            self.weights_into.push(vec![Vec::new(); num_subgroups]);
            self.weights_from.push(vec![Vec::new(); num_subgroups]);
        }

        for group in network.groups() {
            for subgroup in group.subgroups() {
                let at = SubgroupRef {
                    group: group.id,
                    subgroup: subgroup.index,
                };
                for link in network.links_into(group.id) {
                    for from_subgroup in network.group(link.from).subgroups() {
                        let from = SubgroupRef {
                            group: link.from,
                            subgroup: from_subgroup.index,
                        };
                        let id = self.add_node(Node::new_weight(self.next_id(), at, from, link.id))?;
                        self.weights_into[at.group][at.subgroup].push(id);
                        self.weights_from[from.group][from.subgroup].push(id);
                    }
                }

                let id = self.add_node(Node::new(self.next_id(), Role::Sum, at))?;
                self.sums[at.group].push(id);
                if group.is_input {
                    let id = self.add_node(Node::new(self.next_id(), Role::Input, at))?;
                    self.inputs[at.group].push(id);
                }
                let id = self.add_node(Node::new(self.next_id(), Role::Threshold, at))?;
                self.thresholds[at.group].push(id);
            }
        }
        Ok(())
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len())
    }

    fn add_node(&mut self, node: Node) -> PdpResult<NodeId> {
        let id = node.id;
        if self
            .node_idx_by_label
            .insert(node.label.clone(), id.0)
            .is_some()
        {
            return topology_error!(format!("Duplicate node label '{}'", node.label));
        }
        debug!("Add node {node}");
        self.nodes.push(node);
        self.in_degrees.push([0; NUM_CHANNEL_KINDS]);
        self.out_degrees.push([0; NUM_CHANNEL_KINDS]);
        Ok(id)
    }

    fn connect(&mut self, src: NodeId, dst: NodeId, kind: ChannelKind) {
        trace!(
            "Connect {} to {} ({kind})",
            self.nodes[src.0].label, self.nodes[dst.0].label
        );
        self.edges.push(Edge { src, dst, kind });
        self.out_degrees[src.0][kind.slot()] += 1;
        self.in_degrees[dst.0][kind.slot()] += 1;
    }

    fn subgroup_refs<'a>(network: &'a Network) -> impl Iterator<Item = SubgroupRef> + 'a {
        network.groups().iter().flat_map(|g| {
            g.subgroups().iter().map(move |s| SubgroupRef {
                group: g.id,
                subgroup: s.index,
            })
        })
    }

    fn weight_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.role == Role::Weight)
            .map(|n| n.id)
            .collect()
    }

    fn connect_forward(&mut self, network: &Network) {
        for w in self.weight_nodes() {
            let at = self.nodes[w.0].at;
            self.connect(w, self.sum(at), ChannelKind::Forward);
        }
        for at in Self::subgroup_refs(network) {
            let s = self.sum(at);
            let t = self.threshold(at);
            match self.input(at) {
                Some(i) => {
                    self.connect(s, i, ChannelKind::Forward);
                    self.connect(i, t, ChannelKind::Forward);
                }
                None => self.connect(s, t, ChannelKind::Forward),
            }
            for w in self.weights_from(at).to_vec() {
                self.connect(t, w, ChannelKind::Forward);
            }
        }
    }

    fn connect_backprop(&mut self, network: &Network) {
        for w in self.weight_nodes() {
            if let Some(from) = self.nodes[w.0].from {
                self.connect(w, self.sum(from), ChannelKind::Backprop);
            }
        }
        for at in Self::subgroup_refs(network) {
            let s = self.sum(at);
            let t = self.threshold(at);
            self.connect(s, t, ChannelKind::Backprop);
            let feeding = self.weights_into(at).to_vec();
            match self.input(at) {
                Some(i) => {
                    self.connect(t, i, ChannelKind::Backprop);
                    for w in feeding {
                        self.connect(i, w, ChannelKind::Backprop);
                    }
                }
                None => {
                    for w in feeding {
                        self.connect(t, w, ChannelKind::Backprop);
                    }
                }
            }
        }
    }

    fn connect_forward_sync(&mut self) {
        for w in self.weight_nodes() {
            if let Some(from) = self.nodes[w.0].from {
                self.connect(w, self.threshold(from), ChannelKind::ForwardSync);
            }
        }
    }

    /// Partial sums flow Weight -> Sum, then to subgroup 0 of each group,
    /// then to subgroup 0 of the first group, which broadcasts the total back
    /// to every Weight node.
    fn connect_local_delta_sum(&mut self, network: &Network) {
        let weights = self.weight_nodes();
        for &w in &weights {
            let at = self.nodes[w.0].at;
            self.connect(w, self.sum(at), ChannelKind::LocalDeltaSum);
        }

        let root = self.sum(SubgroupRef {
            group: network.first_group().id,
            subgroup: 0,
        });
        for at in Self::subgroup_refs(network) {
            let s = self.sum(at);
            if at.subgroup != 0 {
                let group_root = self.sum(SubgroupRef {
                    group: at.group,
                    subgroup: 0,
                });
                self.connect(s, group_root, ChannelKind::LocalDeltaSum);
            } else if s != root {
                self.connect(s, root, ChannelKind::LocalDeltaSum);
            }
        }

        for w in weights {
            self.connect(root, w, ChannelKind::LocalDeltaSum);
        }
    }

    /// Each group's last subgroup collects from its other subgroups. The last
    /// subgroups of the output groups then report to the stop node.
    fn connect_criterion(&mut self, network: &Network) {
        for group in network.groups() {
            let last = SubgroupRef {
                group: group.id,
                subgroup: group.num_subgroups() - 1,
            };
            let collector = self.threshold(last);
            for subgroup in 0..last.subgroup {
                let t = self.threshold(SubgroupRef {
                    group: group.id,
                    subgroup,
                });
                self.connect(t, collector, ChannelKind::Criterion);
            }
        }

        for &group in network.output_chain() {
            let last = SubgroupRef {
                group,
                subgroup: network.group(group).num_subgroups() - 1,
            };
            let t = self.threshold(last);
            if t != self.stop_node {
                self.connect(t, self.stop_node, ChannelKind::Criterion);
            }
        }
    }

    fn connect_stop(&mut self) {
        let stop_node = self.stop_node;
        for dst in 0..self.nodes.len() {
            if dst != stop_node.0 {
                self.connect(stop_node, NodeId(dst), ChannelKind::Stop);
            }
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_from_label(&self, label: &str) -> PdpResult<&Node> {
        match self.node_idx_by_label.get(label) {
            Some(idx) => Ok(&self.nodes[*idx]),
            None => topology_error!(format!("No node '{label}'")),
        }
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn out_edges(&self, node: NodeId, kind: ChannelKind) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(move |e| e.src == node && e.kind == kind)
    }

    #[must_use]
    pub fn in_degree(&self, node: NodeId, kind: ChannelKind) -> usize {
        self.in_degrees[node.0][kind.slot()]
    }

    #[must_use]
    pub fn out_degree(&self, node: NodeId, kind: ChannelKind) -> usize {
        self.out_degrees[node.0][kind.slot()]
    }

    /// A node originates a channel kind when it sends at least one message
    /// of that kind.
    #[must_use]
    pub fn originates(&self, node: NodeId, kind: ChannelKind) -> bool {
        self.out_degree(node, kind) > 0
    }

    /// Every originated endpoint as (node, kind), in node then slot order.
    #[must_use]
    pub fn partitions(&self) -> Vec<(NodeId, ChannelKind)> {
        self.nodes
            .iter()
            .cartesian_product(ChannelKind::ALL)
            .filter(|(node, kind)| self.originates(node.id, *kind))
            .map(|(node, kind)| (node.id, kind))
            .collect()
    }

    #[must_use]
    pub fn sum(&self, at: SubgroupRef) -> NodeId {
        self.sums[at.group][at.subgroup]
    }

    #[must_use]
    pub fn threshold(&self, at: SubgroupRef) -> NodeId {
        self.thresholds[at.group][at.subgroup]
    }

    #[must_use]
    pub fn input(&self, at: SubgroupRef) -> Option<NodeId> {
        self.inputs[at.group].get(at.subgroup).copied()
    }

    /// Weight nodes whose destination is `at`.
    #[must_use]
    pub fn weights_into(&self, at: SubgroupRef) -> &[NodeId] {
        &self.weights_into[at.group][at.subgroup]
    }

    /// Weight nodes whose source is `at`.
    #[must_use]
    pub fn weights_from(&self, at: SubgroupRef) -> &[NodeId] {
        &self.weights_from[at.group][at.subgroup]
    }

    /// The Threshold node that originates the stop broadcast.
    #[must_use]
    pub fn stop_node(&self) -> NodeId {
        self.stop_node
    }

    #[must_use]
    pub fn num_nodes_with_role(&self, role: Role) -> usize {
        self.nodes.iter().filter(|n| n.role == role).count()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Topology: {} nodes ({} weight, {} sum, {} input, {} threshold), {} edges",
            self.nodes.len(),
            self.num_nodes_with_role(Role::Weight),
            self.num_nodes_with_role(Role::Sum),
            self.num_nodes_with_role(Role::Input),
            self.num_nodes_with_role(Role::Threshold),
            self.edges.len()
        )?;
        let per_kind = ChannelKind::ALL
            .iter()
            .map(|kind| {
                let count = self.edges.iter().filter(|e| e.kind == *kind).count();
                format!("{kind}: {count}")
            })
            .join(", ");
        write!(
            f,
            "  {per_kind}; stop node {}",
            self.nodes[self.stop_node.0].label
        )
    }
}
