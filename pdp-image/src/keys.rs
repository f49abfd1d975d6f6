// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Routing keys for outgoing partitions.
//!
//! Every endpoint a node originates is one partition of the machine graph
//! and is given its own key space by the placement and routing service. The
//! mapping only asks for the base key of each partition.

use std::collections::HashMap;

use log::trace;
use pdp_model::topology_error;
use pdp_model::types::PdpResult;
use pdp_topology::builder::Topology;
use pdp_topology::channel::ChannelKind;

/// Keys reserved for each partition. Messages carry the unit index in the
/// low bits.
pub const KEY_SPACE_SIZE: u32 = 0x1_0000;

pub trait KeyAllocator {
    /// Base routing key of the partition `kind` originated by node `label`.
    fn key_for(&self, label: &str, kind: ChannelKind) -> PdpResult<u32>;
}

/// Allocates consecutive key spaces to partitions in topology order.
pub struct SequentialKeyAllocator {
    keys: HashMap<(String, ChannelKind), u32>,
}

impl SequentialKeyAllocator {
    pub fn new(topology: &Topology, base: u32) -> PdpResult<Self> {
        let mut keys = HashMap::new();
        let mut next = Some(base);
        for (node, kind) in topology.partitions() {
            let label = &topology.node(node).label;
            let Some(key) = next else {
                return topology_error!(format!(
                    "Key space exhausted at partition {kind} of {label}"
                ));
            };
            trace!("Key {key:#010x} for {}", topology.node(node).endpoint(kind));
            keys.insert((label.clone(), kind), key);
            next = key.checked_add(KEY_SPACE_SIZE);
        }
        Ok(Self { keys })
    }

    #[must_use]
    pub fn num_partitions(&self) -> usize {
        self.keys.len()
    }
}

impl KeyAllocator for SequentialKeyAllocator {
    fn key_for(&self, label: &str, kind: ChannelKind) -> PdpResult<u32> {
        match self.keys.get(&(label.to_string(), kind)) {
            Some(key) => Ok(*key),
            None => topology_error!(format!("No {kind} partition for {label}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use pdp_model::test_helpers::chain_network;

    use super::*;

    #[test]
    fn keys_are_spaced_by_partition() {
        let topology = Topology::build(&chain_network()).unwrap();
        let keys = SequentialKeyAllocator::new(&topology, 0x1000_0000).unwrap();
        assert_eq!(keys.num_partitions(), topology.partitions().len());

        let (first_node, first_kind) = topology.partitions()[0];
        let first = topology.node(first_node);
        assert_eq!(keys.key_for(&first.label, first_kind).unwrap(), 0x1000_0000);

        let (second_node, second_kind) = topology.partitions()[1];
        let second = topology.node(second_node);
        assert_eq!(
            keys.key_for(&second.label, second_kind).unwrap(),
            0x1000_0000 + KEY_SPACE_SIZE
        );
    }

    #[test]
    #[should_panic(expected = "No stp partition for s_core0/0")]
    fn unknown_partition() {
        let topology = Topology::build(&chain_network()).unwrap();
        let keys = SequentialKeyAllocator::new(&topology, 0).unwrap();
        keys.key_for("s_core0/0", ChannelKind::Stop).unwrap();
    }

    #[test]
    #[should_panic(expected = "Key space exhausted")]
    fn key_space_exhausted() {
        let topology = Topology::build(&chain_network()).unwrap();
        SequentialKeyAllocator::new(&topology, u32::MAX - KEY_SPACE_SIZE).unwrap();
    }
}
