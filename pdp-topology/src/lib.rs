// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Message topology of a mapped PDP network.
//!
//! Every subgroup of a group is served by a Sum and a Threshold node (plus an
//! Input node for input groups) and every pair of linked subgroups by a Weight
//! node. The [builder](crate::builder) derives these nodes and the typed
//! channels between them; the [scoreboard](crate::scoreboard) derives the
//! message counts each node waits for and checks them against the topology.
//!
//! ```rust
//! use pdp_model::test_helpers::chain_network;
//! use pdp_topology::builder::Topology;
//! use pdp_topology::node::Role;
//! use pdp_topology::scoreboard::verify;
//!
//! let network = chain_network();
//! let topology = Topology::build(&network).unwrap();
//! assert_eq!(topology.num_nodes_with_role(Role::Weight), 2);
//! verify(&network, &topology).unwrap();
//! ```

pub mod builder;
pub mod channel;
pub mod node;
pub mod scoreboard;
