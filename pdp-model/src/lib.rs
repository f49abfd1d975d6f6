// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! In-memory model of a PDP network.
//!
//! A [Network](crate::network::Network) is built once from a YAML description
//! and then treated as immutable. It holds the global parameters, the groups
//! (layers) with their subgroup partitions, the links between groups and the
//! example set used for training and testing.
//!
//! ```rust
//! use pdp_model::network::Network;
//!
//! let network = Network::from_string(
//!     "
//! network:
//!   name: tiny
//! groups:
//!   - label: Input
//!     units: 2
//!     kind: [input]
//!   - label: Output
//!     units: 1
//!     kind: [output]
//! links:
//!   - from: Input
//!     to: Output
//! ",
//! )
//! .unwrap();
//! assert_eq!(network.num_groups(), 2);
//! assert_eq!(network.output_chain(), &[1]);
//! ```
//!
//! The [fixed](crate::fixed) module converts real values into the
//! fixed-point representations understood by the node runtime.

pub mod builder;
pub mod config;
pub mod example;
pub mod fixed;
pub mod functions;
pub mod group;
pub mod network;
pub mod test_helpers;
pub mod types;
