// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! Memory images of the nodes of a mapped PDP network.
//!
//! A [Mapping](crate::mapping::Mapping) creates one
//! [vertex](crate::vertex) per node of the topology. Each vertex encodes its
//! configuration [blocks](crate::blocks) using the layouts of the
//! [schema](crate::schema) module, the [accountant](crate::accountant) sizes
//! its memory and the [regions](crate::regions) module lays it out.
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use pdp_image::keys::SequentialKeyAllocator;
//! use pdp_image::mapping::Mapping;
//! use pdp_image::stage::{Stage, StageId};
//! use pdp_model::test_helpers::chain_network;
//!
//! let mapping = Mapping::new(Rc::new(chain_network())).unwrap();
//! let keys = SequentialKeyAllocator::new(mapping.topology(), 0).unwrap();
//! let images = mapping
//!     .generate(&keys, &Stage::training(StageId(0)))
//!     .unwrap();
//! assert_eq!(images.len(), 9);
//! ```

pub mod accountant;
pub mod blocks;
pub mod keys;
pub mod mapping;
pub mod recording;
pub mod regions;
pub mod schema;
pub mod stage;
pub mod vertex;
