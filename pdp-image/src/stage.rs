// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Training and testing stages.
//!
//! A stage is one run of the mapped network over the example set. Only the
//! stage region and the recording descriptor change between stages, so the
//! [StageId] is passed explicitly to every regeneration call.

use std::fmt;

use pdp_model::network::Network;
use pdp_model::types::PdpResult;
use pdp_model::{config_error, encoding_error};

use crate::blocks::StageBlock;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(pub u32);

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub id: StageId,
    pub training: bool,
    /// Number of examples to present, `None` for the whole set.
    pub num_examples: Option<u32>,
    /// Number of passes over the examples, `None` for the network default.
    pub num_epochs: Option<u32>,
    /// Update function override, `None` for the network's.
    pub update_function: Option<u8>,
    /// Ticks to record for, `None` to derive from the example set.
    pub run_ticks: Option<u32>,
}

impl Stage {
    #[must_use]
    pub fn training(id: StageId) -> Self {
        Self {
            id,
            training: true,
            num_examples: None,
            num_epochs: None,
            update_function: None,
            run_ticks: None,
        }
    }

    #[must_use]
    pub fn testing(id: StageId) -> Self {
        Self {
            training: false,
            ..Self::training(id)
        }
    }

    pub fn num_examples(&self, network: &Network) -> PdpResult<u32> {
        let available = network.example_set().num_examples();
        match self.num_examples {
            None => match u32::try_from(available) {
                Ok(n) => Ok(n),
                Err(_) => encoding_error!(format!("{available} examples do not fit in 32 bits")),
            },
            Some(n) if n as usize > available => config_error!(format!(
                "Stage {} asks for {n} examples but the set has {available}",
                self.id
            )),
            Some(n) => Ok(n),
        }
    }

    /// Training stages default to the network's number of updates, testing
    /// stages to a single pass.
    #[must_use]
    pub fn num_epochs(&self, network: &Network) -> u32 {
        match self.num_epochs {
            Some(n) => n,
            None if self.training => network.params().num_updates,
            None => 1,
        }
    }

    /// Ticks the stage runs for: every example of every epoch for the
    /// longest example's duration.
    pub fn run_ticks(&self, network: &Network) -> PdpResult<u32> {
        if let Some(ticks) = self.run_ticks {
            return Ok(ticks);
        }
        let ticks = u64::from(self.num_examples(network)?)
            * u64::from(self.num_epochs(network))
            * u64::from(network.global_max_ticks());
        match u32::try_from(ticks) {
            Ok(t) => Ok(t),
            Err(_) => config_error!(format!(
                "Stage {} runs for {ticks} ticks which is too many to record",
                self.id
            )),
        }
    }

    pub fn block(&self, network: &Network) -> PdpResult<StageBlock> {
        Ok(StageBlock {
            stage_id: self.id.0,
            training: self.training,
            update_function: self
                .update_function
                .unwrap_or(network.params().update_function),
            num_examples: self.num_examples(network)?,
            num_epochs: self.num_epochs(network),
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mode = if self.training { "training" } else { "testing" };
        write!(f, "Stage {} ({mode})", self.id)
    }
}
