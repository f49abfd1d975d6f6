// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Function identifiers understood by the node runtime.
//!
//! The model keeps identifiers as raw `u8` values so that a network file can
//! name a function by number. They are only checked against these
//! enumerations when a configuration block is encoded.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::encoding_error;
use crate::types::PdpResult;

/// Number of output-process slots in a threshold configuration block.
pub const NUM_OUT_PROCS: usize = 5;

/// Number of input-process slots in an input configuration block.
pub const NUM_IN_PROCS: usize = 2;

pub trait FunctionId: Sized + Copy {
    /// Name of the enumeration used in error messages.
    const FAMILY: &'static str;

    fn from_label(label: &str) -> Option<Self>;

    fn label(self) -> &'static str;

    fn id(self) -> u8;

    /// Check a raw identifier against the enumeration.
    fn from_id(id: u8) -> PdpResult<Self>;
}

macro_rules! function_ids {
    ($(#[$meta:meta])* $name:ident, $family:literal, { $($variant:ident = $id:literal => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
        pub enum $name {
            $($variant = $id),+
        }

        impl FunctionId for $name {
            const FAMILY: &'static str = $family;

            fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            fn id(self) -> u8 {
                self as u8
            }

            fn from_id(id: u8) -> PdpResult<Self> {
                match <$name as FromPrimitive>::from_u8(id) {
                    Some(function) => Ok(function),
                    None => encoding_error!(format!("Unknown {} id {id}", $family)),
                }
            }
        }
    };
}

function_ids!(
    /// Output-stage processes of a threshold node.
    OutputProc, "output process", {
        Logistic = 0 => "logistic",
        Integr = 1 => "integr",
        HardClamp = 2 => "hard_clamp",
        WeakClamp = 3 => "weak_clamp",
        Bias = 4 => "bias",
    }
);

function_ids!(
    /// Net-input processes of an input node.
    InputProc, "input process", {
        Integr = 0 => "in_integr",
        SoftClamp = 1 => "soft_clamp",
    }
);

function_ids!(
    /// Convergence criterion evaluated by threshold nodes.
    CriterionFunction, "criterion function", {
        NoStop = 0 => "no_stop",
        Std = 1 => "std",
        Max = 2 => "max",
    }
);

function_ids!(
    ErrorFunction, "error function", {
        None = 0 => "none",
        CrossEntropy = 1 => "cross_entropy",
        Squared = 2 => "squared",
    }
);

function_ids!(
    /// Weight update rule applied by weight nodes.
    UpdateFunction, "update function", {
        Steepest = 0 => "steepest",
        Momentum = 1 => "momentum",
        DougsMomentum = 2 => "dougs_momentum",
    }
);

function_ids!(
    NetType, "network type", {
        FeedFwd = 0 => "feed_fwd",
        SimpleRec = 1 => "simple_rec",
        Rbptt = 2 => "rbptt",
        Continuous = 3 => "continuous",
    }
);
