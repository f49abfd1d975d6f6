// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Fixed-point conversion of real values for the node runtime.
//!
//! Every numeric quantity sent to a node has a [FixedKind] which determines
//! the field width and the number of fractional bits. The most negative value
//! of each width is reserved as the "absent" sentinel, so it is never produced
//! by encoding a real value.

use std::fmt;

use crate::encoding_error;
use crate::types::PdpResult;

pub const FPREAL_SHIFT: u32 = 16;
pub const SHORT_FPREAL_SHIFT: u32 = 15;
pub const ACTIV_SHIFT: u32 = 27;
pub const SHORT_ACTIV_SHIFT: u32 = 15;
pub const ERROR_SHIFT: u32 = 23;
pub const NET_SHIFT: u32 = 23;
pub const WEIGHT_SHIFT: u32 = 16;

/// Sentinel written for absent 32-bit values.
pub const SENTINEL_32: i32 = i32::MIN;

/// Sentinel written for absent 16-bit values.
pub const SENTINEL_16: i16 = i16::MIN;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FixedKind {
    /// General real value (s15.16).
    FpReal,
    /// Short real value used for learning parameters (s0.15).
    ShortFpReal,
    /// Unit activation (s4.27).
    Activation,
    /// Recorded unit activation (s0.15).
    ShortActivation,
    /// Error and convergence criteria (s8.23).
    Error,
    /// Net input (s8.23).
    Net,
    /// Connection weight (s15.16).
    Weight,
}

impl FixedKind {
    #[must_use]
    pub const fn shift(self) -> u32 {
        match self {
            FixedKind::FpReal => FPREAL_SHIFT,
            FixedKind::ShortFpReal => SHORT_FPREAL_SHIFT,
            FixedKind::Activation => ACTIV_SHIFT,
            FixedKind::ShortActivation => SHORT_ACTIV_SHIFT,
            FixedKind::Error => ERROR_SHIFT,
            FixedKind::Net => NET_SHIFT,
            FixedKind::Weight => WEIGHT_SHIFT,
        }
    }

    #[must_use]
    pub const fn width_bits(self) -> u32 {
        match self {
            FixedKind::ShortFpReal | FixedKind::ShortActivation => 16,
            _ => 32,
        }
    }

    #[must_use]
    pub const fn sentinel(self) -> i32 {
        match self.width_bits() {
            16 => SENTINEL_16 as i32,
            _ => SENTINEL_32,
        }
    }

    #[must_use]
    pub const fn max_raw(self) -> i32 {
        match self.width_bits() {
            16 => i16::MAX as i32,
            _ => i32::MAX,
        }
    }

    /// Value of one least significant bit.
    #[must_use]
    pub fn resolution(self) -> f64 {
        1.0 / scale(self)
    }
}

impl fmt::Display for FixedKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FixedKind::FpReal => "fpreal",
            FixedKind::ShortFpReal => "short fpreal",
            FixedKind::Activation => "activation",
            FixedKind::ShortActivation => "short activation",
            FixedKind::Error => "error",
            FixedKind::Net => "net",
            FixedKind::Weight => "weight",
        };
        write!(f, "{name}")
    }
}

fn scale(kind: FixedKind) -> f64 {
    f64::from(1u32 << kind.shift())
}

/// Encode a required value.
///
/// Fails if the value is NaN or if the rounded result does not fit the
/// kind's width without colliding with the sentinel.
pub fn encode(value: f64, kind: FixedKind) -> PdpResult<i32> {
    if value.is_nan() {
        return encoding_error!(format!("Missing required {kind} value"));
    }

    let scaled = (value * scale(kind)).round();
    if !(scaled > f64::from(kind.sentinel()) && scaled <= f64::from(kind.max_raw())) {
        return encoding_error!(format!(
            "Fixed-point overflow: {value} does not fit a {}-bit {kind} field",
            kind.width_bits()
        ));
    }
    Ok(scaled as i32)
}

/// Encode a value that may be absent. Both `None` and NaN become the
/// sentinel.
pub fn encode_optional(value: Option<f64>, kind: FixedKind) -> PdpResult<i32> {
    match value {
        Some(v) if !v.is_nan() => encode(v, kind),
        _ => Ok(kind.sentinel()),
    }
}

#[must_use]
pub fn decode(raw: i32, kind: FixedKind) -> Option<f64> {
    if raw == kind.sentinel() {
        None
    } else {
        Some(f64::from(raw) / scale(kind))
    }
}
