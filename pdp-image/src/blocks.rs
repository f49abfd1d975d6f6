// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Configuration blocks read by the node runtime.
//!
//! Each block type has a [Schema] that mirrors the node-side structure and a
//! plain struct holding the values to encode. Real values are held as `f64`
//! (or `Option<f64>` where they may be absent) and only converted to fixed
//! point here.

use pdp_model::encoding_error;
use pdp_model::fixed::{FixedKind, encode, encode_optional};
use pdp_model::functions::{
    CriterionFunction, ErrorFunction, FunctionId, InputProc, NUM_IN_PROCS, NUM_OUT_PROCS, NetType,
    OutputProc, UpdateFunction,
};
use pdp_model::types::PdpResult;

use crate::schema::{BlockWriter, Field, FieldType, SCHEMA_VERSION, Schema};

pub static SYSTEM_SCHEMA: Schema = Schema {
    name: "system",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("timer_period", FieldType::U32),
        Field::scalar("time_scale_factor", FieldType::U32),
        Field::scalar("proc_type", FieldType::U32),
    ],
};

pub static NETWORK_SCHEMA: Schema = Schema {
    name: "network_conf",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("net_type", FieldType::U8),
        Field::pad(3),
        Field::scalar("ticks_per_int", FieldType::U32),
        Field::scalar("global_max_ticks", FieldType::U32),
        Field::scalar("num_write_blks", FieldType::U32),
        Field::scalar("timeout", FieldType::U32),
    ],
};

pub static STAGE_SCHEMA: Schema = Schema {
    name: "stage_conf",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("stage_id", FieldType::U8),
        Field::scalar("training", FieldType::U8),
        Field::scalar("update_function", FieldType::U8),
        Field::pad(1),
        Field::scalar("num_examples", FieldType::U32),
        Field::scalar("num_epochs", FieldType::U32),
    ],
};

pub static EXAMPLE_SET_SCHEMA: Schema = Schema {
    name: "mlp_set",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("num_examples", FieldType::U32),
        Field::scalar("max_time", FieldType::I32),
        Field::scalar("min_time", FieldType::I32),
        Field::scalar("grace_time", FieldType::I32),
    ],
};

pub static EXAMPLE_SCHEMA: Schema = Schema {
    name: "mlp_example",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("num", FieldType::U32),
        Field::scalar("num_events", FieldType::U32),
        Field::scalar("ev_idx", FieldType::U32),
        Field::scalar("freq", FieldType::I32),
    ],
};

pub static EVENT_SCHEMA: Schema = Schema {
    name: "mlp_event",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("max_time", FieldType::I32),
        Field::scalar("min_time", FieldType::I32),
        Field::scalar("grace_time", FieldType::I32),
        Field::scalar("it_idx", FieldType::U32),
    ],
};

pub static WEIGHT_SCHEMA: Schema = Schema {
    name: "w_conf",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("num_rows", FieldType::U32),
        Field::scalar("num_cols", FieldType::U32),
        Field::scalar("row_blk", FieldType::U32),
        Field::scalar("col_blk", FieldType::U32),
        Field::scalar("init_output", FieldType::I32),
        Field::scalar("learningRate", FieldType::I16),
        Field::scalar("weightDecay", FieldType::I16),
        Field::scalar("momentum", FieldType::I16),
        Field::pad(2),
    ],
};

pub static SUM_SCHEMA: Schema = Schema {
    name: "s_conf",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("num_units", FieldType::U32),
        Field::scalar("fwd_expect", FieldType::U32),
        Field::scalar("bkp_expect", FieldType::U32),
        Field::scalar("ldsa_expect", FieldType::U32),
        Field::scalar("is_first_group", FieldType::U8),
        Field::pad(3),
    ],
};

pub static INPUT_SCHEMA: Schema = Schema {
    name: "i_conf",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("output_grp", FieldType::U8),
        Field::scalar("input_grp", FieldType::U8),
        Field::pad(2),
        Field::scalar("num_units", FieldType::U32),
        Field::scalar("num_in_procs", FieldType::U32),
        Field::array("procs_list", FieldType::U32, NUM_IN_PROCS),
        Field::scalar("in_integr_en", FieldType::U8),
        Field::pad(3),
        Field::scalar("in_integr_dt", FieldType::I32),
        Field::scalar("soft_clamp_strength", FieldType::I32),
        Field::scalar("initNets", FieldType::I32),
    ],
};

pub static THRESHOLD_SCHEMA: Schema = Schema {
    name: "t_conf",
    version: SCHEMA_VERSION,
    fields: &[
        Field::scalar("output_grp", FieldType::U8),
        Field::scalar("input_grp", FieldType::U8),
        Field::scalar("is_last_sgrp", FieldType::U8),
        Field::pad(1),
        Field::scalar("num_units", FieldType::U32),
        Field::scalar("hard_clamp_en", FieldType::U8),
        Field::scalar("out_integr_en", FieldType::U8),
        Field::pad(2),
        Field::scalar("out_integr_dt", FieldType::I32),
        Field::scalar("num_out_procs", FieldType::U32),
        Field::array("procs_list", FieldType::U32, NUM_OUT_PROCS),
        Field::scalar("weak_clamp_strength", FieldType::I32),
        Field::scalar("initOutput", FieldType::I32),
        Field::scalar("tst_group_criterion", FieldType::I32),
        Field::scalar("trn_group_criterion", FieldType::I32),
        Field::scalar("crit_expected", FieldType::U32),
        Field::scalar("criterion_function", FieldType::U8),
        Field::scalar("is_first_output", FieldType::U8),
        Field::scalar("is_last_output", FieldType::U8),
        Field::scalar("error_function", FieldType::U8),
    ],
};

/// All block layouts, for layout-wide checks.
pub static ALL_SCHEMAS: [&Schema; 10] = [
    &SYSTEM_SCHEMA,
    &NETWORK_SCHEMA,
    &STAGE_SCHEMA,
    &EXAMPLE_SET_SCHEMA,
    &EXAMPLE_SCHEMA,
    &EVENT_SCHEMA,
    &WEIGHT_SCHEMA,
    &SUM_SCHEMA,
    &INPUT_SCHEMA,
    &THRESHOLD_SCHEMA,
];

/// Check every function id against its enumeration and build the fixed-size
/// slot list, unused slots being zero.
fn procs_list<F: FunctionId>(ids: &[u8], slots: usize) -> PdpResult<Vec<u32>> {
    if ids.len() > slots {
        return encoding_error!(format!(
            "{} {}es given but only {slots} are supported",
            ids.len(),
            F::FAMILY
        ));
    }
    let mut list = vec![0u32; slots];
    for (slot, id) in list.iter_mut().zip(ids) {
        *slot = u32::from(F::from_id(*id)?.id());
    }
    Ok(list)
}

pub(crate) fn count_u32(name: &str, value: usize) -> PdpResult<u32> {
    match u32::try_from(value) {
        Ok(v) => Ok(v),
        Err(_) => encoding_error!(format!("Value {value} of {name} does not fit in 32 bits")),
    }
}

fn id_u8(name: &str, value: u32) -> PdpResult<u8> {
    match u8::try_from(value) {
        Ok(v) => Ok(v),
        Err(_) => encoding_error!(format!("Value {value} of {name} does not fit in 8 bits")),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SystemBlock {
    pub timer_period_us: u32,
    pub time_scale_factor: u32,
    pub proc_type: u32,
}

impl SystemBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let mut w = BlockWriter::new(&SYSTEM_SCHEMA);
        w.u32("timer_period", self.timer_period_us)?;
        w.u32("time_scale_factor", self.time_scale_factor)?;
        w.u32("proc_type", self.proc_type)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NetworkBlock {
    pub net_type: u8,
    pub ticks_per_int: u32,
    pub global_max_ticks: u32,
    pub num_write_blks: u32,
    pub timeout: u32,
}

impl NetworkBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let net_type = NetType::from_id(self.net_type)?;
        let mut w = BlockWriter::new(&NETWORK_SCHEMA);
        w.u8("net_type", net_type.id())?;
        w.u32("ticks_per_int", self.ticks_per_int)?;
        w.u32("global_max_ticks", self.global_max_ticks)?;
        w.u32("num_write_blks", self.num_write_blks)?;
        w.u32("timeout", self.timeout)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageBlock {
    pub stage_id: u32,
    pub training: bool,
    pub update_function: u8,
    pub num_examples: u32,
    pub num_epochs: u32,
}

impl StageBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let update_function = UpdateFunction::from_id(self.update_function)?;
        let mut w = BlockWriter::new(&STAGE_SCHEMA);
        w.u8("stage_id", id_u8("stage_id", self.stage_id)?)?;
        w.flag("training", self.training)?;
        w.u8("update_function", update_function.id())?;
        w.u32("num_examples", self.num_examples)?;
        w.u32("num_epochs", self.num_epochs)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExampleSetBlock {
    pub num_examples: usize,
    pub max_time: Option<f64>,
    pub min_time: Option<f64>,
    pub grace_time: Option<f64>,
}

impl ExampleSetBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let mut w = BlockWriter::new(&EXAMPLE_SET_SCHEMA);
        w.u32("num_examples", count_u32("num_examples", self.num_examples)?)?;
        w.i32("max_time", encode_optional(self.max_time, FixedKind::FpReal)?)?;
        w.i32("min_time", encode_optional(self.min_time, FixedKind::FpReal)?)?;
        w.i32("grace_time", encode_optional(self.grace_time, FixedKind::FpReal)?)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExampleBlock {
    pub num: usize,
    pub num_events: usize,
    pub ev_idx: usize,
    pub freq: Option<f64>,
}

impl ExampleBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let mut w = BlockWriter::new(&EXAMPLE_SCHEMA);
        w.u32("num", count_u32("num", self.num)?)?;
        w.u32("num_events", count_u32("num_events", self.num_events)?)?;
        w.u32("ev_idx", count_u32("ev_idx", self.ev_idx)?)?;
        w.i32("freq", encode_optional(self.freq, FixedKind::FpReal)?)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventBlock {
    pub max_time: Option<f64>,
    pub min_time: Option<f64>,
    pub grace_time: Option<f64>,
    pub it_idx: usize,
}

impl EventBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let mut w = BlockWriter::new(&EVENT_SCHEMA);
        w.i32("max_time", encode_optional(self.max_time, FixedKind::FpReal)?)?;
        w.i32("min_time", encode_optional(self.min_time, FixedKind::FpReal)?)?;
        w.i32("grace_time", encode_optional(self.grace_time, FixedKind::FpReal)?)?;
        w.u32("it_idx", count_u32("it_idx", self.it_idx)?)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeightBlock {
    pub num_rows: u32,
    pub num_cols: u32,
    pub row_blk: u32,
    pub col_blk: u32,
    pub init_output: f64,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub momentum: f64,
}

impl WeightBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let mut w = BlockWriter::new(&WEIGHT_SCHEMA);
        w.u32("num_rows", self.num_rows)?;
        w.u32("num_cols", self.num_cols)?;
        w.u32("row_blk", self.row_blk)?;
        w.u32("col_blk", self.col_blk)?;
        w.i32("init_output", encode(self.init_output, FixedKind::Activation)?)?;
        w.i16("learningRate", encode(self.learning_rate, FixedKind::ShortFpReal)?)?;
        w.i16("weightDecay", encode(self.weight_decay, FixedKind::ShortFpReal)?)?;
        w.i16("momentum", encode(self.momentum, FixedKind::ShortFpReal)?)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SumBlock {
    pub num_units: u32,
    pub fwd_expect: u32,
    pub bkp_expect: u32,
    pub lds_expect: u32,
    pub is_first_group: bool,
}

impl SumBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let mut w = BlockWriter::new(&SUM_SCHEMA);
        w.u32("num_units", self.num_units)?;
        w.u32("fwd_expect", self.fwd_expect)?;
        w.u32("bkp_expect", self.bkp_expect)?;
        w.u32("ldsa_expect", self.lds_expect)?;
        w.flag("is_first_group", self.is_first_group)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputBlock {
    pub output_grp: bool,
    pub input_grp: bool,
    pub num_units: u32,
    pub in_procs: Vec<u8>,
    pub in_integr_dt: f64,
    pub soft_clamp_strength: f64,
    pub init_nets: f64,
}

impl InputBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let procs = procs_list::<InputProc>(&self.in_procs, NUM_IN_PROCS)?;
        let in_integr_en = self.in_procs.contains(&InputProc::Integr.id());

        let mut w = BlockWriter::new(&INPUT_SCHEMA);
        w.flag("output_grp", self.output_grp)?;
        w.flag("input_grp", self.input_grp)?;
        w.u32("num_units", self.num_units)?;
        w.u32("num_in_procs", count_u32("num_in_procs", self.in_procs.len())?)?;
        w.u32_array("procs_list", &procs)?;
        w.flag("in_integr_en", in_integr_en)?;
        w.i32("in_integr_dt", encode(self.in_integr_dt, FixedKind::FpReal)?)?;
        w.i32(
            "soft_clamp_strength",
            encode(self.soft_clamp_strength, FixedKind::FpReal)?,
        )?;
        w.i32("initNets", encode(self.init_nets, FixedKind::Net)?)?;
        w.finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdBlock {
    pub output_grp: bool,
    pub input_grp: bool,
    pub is_last_sgrp: bool,
    pub num_units: u32,
    pub out_procs: Vec<u8>,
    pub out_integr_dt: f64,
    pub weak_clamp_strength: f64,
    pub init_output: f64,
    pub tst_group_criterion: f64,
    pub trn_group_criterion: f64,
    pub crit_expected: u32,
    pub criterion_function: u8,
    pub is_first_output: bool,
    pub is_last_output: bool,
    pub error_function: u8,
}

impl ThresholdBlock {
    pub fn encode(&self) -> PdpResult<Vec<u8>> {
        let procs = procs_list::<OutputProc>(&self.out_procs, NUM_OUT_PROCS)?;
        let hard_clamp_en = self.out_procs.contains(&OutputProc::HardClamp.id());
        let out_integr_en = self.out_procs.contains(&OutputProc::Integr.id());
        let criterion_function = CriterionFunction::from_id(self.criterion_function)?;
        let error_function = ErrorFunction::from_id(self.error_function)?;

        let mut w = BlockWriter::new(&THRESHOLD_SCHEMA);
        w.flag("output_grp", self.output_grp)?;
        w.flag("input_grp", self.input_grp)?;
        w.flag("is_last_sgrp", self.is_last_sgrp)?;
        w.u32("num_units", self.num_units)?;
        w.flag("hard_clamp_en", hard_clamp_en)?;
        w.flag("out_integr_en", out_integr_en)?;
        w.i32("out_integr_dt", encode(self.out_integr_dt, FixedKind::FpReal)?)?;
        w.u32("num_out_procs", count_u32("num_out_procs", self.out_procs.len())?)?;
        w.u32_array("procs_list", &procs)?;
        w.i32(
            "weak_clamp_strength",
            encode(self.weak_clamp_strength, FixedKind::FpReal)?,
        )?;
        w.i32("initOutput", encode(self.init_output, FixedKind::Activation)?)?;
        w.i32(
            "tst_group_criterion",
            encode(self.tst_group_criterion, FixedKind::Error)?,
        )?;
        w.i32(
            "trn_group_criterion",
            encode(self.trn_group_criterion, FixedKind::Error)?,
        )?;
        w.u32("crit_expected", self.crit_expected)?;
        w.u8("criterion_function", criterion_function.id())?;
        w.flag("is_first_output", self.is_first_output)?;
        w.flag("is_last_output", self.is_last_output)?;
        w.u8("error_function", error_function.id())?;
        w.finish()
    }
}

/// Encode a matrix of optional values row by row as little-endian words.
pub fn encode_rows(rows: &[Vec<Option<f64>>], kind: FixedKind) -> PdpResult<Vec<u8>> {
    let mut bytes = Vec::with_capacity(rows.iter().map(Vec::len).sum::<usize>() * 4);
    for row in rows {
        for value in row {
            bytes.extend_from_slice(&encode_optional(*value, kind)?.to_le_bytes());
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_schemas_are_aligned() {
        for schema in ALL_SCHEMAS {
            schema.check_alignment().unwrap();
            assert_eq!(schema.version, SCHEMA_VERSION);
        }
    }

    #[test]
    fn schema_sizes() {
        assert_eq!(SYSTEM_SCHEMA.size(), 12);
        assert_eq!(NETWORK_SCHEMA.size(), 20);
        assert_eq!(STAGE_SCHEMA.size(), 12);
        assert_eq!(EXAMPLE_SET_SCHEMA.size(), 16);
        assert_eq!(EXAMPLE_SCHEMA.size(), 16);
        assert_eq!(EVENT_SCHEMA.size(), 16);
        assert_eq!(WEIGHT_SCHEMA.size(), 28);
        assert_eq!(SUM_SCHEMA.size(), 20);
        assert_eq!(INPUT_SCHEMA.size(), 36);
        assert_eq!(THRESHOLD_SCHEMA.size(), 64);
    }

    #[test]
    fn threshold_field_offsets() {
        assert_eq!(THRESHOLD_SCHEMA.offset_of("num_units"), Some(4));
        assert_eq!(THRESHOLD_SCHEMA.offset_of("out_integr_dt"), Some(12));
        assert_eq!(THRESHOLD_SCHEMA.offset_of("procs_list"), Some(20));
        assert_eq!(THRESHOLD_SCHEMA.offset_of("weak_clamp_strength"), Some(40));
        assert_eq!(THRESHOLD_SCHEMA.offset_of("crit_expected"), Some(56));
        assert_eq!(THRESHOLD_SCHEMA.offset_of("error_function"), Some(63));
    }

    #[test]
    fn rows_use_sentinel_for_absent_values() {
        let bytes = encode_rows(&[vec![Some(1.0), None]], FixedKind::Activation).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 8, 0, 0, 0, 0x80]);
    }
}
