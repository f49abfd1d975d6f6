// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use pdp_image::blocks::{
    InputBlock, NetworkBlock, SUM_SCHEMA, SumBlock, THRESHOLD_SCHEMA, ThresholdBlock, WEIGHT_SCHEMA,
};
use pdp_image::mapping::Mapping;
use pdp_image::schema::decode;
use pdp_image::vertex::Vertex;
use pdp_model::network::Network;
use pdp_model::test_helpers::{CHAIN_YAML, chain_network, wide_network};

#[test]
fn sum_block_layout() {
    let block = SumBlock {
        num_units: 10,
        fwd_expect: 4,
        bkp_expect: 4,
        lds_expect: 5,
        is_first_group: true,
    };
    let bytes = block.encode().unwrap();
    assert_eq!(
        bytes,
        vec![10, 0, 0, 0, 4, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 1, 0, 0, 0]
    );
    assert_eq!(SUM_SCHEMA.offset_of("is_first_group"), Some(16));
}

#[test]
fn chain_sum_blocks() {
    let mapping = Mapping::new(Rc::new(chain_network())).unwrap();

    let bytes = mapping.vertex("s_core0/0").unwrap().core_block().unwrap();
    let block = decode(&SUM_SCHEMA, &bytes).unwrap();
    assert_eq!(block.value("num_units"), Some(10));
    assert_eq!(block.value("fwd_expect"), Some(0));
    assert_eq!(block.value("bkp_expect"), Some(1));
    assert_eq!(block.value("ldsa_expect"), Some(2));
    assert_eq!(block.value("is_first_group"), Some(1));

    let bytes = mapping.vertex("s_core1/0").unwrap().core_block().unwrap();
    let block = decode(&SUM_SCHEMA, &bytes).unwrap();
    assert_eq!(block.value("num_units"), Some(50));
    assert_eq!(block.value("is_first_group"), Some(0));
}

#[test]
fn input_threshold_block() {
    let mapping = Mapping::new(Rc::new(chain_network())).unwrap();
    let bytes = mapping.vertex("t_core0/0").unwrap().core_block().unwrap();
    let block = decode(&THRESHOLD_SCHEMA, &bytes).unwrap();

    assert_eq!(block.value("input_grp"), Some(1));
    assert_eq!(block.value("output_grp"), Some(0));
    assert_eq!(block.value("hard_clamp_en"), Some(1));
    assert_eq!(block.value("out_integr_en"), Some(0));
    // 1/5 of an interval
    assert_eq!(block.value("out_integr_dt"), Some(13107));
    assert_eq!(block.value("num_out_procs"), Some(1));
    assert_eq!(block.values("procs_list"), Some(&[2, 0, 0, 0, 0][..]));
    assert_eq!(block.value("crit_expected"), Some(0));
    assert_eq!(block.value("criterion_function"), Some(0));
}

#[test]
fn output_threshold_blocks() {
    let mapping = Mapping::new(Rc::new(wide_network())).unwrap();

    // OutA is last in the output chain and overrides the train criterion
    let bytes = mapping.vertex("t_core2/0").unwrap().core_block().unwrap();
    let block = decode(&THRESHOLD_SCHEMA, &bytes).unwrap();
    assert_eq!(block.value("output_grp"), Some(1));
    assert_eq!(block.value("is_last_sgrp"), Some(1));
    assert_eq!(block.value("num_units"), Some(20));
    assert_eq!(block.value("initOutput"), Some(1 << 26));
    assert_eq!(block.value("trn_group_criterion"), Some(2_516_582));
    assert_eq!(block.value("tst_group_criterion"), Some(419_430));
    assert_eq!(block.value("crit_expected"), Some(1));
    assert_eq!(block.value("criterion_function"), Some(1));
    assert_eq!(block.value("is_first_output"), Some(0));
    assert_eq!(block.value("is_last_output"), Some(1));
    assert_eq!(block.value("error_function"), Some(1));

    // OutB is first in the output chain
    let bytes = mapping.vertex("t_core3/0").unwrap().core_block().unwrap();
    let block = decode(&THRESHOLD_SCHEMA, &bytes).unwrap();
    assert_eq!(block.value("is_last_sgrp"), Some(0));
    assert_eq!(block.value("num_units"), Some(32));
    assert_eq!(block.value("trn_group_criterion"), Some(838_861));
    assert_eq!(block.value("crit_expected"), Some(0));
    assert_eq!(block.value("criterion_function"), Some(2));
    assert_eq!(block.value("is_first_output"), Some(1));
    assert_eq!(block.value("is_last_output"), Some(0));
    assert_eq!(block.value("error_function"), Some(2));

    let bytes = mapping.vertex("t_core3/1").unwrap().core_block().unwrap();
    let block = decode(&THRESHOLD_SCHEMA, &bytes).unwrap();
    assert_eq!(block.value("is_last_sgrp"), Some(1));
    assert_eq!(block.value("num_units"), Some(8));
    assert_eq!(block.value("crit_expected"), Some(1));
    assert_eq!(block.value("is_first_output"), Some(0));
}

#[test]
fn weight_block() {
    let mapping = Mapping::new(Rc::new(chain_network())).unwrap();
    let bytes = mapping
        .vertex("w_core2/0_1/0")
        .unwrap()
        .core_block()
        .unwrap();
    let block = decode(&WEIGHT_SCHEMA, &bytes).unwrap();
    assert_eq!(block.value("num_rows"), Some(50));
    assert_eq!(block.value("num_cols"), Some(10));
    assert_eq!(block.value("row_blk"), Some(0));
    assert_eq!(block.value("col_blk"), Some(0));
    assert_eq!(block.value("learningRate"), Some(3277));
    assert_eq!(block.value("weightDecay"), Some(0));
    assert_eq!(block.value("momentum"), Some(29491));
}

#[test]
fn wide_weight_blocks_use_subgroup_indices() {
    let mapping = Mapping::new(Rc::new(wide_network())).unwrap();
    let bytes = mapping
        .vertex("w_core1/2_0/1")
        .unwrap()
        .core_block()
        .unwrap();
    let block = decode(&WEIGHT_SCHEMA, &bytes).unwrap();
    assert_eq!(block.value("num_rows"), Some(8));
    assert_eq!(block.value("num_cols"), Some(6));
    assert_eq!(block.value("row_blk"), Some(1));
    assert_eq!(block.value("col_blk"), Some(2));
}

#[test]
#[should_panic(expected = "3 input processes given but only 2 are supported")]
fn too_many_input_procs() {
    let block = InputBlock {
        output_grp: false,
        input_grp: true,
        num_units: 4,
        in_procs: vec![0, 1, 0],
        in_integr_dt: 1.0,
        soft_clamp_strength: 0.5,
        init_nets: 0.0,
    };
    block.encode().unwrap();
}

#[test]
#[should_panic(expected = "Unknown output process id 9")]
fn unknown_output_proc() {
    let block = ThresholdBlock {
        output_grp: true,
        input_grp: false,
        is_last_sgrp: true,
        num_units: 4,
        out_procs: vec![0, 9],
        out_integr_dt: 1.0,
        weak_clamp_strength: 1.0,
        init_output: 0.5,
        tst_group_criterion: 0.0,
        trn_group_criterion: 0.0,
        crit_expected: 0,
        criterion_function: 1,
        is_first_output: true,
        is_last_output: true,
        error_function: 1,
    };
    block.encode().unwrap();
}

#[test]
#[should_panic(expected = "Unknown network type id 7")]
fn unknown_network_type() {
    let block = NetworkBlock {
        net_type: 7,
        ticks_per_int: 1,
        global_max_ticks: 2,
        num_write_blks: 1,
        timeout: 100,
    };
    block.encode().unwrap();
}

#[test]
#[should_panic(expected = "Fixed-point overflow: 1.5 does not fit a 16-bit short fpreal field")]
fn learning_rate_overflow() {
    let yaml = CHAIN_YAML.replace("num_updates: 10", "num_updates: 10\n  learning_rate: 1.5");
    let mapping = Mapping::new(Rc::new(Network::from_string(&yaml).unwrap())).unwrap();
    mapping
        .vertex("w_core1/0_0/0")
        .unwrap()
        .core_block()
        .unwrap();
}
