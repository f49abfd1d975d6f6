// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::io::Write;

use approx::assert_abs_diff_eq;
use pdp_model::fixed::{FixedKind, decode, encode, encode_optional};
use pdp_model::functions::{CriterionFunction, ErrorFunction, FunctionId, NetType, OutputProc};
use pdp_model::network::Network;
use pdp_model::test_helpers::{CHAIN_YAML, chain_network, recurrent_chain_network, wide_network};

#[test]
fn chain_groups_and_defaults() {
    let network = chain_network();
    assert_eq!(network.num_groups(), 3);
    assert_eq!(network.params().net_type, NetType::Continuous.id());
    assert_eq!(network.params().ticks_per_interval, 5);

    let input = network.group(0);
    assert!(input.is_input);
    assert!(input.out_procs.contains(&OutputProc::HardClamp.id()));
    assert_eq!(input.criterion_function, CriterionFunction::NoStop.id());

    let hidden = network.group(1);
    assert!(hidden.is_hidden());
    assert_eq!(hidden.num_subgroups(), 1);
    assert_eq!(hidden.in_procs, vec![0]);

    let output = network.group(2);
    assert!(output.out_procs.contains(&OutputProc::Logistic.id()));
    assert_eq!(output.error_function, ErrorFunction::CrossEntropy.id());
    assert_eq!(network.output_chain(), &[2]);
    assert!(network.is_first_output_group(2));
    assert!(network.is_last_output_group(2));
}

#[test]
fn global_max_ticks_covers_longest_example() {
    // ex1 has events of 1.0 and 2.0 intervals at 5 ticks each, plus the
    // initial tick
    let network = chain_network();
    assert_eq!(network.global_max_ticks(), 16);
    assert_eq!(network.example_set().num_events(), 3);
}

#[test]
fn example_rows_are_sliced_per_subgroup() {
    let network = wide_network();
    let input = network.group(0);
    let subgroups = input.subgroups();
    assert_eq!(subgroups.len(), 2);

    let rows = network
        .example_set()
        .input_rows(input, subgroups[1].first_unit, subgroups[1].units);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], vec![Some(0.0); 8]);

    let out_b = network.group(3);
    let rows = network
        .example_set()
        .target_rows(out_b, 0, out_b.subgroups()[0].units);
    assert_eq!(rows[0], vec![None; 32]);
}

#[test]
fn output_chain_order_is_kept() {
    let network = wide_network();
    assert_eq!(network.output_chain(), &[3, 2]);
    assert!(network.is_first_output_group(3));
    assert!(network.is_last_output_group(2));
    assert_eq!(network.group(3).criterion_function, CriterionFunction::Max.id());
}

#[test]
fn self_links_are_not_cycles() {
    let network = recurrent_chain_network();
    assert_eq!(network.links().len(), 3);
    assert!(network.links()[0].is_self_link());
    assert_eq!(network.links_into(1).count(), 2);
}

#[test]
fn initial_weights_are_deterministic() {
    let first = chain_network();
    let second = chain_network();
    let link = &first.links()[0];
    let weights = first.initial_weights(link);
    assert_eq!(weights.len(), 10);
    assert_eq!(weights[0].len(), 50);
    assert_eq!(weights, second.initial_weights(&second.links()[0]));
    assert!(
        weights
            .iter()
            .flatten()
            .all(|w| w.is_some_and(|w| (-1.0..=1.0).contains(&w)))
    );
}

#[test]
fn explicit_weights_are_used() {
    let network = Network::from_string(
        "
network:
  init_weight_range: 0.0
groups:
  - label: In
    units: 2
    kind: [input]
  - label: Out
    units: 1
    kind: [output]
links:
  - from: In
    to: Out
    weights: [[0.25], [~]]
",
    )
    .unwrap();
    let weights = network.initial_weights(&network.links()[0]);
    assert_eq!(weights, vec![vec![Some(0.25)], vec![None]]);
}

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CHAIN_YAML.as_bytes()).unwrap();
    let network = Network::from_file(file.path()).unwrap();
    assert_eq!(network.params().name, "rand10x40");
}

#[test]
fn fixed_point_round_trip() {
    let kinds = [
        FixedKind::FpReal,
        FixedKind::Activation,
        FixedKind::Error,
        FixedKind::Net,
        FixedKind::Weight,
        FixedKind::ShortFpReal,
        FixedKind::ShortActivation,
    ];
    for kind in kinds {
        for v in [0.0, 0.2, -0.73, 0.999, 1.0 / 3.0] {
            let raw = encode(v, kind).unwrap();
            let back = decode(raw, kind).unwrap();
            assert_abs_diff_eq!(back, v, epsilon = kind.resolution());
        }
        let absent = encode_optional(None, kind).unwrap();
        assert_eq!(decode(absent, kind), None);
    }
}
