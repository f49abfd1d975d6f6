// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Turn configuration sections into model objects, filling in defaults.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::config::{
    EventSection, ExampleSetSection, FunctionRef, GroupKind, GroupSection, LinkSection,
    NetworkSection,
};
use crate::example::{Event, Example, ExampleSet, UnitValues};
use crate::functions::{
    CriterionFunction, ErrorFunction, FunctionId, InputProc, NetType, OutputProc, UpdateFunction,
};
use crate::group::{Group, MAX_SUBGROUP_UNITS, partition_units};
use crate::network::{Link, NetworkParams};
use crate::types::PdpResult;
use crate::{config_error, topology_error};

/// Look up a function by name, or keep a numeric id as given.
pub fn resolve_function<F: FunctionId>(function: &FunctionRef) -> PdpResult<u8> {
    match function {
        FunctionRef::Id(id) => Ok(*id),
        FunctionRef::Label(label) => match F::from_label(label) {
            Some(f) => Ok(f.id()),
            None => config_error!(format!("Unknown {} '{label}'", F::FAMILY)),
        },
    }
}

fn resolve_functions<F: FunctionId>(functions: &[FunctionRef]) -> PdpResult<Vec<u8>> {
    functions.iter().map(resolve_function::<F>).collect()
}

pub fn build_params(section: &NetworkSection) -> PdpResult<NetworkParams> {
    const DEFAULT_NAME: &str = "network";
    const DEFAULT_INTERVALS: u32 = 1;
    const DEFAULT_TICKS_PER_INTERVAL: u32 = 1;
    const DEFAULT_NUM_UPDATES: u32 = 1;
    const DEFAULT_LEARNING_RATE: f64 = 0.1;
    const DEFAULT_WEIGHT_DECAY: f64 = 0.0;
    const DEFAULT_MOMENTUM: f64 = 0.9;
    const DEFAULT_TIMEOUT: u32 = 100;
    const DEFAULT_TIMER_TICK_PERIOD_US: u32 = 1_000_000;
    const DEFAULT_SEED: u64 = 0;
    const DEFAULT_INIT_WEIGHT_RANGE: f64 = 1.0;

    let net_type = match &section.net_type {
        Some(f) => resolve_function::<NetType>(f)?,
        None => NetType::FeedFwd.id(),
    };
    let update_function = match &section.update_function {
        Some(f) => resolve_function::<UpdateFunction>(f)?,
        None => UpdateFunction::Steepest.id(),
    };

    let ticks_per_interval = section
        .ticks_per_interval
        .unwrap_or(DEFAULT_TICKS_PER_INTERVAL);
    if ticks_per_interval == 0 {
        return config_error!("ticks_per_interval must be non-zero");
    }

    Ok(NetworkParams {
        name: section
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_NAME.to_string()),
        net_type,
        intervals: section.intervals.unwrap_or(DEFAULT_INTERVALS),
        ticks_per_interval,
        num_updates: section.num_updates.unwrap_or(DEFAULT_NUM_UPDATES),
        train_group_crit: section.train_group_crit,
        test_group_crit: section.test_group_crit,
        learning_rate: section.learning_rate.unwrap_or(DEFAULT_LEARNING_RATE),
        weight_decay: section.weight_decay.unwrap_or(DEFAULT_WEIGHT_DECAY),
        momentum: section.momentum.unwrap_or(DEFAULT_MOMENTUM),
        update_function,
        timeout: section.timeout.unwrap_or(DEFAULT_TIMEOUT),
        timer_tick_period_us: section
            .timer_tick_period_us
            .unwrap_or(DEFAULT_TIMER_TICK_PERIOD_US),
        seed: section.seed.unwrap_or(DEFAULT_SEED),
        init_weight_range: section.init_weight_range.unwrap_or(DEFAULT_INIT_WEIGHT_RANGE),
        max_subgroup_units: section.max_subgroup_units.unwrap_or(MAX_SUBGROUP_UNITS),
        node_memory_limit: section.node_memory_limit,
    })
}

pub fn build_groups(sections: &[GroupSection], max_subgroup_units: u32) -> PdpResult<Vec<Group>> {
    const DEFAULT_WEAK_CLAMP_STRENGTH: f64 = 1.0;
    const DEFAULT_SOFT_CLAMP_STRENGTH: f64 = 0.5;
    const DEFAULT_INIT_OUTPUT: f64 = 0.5;
    const DEFAULT_INIT_NET: f64 = 0.0;

    let mut groups = Vec::with_capacity(sections.len());
    for (id, section) in sections.iter().enumerate() {
        let kinds = section.kind.clone().unwrap_or_default();
        let is_input = kinds.contains(&GroupKind::Input);
        let is_output = kinds.contains(&GroupKind::Output);
        if kinds.contains(&GroupKind::Hidden) && (is_input || is_output) {
            return config_error!(format!(
                "Group '{}' cannot be hidden and input/output",
                section.label
            ));
        }

        let out_procs = match &section.out_procs {
            Some(procs) => resolve_functions::<OutputProc>(procs)?,
            None if is_input => vec![OutputProc::HardClamp.id()],
            None => vec![OutputProc::Logistic.id()],
        };
        let in_procs = match &section.in_procs {
            Some(procs) => resolve_functions::<InputProc>(procs)?,
            None => Vec::new(),
        };
        let criterion_function = match &section.criterion_function {
            Some(f) => resolve_function::<CriterionFunction>(f)?,
            None if is_output => CriterionFunction::Std.id(),
            None => CriterionFunction::NoStop.id(),
        };
        let error_function = match &section.error_function {
            Some(f) => resolve_function::<ErrorFunction>(f)?,
            None if is_output => ErrorFunction::CrossEntropy.id(),
            None => ErrorFunction::None.id(),
        };

        let subgroups = partition_units(&section.label, section.units, max_subgroup_units)?;
        debug!(
            "Group {id} '{}' split into {} subgroups",
            section.label,
            subgroups.len()
        );

        groups.push(Group {
            id,
            label: section.label.clone(),
            units: section.units,
            is_input,
            is_output,
            out_procs,
            in_procs,
            criterion_function,
            error_function,
            weak_clamp_strength: section
                .weak_clamp_strength
                .unwrap_or(DEFAULT_WEAK_CLAMP_STRENGTH),
            soft_clamp_strength: section
                .soft_clamp_strength
                .unwrap_or(DEFAULT_SOFT_CLAMP_STRENGTH),
            init_output: section.init_output.unwrap_or(DEFAULT_INIT_OUTPUT),
            init_net: section.init_net.unwrap_or(DEFAULT_INIT_NET),
            train_criterion: section.train_crit,
            test_criterion: section.test_crit,
            subgroups,
        });
    }
    Ok(groups)
}

pub fn build_links(
    sections: &[LinkSection],
    groups: &[Group],
    groups_idx_by_label: &HashMap<String, usize>,
) -> PdpResult<Vec<Link>> {
    let mut links: Vec<Link> = Vec::with_capacity(sections.len());
    for section in sections {
        let from = group_idx(groups_idx_by_label, &section.from)?;
        let to = group_idx(groups_idx_by_label, &section.to)?;
        if links.iter().any(|l| l.from == from && l.to == to) {
            return topology_error!(format!(
                "Duplicate link from '{}' to '{}'",
                section.from, section.to
            ));
        }

        if let Some(weights) = &section.weights {
            let rows = groups[from].units as usize;
            let cols = groups[to].units as usize;
            if weights.len() != rows || weights.iter().any(|row| row.len() != cols) {
                return config_error!(format!(
                    "Weights for link '{}' -> '{}' must be {rows}x{cols}",
                    section.from, section.to
                ));
            }
        }

        links.push(Link {
            id: links.len(),
            from,
            to,
            weights: section.weights.clone(),
        });
    }
    Ok(links)
}

pub fn build_output_chain(
    chain: Option<&[String]>,
    groups: &[Group],
    groups_idx_by_label: &HashMap<String, usize>,
) -> PdpResult<Vec<usize>> {
    let Some(chain) = chain else {
        return Ok(groups.iter().filter(|g| g.is_output).map(|g| g.id).collect());
    };

    let mut output_chain = Vec::with_capacity(chain.len());
    for label in chain {
        let idx = group_idx(groups_idx_by_label, label)?;
        if !groups[idx].is_output {
            return topology_error!(format!(
                "Group '{label}' in output chain is not an output group"
            ));
        }
        if output_chain.contains(&idx) {
            return topology_error!(format!("Group '{label}' repeated in output chain"));
        }
        output_chain.push(idx);
    }
    if let Some(missing) = groups
        .iter()
        .find(|g| g.is_output && !output_chain.contains(&g.id))
    {
        return topology_error!(format!(
            "Output group '{}' missing from output chain",
            missing.label
        ));
    }
    Ok(output_chain)
}

pub fn build_example_set(
    section: Option<&ExampleSetSection>,
    groups: &[Group],
    groups_idx_by_label: &HashMap<String, usize>,
) -> PdpResult<ExampleSet> {
    let Some(section) = section else {
        return Ok(ExampleSet::default());
    };

    let mut examples = Vec::with_capacity(section.examples.len());
    for (i, example) in section.examples.iter().enumerate() {
        let name = example.name.clone().unwrap_or_else(|| format!("example{i}"));
        let mut events = Vec::with_capacity(example.events.len());
        for (j, event) in example.events.iter().enumerate() {
            events.push(build_event(event, &name, j, groups, groups_idx_by_label)?);
        }
        examples.push(Example {
            name,
            frequency: example.frequency,
            events,
        });
    }

    Ok(ExampleSet {
        max_time: section.max_time,
        min_time: section.min_time,
        grace_time: section.grace_time,
        examples,
    })
}

fn build_event(
    section: &EventSection,
    example: &str,
    index: usize,
    groups: &[Group],
    groups_idx_by_label: &HashMap<String, usize>,
) -> PdpResult<Event> {
    let inputs = build_values(
        section.inputs.as_ref(),
        "inputs",
        |g| g.is_input,
        example,
        index,
        groups,
        groups_idx_by_label,
    )?;
    let targets = build_values(
        section.targets.as_ref(),
        "targets",
        |g| g.is_output,
        example,
        index,
        groups,
        groups_idx_by_label,
    )?;
    Ok(Event {
        max_time: section.max_time,
        min_time: section.min_time,
        grace_time: section.grace_time,
        inputs,
        targets,
    })
}

fn build_values(
    values: Option<&BTreeMap<String, Vec<Option<f64>>>>,
    what: &str,
    allowed: impl Fn(&Group) -> bool,
    example: &str,
    index: usize,
    groups: &[Group],
    groups_idx_by_label: &HashMap<String, usize>,
) -> PdpResult<BTreeMap<usize, UnitValues>> {
    let mut by_group = BTreeMap::new();
    let Some(values) = values else {
        return Ok(by_group);
    };

    for (label, row) in values {
        let Some(&idx) = groups_idx_by_label.get(label) else {
            return config_error!(format!(
                "Event {index} of example '{example}' has {what} for unknown group '{label}'"
            ));
        };
        let group = &groups[idx];
        if !allowed(group) {
            return config_error!(format!(
                "Event {index} of example '{example}' has {what} for group '{label}' which cannot take them"
            ));
        }
        if row.len() != group.units as usize {
            return config_error!(format!(
                "Event {index} of example '{example}' has {} {what} for group '{label}' with {} units",
                row.len(),
                group.units
            ));
        }
        by_group.insert(idx, row.clone());
    }
    Ok(by_group)
}

fn group_idx(groups_idx_by_label: &HashMap<String, usize>, label: &str) -> PdpResult<usize> {
    match groups_idx_by_label.get(label) {
        Some(idx) => Ok(*idx),
        None => topology_error!(format!("No group '{label}'")),
    }
}
