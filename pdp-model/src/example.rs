// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Training and testing examples.
//!
//! Values are `Option<f64>`: an absent value is `None` and stays that way
//! until a configuration block is encoded.

use std::collections::BTreeMap;

use crate::config_error;
use crate::group::Group;
use crate::types::PdpResult;

/// One value per unit of a group, any of which may be absent.
pub type UnitValues = Vec<Option<f64>>;

#[derive(Clone, Debug, Default)]
pub struct Event {
    pub max_time: Option<f64>,
    pub min_time: Option<f64>,
    pub grace_time: Option<f64>,
    /// Input values keyed by group id.
    pub inputs: BTreeMap<usize, UnitValues>,
    /// Target values keyed by group id.
    pub targets: BTreeMap<usize, UnitValues>,
}

impl Event {
    #[must_use]
    pub fn inputs_for(&self, group: usize) -> Option<&[Option<f64>]> {
        self.inputs.get(&group).map(Vec::as_slice)
    }

    #[must_use]
    pub fn targets_for(&self, group: usize) -> Option<&[Option<f64>]> {
        self.targets.get(&group).map(Vec::as_slice)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Example {
    pub name: String,
    pub frequency: Option<f64>,
    pub events: Vec<Event>,
}

#[derive(Clone, Debug, Default)]
pub struct ExampleSet {
    pub max_time: Option<f64>,
    pub min_time: Option<f64>,
    pub grace_time: Option<f64>,
    pub examples: Vec<Example>,
}

impl ExampleSet {
    #[must_use]
    pub fn num_examples(&self) -> usize {
        self.examples.len()
    }

    /// Total number of events over all examples.
    #[must_use]
    pub fn num_events(&self) -> usize {
        self.examples.iter().map(|ex| ex.events.len()).sum()
    }

    /// All events in example order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.examples.iter().flat_map(|ex| ex.events.iter())
    }

    /// One row per event holding the subgroup's slice of the group's inputs.
    /// Events without inputs for the group produce absent values.
    #[must_use]
    pub fn input_rows(&self, group: &Group, first_unit: u32, units: u32) -> Vec<UnitValues> {
        self.events()
            .map(|event| slice_row(event.inputs_for(group.id), first_unit, units))
            .collect()
    }

    #[must_use]
    pub fn target_rows(&self, group: &Group, first_unit: u32, units: u32) -> Vec<UnitValues> {
        self.events()
            .map(|event| slice_row(event.targets_for(group.id), first_unit, units))
            .collect()
    }

    /// Number of ticks an example can run for, given the interval length.
    ///
    /// Each event lasts for its own maximum time, falling back to the set's
    /// and then to `default_intervals`.
    pub fn example_ticks(
        &self,
        example: &Example,
        ticks_per_interval: u32,
        default_intervals: u32,
    ) -> PdpResult<u32> {
        let mut total: u64 = 0;
        for event in &example.events {
            let max_time = event
                .max_time
                .filter(|t| !t.is_nan())
                .or(self.max_time.filter(|t| !t.is_nan()))
                .unwrap_or(f64::from(default_intervals));
            let ticks = (max_time * f64::from(ticks_per_interval)).ceil().max(0.0);
            if ticks.is_nan() || ticks > f64::from(u32::MAX) {
                return config_error!(format!(
                    "Event of example '{}' lasts {max_time} intervals, too many ticks",
                    example.name
                ));
            }
            total = match total.checked_add(ticks as u64) {
                Some(total) => total,
                None => return config_error!(format!("Example '{}' overflows ticks", example.name)),
            };
        }
        match u32::try_from(total) {
            Ok(ticks) => Ok(ticks),
            Err(_) => config_error!(format!(
                "Example '{}' runs for {total} ticks, more than {}",
                example.name,
                u32::MAX
            )),
        }
    }
}

fn slice_row(values: Option<&[Option<f64>]>, first_unit: u32, units: u32) -> UnitValues {
    let start = first_unit as usize;
    let end = start + units as usize;
    match values {
        Some(values) if values.len() >= end => values[start..end].to_vec(),
        _ => vec![None; units as usize],
    }
}
