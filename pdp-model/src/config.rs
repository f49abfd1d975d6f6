// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Sections of a YAML network description.

use std::collections::BTreeMap;

use byte_unit::Byte;
use serde::{Deserialize, de};
use serde_yaml::Value;

/// Deserialize `node_memory_limit`: a byte count given as an integer, a hex
/// string such as `0x1_0000` or a unit string such as `64KiB`.
pub fn parse_memory_limit<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: de::Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    let text = match &value {
        Value::Number(n) => match n.as_u64() {
            Some(bytes) => return Ok(Some(bytes)),
            None => {
                return Err(de::Error::custom(format!(
                    "node_memory_limit {n} is not a byte count"
                )));
            }
        },
        Value::String(text) => text,
        other => {
            return Err(de::Error::custom(format!(
                "node_memory_limit must be a number or a string, not {other:?}"
            )));
        }
    };

    let bytes = match text.to_lowercase().strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).map_err(|e| {
            de::Error::custom(format!("node_memory_limit '{text}' is not hex: {e}"))
        })?,
        None => Byte::parse_str(text, false)
            .map_err(|e| de::Error::custom(format!("node_memory_limit '{text}': {e}")))?
            .as_u64(),
    };
    Ok(Some(bytes))
}

/// A function given either by runtime id or by name.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FunctionRef {
    Id(u8),
    Label(String),
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    pub network: Option<NetworkSection>,
    pub groups: Vec<GroupSection>,
    pub links: Option<Vec<LinkSection>>,
    pub output_chain: Option<Vec<String>>,
    pub examples: Option<ExampleSetSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NetworkSection {
    pub name: Option<String>,
    pub net_type: Option<FunctionRef>,
    pub intervals: Option<u32>,
    pub ticks_per_interval: Option<u32>,
    pub num_updates: Option<u32>,
    pub train_group_crit: Option<f64>,
    pub test_group_crit: Option<f64>,
    pub learning_rate: Option<f64>,
    pub weight_decay: Option<f64>,
    pub momentum: Option<f64>,
    pub update_function: Option<FunctionRef>,
    pub timeout: Option<u32>,
    pub timer_tick_period_us: Option<u32>,
    pub seed: Option<u64>,
    pub init_weight_range: Option<f64>,
    pub max_subgroup_units: Option<u32>,
    #[serde(default, deserialize_with = "parse_memory_limit")]
    pub node_memory_limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Input,
    Output,
    Hidden,
}

#[derive(Debug, Deserialize)]
pub struct GroupSection {
    pub label: String,
    pub units: u32,
    pub kind: Option<Vec<GroupKind>>,
    pub out_procs: Option<Vec<FunctionRef>>,
    pub in_procs: Option<Vec<FunctionRef>>,
    pub criterion_function: Option<FunctionRef>,
    pub error_function: Option<FunctionRef>,
    pub weak_clamp_strength: Option<f64>,
    pub soft_clamp_strength: Option<f64>,
    pub init_output: Option<f64>,
    pub init_net: Option<f64>,
    pub train_crit: Option<f64>,
    pub test_crit: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LinkSection {
    pub from: String,
    pub to: String,
    /// Source units by destination units.
    pub weights: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Deserialize)]
pub struct ExampleSetSection {
    pub max_time: Option<f64>,
    pub min_time: Option<f64>,
    pub grace_time: Option<f64>,
    pub examples: Vec<ExampleSection>,
}

#[derive(Debug, Deserialize)]
pub struct ExampleSection {
    pub name: Option<String>,
    pub frequency: Option<f64>,
    pub events: Vec<EventSection>,
}

#[derive(Debug, Deserialize)]
pub struct EventSection {
    pub max_time: Option<f64>,
    pub min_time: Option<f64>,
    pub grace_time: Option<f64>,
    pub inputs: Option<BTreeMap<String, Vec<Option<f64>>>>,
    pub targets: Option<BTreeMap<String, Vec<Option<f64>>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_strings_are_parsed() {
        let yaml = "network:\n  node_memory_limit: 64KiB\ngroups: []\n";
        let cfg: NetworkConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.network.unwrap().node_memory_limit, Some(65536));

        let yaml = "network:\n  node_memory_limit: 0x1_0000\ngroups: []\n";
        let cfg: NetworkConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.network.unwrap().node_memory_limit, Some(0x10000));

        let yaml = "network:\n  node_memory_limit: 4096\ngroups: []\n";
        let cfg: NetworkConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.network.unwrap().node_memory_limit, Some(4096));
    }

    #[test]
    #[should_panic(expected = "node_memory_limit must be a number or a string")]
    fn memory_limit_is_not_a_list() {
        let yaml = "network:\n  node_memory_limit: [1]\ngroups: []\n";
        serde_yaml::from_str::<NetworkConfig>(yaml).unwrap();
    }

    #[test]
    fn functions_by_id_or_label() {
        let yaml = "label: Output\nunits: 4\nout_procs: [logistic, 3]\n";
        let group: GroupSection = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            group.out_procs.unwrap(),
            vec![FunctionRef::Label("logistic".to_string()), FunctionRef::Id(3)]
        );
    }

    #[test]
    fn null_values_are_absent() {
        let yaml = "inputs:\n  Input: [0.5, ~, .nan]\n";
        let event: EventSection = serde_yaml::from_str(yaml).unwrap();
        let values = &event.inputs.unwrap()["Input"];
        assert_eq!(values[0], Some(0.5));
        assert_eq!(values[1], None);
        assert!(values[2].unwrap().is_nan());
    }
}
