// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Recording channels of output Threshold nodes and their read-back.
//!
//! Every output Threshold records its outputs on every tick and the test
//! results once per stage. The first output node also records per-tick
//! bookkeeping data. The buffers are sized per stage and described to the
//! runtime by the recording-info region.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::debug;
use pdp_model::fixed::{FixedKind, decode};
use pdp_model::types::PdpResult;
use pdp_model::{data_error, encoding_error};

use crate::regions::file_stem;

/// Bytes of the constant test-results buffer: epochs trained, examples
/// tested, ticks tested and examples correct.
pub const TEST_RESULTS_BYTES: u32 = 16;

/// Bytes recorded per tick on the tick-data channel.
pub const TICK_DATA_BYTES: u32 = 16;

/// Bytes recorded per unit per tick on the outputs channel.
pub const OUTPUT_BYTES: u32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordingChannel {
    Outputs,
    TestResults,
    TickData,
}

impl RecordingChannel {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RecordingChannel::Outputs => "outputs",
            RecordingChannel::TestResults => "test_results",
            RecordingChannel::TickData => "tick_data",
        }
    }
}

impl fmt::Display for RecordingChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Recording channels of one output Threshold node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecordingPlan {
    pub units: u32,
    /// Set on the first subgroup of the first output group.
    pub first_output: bool,
}

impl RecordingPlan {
    /// Channels in recording-region order.
    #[must_use]
    pub fn channels(&self) -> Vec<RecordingChannel> {
        let mut channels = vec![RecordingChannel::Outputs, RecordingChannel::TestResults];
        if self.first_output {
            channels.push(RecordingChannel::TickData);
        }
        channels
    }

    /// Buffer size of a channel for a run of `run_ticks`.
    pub fn size(&self, channel: RecordingChannel, run_ticks: u32) -> PdpResult<u32> {
        let size = match channel {
            RecordingChannel::Outputs => {
                u64::from(OUTPUT_BYTES) * u64::from(self.units) * u64::from(run_ticks)
            }
            RecordingChannel::TestResults => u64::from(TEST_RESULTS_BYTES),
            RecordingChannel::TickData => u64::from(TICK_DATA_BYTES) * u64::from(run_ticks),
        };
        match u32::try_from(size) {
            Ok(size) => Ok(size),
            Err(_) => encoding_error!(format!(
                "Recording channel {channel} needs {size} bytes for {run_ticks} ticks"
            )),
        }
    }

    #[must_use]
    pub fn descriptor_size(&self) -> u32 {
        4 * (1 + self.channels().len() as u32)
    }

    /// Recording-info region content: the channel count then the size of
    /// every channel.
    pub fn descriptor(&self, run_ticks: u32) -> PdpResult<Vec<u8>> {
        let channels = self.channels();
        let mut bytes = Vec::with_capacity(self.descriptor_size() as usize);
        bytes.extend_from_slice(&(channels.len() as u32).to_le_bytes());
        for channel in channels {
            bytes.extend_from_slice(&self.size(channel, run_ticks)?.to_le_bytes());
        }
        Ok(bytes)
    }

    /// Memory held for the constant-size channels.
    #[must_use]
    pub fn fixed_bytes(&self) -> u64 {
        u64::from(TEST_RESULTS_BYTES)
    }

    #[must_use]
    pub fn variable_bytes_per_tick(&self) -> u64 {
        let mut bytes = u64::from(OUTPUT_BYTES) * u64::from(self.units);
        if self.first_output {
            bytes += u64::from(TICK_DATA_BYTES);
        }
        bytes
    }
}

/// Raw data of one channel as returned by the buffer manager.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recorded {
    pub data: Vec<u8>,
    /// Set when the runtime lost some of the channel's data.
    pub missing: bool,
}

pub trait RecordingSource {
    fn recording(&self, label: &str, channel: RecordingChannel) -> PdpResult<Recorded>;
}

/// Read one channel, failing if any of its data is missing.
pub fn read_recording(
    source: &dyn RecordingSource,
    label: &str,
    channel: RecordingChannel,
) -> PdpResult<Vec<u8>> {
    let recorded = source.recording(label, channel)?;
    if recorded.missing {
        return data_error!(format!("Recording {channel} of {label} is missing data"));
    }
    debug!(
        "Read {} bytes of {channel} from {label}",
        recorded.data.len()
    );
    Ok(recorded.data)
}

/// Decode the outputs channel into one row of activations per tick.
pub fn decode_outputs(data: &[u8], units: u32) -> PdpResult<Vec<Vec<Option<f64>>>> {
    let row_bytes = (OUTPUT_BYTES * units) as usize;
    if row_bytes == 0 || data.len() % row_bytes != 0 {
        return data_error!(format!(
            "{} bytes of outputs is not a whole number of {units} unit rows",
            data.len()
        ));
    }
    Ok(data
        .chunks_exact(row_bytes)
        .map(|row| {
            row.chunks_exact(2)
                .map(|raw| {
                    decode(
                        i32::from(i16::from_le_bytes([raw[0], raw[1]])),
                        FixedKind::ShortActivation,
                    )
                })
                .collect()
        })
        .collect())
}

/// Recordings downloaded to a directory, one `<node>.<channel>.rec` file per
/// channel. A missing file is reported as missing data.
pub struct FileRecordings {
    dir: PathBuf,
}

impl FileRecordings {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn path(&self, label: &str, channel: RecordingChannel) -> PathBuf {
        self.dir
            .join(format!("{}.{}.rec", file_stem(label), channel.name()))
    }
}

impl RecordingSource for FileRecordings {
    fn recording(&self, label: &str, channel: RecordingChannel) -> PdpResult<Recorded> {
        let path = self.path(label, channel);
        match std::fs::read(&path) {
            Ok(data) => Ok(Recorded {
                data,
                missing: false,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Recorded {
                data: Vec::new(),
                missing: true,
            }),
            Err(e) => data_error!(format!("Unable to read {}: {e}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_output_records_tick_data() {
        let plan = RecordingPlan {
            units: 10,
            first_output: true,
        };
        assert_eq!(
            plan.channels(),
            vec![
                RecordingChannel::Outputs,
                RecordingChannel::TestResults,
                RecordingChannel::TickData
            ]
        );
        assert_eq!(plan.variable_bytes_per_tick(), 20 + 16);
        assert_eq!(plan.descriptor_size(), 16);

        let descriptor = plan.descriptor(5).unwrap();
        let words: Vec<u32> = descriptor
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        assert_eq!(words, vec![3, 100, 16, 80]);
    }

    #[test]
    fn other_outputs_have_two_channels() {
        let plan = RecordingPlan {
            units: 8,
            first_output: false,
        };
        assert_eq!(plan.channels().len(), 2);
        assert_eq!(plan.variable_bytes_per_tick(), 16);
        assert_eq!(plan.fixed_bytes(), 16);
        assert_eq!(plan.descriptor_size(), 12);
    }

    #[test]
    fn outputs_decode_per_tick() {
        // 0.5 and absent, then the largest short and 0
        let data = [0x00, 0x40, 0x00, 0x80, 0xff, 0x7f, 0x00, 0x00];
        let rows = decode_outputs(&data, 2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Some(0.5));
        assert_eq!(rows[0][1], None);
        assert_eq!(rows[1][1], Some(0.0));
    }

    #[test]
    #[should_panic(expected = "3 bytes of outputs is not a whole number of 2 unit rows")]
    fn partial_output_row() {
        decode_outputs(&[0, 0, 0], 2).unwrap();
    }
}
