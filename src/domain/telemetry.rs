// Normalized telemetry domain models
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A channel the normalizer extracts from every record.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSpec {
    /// Stable key inside the normalized set, e.g. `power.KW.L1`.
    pub key: &'static str,
    /// Dotted path inside a raw record.
    pub source: &'static str,
}

const fn channel(key: &'static str) -> ChannelSpec {
    ChannelSpec { key, source: key }
}

pub const CHANNELS: &[ChannelSpec] = &[
    channel("voltage.V1"),
    channel("voltage.V2"),
    channel("voltage.V3"),
    channel("current.I1"),
    channel("current.I2"),
    channel("current.I3"),
    channel("power.KW.L1"),
    channel("power.KW.L2"),
    channel("power.KW.L3"),
    channel("power.Kvar.L1"),
    channel("power.Kvar.L2"),
    channel("power.Kvar.L3"),
    channel("power.KVA.L1"),
    channel("power.KVA.L2"),
    channel("power.KVA.L3"),
    channel("power.PF.L1"),
    channel("power.PF.L2"),
    channel("power.PF.L3"),
    ChannelSpec { key: "power.Total.KW1", source: "power.Total.KW" },
    channel("power.Total.Kvar"),
    channel("power.Total.KVA"),
    channel("power.Total.PF"),
    channel("energy.KwhImport"),
    channel("energy.KVAhImport"),
    channel("network.act"),
    channel("network.rssi"),
    channel("network.rsrp"),
    channel("network.rsrq"),
    ChannelSpec { key: "network.Frequency1", source: "network.Frequency.Freq" },
];

/// Channel group -> dotted path of the unit string inside a raw record.
pub const UNIT_GROUPS: &[(&str, &str)] = &[
    ("voltage", "voltage.unit"),
    ("current", "current.unit"),
    ("power.KW", "power.KW.unit"),
    ("power.Kvar", "power.Kvar.unit"),
    ("power.KVA", "power.KVA.unit"),
    ("power.PF", "power.PF.unit"),
    ("power.Total", "power.KW.unit"),
    ("energy", "energy.unit"),
    ("network.Frequency", "network.Frequency.unit"),
];

pub fn is_known_channel(key: &str) -> bool {
    CHANNELS.iter().any(|c| c.key == key)
}

/// Column-oriented view of one fetched page, in chronological order.
///
/// Every channel is exactly `timestamps.len()` long; missing readings are `None`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSeriesSet {
    pub timestamps: Vec<Option<String>>,
    pub date: Vec<Option<String>>,
    pub time: Vec<Option<String>>,
    pub channels: BTreeMap<String, Vec<Option<f64>>>,
    pub units: BTreeMap<String, String>,
    pub device_info: Value,
    pub threshold_values: Value,
}

impl NormalizedSeriesSet {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn channel(&self, key: &str) -> Option<&[Option<f64>]> {
        self.channels.get(key).map(Vec::as_slice)
    }

    pub fn unit(&self, group: &str) -> Option<&str> {
        self.units.get(group).map(String::as_str)
    }

    /// Shared time axis: `date[i] time[i]` for every index.
    pub fn x_axis(&self) -> Vec<Option<String>> {
        self.date
            .iter()
            .zip(&self.time)
            .map(|(date, time)| match (date, time) {
                (Some(d), Some(t)) => Some(format!("{} {}", d, t)),
                (Some(d), None) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    /// Newest reading timestamp, if any.
    pub fn latest_timestamp(&self) -> Option<&str> {
        self.timestamps.iter().rev().find_map(|t| t.as_deref())
    }
}
