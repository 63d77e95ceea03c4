// Telemetry normalizer - Raw newest-first pages into chronological column series
use crate::domain::error::{EngineError, Result};
use crate::domain::field::{resolve, resolve_number, resolve_str};
use crate::domain::telemetry::{CHANNELS, NormalizedSeriesSet, UNIT_GROUPS};
use serde_json::Value;
use std::collections::BTreeMap;

/// Convert one page from the telemetry source into a `NormalizedSeriesSet`.
///
/// The page is validated before any record is read, so a malformed page never produces a
/// partial set.
pub fn normalize(page: &Value) -> Result<NormalizedSeriesSet> {
    let device_info = metadata_block(page, "device_info")?;
    let threshold_values = metadata_block(page, "threshold_values")?;
    let records = page
        .get("mapped_data")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            EngineError::MalformedPayload("mapped_data is absent or not a sequence".to_string())
        })?;

    let mut builder = SeriesBuilder::with_capacity(records.len());
    for record in records {
        builder.push(record);
    }
    let set = builder.finish(device_info.clone(), threshold_values.clone());

    tracing::debug!(
        "Normalized {} records into {} channels ({} units)",
        set.len(),
        set.channels.len(),
        set.units.len()
    );
    Ok(set)
}

fn metadata_block<'a>(page: &'a Value, name: &str) -> Result<&'a Value> {
    page.get(name)
        .filter(|block| block.is_object())
        .ok_or_else(|| EngineError::MalformedPayload(format!("missing '{}' block", name)))
}

/// Accumulates records in arrival order; `finish` restores chronological order in one step.
struct SeriesBuilder {
    timestamps: Vec<Option<String>>,
    date: Vec<Option<String>>,
    time: Vec<Option<String>>,
    channels: Vec<Vec<Option<f64>>>,
    units: BTreeMap<String, String>,
}

impl SeriesBuilder {
    fn with_capacity(len: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(len),
            date: Vec::with_capacity(len),
            time: Vec::with_capacity(len),
            channels: CHANNELS.iter().map(|_| Vec::with_capacity(len)).collect(),
            units: BTreeMap::new(),
        }
    }

    fn push(&mut self, record: &Value) {
        self.timestamps.push(text(record, "timestamp"));
        self.date.push(text(record, "date"));
        self.time.push(text(record, "time"));

        for (column, spec) in self.channels.iter_mut().zip(CHANNELS) {
            column.push(resolve_number(record, spec.source));
        }

        // First unit seen wins; records arrive newest-first.
        for (group, path) in UNIT_GROUPS {
            if self.units.contains_key(*group) {
                continue;
            }
            if let Some(unit) = resolve_str(record, path) {
                self.units.insert(group.to_string(), unit.to_string());
            }
        }
    }

    fn finish(self, device_info: Value, threshold_values: Value) -> NormalizedSeriesSet {
        let channels = CHANNELS
            .iter()
            .map(|spec| spec.key.to_string())
            .zip(self.channels)
            .collect();

        let mut set = NormalizedSeriesSet {
            timestamps: self.timestamps,
            date: self.date,
            time: self.time,
            channels,
            units: self.units,
            device_info,
            threshold_values,
        };
        restore_chronological_order(&mut set);
        debug_assert!(set.channels.values().all(|c| c.len() == set.timestamps.len()));
        set
    }
}

/// The source delivers newest-first. Every time-indexed sequence is reversed here and nowhere else.
fn restore_chronological_order(set: &mut NormalizedSeriesSet) {
    set.timestamps.reverse();
    set.date.reverse();
    set.time.reverse();
    for column in set.channels.values_mut() {
        column.reverse();
    }
}

fn text(record: &Value, path: &str) -> Option<String> {
    match resolve(record, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::{page, record, sample_page};
    use serde_json::json;

    #[test]
    fn test_all_sequences_share_length() {
        let set = normalize(&sample_page(5)).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.date.len(), 5);
        assert_eq!(set.time.len(), 5);
        assert_eq!(set.channels.len(), CHANNELS.len());
        for (key, column) in &set.channels {
            assert_eq!(column.len(), 5, "channel {} has wrong length", key);
        }
    }

    #[test]
    fn test_restores_chronological_order() {
        let set = normalize(&sample_page(4)).unwrap();
        let timestamps: Vec<&str> = set.timestamps.iter().map(|t| t.as_deref().unwrap()).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(timestamps[0], "2024-05-01T10:00:00Z");
        assert_eq!(set.latest_timestamp(), Some("2024-05-01T10:03:00Z"));
    }

    #[test]
    fn test_channel_values_follow_their_record() {
        let raw = sample_page(3);
        let records = raw["mapped_data"].as_array().unwrap();
        let set = normalize(&raw).unwrap();
        let v1 = set.channel("voltage.V1").unwrap();
        let time = &set.time;
        for k in 0..3 {
            let source = &records[records.len() - 1 - k];
            assert_eq!(v1[k], source["voltage"]["V1"].as_f64());
            assert_eq!(time[k].as_deref(), source["time"].as_str());
        }
    }

    #[test]
    fn test_missing_reading_becomes_null() {
        let mut middle = record("2024-05-01T10:01:00Z", 1);
        middle["network"].as_object_mut().unwrap().remove("rssi");
        let raw = page(vec![
            record("2024-05-01T10:02:00Z", 2),
            middle,
            record("2024-05-01T10:00:00Z", 0),
        ]);
        let set = normalize(&raw).unwrap();
        assert_eq!(set.channel("network.rssi").unwrap(), &[Some(-70.0), None, Some(-72.0)]);
    }

    #[test]
    fn test_renamed_and_coerced_channels() {
        let set = normalize(&sample_page(2)).unwrap();
        assert_eq!(set.channel("power.Total.KW1").unwrap(), &[Some(7.5), Some(10.5)]);
        assert_eq!(set.channel("network.Frequency1").unwrap(), &[Some(50.0), Some(50.0)]);
        assert_eq!(set.channel("network.rsrq").unwrap(), &[Some(-11.0), Some(-11.0)]);
        // access technology is not numeric
        assert_eq!(set.channel("network.act").unwrap(), &[None, None]);
    }

    #[test]
    fn test_units_come_from_first_record_that_has_one() {
        let mut newest = record("2024-05-01T10:01:00Z", 1);
        newest["voltage"].as_object_mut().unwrap().remove("unit");
        let mut older = record("2024-05-01T10:00:00Z", 0);
        older["voltage"]["unit"] = json!("Volts");
        let set = normalize(&page(vec![newest, older])).unwrap();
        assert_eq!(set.unit("voltage"), Some("Volts"));
        assert_eq!(set.unit("power.Total"), Some("kW"));
        assert_eq!(set.unit("network.Frequency"), Some("Hz"));
    }

    #[test]
    fn test_metadata_copied_verbatim() {
        let raw = sample_page(1);
        let set = normalize(&raw).unwrap();
        assert_eq!(set.device_info, raw["device_info"]);
        assert_eq!(set.threshold_values, raw["threshold_values"]);
    }

    #[test]
    fn test_empty_page_is_valid() {
        let set = normalize(&page(vec![])).unwrap();
        assert!(set.is_empty());
        assert!(set.channels.values().all(Vec::is_empty));
        assert!(set.units.is_empty());
    }

    #[test]
    fn test_malformed_payloads() {
        let mut missing_device = sample_page(1);
        missing_device.as_object_mut().unwrap().remove("device_info");

        let mut missing_thresholds = sample_page(1);
        missing_thresholds["threshold_values"] = json!("n/a");

        let mut not_a_sequence = sample_page(1);
        not_a_sequence["mapped_data"] = json!({"0": {}});

        let mut no_data = sample_page(1);
        no_data.as_object_mut().unwrap().remove("mapped_data");

        for raw in [missing_device, missing_thresholds, not_a_sequence, no_data, json!([])] {
            assert!(matches!(normalize(&raw), Err(EngineError::MalformedPayload(_))));
        }
    }

    #[test]
    fn test_non_object_record_yields_nulls() {
        let raw = page(vec![json!("garbage"), record("2024-05-01T10:00:00Z", 0)]);
        let set = normalize(&raw).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.timestamps[1], None);
        assert_eq!(set.channel("voltage.V1").unwrap(), &[Some(230.0), None]);
    }
}
