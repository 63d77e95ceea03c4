// Test payloads shaped like the telemetry source's pages
use serde_json::{Value, json};

/// One raw record. `i` seeds every reading so values differ per record.
pub fn record(timestamp: &str, i: usize) -> Value {
    let base = i as f64;
    let (date, time) = timestamp
        .trim_end_matches('Z')
        .split_once('T')
        .unwrap_or((timestamp, ""));
    json!({
        "timestamp": timestamp,
        "date": date,
        "time": time,
        "voltage": {"V1": 230.0 + base, "V2": 231.0 + base, "V3": 232.0 + base, "unit": "V"},
        "current": {"I1": 10.0 + base, "I2": 11.0 + base, "I3": 12.0 + base, "unit": "A"},
        "power": {
            "KW": {"L1": 2.0 + base, "L2": 2.5 + base, "L3": 3.0 + base, "unit": "kW"},
            "Kvar": {"L1": 0.5 + base, "L2": 0.6 + base, "L3": 0.7 + base, "unit": "kVar"},
            "KVA": {"L1": 2.1 + base, "L2": 2.6 + base, "L3": 3.1 + base, "unit": "kVA"},
            "PF": {"L1": 0.95, "L2": 0.96, "L3": 0.97, "unit": "%"},
            "Total": {"KW": 7.5 + 3.0 * base, "Kvar": 1.8, "KVA": 7.8, "PF": 0.96}
        },
        "energy": {"KwhImport": 1000.0 + base, "KVAhImport": 1100.0 + base, "unit": "kWh"},
        "network": {
            "act": "LTE",
            "rssi": -70.0 - base,
            "rsrp": -95.0,
            "rsrq": "-11",
            "Frequency": {"Freq": 50.0, "unit": "Hz"}
        }
    })
}

pub fn thresholds() -> Value {
    json!({
        "voltage": {
            "VL1": {"V1H": 250.0, "V1L": 210.0},
            "VL2": {"V2H": 250.0, "V2L": 210.0},
            "VL3": {"V3H": 250.0}
        },
        "current": {
            "IR1": {"I1H": 60.0, "I1L": 0.0},
            "IR2": {"I2H": 60.0, "I2L": 0.0},
            "IR3": {"I3H": 60.0, "I3L": 0.0}
        },
        "power": {
            "KW": {"PW1": {"L1H": 10.0, "L1L": 0.0}},
            "KVA": {"KVA1": {"L1H": 12.0, "L1L": 1.0}, "KVA2": {"L2H": 12.0}},
            "Kvar": {"Kvar1": {"L1H": 4.0, "L1L": 0.1}}
        },
        "Frequency": {"FreqH": 50.5, "FreqL": 49.5}
    })
}

pub fn device_info() -> Value {
    json!({
        "deviceID": "dev-42",
        "deviceName": "Main incomer",
        "serialNumber": "WR2001000008",
        "status": "online",
        "lastUpdate": "2024-05-01T10:02:00Z"
    })
}

pub fn page(records: Vec<Value>) -> Value {
    json!({
        "status": "success",
        "device_info": device_info(),
        "threshold_values": thresholds(),
        "mapped_data": records
    })
}

/// `n` records one minute apart, delivered newest-first like the real source.
pub fn sample_page(n: usize) -> Value {
    let records = (0..n)
        .rev()
        .map(|i| record(&format!("2024-05-01T10:{:02}:00Z", i), i))
        .collect();
    page(records)
}
