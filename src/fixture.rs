//! fixture — детерминированный генератор тестового лога из показаний датчиков.
//!
//! Лог: `n` маленьких чанков (по одному показанию, pretty JSON) и один большой
//! чанк из 20 копий последнего показания, который гарантированно проходит порог сжатия.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::chunk::{write_chunk, ChunkHeader, WriteOptions};
use crate::error::ChunkError;
use crate::util::format_node_id;

/// Number of copies in the trailing large chunk.
pub const LARGE_CHUNK_COPIES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: u32,
    pub node_id: String,
    pub battery_pct: i32,
    pub mode: String,
    pub sensors: Sensors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    pub bme280: Bme280,
    pub aht21: Aht21,
    pub ens160: Ens160,
    pub gy271: Gy271,
    pub ina219: Ina219,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bme280 {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub pressure_hpa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aht21 {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ens160 {
    pub aqi: u8,
    pub tvoc_ppb: u32,
    pub eco2_ppm: u32,
    pub status: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gy271 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ina219 {
    pub bus_voltage_v: f64,
    pub shunt_voltage_mv: f64,
    pub current_ma: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl SensorReading {
    /// The `i`-th reading of a series: one minute apart, battery draining, bme280 warming up.
    pub fn sample(node_id: u64, base_ts: u32, i: usize) -> Self {
        Self {
            timestamp: base_ts.saturating_add((i as u32).saturating_mul(60)),
            node_id: format_node_id(node_id),
            battery_pct: 28 - i as i32,
            mode: "POWER_SAVE".to_string(),
            sensors: Sensors {
                bme280: Bme280 {
                    temperature_c: round2(30.5 + i as f64 * 0.2),
                    humidity_pct: 65.2,
                    pressure_hpa: 1013.25,
                },
                aht21: Aht21 {
                    temperature_c: 30.1,
                    humidity_pct: 62.9,
                },
                ens160: Ens160 {
                    aqi: 1,
                    tvoc_ppb: 35,
                    eco2_ppm: 426,
                    status: 0x8B,
                },
                gy271: Gy271 {
                    x: -6222,
                    y: 1550,
                    z: -1122,
                },
                ina219: Ina219 {
                    bus_voltage_v: 3.552,
                    shunt_voltage_mv: 7.49,
                    current_ma: 74.9,
                },
            },
        }
    }
}

/// Write `n` single-reading chunks followed by one large chunk; returns the written headers.
pub fn write_fixture_log<W: Write>(
    sink: &mut W,
    node_id: u64,
    base_ts: u32,
    n: usize,
    opts: &WriteOptions,
) -> Result<Vec<ChunkHeader>, ChunkError> {
    let mut headers = Vec::with_capacity(n + 1);
    let mut last = SensorReading::sample(node_id, base_ts, 0);

    for i in 0..n {
        last = SensorReading::sample(node_id, base_ts, i);
        let json = serde_json::to_string_pretty(&last).map_err(io::Error::from)?;
        headers.push(write_chunk(sink, json.as_bytes(), node_id, last.timestamp, opts)?);
    }

    let many = vec![last.clone(); LARGE_CHUNK_COPIES];
    let json = serde_json::to_string_pretty(&many).map_err(io::Error::from)?;
    headers.push(write_chunk(sink, json.as_bytes(), node_id, last.timestamp, opts)?);

    Ok(headers)
}
