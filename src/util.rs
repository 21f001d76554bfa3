//! util — общие хелперы: идентификатор узла (MAC), время, hex/text дампы payload.

use chrono::{DateTime, SecondsFormat};

/// Текущее Unix-время в секундах, обрезанное к u32 (saturating).
#[inline]
pub fn now_secs() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs().min(u32::MAX as u64) as u32
}

/// Упаковать MAC в node_id: mac[0] — старший из 48 использованных бит.
pub fn node_id_from_mac(mac: [u8; 6]) -> u64 {
    mac.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Обратное к node_id_from_mac: младшие 48 бит -> 6 байт MAC (старший байт первым).
pub fn mac_from_node_id(node_id: u64) -> [u8; 6] {
    let mut mac = [0u8; 6];
    for (i, b) in mac.iter_mut().enumerate() {
        *b = (node_id >> ((5 - i) * 8)) as u8;
    }
    mac
}

/// `AA:BB:CC:DD:EE:FF`; the upper 16 bits of `node_id` are ignored.
pub fn format_node_id(node_id: u64) -> String {
    let mac = mac_from_node_id(node_id);
    mac.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse a node id given as `AA:BB:CC:DD:EE:FF`, `0x...` or plain hex.
pub fn parse_node_id(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.contains(':') {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(format!("MAC must have 6 octets, got {}", parts.len()));
        }
        let mut mac = [0u8; 6];
        for (i, p) in parts.iter().enumerate() {
            mac[i] = u8::from_str_radix(p, 16).map_err(|e| format!("octet {}: {}", i, e))?;
        }
        return Ok(node_id_from_mac(mac));
    }
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(hex, 16).map_err(|e| e.to_string())
}

/// ISO-8601 (UTC) для Unix-времени; 0 — "нет времени" -> None.
pub fn timestamp_iso(ts: u32) -> Option<String> {
    if ts == 0 {
        return None;
    }
    DateTime::from_timestamp(i64::from(ts), 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            if i % 16 == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.push_str(&format!("{:02x}", b));
    }
    out
}

pub fn display_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => format!("(binary {} B)", bytes.len()),
    }
}
