//! checksum — CRC-32 (IEEE, reflected poly 0xEDB88320), совместимый с zlib/PNG.
//!
//! CRC всегда считается по сохранённым байтам payload (после решения raw/deflate),
//! заголовок в расчёт не входит.

/// CRC-32 of `bytes`. Empty input yields 0.
#[inline]
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// true, если сохранённое значение — побитовая инверсия вычисленного
/// (так выглядят CRC, записанные без финального XOR).
#[inline]
pub fn is_inverted_crc(stored: u32, computed: u32) -> bool {
    stored != computed && (computed ^ 0xFFFF_FFFF) == stored
}
