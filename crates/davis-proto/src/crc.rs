//! CRC-16/XMODEM, as used to checksum every framed response the console sends.
//!
//! Polynomial 0x1021, initial value 0, no reflection, no final XOR. The
//! 256-entry table is generated once from the polynomial rather than
//! hand-transcribed.

use std::sync::OnceLock;

fn table() -> &'static [u16; 256] {
    static TABLE: OnceLock<[u16; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u16; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = (i as u16) << 8;
            for _ in 0..8 {
                crc = if crc & 0x8000 != 0 {
                    (crc << 1) ^ 0x1021
                } else {
                    crc << 1
                };
            }
            *entry = crc;
        }
        table
    })
}

/// Compute the running CRC-16/XMODEM over `bytes`, starting from the
/// console protocol's initial value of 0.
pub fn checksum(bytes: &[u8]) -> u16 {
    let table = table();
    let mut accu: u16 = 0;
    for &b in bytes {
        accu = table[((accu >> 8) ^ b as u16) as usize & 0xFF] ^ (accu << 8);
    }
    accu
}

/// `bytes` followed by its own big-endian CRC always checksums to zero.
pub fn verify(bytes: &[u8], expected: u16) -> bool {
    checksum(bytes) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_to_zero() {
        let frame = [0x06u8, 0xE0, 0x00, 0x00];
        let crc = checksum(&frame);
        let mut with_crc = frame.to_vec();
        with_crc.extend_from_slice(&crc.to_be_bytes());
        assert_eq!(checksum(&with_crc), 0);
    }

    #[test]
    fn matches_known_vector() {
        // S1: 06 E0 00 00 (see SPEC_FULL.md §8).
        let frame = [0x06u8, 0xE0, 0x00, 0x00];
        let crc = checksum(&frame);
        assert!(verify(&frame, crc));
        assert_ne!(crc, 0);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(checksum(&[]), 0);
    }
}
