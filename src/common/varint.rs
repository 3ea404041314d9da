//! Zigzag LEB128 integers stored in a fixed `INTEGER_SIZE` byte slot.
//!
//! Unused trailing bytes of the slot are zero. Eight 7-bit groups give 56
//! payload bits, so the representable range is `[-2^55, 2^55)`.

use crate::common::INTEGER_SIZE;

pub type Slot = [u8; INTEGER_SIZE];

pub const MIN: i64 = -(1 << 55);
pub const MAX: i64 = (1 << 55) - 1;

pub fn encode(value: i64) -> Option<Slot> {
    let mut rest = ((value << 1) ^ (value >> 63)) as u64;
    let mut slot = [0; INTEGER_SIZE];

    for byte in slot.iter_mut() {
        if rest < 0x80 {
            *byte = rest as u8;
            return Some(slot);
        }
        *byte = (rest as u8) | 0x80;
        rest >>= 7;
    }

    None
}

/// Returns `None` when no byte of the slot terminates the number.
pub fn decode(slot: &Slot) -> Option<i64> {
    let mut zigzag = 0u64;

    for (i, byte) in slot.iter().enumerate() {
        zigzag |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            let value = (zigzag >> 1) as i64 ^ -((zigzag & 1) as i64);
            return Some(value);
        }
    }

    None
}
