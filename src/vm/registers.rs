use crate::common::*;
use crate::vm::value::Value;

pub const A: u8 = 0x00;
pub const B: u8 = 0x01;
pub const C: u8 = 0x02;
pub const D: u8 = 0x03;
pub const E: u8 = 0x04;
pub const F: u8 = 0x05;
pub const G: u8 = 0x06;
pub const H: u8 = 0x07;
pub const I: u8 = 0x08;
pub const J: u8 = 0x09;

pub const PC: u8 = 0x0a; // program counter
pub const SP: u8 = 0x0b; // stack pointer
pub const FP: u8 = 0x0c; // frame pointer
pub const RT: u8 = 0x0d; // return address

const NAMES: [&str; REGISTERS] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "PC", "SP", "FP", "RT",
];

/// Case-insensitive register name lookup, without the `$` prefix.
pub fn index(name: &str) -> Option<u8> {
    NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(name))
        .map(|i| i as u8)
}

pub fn name(id: u8) -> Option<&'static str> {
    NAMES.get(id as usize).cloned()
}

pub fn is_special(id: u8) -> bool {
    id as usize >= GENERAL_REGISTERS && (id as usize) < REGISTERS
}

/// General registers hold any value, special ones only integers.
#[derive(Clone, Debug, PartialEq)]
pub struct Registers {
    general: [Value; GENERAL_REGISTERS],
    special: [i64; SPECIAL_REGISTERS],
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            general: Default::default(),
            special: [0; SPECIAL_REGISTERS],
        }
    }

    /// Panics on an id outside the register file; callers validate ids
    /// read from the program first.
    pub fn get(&self, id: u8) -> Value {
        let id = id as usize;
        if id < GENERAL_REGISTERS {
            self.general[id].clone()
        } else {
            Value::Integer(self.special[id - GENERAL_REGISTERS])
        }
    }

    pub fn get_special(&self, id: u8) -> i64 {
        debug_assert!(is_special(id));
        self.special[id as usize - GENERAL_REGISTERS]
    }

    pub fn set_special(&mut self, id: u8, value: i64) {
        debug_assert!(is_special(id));
        self.special[id as usize - GENERAL_REGISTERS] = value;
    }

    /// Returns the value back when a special register would receive bytes.
    pub fn set(&mut self, id: u8, value: Value) -> Result<(), Value> {
        let id = id as usize;
        if id < GENERAL_REGISTERS {
            self.general[id] = value;
            return Ok(());
        }

        match value {
            Value::Integer(i) => {
                self.special[id - GENERAL_REGISTERS] = i;
                Ok(())
            }
            bytes => Err(bytes),
        }
    }

    pub fn increment(&mut self, id: u8) {
        let slot = &mut self.special[id as usize - GENERAL_REGISTERS];
        *slot = slot.wrapping_add(1);
    }

    pub fn decrement(&mut self, id: u8) {
        let slot = &mut self.special[id as usize - GENERAL_REGISTERS];
        *slot = slot.wrapping_sub(1);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Registers::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(Some(A), index("A"));
        assert_eq!(Some(J), index("j"));
        assert_eq!(Some(PC), index("pc"));
        assert_eq!(Some(RT), index("Rt"));
        assert_eq!(None, index("K"));
        assert_eq!(None, index(""));
        assert_eq!(Some("FP"), name(FP));
        assert_eq!(None, name(REGISTERS as u8));
    }

    #[test]
    fn zero_initialized() {
        let registers = Registers::new();
        for id in 0..REGISTERS as u8 {
            assert_eq!(Value::Integer(0), registers.get(id));
        }
    }

    #[test]
    fn special_registers_reject_bytes() {
        let mut registers = Registers::new();
        assert!(registers.set(A, Value::from("x")).is_ok());
        assert_eq!(Value::from("x"), registers.get(A));

        assert_eq!(Err(Value::from("y")), registers.set(SP, Value::from("y")));
        assert_eq!(Value::Integer(0), registers.get(SP));

        assert!(registers.set(FP, Value::Integer(7)).is_ok());
        assert_eq!(7, registers.get_special(FP));
    }
}
