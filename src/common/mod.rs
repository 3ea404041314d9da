use byteorder::BigEndian;

pub mod varint;

pub type Data = Vec<u8>;
pub type DataSlice<'a> = &'a [u8];

pub type Endian = BigEndian;

pub const GENERAL_REGISTERS: usize = 10;
pub const SPECIAL_REGISTERS: usize = 4;
pub const REGISTERS: usize = GENERAL_REGISTERS + SPECIAL_REGISTERS;

pub const STACK_SIZE: usize = 16 * 1024;

// Every integer operand occupies a fixed slot, whatever its varint length.
pub const INTEGER_SIZE: usize = 8;

pub const STRING_LENGTH_SIZE: usize = 2;
pub const MAX_STRING_LENGTH: usize = 32767;
