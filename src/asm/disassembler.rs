use crate::common::*;
use crate::vm::opcodes::{Opcode, Operands};
use crate::vm::registers;
use crate::vm::{Fatal, Value};
use byteorder::ByteOrder;

struct Cursor<'a> {
    program: DataSlice<'a>,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn byte(&mut self) -> Result<u8, Fatal> {
        let byte = *self.program
            .get(self.offset)
            .ok_or(Fatal::UnexpectedEnd(self.offset as i64))?;
        self.offset += 1;
        Ok(byte)
    }

    fn bytes(&mut self, count: usize) -> Result<DataSlice<'a>, Fatal> {
        let end = self.offset + count;
        if end > self.program.len() {
            return Err(Fatal::UnexpectedEnd(self.program.len() as i64));
        }
        let bytes = &self.program[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn register(&mut self) -> Result<String, Fatal> {
        let offset = self.offset as i64;
        let id = self.byte()?;
        match registers::name(id) {
            Some(name) => Ok(format!("${}", name)),
            None => {
                Err(Fatal::UnknownRegister {
                    register: id,
                    offset: offset,
                })
            }
        }
    }

    fn integer(&mut self) -> Result<String, Fatal> {
        let offset = self.offset as i64;
        let mut slot = [0; INTEGER_SIZE];
        slot.copy_from_slice(self.bytes(INTEGER_SIZE)?);
        varint::decode(&slot)
            .map(|i| i.to_string())
            .ok_or(Fatal::MalformedInteger(offset))
    }

    fn string(&mut self) -> Result<String, Fatal> {
        let offset = self.offset as i64;
        let length = Endian::read_u16(self.bytes(STRING_LENGTH_SIZE)?) as usize;
        if length > MAX_STRING_LENGTH {
            return Err(Fatal::MalformedString {
                length: length,
                offset: offset,
            });
        }
        let bytes = self.bytes(length)?;
        Ok(Value::Bytes(bytes.to_vec()).to_string())
    }
}

/// One line per instruction: `offset: MNEMONIC operands`. Label references
/// come out as the absolute offsets they were patched with.
pub fn disassemble(program: DataSlice) -> Result<Vec<String>, Fatal> {
    let mut cursor = Cursor {
        program: program,
        offset: 0,
    };
    let mut lines = vec![];

    while cursor.offset < program.len() {
        let offset = cursor.offset;
        let byte = cursor.byte()?;
        let opcode = Opcode::from_byte(byte).ok_or(Fatal::UnknownOpcode {
            opcode: byte,
            offset: offset as i64,
        })?;

        let operands = match opcode.operands() {
            Operands::None => vec![],
            Operands::Byte => vec![cursor.byte()?.to_string()],
            Operands::Register => vec![cursor.register()?],
            Operands::Integer | Operands::IntegerOrLabel => vec![cursor.integer()?],
            Operands::String => vec![cursor.string()?],
            Operands::RegisterInteger | Operands::RegisterIntegerOrLabel => {
                vec![cursor.register()?, cursor.integer()?]
            }
            Operands::RegisterString => vec![cursor.register()?, cursor.string()?],
            Operands::TwoRegisters => vec![cursor.register()?, cursor.register()?],
        };

        let mut line = format!("{:04}: {}", offset, opcode.mnemonic());
        for operand in operands {
            line.push(' ');
            line.push_str(&operand);
        }
        lines.push(line);
    }

    Ok(lines)
}
