//! Text to bytecode.
//!
//! One instruction per line, `;` starts a comment, an optional `label:`
//! prefix binds the label to the offset of the instruction that follows.
//! Registers are written `$A`, label references `%name`, strings are
//! delimited by matching quotes and taken verbatim.
//!
//! Label references are emitted as zeroed integer slots and backfilled once
//! the whole source has been read, so labels may be used before they are
//! defined.

use crate::common::*;
use crate::vm::opcodes::{Opcode, Operands};
use crate::vm::registers;
use byteorder::ByteOrder;
use std::collections::HashMap;
use thiserror::Error;

mod disassembler;

#[cfg(test)]
mod tests;

pub use self::disassembler::disassemble;

const COMMENT_CHAR: char = ';';
const LABEL_SUFFIX: char = ':';
const REGISTER_PREFIX: char = '$';
const LABEL_PREFIX: char = '%';

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SyntaxError {
    #[error("Unknown instruction {mnemonic} on line {line}")]
    UnknownInstruction { line: usize, mnemonic: String },
    #[error("Expected {expected} on line {line}")]
    Arity { line: usize, expected: &'static str },
    #[error("Expected register on line {line}")]
    ExpectedRegister { line: usize },
    #[error("{name} is not a register, line {line}")]
    UnknownRegister { line: usize, name: String },
    #[error("Invalid integer {token} on line {line}")]
    InvalidInteger { line: usize, token: String },
    #[error("Integer {value} out of operand range on line {line}")]
    IntegerOutOfRange { line: usize, value: i64 },
    #[error("Exit code must be between 0-255, line {line}")]
    ExitCodeOutOfRange { line: usize },
    #[error("Malformed string literal on line {line}")]
    MalformedString { line: usize },
    #[error("String too long on line {line}")]
    StringTooLong { line: usize },
    #[error("Empty label name on line {line}")]
    EmptyLabel { line: usize },
    #[error("Label {label} redefined on line {line}")]
    DuplicateLabel { line: usize, label: String },
    #[error("Label {label} not defined, referenced on line {line}")]
    UndefinedLabel { line: usize, label: String },
}

struct Patch {
    offset: usize,
    label: String,
    line: usize,
}

pub struct Assembler {
    line: usize,
    program: Data,
    labels: HashMap<String, usize>,
    patches: Vec<Patch>,
}

/// Assembles a whole source text. Nothing is returned on error.
pub fn assemble(source: &str) -> Result<Data, SyntaxError> {
    let mut assembler = Assembler::new();
    for line in source.lines() {
        assembler.feed_line(line)?;
    }
    assembler.finish()
}

impl Assembler {
    pub fn new() -> Self {
        Assembler {
            line: 0,
            program: Vec::with_capacity(1024),
            labels: HashMap::new(),
            patches: Vec::new(),
        }
    }

    /// Current offset, which is where the next instruction lands.
    pub fn offset(&self) -> usize {
        self.program.len()
    }

    pub fn feed_line(&mut self, line: &str) -> Result<(), SyntaxError> {
        self.line += 1;

        let line = strip_comment(line.trim()).trim();
        if line.is_empty() {
            return Ok(());
        }

        let mut line = line;
        while let Some((label, rest)) = split_label(line) {
            self.define_label(label)?;
            line = rest.trim();
        }
        if line.is_empty() {
            return Ok(());
        }

        let (mnemonic, operands) = match line.find(char::is_whitespace) {
            Some(i) => (&line[..i], line[i..].trim()),
            None => (line, ""),
        };

        let opcode = Opcode::from_mnemonic(mnemonic).ok_or(SyntaxError::UnknownInstruction {
            line: self.line,
            mnemonic: mnemonic.to_string(),
        })?;
        debug!("line {}: {} at {}", self.line, opcode.mnemonic(), self.offset());
        self.program.push(opcode.byte());

        self.encode_operands(opcode.operands(), operands)
    }

    /// Runs the patch phase and hands out the program.
    pub fn finish(mut self) -> Result<Data, SyntaxError> {
        for patch in &self.patches {
            let address = *self.labels.get(&patch.label).ok_or(SyntaxError::UndefinedLabel {
                line: patch.line,
                label: patch.label.clone(),
            })?;

            let slot = varint::encode(address as i64).ok_or(SyntaxError::IntegerOutOfRange {
                line: patch.line,
                value: address as i64,
            })?;
            self.program[patch.offset..patch.offset + INTEGER_SIZE].copy_from_slice(&slot);
            debug!("patched {} -> {} at {}", patch.label, address, patch.offset);
        }

        Ok(self.program)
    }

    fn define_label(&mut self, label: &str) -> Result<(), SyntaxError> {
        if label.is_empty() {
            return Err(SyntaxError::EmptyLabel { line: self.line });
        }
        if self.labels.contains_key(label) {
            return Err(SyntaxError::DuplicateLabel {
                line: self.line,
                label: label.to_string(),
            });
        }

        let offset = self.offset();
        self.labels.insert(label.to_string(), offset);
        Ok(())
    }

    fn encode_operands(&mut self, schema: Operands, operands: &str) -> Result<(), SyntaxError> {
        let tokens = operands.split_whitespace().collect::<Vec<&str>>();

        match schema {
            Operands::None => self.expect_tokens(&tokens, 0, "no operands"),
            Operands::Byte => {
                self.expect_tokens(&tokens, 1, "int")?;
                self.encode_byte(tokens[0])
            }
            Operands::Register => {
                self.expect_tokens(&tokens, 1, "register")?;
                self.encode_register(tokens[0])
            }
            Operands::Integer => {
                self.expect_tokens(&tokens, 1, "int")?;
                self.encode_integer(tokens[0])
            }
            Operands::IntegerOrLabel => {
                self.expect_tokens(&tokens, 1, "int or label")?;
                self.encode_integer_or_label(tokens[0])
            }
            Operands::String => self.encode_string(operands),
            Operands::RegisterInteger => {
                self.expect_tokens(&tokens, 2, "register and int")?;
                self.encode_register(tokens[0])?;
                self.encode_integer(tokens[1])
            }
            Operands::RegisterIntegerOrLabel => {
                self.expect_tokens(&tokens, 2, "register and int or label")?;
                self.encode_register(tokens[0])?;
                self.encode_integer_or_label(tokens[1])
            }
            Operands::RegisterString => {
                if tokens.len() < 2 {
                    return Err(self.arity("register and string"));
                }
                self.encode_register(tokens[0])?;
                let string = operands[tokens[0].len()..].trim();
                self.encode_string(string)
            }
            Operands::TwoRegisters => {
                self.expect_tokens(&tokens, 2, "two registers")?;
                self.encode_register(tokens[0])?;
                self.encode_register(tokens[1])
            }
        }
    }

    fn arity(&self, expected: &'static str) -> SyntaxError {
        SyntaxError::Arity {
            line: self.line,
            expected: expected,
        }
    }

    fn expect_tokens(&self,
                     tokens: &[&str],
                     count: usize,
                     expected: &'static str)
                     -> Result<(), SyntaxError> {
        if tokens.len() == count {
            Ok(())
        } else {
            Err(self.arity(expected))
        }
    }

    fn parse_integer(&self, token: &str) -> Result<i64, SyntaxError> {
        token.parse::<i64>().map_err(|_| SyntaxError::InvalidInteger {
            line: self.line,
            token: token.to_string(),
        })
    }

    fn encode_byte(&mut self, token: &str) -> Result<(), SyntaxError> {
        let code = self.parse_integer(token)?;
        if code < 0 || code > 255 {
            return Err(SyntaxError::ExitCodeOutOfRange { line: self.line });
        }
        self.program.push(code as u8);
        Ok(())
    }

    fn encode_integer(&mut self, token: &str) -> Result<(), SyntaxError> {
        let value = self.parse_integer(token)?;
        let slot = varint::encode(value).ok_or(SyntaxError::IntegerOutOfRange {
            line: self.line,
            value: value,
        })?;
        self.program.extend_from_slice(&slot);
        Ok(())
    }

    fn encode_integer_or_label(&mut self, token: &str) -> Result<(), SyntaxError> {
        if !token.starts_with(LABEL_PREFIX) {
            return self.encode_integer(token);
        }

        let label = &token[LABEL_PREFIX.len_utf8()..];
        if label.is_empty() {
            return Err(SyntaxError::EmptyLabel { line: self.line });
        }

        self.patches.push(Patch {
            offset: self.offset(),
            label: label.to_string(),
            line: self.line,
        });
        self.program.extend_from_slice(&[0; INTEGER_SIZE]);
        Ok(())
    }

    fn encode_register(&mut self, token: &str) -> Result<(), SyntaxError> {
        if !token.starts_with(REGISTER_PREFIX) {
            return Err(SyntaxError::ExpectedRegister { line: self.line });
        }

        let id = registers::index(&token[REGISTER_PREFIX.len_utf8()..])
            .ok_or(SyntaxError::UnknownRegister {
                line: self.line,
                name: token.to_string(),
            })?;
        self.program.push(id);
        Ok(())
    }

    fn encode_string(&mut self, literal: &str) -> Result<(), SyntaxError> {
        let bytes = literal.as_bytes();
        let quoted = bytes.len() >= 2 && is_quote(bytes[0]) && bytes[0] == bytes[bytes.len() - 1];
        if !quoted {
            return Err(SyntaxError::MalformedString { line: self.line });
        }

        let contents = &bytes[1..bytes.len() - 1];
        if contents.len() > MAX_STRING_LENGTH {
            return Err(SyntaxError::StringTooLong { line: self.line });
        }

        let mut prefix = [0; STRING_LENGTH_SIZE];
        Endian::write_u16(&mut prefix, contents.len() as u16);
        self.program.extend_from_slice(&prefix);
        self.program.extend_from_slice(contents);
        Ok(())
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler::new()
    }
}

fn is_quote(byte: u8) -> bool {
    byte == b'"' || byte == b'\''
}

/// Cuts the line at the first `;` that is not inside a quoted string.
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, COMMENT_CHAR) => return &line[..i],
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(open), c) if c == open && closes_literal(&line[i + c.len_utf8()..]) => {
                quote = None
            }
            _ => (),
        }
    }
    line
}

/// Quotes are taken verbatim unless only a comment follows them.
fn closes_literal(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with(COMMENT_CHAR)
}

/// A `:` before the first space makes the text in front of it a label.
fn split_label(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(LABEL_SUFFIX)?;
    match line.find(char::is_whitespace) {
        Some(space) if space < colon => None,
        _ => Some((&line[..colon], &line[colon + LABEL_SUFFIX.len_utf8()..])),
    }
}
