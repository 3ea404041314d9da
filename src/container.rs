//! Precompiled images: the magic header followed by the raw program.
//! Anything without the header is assembler source.

use crate::asm::{self, SyntaxError};
use crate::common::*;
use crate::utils::data_to_hex;
use std::io::{self, Write};
use std::str::{self, Utf8Error};
use thiserror::Error;

pub const MAGIC: [u8; 4] = [0x1f, b'E', b'B', b'C'];

#[derive(Debug, PartialEq)]
pub enum Input {
    Image(Data),
    Source(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum LoadError {
    #[error("source is not valid UTF-8: {0}")]
    Encoding(#[from] Utf8Error),
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
}

pub fn is_image(file: DataSlice) -> bool {
    file.starts_with(&MAGIC)
}

pub fn detect(file: Data) -> Result<Input, LoadError> {
    if is_image(&file) {
        debug!("precompiled image, {} bytes", file.len() - MAGIC.len());
        return Ok(Input::Image(file[MAGIC.len()..].to_vec()));
    }

    let source = str::from_utf8(&file)?;
    Ok(Input::Source(source.to_string()))
}

/// Returns the program in `file`, assembling it when it is not an image.
pub fn load(file: Data) -> Result<Data, LoadError> {
    let program = match detect(file)? {
        Input::Image(program) => program,
        Input::Source(source) => asm::assemble(&source)?,
    };
    debug!("program [{}]", data_to_hex(&program));
    Ok(program)
}

pub fn to_image(program: DataSlice) -> Data {
    let mut image = Vec::with_capacity(MAGIC.len() + program.len());
    image.extend_from_slice(&MAGIC);
    image.extend_from_slice(program);
    image
}

pub fn write_image<W: Write>(writer: &mut W, program: DataSlice) -> io::Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(program)?;
    writer.flush()
}
