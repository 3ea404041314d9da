#[macro_use]
extern crate log;

#[macro_use]
extern crate more_asserts;

#[macro_use]
pub mod utils;

pub mod asm;
pub mod common;
pub mod config;
pub mod container;
pub mod vm;
