use crate::asm;
use crate::common::*;
use crate::vm::{Fatal, VM};

macro_rules! to_hex {
   ($data:expr, Word) => {
       format!("0x{:04x}", $data)
   };
   ($data:expr) => {
       format!("0x{:02x}", $data)
   };
}

pub fn data_to_hex(data: DataSlice) -> String {
    data.iter()
        .map(|i| to_hex!(i))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Runs a program against an in-memory output and hands back what it printed.
pub fn test_run(program: Data) -> (String, Result<u8, Fatal>, VM<Data>) {
    let _ = env_logger::builder().is_test(true).try_init();

    let output: Data = vec![];
    let mut vm = VM::new(output, program);
    let result = vm.run();

    let output = String::from_utf8_lossy(vm.get_output_ref()).into_owned();

    (output, result, vm)
}

/// Assembles `source` and runs it. Panics on syntax errors.
pub fn test_run_source(source: &str) -> (String, Result<u8, Fatal>, VM<Data>) {
    match asm::assemble(source) {
        Ok(program) => test_run(program),
        Err(e) => panic!("failed to assemble test source: {}", e),
    }
}
