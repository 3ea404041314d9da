use thiserror::Error;

/// Runtime errors a well-formed program can run into. The engine records
/// the fault, stops before the next fetch and exits with code 1.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Fault {
    #[error("{opcode} only works on {expected}")]
    TypeMismatch {
        opcode: &'static str,
        expected: &'static str,
    },
    #[error("{opcode} division by zero")]
    DivisionByZero { opcode: &'static str },
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow in {opcode}")]
    StackUnderflow { opcode: &'static str },
    #[error("stack pointer {0} out of range")]
    StackPointerOutOfRange(i64),
    #[error("jump target {0} out of range")]
    JumpOutOfRange(i64),
    #[error("PARAM slot {0} outside the stack")]
    ParamOutOfRange(i64),
    #[error("register {0} only holds integers")]
    SpecialRegister(&'static str),
    #[error("output failed: {0}")]
    Output(String),
    #[error("terminated")]
    Terminated,
}

/// Malformed programs. These cannot become an exit code.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Fatal {
    #[error("unexpected end of program at offset {0}")]
    UnexpectedEnd(i64),
    #[error("unknown opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: i64 },
    #[error("unknown register 0x{register:02x} at offset {offset}")]
    UnknownRegister { register: u8, offset: i64 },
    #[error("malformed integer operand at offset {0}")]
    MalformedInteger(i64),
    #[error("string length {length} exceeds limit at offset {offset}")]
    MalformedString { length: usize, offset: i64 },
}

pub(crate) enum Trap {
    Fault(Fault),
    Fatal(Fatal),
}

impl From<Fault> for Trap {
    fn from(fault: Fault) -> Self {
        Trap::Fault(fault)
    }
}

impl From<Fatal> for Trap {
    fn from(fatal: Fatal) -> Self {
        Trap::Fatal(fatal)
    }
}
