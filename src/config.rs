use crate::common::STACK_SIZE;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Number of value slots in the operand stack.
    pub stack_size: usize,

    /// Log every executed instruction. `STEP` toggles it at runtime.
    pub trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stack_size: STACK_SIZE,
            trace: false,
        }
    }
}
