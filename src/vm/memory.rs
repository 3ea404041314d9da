use crate::common::*;
use crate::vm::value::Value;

/// Read-only program bytes plus the pre-allocated operand stack.
pub struct Memory {
    code: Data,
    stack: Vec<Value>,
}

impl Memory {
    pub fn from_program(program: Data, stack_size: usize) -> Memory {
        Memory {
            code: program,
            stack: vec![Value::default(); stack_size],
        }
    }

    pub fn is_in_code(&self, index: i64) -> bool {
        index >= 0 && (index as u64) < self.code.len() as u64
    }

    pub fn get(&self, index: i64) -> Option<u8> {
        if self.is_in_code(index) {
            Some(self.code[index as usize])
        } else {
            None
        }
    }

    pub fn stack_capacity(&self) -> usize {
        self.stack.len()
    }

    /// Live slots, bottom first.
    pub fn stack(&self, sp: usize) -> &[Value] {
        assert_le!(sp, self.stack.len());
        &self.stack[..sp]
    }

    pub fn slot(&self, index: usize) -> &Value {
        &self.stack[index]
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.stack.swap(a, b);
    }

    pub fn put(&mut self, index: usize, value: Value) {
        debug!("put slot={} value={}", index, value);
        self.stack[index] = value;
    }

    /// Moves the value out, leaving the zero integer behind.
    pub fn take(&mut self, index: usize) -> Value {
        std::mem::replace(&mut self.stack[index], Value::default())
    }
}
