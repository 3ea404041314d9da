use crate::common::*;
use crate::config::Config;
use byteorder::ByteOrder;
use std::cmp::Ordering;
use std::fmt;
use std::io::Write;
use std::num::Wrapping;
use std::sync::atomic::{self, AtomicBool};
use std::sync::Arc;

pub mod errors;
pub mod memory;
pub mod opcodes;
pub mod registers;
pub mod value;


use self::errors::Trap;
pub use self::errors::{Fatal, Fault};
use self::memory::*;
use self::opcodes::*;
use self::registers::*;
pub use self::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted(u8),
    Faulted,
}

pub struct VM<W: Write> {
    output: W,

    registers: Registers,
    memory: Memory,

    zero_flag: Ordering,
    fault: Option<Fault>,
    exit_code: Option<u8>,

    config: Config,
    termination_scheduled: Option<Arc<AtomicBool>>,
}

impl<W: Write> VM<W> {
    pub fn new(output: W, program: Data) -> Self {
        VM::with_config(output, program, Config::default())
    }

    pub fn with_config(output: W, program: Data, config: Config) -> Self {
        let memory = Memory::from_program(program, config.stack_size);

        VM {
            output: output,
            registers: Registers::new(),
            memory: memory,
            zero_flag: Ordering::Equal,
            fault: None,
            exit_code: None,
            config: config,
            termination_scheduled: None,
        }
    }

    /// The flag is polled before every fetch.
    pub fn set_termination_flag(&mut self, flag: Arc<AtomicBool>) {
        self.termination_scheduled = Some(flag);
    }

    /// Runs until `HALT` or a fault. A fault is reported on the output
    /// and turns into exit code 1.
    pub fn run(&mut self) -> Result<u8, Fatal> {
        loop {
            match self.step()? {
                Status::Running => (),
                Status::Halted(code) => {
                    info!("halted with exit code {}", code);
                    let _ = self.output.flush();
                    return Ok(code);
                }
                Status::Faulted => {
                    let message = self.fault.as_ref().map(|f| f.to_string()).unwrap_or_default();
                    let _ = writeln!(self.output, "Error: {}", message);
                    let _ = self.output.flush();
                    return Ok(1);
                }
            }
        }
    }

    /// One fetch-decode-execute cycle.
    pub fn step(&mut self) -> Result<Status, Fatal> {
        if let Some(code) = self.exit_code {
            return Ok(Status::Halted(code));
        }

        if self.fault.is_some() {
            return Ok(Status::Faulted);
        }

        if self.termination_requested() {
            info!("Terminating...");
            self.fault = Some(Fault::Terminated);
            return Ok(Status::Faulted);
        }

        match self.cycle() {
            Ok(Some(code)) => {
                self.exit_code = Some(code);
                Ok(Status::Halted(code))
            }
            Ok(None) => Ok(Status::Running),
            Err(Trap::Fault(fault)) => {
                error!("{} {:?}", fault, self);
                self.fault = Some(fault);
                Ok(Status::Running)
            }
            Err(Trap::Fatal(fatal)) => {
                error!("{} {:?}", fatal, self);
                Err(fatal)
            }
        }
    }

    pub fn stack(&self) -> &[Value] {
        self.memory.stack(self.sp())
    }

    pub fn register(&self, id: u8) -> Value {
        self.registers.get(id)
    }

    pub fn zero_flag(&self) -> Ordering {
        self.zero_flag
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn get_output_ref(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn cycle(&mut self) -> Result<Option<u8>, Trap> {
        let offset = self.registers.get_special(PC);
        let opcode = self.fetch()?;

        if self.config.trace {
            info!("{} {} {:?}", to_hex!(offset, Word), opcode.mnemonic(), self);
        }

        self.execute(opcode)
    }

    fn fetch(&mut self) -> Result<Opcode, Fatal> {
        let offset = self.registers.get_special(PC);
        let byte = self.next_code_byte()?;
        let opcode = Opcode::from_byte(byte).ok_or(Fatal::UnknownOpcode {
            opcode: byte,
            offset: offset,
        })?;
        debug!("fetch {} {:?}", opcode.mnemonic(), self);
        Ok(opcode)
    }

    fn execute(&mut self, opcode: Opcode) -> Result<Option<u8>, Trap> {
        match opcode {
            Opcode::Halt => return Ok(Some(self.next_code_byte()?)),

            Opcode::PushI => {
                let i = self.next_integer()?;
                self.stack_push(Value::Integer(i))?;
            }
            Opcode::PushStr => {
                let bytes = self.next_string()?;
                self.stack_push(Value::Bytes(bytes))?;
            }
            Opcode::PushReg => {
                let id = self.next_register()?;
                let value = self.registers.get(id);
                self.stack_push(value)?;
            }
            Opcode::Pop => {
                self.stack_pop(opcode)?;
            }
            Opcode::PopReg => {
                let id = self.next_register()?;
                let value = self.stack_pop(opcode)?;
                self.set_register(id, value)?;
            }
            Opcode::Store => {
                let id = self.next_register()?;
                let value = self.stack_top(opcode)?.clone();
                self.set_register(id, value)?;
            }
            Opcode::Swap => {
                let sp = self.sp();
                if sp < 2 {
                    return Err(self.underflow(opcode).into());
                }
                self.memory.swap(sp - 1, sp - 2);
            }
            Opcode::Dup => {
                let value = self.stack_top(opcode)?.clone();
                self.stack_push(value)?;
            }

            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => self.arithmetic(opcode)?,

            Opcode::SetI => {
                let id = self.next_register()?;
                let i = self.next_integer()?;
                self.set_register(id, Value::Integer(i))?;
            }
            Opcode::SetStr => {
                let id = self.next_register()?;
                let bytes = self.next_string()?;
                self.set_register(id, Value::Bytes(bytes))?;
            }

            Opcode::Jump => {
                let target = self.next_integer()?;
                self.jump(target)?;
            }
            Opcode::JumpGtz | Opcode::JumpLtz | Opcode::JumpEq | Opcode::JumpNeq => {
                let target = self.next_integer()?;
                let top = match *self.stack_top(opcode)? {
                    Value::Integer(i) => i,
                    Value::Bytes(_) => return Err(type_mismatch(opcode, "integers").into()),
                };
                let taken = match opcode {
                    Opcode::JumpGtz => top > 0,
                    Opcode::JumpLtz => top < 0,
                    Opcode::JumpEq => top == 0,
                    _ => top != 0,
                };
                if taken {
                    self.jump(target)?;
                }
            }
            Opcode::JumpReg => {
                let id = self.next_register()?;
                match self.registers.get(id) {
                    Value::Integer(target) => self.jump(target)?,
                    Value::Bytes(_) => return Err(type_mismatch(opcode, "integers").into()),
                }
            }

            Opcode::Print => {
                let value = self.stack_top(opcode)?.clone();
                self.write_line(&value)?;
            }
            Opcode::PrintR => {
                let id = self.next_register()?;
                let value = self.registers.get(id);
                self.write_line(&value)?;
            }
            Opcode::Dump => {
                let dump = render_stack(self.stack());
                self.write_line(&dump)?;
            }
            Opcode::DumpR => {
                let dump = render_registers(&self.registers);
                self.write_line(&dump)?;
            }

            Opcode::Return => {
                let target = self.registers.get_special(RT);
                self.jump(target)?;
            }
            Opcode::Call => {
                let target = self.next_integer()?;
                self.check_target(target)?;
                let return_address = self.registers.get_special(PC);
                let sp = self.registers.get_special(SP);
                self.registers.set_special(RT, return_address);
                self.registers.set_special(FP, sp);
                self.registers.set_special(PC, target);
            }

            Opcode::Concat => {
                let right = self.stack_pop(opcode)?;
                let left = self.stack_pop(opcode)?;
                match (left, right) {
                    (Value::Bytes(mut left), Value::Bytes(right)) => {
                        left.extend_from_slice(&right);
                        self.stack_push(Value::Bytes(left))?;
                    }
                    _ => return Err(type_mismatch(opcode, "strings").into()),
                }
            }
            Opcode::Param => {
                let id = self.next_register()?;
                let offset = self.next_integer()?;
                let index = self.registers.get_special(FP).wrapping_sub(offset);
                if index < 0 || index as u64 >= self.sp() as u64 {
                    return Err(Fault::ParamOutOfRange(index).into());
                }
                let value = self.memory.slot(index as usize).clone();
                self.set_register(id, value)?;
            }

            Opcode::Compare => {
                let left = self.next_register()?;
                let right = self.next_register()?;
                match (self.registers.get(left), self.registers.get(right)) {
                    (Value::Integer(left), Value::Integer(right)) => {
                        self.zero_flag = left.cmp(&right);
                    }
                    _ => return Err(type_mismatch(opcode, "integers").into()),
                }
            }
            Opcode::JumpZGtz | Opcode::JumpZLtz | Opcode::JumpZEq | Opcode::JumpZNeq => {
                let target = self.next_integer()?;
                let taken = match opcode {
                    Opcode::JumpZGtz => self.zero_flag == Ordering::Greater,
                    Opcode::JumpZLtz => self.zero_flag == Ordering::Less,
                    Opcode::JumpZEq => self.zero_flag == Ordering::Equal,
                    _ => self.zero_flag != Ordering::Equal,
                };
                if taken {
                    self.jump(target)?;
                }
            }

            Opcode::Step => {
                self.config.trace = !self.config.trace;
                info!("tracing {}", if self.config.trace { "on" } else { "off" });
            }
        }

        Ok(None)
    }

    fn arithmetic(&mut self, opcode: Opcode) -> Result<(), Fault> {
        let right = self.stack_pop(opcode)?;
        let left = self.stack_pop(opcode)?;

        let (left, right) = match (left, right) {
            (Value::Integer(left), Value::Integer(right)) => (Wrapping(left), Wrapping(right)),
            _ => return Err(type_mismatch(opcode, "integers")),
        };

        let result = match opcode {
            Opcode::Add => left + right,
            Opcode::Sub => left - right,
            Opcode::Mul => left * right,
            _ => {
                if right.0 == 0 {
                    return Err(Fault::DivisionByZero {
                        opcode: opcode.mnemonic(),
                    });
                }
                left / right
            }
        };

        self.stack_push(Value::Integer(result.0))
    }

    fn termination_requested(&self) -> bool {
        self.termination_scheduled
            .as_ref()
            .map_or(false, |flag| flag.load(atomic::Ordering::Relaxed))
    }

    fn next_code_byte(&mut self) -> Result<u8, Fatal> {
        let pc = self.registers.get_special(PC);
        let value = self.memory.get(pc).ok_or(Fatal::UnexpectedEnd(pc))?;
        self.registers.increment(PC);
        Ok(value)
    }

    fn next_register(&mut self) -> Result<u8, Fatal> {
        let offset = self.registers.get_special(PC);
        let id = self.next_code_byte()?;
        if id as usize >= REGISTERS {
            return Err(Fatal::UnknownRegister {
                register: id,
                offset: offset,
            });
        }
        Ok(id)
    }

    fn next_integer(&mut self) -> Result<i64, Fatal> {
        let offset = self.registers.get_special(PC);
        let mut slot = [0; INTEGER_SIZE];
        for byte in slot.iter_mut() {
            *byte = self.next_code_byte()?;
        }
        varint::decode(&slot).ok_or(Fatal::MalformedInteger(offset))
    }

    fn next_string(&mut self) -> Result<Data, Fatal> {
        let offset = self.registers.get_special(PC);
        let mut prefix = [0; STRING_LENGTH_SIZE];
        for byte in prefix.iter_mut() {
            *byte = self.next_code_byte()?;
        }

        let length = Endian::read_u16(&prefix) as usize;
        if length > MAX_STRING_LENGTH {
            return Err(Fatal::MalformedString {
                length: length,
                offset: offset,
            });
        }

        let mut bytes = Vec::with_capacity(length);
        for _ in 0..length {
            bytes.push(self.next_code_byte()?);
        }
        Ok(bytes)
    }

    fn set_register(&mut self, id: u8, value: Value) -> Result<(), Fault> {
        match (id, &value) {
            (PC, &Value::Integer(target)) => return self.jump(target),
            (SP, &Value::Integer(sp)) => {
                if sp < 0 || sp as u64 > self.memory.stack_capacity() as u64 {
                    return Err(Fault::StackPointerOutOfRange(sp));
                }
            }
            _ => (),
        }

        self.registers
            .set(id, value)
            .map_err(|_| Fault::SpecialRegister(registers::name(id).unwrap_or("?")))
    }

    fn check_target(&self, target: i64) -> Result<(), Fault> {
        if self.memory.is_in_code(target) {
            Ok(())
        } else {
            Err(Fault::JumpOutOfRange(target))
        }
    }

    fn jump(&mut self, target: i64) -> Result<(), Fault> {
        self.check_target(target)?;
        self.registers.set_special(PC, target);
        Ok(())
    }

    fn write_line<T: fmt::Display>(&mut self, value: &T) -> Result<(), Fault> {
        writeln!(self.output, "{}", value).map_err(|e| Fault::Output(e.to_string()))
    }

    // Kept within [0, capacity] by set_register and the push/pop helpers.
    fn sp(&self) -> usize {
        self.registers.get_special(SP) as usize
    }

    fn underflow(&self, opcode: Opcode) -> Fault {
        Fault::StackUnderflow {
            opcode: opcode.mnemonic(),
        }
    }

    fn stack_top(&self, opcode: Opcode) -> Result<&Value, Fault> {
        let sp = self.sp();
        if sp == 0 {
            return Err(self.underflow(opcode));
        }
        Ok(self.memory.slot(sp - 1))
    }

    fn stack_pop(&mut self, opcode: Opcode) -> Result<Value, Fault> {
        let sp = self.sp();
        if sp == 0 {
            return Err(self.underflow(opcode));
        }
        self.registers.decrement(SP);
        Ok(self.memory.take(sp - 1))
    }

    fn stack_push(&mut self, value: Value) -> Result<(), Fault> {
        let sp = self.sp();
        if sp >= self.memory.stack_capacity() {
            return Err(Fault::StackOverflow);
        }
        self.memory.put(sp, value);
        self.registers.increment(SP);
        Ok(())
    }
}

fn type_mismatch(opcode: Opcode, expected: &'static str) -> Fault {
    Fault::TypeMismatch {
        opcode: opcode.mnemonic(),
        expected: expected,
    }
}

/// `[top, ..., bottom]`
pub fn render_stack(stack: &[Value]) -> String {
    let values = stack
        .iter()
        .rev()
        .map(|value| value.to_string())
        .collect::<Vec<String>>()
        .join(", ");
    format!("[{}]", values)
}

pub fn render_registers(registers: &Registers) -> String {
    (0..REGISTERS as u8)
        .map(|id| format!("{}={}", registers::name(id).unwrap_or("?"), registers.get(id)))
        .collect::<Vec<String>>()
        .join(" ")
}

impl<W: Write> fmt::Debug for VM<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "PC={} SP={} FP={} RT={} flag={:?} stack={}",
               to_hex!(self.registers.get_special(PC), Word),
               self.registers.get_special(SP),
               to_hex!(self.registers.get_special(FP), Word),
               to_hex!(self.registers.get_special(RT), Word),
               self.zero_flag,
               render_stack(self.stack()))
    }
}
