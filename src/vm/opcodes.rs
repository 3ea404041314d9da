/// What follows an opcode byte in the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operands {
    None,
    Byte,
    Register,
    Integer,
    IntegerOrLabel,
    String,
    RegisterInteger,
    RegisterIntegerOrLabel,
    RegisterString,
    TwoRegisters,
}

macro_rules! opcodes {
    ($($byte:ident = $value:expr => $variant:ident, $mnemonic:literal, $operands:ident;)*) => {
        $(pub const $byte: u8 = $value;)*

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            pub fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $($byte => Some(Opcode::$variant),)*
                    _ => None,
                }
            }

            pub fn byte(self) -> u8 {
                match self {
                    $(Opcode::$variant => $byte,)*
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $mnemonic,)*
                }
            }

            pub fn operands(self) -> Operands {
                match self {
                    $(Opcode::$variant => Operands::$operands,)*
                }
            }

            fn from_canonical_mnemonic(mnemonic: &str) -> Option<Opcode> {
                match mnemonic {
                    $($mnemonic => Some(Opcode::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    HALT     = 0x00 => Halt,     "HALT",    Byte;
    PUSHI    = 0x01 => PushI,    "PUSHI",   Integer;
    PUSHSTR  = 0x02 => PushStr,  "PUSHSTR", String;
    PUSHREG  = 0x03 => PushReg,  "PUSHREG", Register;
    POP      = 0x04 => Pop,      "POP",     None;
    POPREG   = 0x05 => PopReg,   "POPREG",  Register;
    STORE    = 0x06 => Store,    "STORE",   Register;      // top of stack -> register
    SWAP     = 0x07 => Swap,     "SWAP",    None;
    DUP      = 0x08 => Dup,      "DUP",     None;

    ADD      = 0x09 => Add,      "ADD",     None;
    SUB      = 0x0a => Sub,      "SUB",     None;
    MUL      = 0x0b => Mul,      "MUL",     None;
    DIV      = 0x0c => Div,      "DIV",     None;

    SETI     = 0x0d => SetI,     "SETI",    RegisterIntegerOrLabel;
    SETSTR   = 0x0e => SetStr,   "SETSTR",  RegisterString;

    JMP      = 0x0f => Jump,     "JMP",     IntegerOrLabel;
    JMPGZ    = 0x10 => JumpGtz,  "JMPGZ",   IntegerOrLabel;  // > 0
    JMPLZ    = 0x11 => JumpLtz,  "JMPLZ",   IntegerOrLabel;  // < 0
    JMPEQ    = 0x12 => JumpEq,   "JMPEQ",   IntegerOrLabel;  // == 0
    JMPNEQ   = 0x13 => JumpNeq,  "JMPNEQ",  IntegerOrLabel;  // != 0
    JMPREG   = 0x14 => JumpReg,  "JMPREG",  Register;

    PRINT    = 0x15 => Print,    "PRINT",   None;
    PRINTR   = 0x16 => PrintR,   "PRINTR",  Register;
    DUMP     = 0x17 => Dump,     "DUMP",    None;
    DUMPR    = 0x18 => DumpR,    "DUMPR",   None;

    RETURN   = 0x19 => Return,   "RETURN",  None;
    CALL     = 0x1a => Call,     "CALL",    IntegerOrLabel;

    CONCAT   = 0x1b => Concat,   "CONCAT",  None;
    PARAM    = 0x1c => Param,    "PARAM",   RegisterInteger;

    CMP      = 0x1d => Compare,  "CMP",     TwoRegisters;
    JMPZGZ   = 0x1e => JumpZGtz, "JMPZGZ",  IntegerOrLabel;
    JMPZLZ   = 0x1f => JumpZLtz, "JMPZLZ",  IntegerOrLabel;
    JMPZEQ   = 0x20 => JumpZEq,  "JMPZEQ",  IntegerOrLabel;
    JMPZNEQ  = 0x21 => JumpZNeq, "JMPZNEQ", IntegerOrLabel;

    STEP     = 0x22 => Step,     "STEP",    None;
}

impl Opcode {
    /// Case-insensitive mnemonic lookup. `EXIT` is accepted for `HALT`.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        let mnemonic = mnemonic.to_ascii_uppercase();
        match mnemonic.as_str() {
            "EXIT" => Some(Opcode::Halt),
            other => Opcode::from_canonical_mnemonic(other),
        }
    }
}
