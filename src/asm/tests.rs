use super::*;
use crate::vm::opcodes::*;
use crate::vm::registers::*;
use crate::vm::Fatal;

fn int(i: i64) -> Data {
    varint::encode(i).unwrap().to_vec()
}

fn code(parts: &[&[u8]]) -> Data {
    parts.concat()
}

fn line_of(error: SyntaxError) -> usize {
    match error {
        SyntaxError::UnknownInstruction { line, .. } |
        SyntaxError::Arity { line, .. } |
        SyntaxError::ExpectedRegister { line } |
        SyntaxError::UnknownRegister { line, .. } |
        SyntaxError::InvalidInteger { line, .. } |
        SyntaxError::IntegerOutOfRange { line, .. } |
        SyntaxError::ExitCodeOutOfRange { line } |
        SyntaxError::MalformedString { line } |
        SyntaxError::StringTooLong { line } |
        SyntaxError::EmptyLabel { line } |
        SyntaxError::DuplicateLabel { line, .. } |
        SyntaxError::UndefinedLabel { line, .. } => line,
    }
}

#[test]
fn empty_source() {
    assert_eq!(Ok(vec![]), assemble(""));
    assert_eq!(Ok(vec![]), assemble("\n\n   \n; just a comment\n   ; indented\n"));
}

#[rustfmt::skip]
#[test]
fn operand_schemas() {
    assert_eq!(Ok(vec![HALT, 0xff]), assemble("HALT 255"));
    assert_eq!(Ok(vec![HALT, 0x02]), assemble("exit 2"));

    assert_eq!(Ok(code(&[&[PUSHI], &int(-5)])), assemble("PUSHI -5"));

    assert_eq!(Ok(vec![PUSHREG, J]), assemble("PUSHREG $J"));
    assert_eq!(Ok(vec![POPREG, FP]), assemble("popreg $fp"));

    assert_eq!(Ok(vec![POP, SWAP, DUP, ADD, SUB, MUL, DIV, CONCAT, PRINT, DUMP, DUMPR, RETURN, STEP]),
               assemble("POP\nSWAP\nDUP\nADD\nSUB\nMUL\nDIV\nCONCAT\nPRINT\nDUMP\nDUMPR\nRETURN\nSTEP"));

    assert_eq!(Ok(code(&[&[SETI, A], &int(10)])), assemble("SETI $A 10"));
    assert_eq!(Ok(code(&[&[PARAM, C], &int(2)])), assemble("PARAM $C 2"));
    assert_eq!(Ok(vec![CMP, A, B]), assemble("CMP $A $B"));

    assert_eq!(Ok(vec![PUSHSTR, 0x00, 0x05, b'a', b' ', b' ', b'b', b';']),
               assemble("PUSHSTR \"a  b;\" ; trailing comment"));
    assert_eq!(Ok(vec![SETSTR, B, 0x00, 0x02, b'h', b'i']), assemble("SETSTR $B 'hi'"));
    assert_eq!(Ok(vec![PUSHSTR, 0x00, 0x00]), assemble("PUSHSTR \"\""));

    for &(mnemonic, opcode) in &[("JMP", JMP), ("JMPGZ", JMPGZ), ("JMPLZ", JMPLZ),
                                 ("JMPEQ", JMPEQ), ("JMPNEQ", JMPNEQ), ("CALL", CALL),
                                 ("JMPZGZ", JMPZGZ), ("JMPZLZ", JMPZLZ),
                                 ("JMPZEQ", JMPZEQ), ("JMPZNEQ", JMPZNEQ)] {
        let source = format!("{} 7", mnemonic);
        assert_eq!(Ok(code(&[&[opcode], &int(7)])), assemble(&source));
    }
}

#[rustfmt::skip]
#[test]
fn quotes_inside_strings() {
    assert_eq!(Ok(vec![PUSHSTR, 0x00, 0x03, b'a', b'"', b'b']), assemble("PUSHSTR \"a\"b\""));
    assert_eq!(Ok(vec![PUSHSTR, 0x00, 0x03, b'a', b'"', b'b']),
               assemble("PUSHSTR \"a\"b\" ; c"));
    assert_eq!(Ok(vec![PUSHSTR, 0x00, 0x01, b'a']), assemble("PUSHSTR \"a\" ; say \"hi\""));
    assert_eq!(Ok(vec![SETSTR, A, 0x00, 0x02, b'i', b'\'']), assemble("SETSTR $A 'i'' ;'"));
}

#[rustfmt::skip]
#[test]
fn comments_and_whitespace() {
    let source = "
        ; header

        PUSHI 1     ; one
      \tPRINT
        HALT 0";
    assert_eq!(Ok(code(&[&[PUSHI], &int(1), &[PRINT, HALT, 0x00]])), assemble(source));
}

#[rustfmt::skip]
#[test]
fn labels() {
    // forward reference
    {
        let source = "JMP %skip\nPUSHI 1\nPRINT\nskip: HALT 2";
        let program = assemble(source).unwrap();

        assert_eq!(code(&[&[JMP], &int(19), &[PUSHI], &int(1), &[PRINT, HALT, 0x02]]),
                   program);
    }

    // backward reference, label on its own line
    {
        let source = "PUSHI 3\nloop:\nPRINT\nJMPGZ %loop\nHALT 0";
        let program = assemble(source).unwrap();

        assert_eq!(code(&[&[PUSHI], &int(3), &[PRINT, JMPGZ], &int(9), &[HALT, 0x00]]),
                   program);
    }

    // the patched address does not depend on what lies in between
    {
        let source = "CALL %f\nPUSHSTR \"a long string literal\"\nSETI $A %f\nf: RETURN";
        let program = assemble(source).unwrap();
        let f = program.len() - 1;

        assert_eq!(RETURN, program[f]);
        assert_eq!(&int(f as i64)[..], &program[1..9]);
        assert_eq!(&int(f as i64)[..], &program[program.len() - 9..f]);
    }

    {
        let source = "start: end: HALT 0";
        assert_eq!(Ok(vec![HALT, 0x00]), assemble(source));
    }
}

#[test]
fn label_errors() {
    assert_eq!(Err(SyntaxError::DuplicateLabel {
                   line: 3,
                   label: "a".to_string(),
               }),
               assemble("a: PUSHI 1\nPOP\na: HALT 0"));

    assert_eq!(Err(SyntaxError::UndefinedLabel {
                   line: 2,
                   label: "nowhere".to_string(),
               }),
               assemble("PUSHI 0\nJMPEQ %nowhere\nHALT 0"));

    assert_eq!(Err(SyntaxError::EmptyLabel { line: 1 }), assemble(": HALT 0"));
    assert_eq!(Err(SyntaxError::EmptyLabel { line: 1 }), assemble("JMP %"));

    // labels are not accepted where only integers are
    assert_eq!(Err(SyntaxError::InvalidInteger {
                   line: 1,
                   token: "%x".to_string(),
               }),
               assemble("x: PUSHI %x"));
}

#[rustfmt::skip]
#[test]
fn syntax_errors() {
    assert_eq!(Err(SyntaxError::UnknownInstruction { line: 2, mnemonic: "NOP".to_string() }),
               assemble("PUSHI 1\nNOP"));

    assert_eq!(Err(SyntaxError::Arity { line: 1, expected: "int" }), assemble("PUSHI"));
    assert_eq!(Err(SyntaxError::Arity { line: 1, expected: "int" }), assemble("HALT 1 2"));
    assert_eq!(Err(SyntaxError::Arity { line: 1, expected: "no operands" }), assemble("ADD 1"));
    assert_eq!(Err(SyntaxError::Arity { line: 1, expected: "two registers" }),
               assemble("CMP $A"));
    assert_eq!(Err(SyntaxError::Arity { line: 1, expected: "register and string" }),
               assemble("SETSTR $A"));

    assert_eq!(Err(SyntaxError::ExpectedRegister { line: 1 }), assemble("PUSHREG A"));
    assert_eq!(Err(SyntaxError::UnknownRegister { line: 1, name: "$K".to_string() }),
               assemble("PRINTR $K"));

    assert_eq!(Err(SyntaxError::InvalidInteger { line: 1, token: "ten".to_string() }),
               assemble("PUSHI ten"));
    assert_eq!(Err(SyntaxError::ExitCodeOutOfRange { line: 1 }), assemble("HALT 256"));
    assert_eq!(Err(SyntaxError::ExitCodeOutOfRange { line: 1 }), assemble("HALT -1"));
    assert_eq!(Err(SyntaxError::IntegerOutOfRange { line: 1, value: varint::MAX + 1 }),
               assemble(&format!("PUSHI {}", varint::MAX + 1)));

    assert_eq!(Err(SyntaxError::MalformedString { line: 1 }), assemble("PUSHSTR abc"));
    assert_eq!(Err(SyntaxError::MalformedString { line: 1 }), assemble("PUSHSTR \"abc'"));
    assert_eq!(Err(SyntaxError::MalformedString { line: 1 }), assemble("PUSHSTR \""));
    assert_eq!(Err(SyntaxError::MalformedString { line: 1 }), assemble("PUSHSTR"));
}

#[test]
fn string_limit() {
    let longest = "x".repeat(MAX_STRING_LENGTH);
    let program = assemble(&format!("PUSHSTR \"{}\"", longest)).unwrap();
    assert_eq!(&[PUSHSTR, 0x7f, 0xff], &program[..3]);
    assert_eq!(3 + MAX_STRING_LENGTH, program.len());

    let too_long = "x".repeat(MAX_STRING_LENGTH + 1);
    assert_eq!(Err(SyntaxError::StringTooLong { line: 1 }),
               assemble(&format!("PUSHSTR \"{}\"", too_long)));
}

#[test]
fn error_lines() {
    let source = "PUSHI 1\n\n; comment\nPUSHI 2\nPUSHREG $Z";
    assert_eq!(5, line_of(assemble(source).unwrap_err()));

    let source = "HALT 0\nJMP %late\n\n\n";
    assert_eq!(2, line_of(assemble(source).unwrap_err()));
}

#[test]
fn idempotent() {
    let source = "start: SETSTR $A \"x\"\nCALL %f\nHALT 0\nf: PARAM $B 1\nRETURN";
    assert_eq!(assemble(source), assemble(source));
}

#[test]
fn incremental() {
    let mut assembler = Assembler::new();
    assembler.feed_line("JMP %end").unwrap();
    assert_eq!(9, assembler.offset());
    assembler.feed_line("end: HALT 0").unwrap();
    assert_eq!(11, assembler.offset());

    assert_eq!(Ok(code(&[&[JMP], &int(9), &[HALT, 0x00]])), assembler.finish());
}

#[test]
fn disassembly() {
    let source = "SETSTR $A \"hi\"\nloop: CMP $A $PC\nJMPZNEQ %loop\nPARAM $J -1\nHALT 4";
    let program = assemble(source).unwrap();

    let lines = disassemble(&program).unwrap();
    assert_eq!(vec!["0000: SETSTR $A \"hi\"".to_string(),
                    "0006: CMP $A $PC".to_string(),
                    "0009: JMPZNEQ 6".to_string(),
                    "0018: PARAM $J -1".to_string(),
                    "0028: HALT 4".to_string()],
               lines);

    assert_eq!(Err(Fatal::UnknownOpcode {
                   opcode: 0xee,
                   offset: 0,
               }),
               disassemble(&[0xee]));
    assert_eq!(Err(Fatal::UnexpectedEnd(5)), disassemble(&[PUSHI, 0, 0, 0, 0]));
}
