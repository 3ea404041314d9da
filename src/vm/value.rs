use crate::common::Data;
use std::fmt;

/// A stack slot or register content. Reads always clone, so no two
/// locations share a byte buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Bytes(Data),
}

impl Default for Value {
    fn default() -> Self {
        Value::Integer(0)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Bytes(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!("-42", Value::Integer(-42).to_string());
        assert_eq!("\"abcd\"", Value::from("abcd").to_string());
        assert_eq!("\"say \\\"hi\\\"\"", Value::from("say \"hi\"").to_string());
        assert_eq!("\"\"", Value::Bytes(vec![]).to_string());
    }
}
