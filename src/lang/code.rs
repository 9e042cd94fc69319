use crate::lang::hashing::Hash;
use std::{
    fmt::{self, Display, Formatter},
    ops::Index,
};

/// One executable step inside a word body.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum WordNode {
    /// Resolve the hash through the dictionary and call it.
    Call(Hash),

    /// Push a literal value onto the data stack.
    PushInt(i64),

    /// Write the held bytes to the output as soon as the node runs.
    PrintLiteral(Vec<u8>),

    /// Push the address and the length of a string registered in the dictionary.
    PushString(Hash),
}

impl Display for WordNode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            WordNode::Call(hash) => write!(f, "Call        {}", hash),
            WordNode::PushInt(value) => write!(f, "PushInt     {}", value),
            WordNode::PrintLiteral(text) => {
                write!(f, "PrintLiteral {:?}", String::from_utf8_lossy(text))
            }
            WordNode::PushString(hash) => write!(f, "PushString  {}", hash),
        }
    }
}

/// The compiled form of a user defined word.  Once built the body is never changed; redefining the
/// word replaces the whole body.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct WordBody {
    nodes: Vec<WordNode>,
}

impl WordBody {
    pub fn new(nodes: Vec<WordNode>) -> WordBody {
        WordBody { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[WordNode] {
        &self.nodes
    }

    /// Is the node at the given index a call to the given word?
    pub fn is_call_to(&self, index: usize, hash: Hash) -> bool {
        matches!(self.nodes.get(index), Some(WordNode::Call(found)) if *found == hash)
    }
}

impl Index<usize> for WordBody {
    type Output = WordNode;

    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index]
    }
}

/// Pretty print the body for debugging purposes.
impl Display for WordBody {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (index, node) in self.nodes.iter().enumerate() {
            writeln!(f, "{:4}: {}", index, node)?;
        }

        Ok(())
    }
}

/// Largest radix accepted for `base`.  Digits beyond 9 are the letters a to z.
pub const MAX_BASE: u32 = 36;

fn digit_value(byte: u8) -> Option<u32> {
    match byte {
        b'0'..=b'9' => Some((byte - b'0') as u32),
        b'a'..=b'z' => Some((byte - b'a') as u32 + 10),
        b'A'..=b'Z' => Some((byte - b'A') as u32 + 10),
        _ => None,
    }
}

/// Try to read a token as an integer literal.
///
/// Accepted forms are an optional `-` sign followed by digits in the current base, the `#`, `$`
/// and `%` prefixes forcing decimal, hexadecimal or binary, and `'c'` for a character code.
/// Magnitudes up to `u64::MAX` are accepted and reinterpreted as a cell, so an unsigned literal
/// and its signed counterpart compile to the same bits.
pub fn parse_number(token: &[u8], base: u32) -> Option<i64> {
    if let [b'\'', character, b'\''] = token {
        return Some(*character as i64);
    }

    let (base, rest) = match token.first() {
        Some(b'#') => (10, &token[1..]),
        Some(b'$') => (16, &token[1..]),
        Some(b'%') => (2, &token[1..]),
        _ => (base, token),
    };

    let (negative, digits) = match rest.first() {
        Some(b'-') => (true, &rest[1..]),
        _ => (false, rest),
    };

    if digits.is_empty() || !(2..=MAX_BASE).contains(&base) {
        return None;
    }

    let mut magnitude: u64 = 0;

    for &byte in digits {
        let digit = digit_value(byte).filter(|digit| *digit < base)?;

        magnitude = magnitude
            .checked_mul(base as u64)?
            .checked_add(digit as u64)?;
    }

    let value = magnitude as i64;

    Some(if negative { value.wrapping_neg() } else { value })
}

/// Render a signed value in the given base.  Letters are lower case.
pub fn format_number(value: i64, base: u32) -> String {
    let mut text = format_unsigned(value.unsigned_abs(), base);

    if value < 0 {
        text.insert(0, '-');
    }

    text
}

/// Render the bits of a cell as an unsigned value in the given base.
pub fn format_unsigned(mut value: u64, base: u32) -> String {
    let base = base.clamp(2, MAX_BASE) as u64;
    let mut digits = Vec::new();

    loop {
        let digit = (value % base) as u32;
        digits.push(std::char::from_digit(digit, base as u32).unwrap_or('?'));
        value /= base;

        if value == 0 {
            break;
        }
    }

    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_changes_the_value_of_a_token() {
        assert_eq!(parse_number(b"10", 10), Some(10));
        assert_eq!(parse_number(b"10", 16), Some(16));
        assert_eq!(parse_number(b"10", 2), Some(2));
        assert_eq!(parse_number(b"ff", 16), Some(255));
        assert_eq!(parse_number(b"FF", 16), Some(255));
    }

    #[test]
    fn digits_outside_the_base_are_not_numbers() {
        assert_eq!(parse_number(b"ff", 10), None);
        assert_eq!(parse_number(b"12", 2), None);
        assert_eq!(parse_number(b"1+", 10), None);
        assert_eq!(parse_number(b"-", 10), None);
        assert_eq!(parse_number(b"", 10), None);
    }

    #[test]
    fn prefixes_and_signs() {
        assert_eq!(parse_number(b"-42", 10), Some(-42));
        assert_eq!(parse_number(b"$ff", 10), Some(255));
        assert_eq!(parse_number(b"#99", 16), Some(99));
        assert_eq!(parse_number(b"%101", 10), Some(5));
        assert_eq!(parse_number(b"$-10", 10), Some(-16));
        assert_eq!(parse_number(b"'A'", 10), Some(65));
    }

    #[test]
    fn unsigned_literals_wrap_into_cells() {
        assert_eq!(parse_number(b"18446744073709551615", 10), Some(-1));
        assert_eq!(parse_number(b"18446744073709551616", 10), None);
    }

    #[test]
    fn formatting_matches_parsing() {
        for base in [2, 8, 10, 16, 36] {
            for value in [0, 1, -1, 255, -4096, i64::MAX, i64::MIN + 1] {
                let text = format_number(value, base);
                assert_eq!(parse_number(text.as_bytes(), base), Some(value), "{} in {}", text, base);
            }
        }

        assert_eq!(format_number(i64::MIN, 16), "-8000000000000000");
        assert_eq!(format_unsigned(u64::MAX, 16), "ffffffffffffffff");
    }

    #[test]
    fn bodies_know_their_calls() {
        let hash = Hash::from_raw(5);
        let body = WordBody::new(vec![WordNode::PushInt(1), WordNode::Call(hash)]);

        assert_eq!(body.len(), 2);
        assert!(body.is_call_to(1, hash));
        assert!(!body.is_call_to(0, hash));
        assert!(!body.is_call_to(7, hash));
    }
}
