use crate::runtime::error::{self, ErrorCode, ForthError};

fn hex_digit(byte: Option<u8>) -> error::Result<u8> {
    match byte {
        Some(byte @ b'0'..=b'9') => Ok(byte - b'0'),
        Some(byte @ b'a'..=b'f') => Ok(byte - b'a' + 10),
        Some(byte @ b'A'..=b'F') => Ok(byte - b'A' + 10),
        Some(byte) => ForthError::new_as_result(
            ErrorCode::InvalidCall,
            format!("{:?} is not a valid hex digit.", byte as char),
        ),
        None => ForthError::new_as_result(
            ErrorCode::InvalidCall,
            "Escape \\x needs two hex digits.".to_string(),
        ),
    }
}

/// Decode the backslash escapes accepted by `s\"`.
///
/// `\m` expands to carriage return plus line feed, `\xHH` takes exactly two hex digits, and any
/// escaped character without a special meaning stands for itself.
pub fn decode_escapes(text: &[u8]) -> error::Result<Vec<u8>> {
    let mut decoded = Vec::with_capacity(text.len());
    let mut bytes = text.iter().copied();

    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            decoded.push(byte);
            continue;
        }

        let Some(escaped) = bytes.next() else {
            // A lone trailing backslash is kept.
            decoded.push(b'\\');
            break;
        };

        match escaped {
            b'a' => decoded.push(0x07),
            b'b' => decoded.push(0x08),
            b'e' => decoded.push(0x1b),
            b'f' => decoded.push(0x0c),
            b'l' | b'n' => decoded.push(b'\n'),
            b'm' => decoded.extend_from_slice(b"\r\n"),
            b'q' | b'"' => decoded.push(b'"'),
            b'r' => decoded.push(b'\r'),
            b't' => decoded.push(b'\t'),
            b'v' => decoded.push(0x0b),
            b'z' => decoded.push(0),
            b'x' => {
                let high = hex_digit(bytes.next())?;
                let low = hex_digit(bytes.next())?;
                decoded.push((high << 4) | low);
            }
            other => decoded.push(other),
        }
    }

    Ok(decoded)
}

/// Does the text end in an escaped character, meaning that a quote right after it belongs to the
/// string rather than closing it?
pub fn ends_in_escape(text: &[u8]) -> bool {
    let trailing = text.iter().rev().take_while(|byte| **byte == b'\\').count();
    trailing % 2 == 1
}

/// Turn plain bytes into a counted string: a length byte followed by the bytes.  Strings longer
/// than 255 bytes can not be counted.
pub fn to_counted(text: &[u8]) -> error::Result<Vec<u8>> {
    let Ok(length) = u8::try_from(text.len()) else {
        return ForthError::new_as_result(
            ErrorCode::NoMemory,
            format!("Counted string of {} bytes is too long.", text.len()),
        );
    };

    let mut counted = Vec::with_capacity(text.len() + 1);
    counted.push(length);
    counted.extend_from_slice(text);

    Ok(counted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_escape() {
        assert_eq!(decode_escapes(b"a\\nb").unwrap(), b"a\nb");
    }

    #[test]
    fn all_named_escapes() {
        let decoded = decode_escapes(b"\\a\\b\\e\\f\\l\\m\\q\\r\\t\\v\\z\\\\\\\"").unwrap();

        assert_eq!(
            decoded,
            vec![7, 8, 27, 12, 10, 13, 10, b'"', 13, 9, 11, 0, b'\\', b'"']
        );
    }

    #[test]
    fn hex_escapes() {
        assert_eq!(decode_escapes(b"\\x41\\x7e").unwrap(), b"A~");
        assert_eq!(decode_escapes(b"\\xfF").unwrap(), vec![0xff]);
        assert!(decode_escapes(b"\\xg1").is_err());
        assert!(decode_escapes(b"\\x4").is_err());
    }

    #[test]
    fn unknown_escapes_are_kept() {
        assert_eq!(decode_escapes(b"\\w\\").unwrap(), b"w\\");
    }

    #[test]
    fn escaped_quote_detection() {
        assert!(ends_in_escape(b"say \\"));
        assert!(!ends_in_escape(b"path\\\\"));
        assert!(ends_in_escape(b"\\\\\\"));
        assert!(!ends_in_escape(b"plain"));
    }

    #[test]
    fn counted_strings_lead_with_their_length() {
        assert_eq!(to_counted(b"abc").unwrap(), vec![3, b'a', b'b', b'c']);
        assert_eq!(to_counted(b"").unwrap(), vec![0]);
        assert!(to_counted(&[b'x'; 256]).is_err());
    }
}
