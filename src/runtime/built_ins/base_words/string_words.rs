use crate::{
    add_native_word,
    runtime::{error, interpreter::Interpreter},
};

/// Fetch the byte at a string address.
///
/// Signature: `address -- byte`
fn word_char_fetch(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.pop()?;
    let byte = interpreter.read_bytes(address, 1)?[0];

    interpreter.push(byte as i64)
}

/// Turn the address of a counted string into the address and length of its text.
///
/// Signature: `address -- text-address length`
fn word_count(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.pop()?;
    let length = interpreter.read_bytes(address, 1)?[0];

    interpreter.push(address.wrapping_add(1))?;
    interpreter.push(length as i64)
}

/// Register the words that read strings.
pub fn register_string_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "c@",
        word_char_fetch,
        "Fetch the byte at a string address.",
        "address -- byte"
    );

    add_native_word!(
        interpreter,
        "count",
        word_count,
        "Get the text address and length of a counted string.",
        "address -- text-address length"
    );
}
