use crate::{
    add_native_word,
    lang::code::{format_number, format_unsigned},
    runtime::{error, interpreter::Interpreter},
};

fn write_text(interpreter: &mut dyn Interpreter, text: &[u8]) -> error::Result<()> {
    interpreter.output().write_all(text)?;
    Ok(())
}

/// Print the top value in the current base, followed by a space.
///
/// Signature: `value -- `
fn word_print(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;
    let text = format!("{} ", format_number(value, interpreter.base()));

    write_text(interpreter, text.as_bytes())
}

/// Print the top value as an unsigned number.
///
/// Signature: `value -- `
fn word_print_unsigned(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;
    let text = format!("{} ", format_unsigned(value as u64, interpreter.base()));

    write_text(interpreter, text.as_bytes())
}

/// Print a single character.
///
/// Signature: `character -- `
fn word_emit(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let character = interpreter.pop()?;

    write_text(interpreter, &[character as u8])
}

/// Print a string given its address and length.
///
/// Signature: `address length -- `
fn word_type(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let length = interpreter.pop_as_usize()?;
    let address = interpreter.pop()?;
    let text = interpreter.read_bytes(address, length)?.to_vec();

    write_text(interpreter, &text)
}

/// Register the output words.
pub fn register_io_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        ".",
        word_print,
        "Print the top value followed by a space.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "u.",
        word_print_unsigned,
        "Print the top value as an unsigned number followed by a space.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "emit",
        word_emit,
        "Print the character with the given code.",
        "character -- "
    );

    add_native_word!(
        interpreter,
        "cr",
        |interpreter| write_text(interpreter, b"\n"),
        "Print a new line.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "space",
        |interpreter| write_text(interpreter, b" "),
        "Print a space.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "type",
        word_type,
        "Print the string at the address.",
        "address length -- "
    );
}
