use crate::{
    add_native_word,
    lang::code::format_number,
    runtime::{error, interpreter::Interpreter},
};

/// Duplicate the top value on the data stack.
///
/// Signature: `value -- value value`
fn word_dup(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pick(0)?;

    interpreter.push(value)
}

/// Drop the top value on the data stack.
///
/// Signature: `value -- `
fn word_drop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = interpreter.pop()?;

    Ok(())
}

/// Swap the top 2 values on the data stack.
///
/// Signature: `a b -- b a`
fn word_swap(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.roll(1)
}

/// Make a copy of the second value and place the copy on top.
///
/// Signature: `a b -- a b a`
fn word_over(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let a = interpreter.pick(1)?;

    interpreter.push(a)
}

/// Rotate the top 3 values on the stack.
///
/// Signature: `a b c -- b c a`
fn word_rot(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.roll(2)
}

/// Copy the value at the given depth to the top of the stack, 0 being the top.
///
/// Signature: `... n -- ... value`
fn word_pick(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let depth = interpreter.pop_as_usize()?;
    let value = interpreter.pick(depth)?;

    interpreter.push(value)
}

/// Move the value at the given depth to the top of the stack, 0 being the top.
///
/// Signature: `... n -- ... value`
fn word_roll(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let depth = interpreter.pop_as_usize()?;

    interpreter.roll(depth)
}

/// Get the depth of the data stack before calling this word.
///
/// Signature: ` -- depth`
fn word_depth(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let depth = interpreter.stack().len() as i64;

    interpreter.push(depth)
}

fn word_clear_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.clear_stack();
    Ok(())
}

/// Print the data stack, bottom first, without changing it.
///
/// Signature: ` -- `
fn word_print_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let base = interpreter.base();
    let mut text = format!("<{}> ", interpreter.stack().len());

    for value in interpreter.stack() {
        text.push_str(&format_number(*value, base));
        text.push(' ');
    }

    interpreter.output().write_all(text.as_bytes())?;
    Ok(())
}

/// Register the stack manipulation words.
pub fn register_stack_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "dup",
        word_dup,
        "Duplicate the top value on the data stack.",
        "value -- value value"
    );

    add_native_word!(
        interpreter,
        "drop",
        word_drop,
        "Discard the top value on the data stack.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "swap",
        word_swap,
        "Swap the top 2 values on the data stack.",
        "a b -- b a"
    );

    add_native_word!(
        interpreter,
        "over",
        word_over,
        "Copy the second value to the top of the stack.",
        "a b -- a b a"
    );

    add_native_word!(
        interpreter,
        "rot",
        word_rot,
        "Rotate the third value to the top of the stack.",
        "a b c -- b c a"
    );

    add_native_word!(
        interpreter,
        "pick",
        word_pick,
        "Copy the nth value to the top of the stack, 0 being the top.",
        "... n -- ... value"
    );

    add_native_word!(
        interpreter,
        "roll",
        word_roll,
        "Move the nth value to the top of the stack, 0 being the top.",
        "... n -- ... value"
    );

    add_native_word!(
        interpreter,
        "depth",
        word_depth,
        "Get the depth of the stack before calling this word.",
        " -- depth"
    );

    add_native_word!(
        interpreter,
        "clearstack",
        word_clear_stack,
        "Discard every value on the data stack.",
        "... -- "
    );

    add_native_word!(
        interpreter,
        ".s",
        word_print_stack,
        "Print the data stack without changing it.",
        " -- "
    );
}
