use crate::{
    add_native_word,
    runtime::{error, interpreter::Interpreter},
};

/// Helper function to handle comparisons.  The comparison is passed in as an argument, the result
/// is pushed as a well formed flag.
fn compare_op(interpreter: &mut dyn Interpreter, op: fn(i64, i64) -> bool) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push_bool(op(a, b))
}

/// Helper function to handle bit logic operations.  The actual bit operation is passed in as an
/// argument.
fn logic_bit_op(interpreter: &mut dyn Interpreter, op: fn(i64, i64) -> i64) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(op(a, b))
}

/// Shift left by a number of bits, shifting everything out past the width of a cell.
///
/// Signature: `value bits -- result`
fn word_left_shift(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let bits = interpreter.pop()?;
    let value = interpreter.pop()?;

    let result = match u32::try_from(bits) {
        Ok(bits) => (value as u64).checked_shl(bits).unwrap_or(0) as i64,
        Err(_) => 0,
    };

    interpreter.push(result)
}

/// Logical shift right, zeros are shifted in from the top.
///
/// Signature: `value bits -- result`
fn word_right_shift(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let bits = interpreter.pop()?;
    let value = interpreter.pop()?;

    let result = match u32::try_from(bits) {
        Ok(bits) => (value as u64).checked_shr(bits).unwrap_or(0) as i64,
        Err(_) => 0,
    };

    interpreter.push(result)
}

/// Register the comparison and bit logic words.
pub fn register_math_logic_and_bit_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "=",
        |interpreter| compare_op(interpreter, |a, b| a == b),
        "Are the 2 values equal?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "<>",
        |interpreter| compare_op(interpreter, |a, b| a != b),
        "Are the 2 values different?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "<",
        |interpreter| compare_op(interpreter, |a, b| a < b),
        "Is a less than b?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        ">",
        |interpreter| compare_op(interpreter, |a, b| a > b),
        "Is a greater than b?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "0=",
        |interpreter| {
            let value = interpreter.pop()?;
            interpreter.push_bool(value == 0)
        },
        "Is the value zero?",
        "value -- flag"
    );

    add_native_word!(
        interpreter,
        "0<",
        |interpreter| {
            let value = interpreter.pop()?;
            interpreter.push_bool(value < 0)
        },
        "Is the value negative?",
        "value -- flag"
    );

    add_native_word!(
        interpreter,
        "and",
        |interpreter| logic_bit_op(interpreter, |a, b| a & b),
        "Bitwise and of 2 values.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "or",
        |interpreter| logic_bit_op(interpreter, |a, b| a | b),
        "Bitwise or of 2 values.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "xor",
        |interpreter| logic_bit_op(interpreter, |a, b| a ^ b),
        "Bitwise exclusive or of 2 values.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "invert",
        |interpreter| {
            let value = interpreter.pop()?;
            interpreter.push(!value)
        },
        "Flip every bit of the value.",
        "value -- result"
    );

    add_native_word!(
        interpreter,
        "lshift",
        word_left_shift,
        "Shift the value left by a number of bits.",
        "value bits -- result"
    );

    add_native_word!(
        interpreter,
        "rshift",
        word_right_shift,
        "Shift the value right by a number of bits, filling with zeros.",
        "value bits -- result"
    );
}
