use crate::{
    add_native_word,
    runtime::{
        error::{self, ErrorCode, forth_error},
        interpreter::Interpreter,
    },
};

/// Pop two values, apply the operation and push the result.  All cell arithmetic wraps.
fn binary_op(interpreter: &mut dyn Interpreter, op: fn(i64, i64) -> i64) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(op(a, b))
}

fn unary_op(interpreter: &mut dyn Interpreter, op: fn(i64) -> i64) -> error::Result<()> {
    let a = interpreter.pop()?;

    interpreter.push(op(a))
}

/// Pop a divisor, failing on zero instead of letting the division trap.
fn pop_divisor(interpreter: &mut dyn Interpreter) -> error::Result<i64> {
    match interpreter.pop()? {
        0 => forth_error(ErrorCode::Arithmetic, "Division by zero."),
        divisor => Ok(divisor),
    }
}

/// Divide, truncating towards zero.
///
/// Signature: `a b -- a/b`
fn word_divide(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = pop_divisor(interpreter)?;
    let a = interpreter.pop()?;

    interpreter.push(a.wrapping_div(b))
}

/// Signature: `a b -- remainder`
fn word_mod(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = pop_divisor(interpreter)?;
    let a = interpreter.pop()?;

    interpreter.push(a.wrapping_rem(b))
}

/// Divide and keep both the remainder and the quotient.
///
/// Signature: `a b -- remainder quotient`
fn word_divide_mod(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = pop_divisor(interpreter)?;
    let a = interpreter.pop()?;

    interpreter.push(a.wrapping_rem(b))?;
    interpreter.push(a.wrapping_div(b))
}

/// Multiply then divide, keeping the full width of the intermediate product.
///
/// Signature: `a b c -- a*b/c`
fn word_multiply_divide(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let c = pop_divisor(interpreter)?;
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    let result = (a as i128 * b as i128) / c as i128;

    interpreter.push(result as i64)
}

/// Register the integer arithmetic words.
pub fn register_simple_arithmetic_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "+",
        |interpreter| binary_op(interpreter, i64::wrapping_add),
        "Add 2 numbers.",
        "a b -- a+b"
    );

    add_native_word!(
        interpreter,
        "-",
        |interpreter| binary_op(interpreter, i64::wrapping_sub),
        "Subtract the top number from the second.",
        "a b -- a-b"
    );

    add_native_word!(
        interpreter,
        "*",
        |interpreter| binary_op(interpreter, i64::wrapping_mul),
        "Multiply 2 numbers.",
        "a b -- a*b"
    );

    add_native_word!(
        interpreter,
        "/",
        word_divide,
        "Divide the second number by the top, truncating.",
        "a b -- a/b"
    );

    add_native_word!(
        interpreter,
        "mod",
        word_mod,
        "Remainder after dividing the second number by the top.",
        "a b -- remainder"
    );

    add_native_word!(
        interpreter,
        "/mod",
        word_divide_mod,
        "Remainder and quotient after dividing the second number by the top.",
        "a b -- remainder quotient"
    );

    add_native_word!(
        interpreter,
        "*/",
        word_multiply_divide,
        "Multiply a and b then divide by c, with a double width intermediate.",
        "a b c -- a*b/c"
    );

    add_native_word!(
        interpreter,
        "1+",
        |interpreter| unary_op(interpreter, |a| a.wrapping_add(1)),
        "Add 1 to the top of the stack.",
        "n -- n+1"
    );

    add_native_word!(
        interpreter,
        "1-",
        |interpreter| unary_op(interpreter, |a| a.wrapping_sub(1)),
        "Subtract 1 from the top of the stack.",
        "n -- n-1"
    );

    add_native_word!(
        interpreter,
        "2*",
        |interpreter| unary_op(interpreter, |a| a.wrapping_shl(1)),
        "Multiply the top of the stack by 2.",
        "n -- n*2"
    );

    add_native_word!(
        interpreter,
        "2/",
        |interpreter| unary_op(interpreter, |a| a >> 1),
        "Divide the top of the stack by 2, rounding towards negative infinity.",
        "n -- n/2"
    );

    add_native_word!(
        interpreter,
        "abs",
        |interpreter| unary_op(interpreter, i64::wrapping_abs),
        "Absolute value of the top of the stack.",
        "n -- |n|"
    );

    add_native_word!(
        interpreter,
        "negate",
        |interpreter| unary_op(interpreter, i64::wrapping_neg),
        "Negate the top of the stack.",
        "n -- -n"
    );
}
