use crate::{
    add_native_word,
    lang::{code::WordBody, hashing::Hash},
    runtime::{
        error::{self, ErrorCode, ForthError},
        interpreter::{ExecPosition, Interpreter},
    },
};

// Word bodies are flat lists of nodes, so the control words find their partners by scanning the
// running body for calls to the matching words, skipping over nested structures.

fn hashes(interpreter: &dyn Interpreter, names: &[&str]) -> Vec<Hash> {
    names
        .iter()
        .map(|name| interpreter.dictionary().hash(name.as_bytes()))
        .collect()
}

fn calls_any(body: &WordBody, index: usize, hashes: &[Hash]) -> bool {
    hashes.iter().any(|hash| body.is_call_to(index, *hash))
}

fn unmatched<T>(word: &str, partner: &str) -> error::Result<T> {
    ForthError::new_as_result(
        ErrorCode::InvalidCall,
        format!("{} has no matching {}.", word, partner),
    )
}

/// Find the first of the targets after the running node that is not inside a nested structure.
/// Openers start a nested structure and closers end one.
fn find_forward(
    interpreter: &dyn Interpreter,
    openers: &[&str],
    closers: &[&str],
    targets: &[&str],
) -> error::Result<Option<usize>> {
    let openers = hashes(interpreter, openers);
    let closers = hashes(interpreter, closers);
    let targets = hashes(interpreter, targets);

    let (body, start) = interpreter.current_body()?;
    let mut depth = 0usize;

    for index in start..body.len() {
        if depth == 0 && calls_any(body, index, &targets) {
            return Ok(Some(index));
        }

        if calls_any(body, index, &openers) {
            depth += 1;
        } else if calls_any(body, index, &closers) {
            if depth == 0 {
                break;
            }

            depth -= 1;
        }
    }

    Ok(None)
}

/// Find the `begin` that the running loop word jumps back to.  Loop ends passed on the way belong
/// to nested loops.
fn find_begin(interpreter: &dyn Interpreter) -> error::Result<Option<usize>> {
    let begin = interpreter.dictionary().hash(b"begin");
    let ends = hashes(interpreter, &["until", "again", "repeat"]);

    let (body, pos) = interpreter.current_body()?;
    let mut depth = 0usize;

    for index in (0..pos.saturating_sub(1)).rev() {
        if body.is_call_to(index, begin) {
            if depth == 0 {
                return Ok(Some(index));
            }

            depth -= 1;
        } else if calls_any(body, index, &ends) {
            depth += 1;
        }
    }

    Ok(None)
}

fn jump_past(
    interpreter: &mut dyn Interpreter,
    index: Option<usize>,
    word: &str,
    partner: &str,
) -> error::Result<()> {
    match index {
        Some(index) => interpreter.jump_to(index + 1),
        None => unmatched(word, partner),
    }
}

fn jump_to_begin(interpreter: &mut dyn Interpreter, word: &str) -> error::Result<()> {
    let begin = find_begin(interpreter)?;
    jump_past(interpreter, begin, word, "begin")
}

/// Fail unless a compiled word is running.
fn require_body(interpreter: &dyn Interpreter) -> error::Result<()> {
    interpreter.current_body().map(|_| ())
}

/// Run the following code only if the flag is true, otherwise skip to the matching `else` or
/// `then`.
///
/// Signature: `flag -- `
fn word_if(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    require_body(interpreter)?;

    if interpreter.pop_as_bool()? {
        return Ok(());
    }

    let target = find_forward(interpreter, &["if"], &["then"], &["else", "then"])?;
    jump_past(interpreter, target, "if", "then")
}

/// Reached at the end of the true branch, skip over the false branch.
fn word_else(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let target = find_forward(interpreter, &["if"], &["then"], &["then"])?;
    jump_past(interpreter, target, "else", "then")
}

/// Marks where the loop words jump back to, and where `if` and `else` skip to.
fn word_marker(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    require_body(interpreter)
}

/// Signature: `flag -- `
fn word_until(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    require_body(interpreter)?;

    if interpreter.pop_as_bool()? {
        return Ok(());
    }

    jump_to_begin(interpreter, "until")
}

fn word_again(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    jump_to_begin(interpreter, "again")
}

/// Keep looping while the flag is true, otherwise leave past the matching `repeat`.
///
/// Signature: `flag -- `
fn word_while(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    require_body(interpreter)?;

    if interpreter.pop_as_bool()? {
        return Ok(());
    }

    let target = find_forward(
        interpreter,
        &["begin"],
        &["until", "again", "repeat"],
        &["repeat"],
    )?;
    jump_past(interpreter, target, "while", "repeat")
}

fn word_repeat(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    jump_to_begin(interpreter, "repeat")
}

/// Find the `loop` or `+loop` that closes the running counted loop.
fn find_loop_end(interpreter: &dyn Interpreter) -> error::Result<Option<usize>> {
    find_forward(
        interpreter,
        &["do", "?do"],
        &["loop", "+loop"],
        &["loop", "+loop"],
    )
}

/// Push a loop frame.  The loop-control stack holds the start of the loop body, the limit and the
/// index, index on top.
fn enter_loop(interpreter: &mut dyn Interpreter, limit: i64, index: i64) -> error::Result<()> {
    let (_, start) = interpreter.current_body()?;

    interpreter.loop_push(start as i64)?;
    interpreter.loop_push(limit)?;
    interpreter.loop_push(index)
}

fn drop_loop_frame(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    for _ in 0..3 {
        let _ = interpreter.loop_pop()?;
    }

    Ok(())
}

/// Signature: `limit index -- `
fn word_do(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    require_body(interpreter)?;

    let index = interpreter.pop()?;
    let limit = interpreter.pop()?;

    enter_loop(interpreter, limit, index)
}

/// Like `do`, but the loop body is skipped entirely when the index already equals the limit.
///
/// Signature: `limit index -- `
fn word_question_do(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    require_body(interpreter)?;

    let index = interpreter.pop()?;
    let limit = interpreter.pop()?;

    if index == limit {
        let target = find_loop_end(interpreter)?;
        return jump_past(interpreter, target, "?do", "loop");
    }

    enter_loop(interpreter, limit, index)
}

/// Advance the running loop's index and either go around again or drop the loop frame.  The loop
/// ends when the index crosses the boundary between limit - 1 and limit, in either direction.
fn loop_step(interpreter: &mut dyn Interpreter, increment: i64) -> error::Result<()> {
    require_body(interpreter)?;

    let index = interpreter.loop_pop()?;
    let limit = interpreter.loop_peek(0)?;
    let start = interpreter.loop_peek(1)?;

    let next = index.wrapping_add(increment);
    let before = index.wrapping_sub(limit);
    let after = next.wrapping_sub(limit);

    if (before ^ after) < 0 && (before ^ increment) < 0 {
        let _ = interpreter.loop_pop()?;
        let _ = interpreter.loop_pop()?;

        return Ok(());
    }

    interpreter.loop_push(next)?;

    let start = usize::try_from(start).map_err(|_| {
        ForthError::new(
            ErrorCode::Impossible,
            format!("Loop start {} is not a position.", start),
        )
    })?;

    interpreter.jump_to(start)
}

/// Signature: `increment -- `
fn word_plus_loop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let increment = interpreter.pop()?;
    loop_step(interpreter, increment)
}

/// Leave the running loop right away.
fn word_leave(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let target = find_loop_end(interpreter)?;

    drop_loop_frame(interpreter)?;
    jump_past(interpreter, target, "leave", "loop")
}

/// Call the word that is running.
fn word_recurse(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    match interpreter.position() {
        ExecPosition::Running { word, .. } => interpreter.call_by_hash(word),
        ExecPosition::Idle => ForthError::new_as_result(
            ErrorCode::InvalidCall,
            "recurse can only be used inside a definition.".to_string(),
        ),
    }
}

/// Register the control flow words.
pub fn register_control_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "if",
        word_if,
        "Run the following code only if the flag is true.",
        "flag -- "
    );

    add_native_word!(
        interpreter,
        "else",
        word_else,
        "Start the code to run when the if flag was false.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "then",
        word_marker,
        "End an if statement.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "begin",
        word_marker,
        "Start an indefinite loop.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "until",
        word_until,
        "Loop back to begin until the flag is true.",
        "flag -- "
    );

    add_native_word!(
        interpreter,
        "again",
        word_again,
        "Loop back to begin unconditionally.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "while",
        word_while,
        "Leave a begin loop when the flag is false.",
        "flag -- "
    );

    add_native_word!(
        interpreter,
        "repeat",
        word_repeat,
        "Loop back to begin.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "do",
        word_do,
        "Start a counted loop.",
        "limit index -- "
    );

    add_native_word!(
        interpreter,
        "?do",
        word_question_do,
        "Start a counted loop that is skipped when index equals limit.",
        "limit index -- "
    );

    add_native_word!(
        interpreter,
        "loop",
        |interpreter| loop_step(interpreter, 1),
        "Add 1 to the loop index and go around again unless the limit is reached.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "+loop",
        word_plus_loop,
        "Add to the loop index and go around again unless the limit is crossed.",
        "increment -- "
    );

    add_native_word!(
        interpreter,
        "i",
        |interpreter| {
            let index = interpreter.loop_peek(0)?;
            interpreter.push(index)
        },
        "Index of the innermost loop.",
        " -- index"
    );

    add_native_word!(
        interpreter,
        "j",
        |interpreter| {
            let index = interpreter.loop_peek(3)?;
            interpreter.push(index)
        },
        "Index of the next outer loop.",
        " -- index"
    );

    add_native_word!(
        interpreter,
        "leave",
        word_leave,
        "Leave the innermost loop.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "unloop",
        drop_loop_frame,
        "Discard the innermost loop's control values, needed before an exit from inside a loop.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "recurse",
        word_recurse,
        "Call the word being defined.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "exit",
        |interpreter| interpreter.exit_word(),
        "Return from the running word.  At the top level this stops the interpreter.",
        " -- "
    );
}
