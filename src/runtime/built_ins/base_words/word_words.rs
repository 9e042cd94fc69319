use crate::{
    add_native_word,
    lang::hashing::Hash,
    runtime::{
        data_structures::dictionary::EntryKind,
        error::{self, ErrorCode, ForthError},
        interpreter::Interpreter,
    },
};

/// Pop an execution token, failing if the value can not be one.
fn pop_execution_token(interpreter: &mut dyn Interpreter) -> error::Result<Hash> {
    let cell = interpreter.pop()?;

    Hash::from_cell(cell).ok_or_else(|| {
        ForthError::new(
            ErrorCode::InvalidCall,
            format!("{} is not an execution token.", cell),
        )
    })
}

/// Call the word an execution token refers to.
///
/// Signature: `xt -- <depends on word>`
fn word_execute(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let hash = pop_execution_token(interpreter)?;

    interpreter.call_by_hash(hash)
}

/// Get the execution token a deferred word is currently bound to.
///
/// Signature: `xt -- bound-xt`
fn word_defer_fetch(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let hash = pop_execution_token(interpreter)?;

    let target = match interpreter.dictionary().find(hash).map(|entry| &entry.kind) {
        Some(EntryKind::Alias(target)) => *target,

        Some(EntryKind::Deferred) => {
            return ForthError::new_as_result(
                ErrorCode::InvalidCall,
                format!("Deferred word {} has not been bound.", hash),
            );
        }

        Some(_) => {
            return ForthError::new_as_result(
                ErrorCode::InvalidCall,
                format!("Word {} is not a deferred word.", hash),
            );
        }

        None => {
            return ForthError::new_as_result(
                ErrorCode::NotFound,
                format!("Word {} is not defined.", hash),
            );
        }
    };

    interpreter.push(target.to_cell())
}

/// Print every named word in the dictionary.
///
/// Signature: ` -- `
fn word_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let listing = interpreter.dictionary().to_string();

    interpreter.output().write_all(listing.as_bytes())?;
    Ok(())
}

fn word_base_store(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let base = interpreter.pop()?;

    interpreter.set_base(base)
}

/// Register the words that work with words and with the interpreter itself.
pub fn register_word_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "execute",
        word_execute,
        "Call the word the execution token refers to.",
        "xt -- <depends on word>"
    );

    add_native_word!(
        interpreter,
        "defer@",
        word_defer_fetch,
        "Get the execution token a deferred word is bound to.",
        "xt -- bound-xt"
    );

    add_native_word!(
        interpreter,
        "bye",
        |interpreter| {
            interpreter.halt();
            Ok(())
        },
        "Stop the interpreter.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "abort",
        |interpreter| {
            interpreter.reset();
            Ok(())
        },
        "Abandon all running code and clear the stacks.",
        "... -- "
    );

    add_native_word!(
        interpreter,
        "words",
        word_words,
        "Print the list of defined words.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "base@",
        |interpreter| {
            let base = interpreter.base() as i64;
            interpreter.push(base)
        },
        "Get the numeric base used to read and print numbers.",
        " -- base"
    );

    add_native_word!(
        interpreter,
        "base!",
        word_base_store,
        "Set the numeric base, between 2 and 36.",
        "base -- "
    );

    add_native_word!(
        interpreter,
        "hex",
        |interpreter| interpreter.set_base(16),
        "Read and print numbers in hexadecimal.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "decimal",
        |interpreter| interpreter.set_base(10),
        "Read and print numbers in decimal.",
        " -- "
    );
}
