use crate::{ add_native_word,
             runtime::{ error::{ self, ErrorCode, ForthError },
                        interpreter::Interpreter } };



/// Push the number of arguments the host handed to the program.
///
/// Signature: ` -- count`
#[cfg(feature = "cli-args")]
fn word_argc(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let count = interpreter.arguments().len() as i64;

    interpreter.push(count)
}

/// Get an argument as a string.  The text was stored in the dictionary when the arguments were
/// handed over, so it can be read with the string words.
///
/// Signature: `index -- address length`
#[cfg(feature = "cli-args")]
fn word_arg(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let index = interpreter.pop_as_usize()?;

    let Some(hash) = interpreter.arguments().get(index).copied()
        else
        {
            return ForthError::new_as_result(ErrorCode::InvalidCall,
                                             format!("There is no argument {}, only {}.",
                                                     index,
                                                     interpreter.arguments().len()));
        };

    interpreter.call_by_hash(hash)
}

/// Signature: `code -- `
#[cfg(feature = "programming-tools")]
fn word_exit_code_store(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let code = interpreter.pop()?;

    interpreter.set_exit_code(code);
    Ok(())
}



/// Register the words that talk to the host program.
pub fn register_user_words(interpreter: &mut dyn Interpreter)
{
    #[cfg(feature = "cli-args")]
    {
        add_native_word!(interpreter, "argc", word_argc,
            "Get the number of program arguments.",
            " -- count");

        add_native_word!(interpreter, "arg", word_arg,
            "Get a program argument as a string.",
            "index -- address length");
    }

    #[cfg(feature = "programming-tools")]
    add_native_word!(interpreter, "exit-code!", word_exit_code_store,
        "Set the status the host reports when the program ends.",
        "code -- ");
}
