use crate::runtime::interpreter::Interpreter;

/// The core words of the language.
pub mod base_words;

/// Words that print.
pub mod io_words;

/// Words that talk to the host program.
pub mod user_words;

/// Register every native word.
pub fn register_builtin_words(interpreter: &mut dyn Interpreter) {
    base_words::register_base_words(interpreter);
    io_words::register_io_words(interpreter);
    user_words::register_user_words(interpreter);
}
