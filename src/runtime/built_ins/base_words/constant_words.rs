use crate::{add_native_word, runtime::interpreter::Interpreter};

/// Register some useful constant words.
pub fn register_constant_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "true",
        |interpreter| interpreter.push_bool(true),
        "Push the value true onto the data stack.",
        " -- -1"
    );

    add_native_word!(
        interpreter,
        "false",
        |interpreter| interpreter.push_bool(false),
        "Push the value false onto the data stack.",
        " -- 0"
    );
}
