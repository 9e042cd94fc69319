/// Words that manipulate the data stack.
mod stack_words;

/// Simple constants.
mod constant_words;

mod simple_arithmetic_words;

/// Words that compare values and work with bits.
mod math_logic_and_bit_words;

/// Branches and loops inside compiled words.
mod control_words;

/// Words that work with words and with the interpreter's state.
mod word_words;

/// Words that work with strings.
mod string_words;

use crate::runtime::{
    built_ins::base_words::{
        constant_words::register_constant_words, control_words::register_control_words,
        math_logic_and_bit_words::register_math_logic_and_bit_words,
        simple_arithmetic_words::register_simple_arithmetic_words,
        stack_words::register_stack_words, string_words::register_string_words,
        word_words::register_word_words,
    },
    interpreter::Interpreter,
};

/// Called to register all of the core words of the language.
pub fn register_base_words(interpreter: &mut dyn Interpreter) {
    register_stack_words(interpreter);
    register_constant_words(interpreter);
    register_simple_arithmetic_words(interpreter);
    register_math_logic_and_bit_words(interpreter);
    register_control_words(interpreter);
    register_word_words(interpreter);
    register_string_words(interpreter);
}
