/// The dictionary module provides the word dictionary used by the interpreter, keyed by the hash
/// of a word's name.
pub mod dictionary;

/// Fixed capacity stacks used for the data, return, loop-control and parser hook stacks.
pub mod stack;

/// Single cell addresses of bytes inside strings held by the dictionary.
pub mod string_address;
