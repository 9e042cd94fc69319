/// All of the core data structures used by the interpreter.
pub mod data_structures;

/// Module for defining the built-in native words that are available to Forth code.
pub mod built_ins;

/// Sizes and switches for a single interpreter instance.
pub mod config;

/// Module for defining the error reporting of the interpreter.
pub mod error;

/// Module for defining the core functionality of the interpreter.  This includes the execution
/// engine and the public facade hosts talk to.
pub mod interpreter;
