/// Hashing of word names into dictionary keys.
pub mod hashing;

/// Module for defining the nodes that make up compiled word bodies, along with the syntax of
/// numeric literals.
pub mod code;

/// Decoding of the backslash escapes used by escaped string literals.
pub mod escapes;

/// Module for turning token text into word bodies and installing them in the dictionary.
pub mod compiler;

/// The incremental, hook driven parser.  Source is fed to it one byte at a time and complete
/// tokens are either executed right away or accumulated into definitions.
pub mod parser;

/// The words that run inside the parser rather than the execution engine.
pub mod compile_words;
