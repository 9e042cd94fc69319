//! An embeddable Forth interpreter.  Source is fed a byte at a time to an incremental parser,
//! completed tokens are compiled into word bodies and run by an execution engine with explicit
//! return frames.

/// Managing source code: name hashing, the token compiler and the parser.
pub mod lang;

/// The runtime and the data structures used by the interpreter, as well as the interpreter itself.
pub mod runtime;

pub use runtime::{
    config::RuntimeConfig,
    error::{ErrorCode, ForthError},
    interpreter::forth_interpreter::ForthInterpreter,
};
