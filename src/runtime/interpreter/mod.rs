use crate::{
    lang::{code::WordBody, hashing::Hash},
    runtime::{
        data_structures::{dictionary::Dictionary, string_address::StringAddress},
        error::{self, ErrorCode, ForthError},
    },
};
use std::{
    fmt::{self, Debug, Formatter},
    io::Write,
    rc::Rc,
};

pub mod forth_interpreter;
pub mod forth_state;

/// Where the execution engine currently is.  `Idle` means no compiled word is running.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ExecPosition {
    #[default]
    Idle,
    Running { word: Hash, pos: usize },
}

/// Trait for managing the interpreter's data and loop-control stacks.  Intended to be called by
/// native words.
pub trait InterpreterStack {
    /// The data stack from bottom to top.  Used for things like the stack dump word `.s`.
    fn stack(&self) -> &[i64];

    /// Push a value onto the data stack.  Fails if the stack is full.
    fn push(&mut self, value: i64) -> error::Result<()>;

    /// Pop the top value of the data stack.  Fails if the stack is empty.
    fn pop(&mut self) -> error::Result<i64>;

    /// Pop the top value and interpret it as a count or an index.
    fn pop_as_usize(&mut self) -> error::Result<usize> {
        let value = self.pop()?;

        usize::try_from(value).map_err(|_| {
            ForthError::new(
                ErrorCode::InvalidCall,
                format!("Expected a non-negative value, found {}.", value),
            )
        })
    }

    /// Pop the top value as a flag, any non-zero value is true.
    fn pop_as_bool(&mut self) -> error::Result<bool> {
        Ok(self.pop()? != 0)
    }

    /// Push a well formed flag, -1 for true and 0 for false.
    fn push_bool(&mut self, value: bool) -> error::Result<()> {
        self.push(if value { -1 } else { 0 })
    }

    /// Copy the value at the given depth, 0 being the top of the stack.
    fn pick(&self, depth: usize) -> error::Result<i64>;

    /// Move the value at the given depth to the top of the stack.
    fn roll(&mut self, depth: usize) -> error::Result<()>;

    /// Drop everything on the data stack.
    fn clear_stack(&mut self);

    fn loop_push(&mut self, value: i64) -> error::Result<()>;

    fn loop_pop(&mut self) -> error::Result<i64>;

    /// Read the loop-control stack at the given depth, 0 being the top.
    fn loop_peek(&self, depth: usize) -> error::Result<i64>;
}

/// Definition of a word handler function.  This is the function that is called when a native word
/// is executed.  Can be a closure or a plain Rust function.
pub type WordHandler = dyn Fn(&mut dyn Interpreter) -> error::Result<()>;

/// A word implemented in Rust along with its help text.
#[derive(Clone)]
pub struct NativeWord {
    handler: Rc<WordHandler>,
    description: String,
    signature: String,
}

impl NativeWord {
    pub fn new(handler: Rc<WordHandler>, description: &str, signature: &str) -> NativeWord {
        NativeWord {
            handler,
            description: description.to_string(),
            signature: signature.to_string(),
        }
    }

    pub fn handler(&self) -> Rc<WordHandler> {
        self.handler.clone()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Two native words are the same if they share the same handler.
impl PartialEq for NativeWord {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.handler), Rc::as_ptr(&other.handler))
    }
}

impl Debug for NativeWord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "NativeWord({})", self.signature)
    }
}

/// Wrap a function or closure as a word handler.  Going through the bound lets closures be written
/// without annotating their parameter.
pub fn native_handler<F>(function: F) -> Rc<WordHandler>
where
    F: Fn(&mut dyn Interpreter) -> error::Result<()> + 'static,
{
    Rc::new(function)
}

/// Simplify registering a native word with the interpreter.
///
/// Required parameters are, the interpreter instance to register with.  The name of the word to
/// register.  The word function handler to execute for the word.  A simple description of the word.
/// As well as the word's stack signature.
#[macro_export]
macro_rules! add_native_word {
    (
        $interpreter:expr ,
        $name:expr ,
        $function:expr ,
        $description:expr ,
        $signature:expr
    ) => {{
        $interpreter.add_word(
            $name,
            $crate::runtime::interpreter::native_handler($function),
            $description,
            $signature,
        );
    }};
}

/// Trait for managing and calling the words known to the interpreter.
pub trait WordManagement {
    fn dictionary(&self) -> &Dictionary;

    fn dictionary_mut(&mut self) -> &mut Dictionary;

    /// Add a native word to the dictionary, replacing any word of the same name.
    fn add_word(
        &mut self,
        name: &str,
        handler: Rc<WordHandler>,
        description: &str,
        signature: &str,
    );

    /// Resolve the hash through the dictionary and call whatever it names.  Native words run right
    /// away, compiled words are entered and then run by the execution engine.
    fn call_by_hash(&mut self, hash: Hash) -> error::Result<()>;

    /// Read a run of bytes from a string stored in the dictionary.  Every access is checked
    /// against the bounds of the string.
    fn read_bytes(&self, address: i64, length: usize) -> error::Result<&[u8]> {
        let address = StringAddress::from_cell(address);
        let start = address.offset as usize;

        let bytes = self.dictionary().string_bytes(address.hash).ok_or_else(|| {
            ForthError::new(
                ErrorCode::InvalidCall,
                format!("Address {} does not point into a string.", address.hash),
            )
        })?;

        start
            .checked_add(length)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| {
                ForthError::new(
                    ErrorCode::InvalidCall,
                    format!(
                        "Access of {} bytes at offset {} is outside of a {} byte string.",
                        length,
                        start,
                        bytes.len()
                    ),
                )
            })
    }
}

/// Trait for the execution engine and the rest of the interpreter's state that words can change.
pub trait ExecutionControl {
    fn position(&self) -> ExecPosition;

    /// The body of the running word along with the index of the next node to run.  Fails when the
    /// engine is idle, so control flow words can only be used inside compiled words.
    fn current_body(&self) -> error::Result<(&WordBody, usize)>;

    /// Continue the running word from another node.
    fn jump_to(&mut self, pos: usize) -> error::Result<()>;

    /// Return from the running word.  At the top level this stops the interpreter.
    fn exit_word(&mut self) -> error::Result<()>;

    /// Stop the interpreter.  The host sees this through `is_running`.
    fn halt(&mut self);

    /// Abandon all running code and clear the stacks.
    fn reset(&mut self);

    fn is_running(&self) -> bool;

    fn base(&self) -> u32;

    fn set_base(&mut self, base: i64) -> error::Result<()>;

    /// Where printing words send their output.
    fn output(&mut self) -> &mut dyn Write;

    /// The arguments the host handed to the program.  Each one is stored once as a string entry,
    /// these are the hashes of those entries.
    fn arguments(&self) -> &[Hash];

    fn set_exit_code(&mut self, code: i64);
}

/// Core interpreter trait.
///
/// This trait brings together the traits that native words are given to work with: the stacks,
/// the dictionary and the execution engine.
pub trait Interpreter: InterpreterStack + WordManagement + ExecutionControl {}
