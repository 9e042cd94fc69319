use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    process::{ExitCode, Termination},
};

pub type Result<T> = std::result::Result<T, ForthError>;

/// The broad class of a failure.  The numeric values are stable and are what a host sees when it
/// turns an error into a status code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ErrorCode {
    /// A fixed size buffer or the hash space ran out.
    NoMemory,

    /// A word was looked up or called but is not in the dictionary.
    NotFound,

    /// A source file could not be opened or read.
    InvalidFile,

    /// The interpreter reached a state that should not be possible.
    Impossible,

    /// A panic was caught while executing a word node.
    RuntimeFault,

    /// The runtime configuration is unusable.
    ConfigError,

    /// One of the data, return, loop or hook stacks went out of bounds.
    StackBound,

    /// The target of a call can not be executed: a compile-time word, an unbound deferred word, a
    /// control word outside of a definition or an invalid execution token.
    InvalidCall,

    /// Division by zero or an invalid numeric base.
    Arithmetic,
}

impl ErrorCode {
    /// The stable numeric value of the code.  Success is 0 and is never represented here.
    pub fn value(&self) -> i32 {
        match self {
            ErrorCode::NoMemory => 1,
            ErrorCode::NotFound => 2,
            ErrorCode::InvalidFile => 3,
            ErrorCode::Impossible => 4,
            ErrorCode::RuntimeFault => 5,
            ErrorCode::ConfigError => 6,
            ErrorCode::StackBound => 7,
            ErrorCode::InvalidCall => 8,
            ErrorCode::Arithmetic => 9,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let text = match self {
            ErrorCode::NoMemory => "out of memory",
            ErrorCode::NotFound => "word not found",
            ErrorCode::InvalidFile => "invalid source file",
            ErrorCode::Impossible => "impossible state",
            ErrorCode::RuntimeFault => "runtime fault trapped",
            ErrorCode::ConfigError => "configuration error",
            ErrorCode::StackBound => "stack out of bounds",
            ErrorCode::InvalidCall => "invalid call",
            ErrorCode::Arithmetic => "arithmetic error",
        };

        write!(f, "{}", text)
    }
}

/// Any error raised while parsing or executing Forth code.
#[derive(Clone, PartialEq, Eq)]
pub struct ForthError {
    /// What kind of failure this is.
    code: ErrorCode,

    /// The description of the error.
    message: String,

    /// The name of the word being executed or parsed when the error occurred, if known.
    word: Option<String>,
}

impl Error for ForthError {}

/// When returned from main, convert the error result to an operating system exit code.
impl Termination for ForthError {
    fn report(self) -> ExitCode {
        eprintln!("Error: {}", self);
        ExitCode::FAILURE
    }
}

impl Display for ForthError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.word {
            Some(word) => write!(f, "{} ({}): {}", self.code, word, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl Debug for ForthError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl ForthError {
    /// Create a new ForthError.
    pub fn new(code: ErrorCode, message: String) -> ForthError {
        ForthError {
            code,
            message,
            word: None,
        }
    }

    /// Create a new ForthError and wrap it in a Result::Err.
    pub fn new_as_result<T>(code: ErrorCode, message: String) -> Result<T> {
        Err(ForthError::new(code, message))
    }

    /// Attach the name of the word the error relates to.
    pub fn with_word(mut self, word: &str) -> ForthError {
        self.word = Some(word.to_string());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The description of the error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// If available, the word the error relates to.
    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }
}

/// Allow for the conversion of a std::io::Error into a ForthError.  Output failures are the only
/// I/O the engine itself performs.
impl From<std::io::Error> for ForthError {
    fn from(error: std::io::Error) -> ForthError {
        ForthError::new(ErrorCode::Impossible, format!("I/O error: {}", error))
    }
}

/// Shorthand for the most common error construction inside native words.
pub fn forth_error<T>(code: ErrorCode, message: &str) -> Result<T> {
    ForthError::new_as_result(code, message.to_string())
}
