use std::io::{ self as std_io, Write };
#[cfg(feature = "source-file")]
use std::{ fs::File,
           io::{ BufReader, Read },
           path::Path };
use tracing::error;
use crate::{ lang::{ compile_words::register_compile_time_words,
                     parser::Parser },
             runtime::{ config::RuntimeConfig,
                        error::{ self, ForthError },
                        interpreter::{ ExecutionControl, WordManagement, forth_state::ForthState } } };
#[cfg(feature = "source-file")]
use crate::runtime::error::ErrorCode;



/// Forth source fed to every interpreter at start-up, unless turned off in the configuration.
const PRELUDE: &str = include_str!("prelude.fs");



/// An embeddable Forth interpreter.  Source is fed to it a byte at a time; every token runs as
/// soon as it is complete.
pub struct ForthInterpreter
{
    state: ForthState,
    parser: Parser
}


impl ForthInterpreter
{
    /// Create an interpreter with the default configuration, printing to stdout.
    pub fn new() -> ForthInterpreter
    {
        Self::build(RuntimeConfig::default(), Box::new(std_io::stdout()))
    }

    pub fn with_config(config: RuntimeConfig) -> error::Result<ForthInterpreter>
    {
        Self::with_output(config, Box::new(std_io::stdout()))
    }

    /// Create an interpreter that sends everything it prints to the given writer.
    pub fn with_output(config: RuntimeConfig, output: Box<dyn Write>) -> error::Result<ForthInterpreter>
    {
        config.validate()?;
        Ok(Self::build(config, output))
    }

    fn build(config: RuntimeConfig, output: Box<dyn Write>) -> ForthInterpreter
    {
        let parser = Parser::new(&config);
        let load_prelude = config.load_prelude;

        let mut state = ForthState::new(config, output);

        if let Err(error) = register_compile_time_words(state.dictionary_mut())
        {
            error!("Could not register the compile-time words: {}", error);
        }

        let mut interpreter = ForthInterpreter { state, parser };

        if load_prelude
        {
            interpreter.feed_str(PRELUDE);
        }

        interpreter
    }

    /// Feed a single byte of source.  The byte is always processed, even if the interpreter has
    /// stopped running.
    pub fn feed_char(&mut self, byte: u8)
    {
        self.parser.feed(&mut self.state, byte);
    }

    /// Feed source until it runs out or the interpreter stops running.
    pub fn feed_bytes(&mut self, bytes: &[u8])
    {
        for byte in bytes
        {
            if !self.state.is_running()
            {
                break;
            }

            self.feed_char(*byte);
        }
    }

    pub fn feed_str(&mut self, text: &str)
    {
        self.feed_bytes(text.as_bytes());
    }

    /// Feed the contents of a file.  A first line starting with `#` is skipped so that scripts can
    /// carry a shebang line.
    ///
    /// Feeding stops early when the program stops the interpreter, or when an execution fault
    /// happens.  The fault is returned in that case.
    #[cfg(feature = "source-file")]
    pub fn feed_file(&mut self, path: impl AsRef<Path>) -> error::Result<()>
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|error|
            {
                ForthError::new(ErrorCode::InvalidFile,
                                format!("Could not open {}: {}", path.display(), error))
            })?;

        let faults = self.state.fault_count();
        let mut first = true;

        for byte in BufReader::new(file).bytes()
        {
            let byte = byte.map_err(|error|
                {
                    ForthError::new(ErrorCode::InvalidFile,
                                    format!("Could not read {}: {}", path.display(), error))
                })?;

            if first
            {
                first = false;

                if byte == b'#'
                {
                    self.feed_str("\\ ");
                }
            }

            self.feed_char(byte);

            if !self.state.is_running()
            {
                return Ok(());
            }

            self.check_faults(faults)?;
        }

        // Complete a last token that has no delimiter after it.
        self.feed_char(b'\n');
        self.check_faults(faults)
    }

    #[cfg(feature = "source-file")]
    fn check_faults(&mut self, faults: usize) -> error::Result<()>
    {
        if self.state.fault_count() == faults
        {
            return Ok(());
        }

        Err(self.state
                .take_error()
                .unwrap_or_else(|| ForthError::new(ErrorCode::RuntimeFault,
                                                   "Execution fault while feeding a file.".to_string())))
    }

    pub fn is_running(&self) -> bool
    {
        self.state.is_running()
    }

    /// Let a stopped interpreter take input again.  Its dictionary and stacks are kept.
    pub fn restart(&mut self)
    {
        self.state.set_running(true);
    }

    /// Hand the program its arguments, read with `argc` and `arg`.
    #[cfg(feature = "cli-args")]
    pub fn feed_arguments(&mut self, arguments: Vec<String>) -> error::Result<()>
    {
        self.state.set_arguments(arguments)
    }

    /// The status set by the program with `exit-code!`.
    #[cfg(feature = "programming-tools")]
    pub fn exit_code(&self) -> i64
    {
        self.state.exit_code()
    }

    /// The last execution fault, if any.
    pub fn take_error(&mut self) -> Option<ForthError>
    {
        self.state.take_error()
    }

    /// The last parse-time diagnostic, if any.
    pub fn take_diagnostic(&mut self) -> Option<ForthError>
    {
        self.parser.take_diagnostic()
    }

    pub fn state(&self) -> &ForthState
    {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ForthState
    {
        &mut self.state
    }

    pub fn parser(&self) -> &Parser
    {
        &self.parser
    }

    /// Drop any half read construct so the next byte starts fresh at the top level.  The
    /// dictionary and the stacks are kept.
    pub fn reset_parser(&mut self)
    {
        self.parser.reset();
    }

    pub fn flush(&mut self) -> error::Result<()>
    {
        self.state.flush()
    }
}


impl Default for ForthInterpreter
{
    fn default() -> Self
    {
        Self::new()
    }
}
