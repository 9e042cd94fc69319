use clap::Parser;
use seforth::{
    ForthInterpreter, RuntimeConfig,
    runtime::{error, interpreter::ExecutionControl},
};
use std::{
    io::{self, IsTerminal, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

/// An embeddable, character-driven Forth interpreter.
#[derive(Parser, Debug)]
#[command(name = "seforth", version, about)]
struct Args {
    /// Depth of the data stack.
    #[arg(long = "data-stack")]
    data_stack: Option<usize>,

    /// Depth of the return stack.
    #[arg(long = "code-stack")]
    code_stack: Option<usize>,

    /// Treat word names that differ only in case as different words.
    #[arg(long)]
    case_sensitive: bool,

    /// Let panics inside native words abort the process instead of resetting the interpreter.
    #[arg(long)]
    no_fault_trap: bool,

    /// Start without the words defined in Forth source.
    #[arg(long)]
    no_prelude: bool,

    /// Source file to run.  Without one, source is read from standard input.
    file: Option<PathBuf>,

    /// Arguments handed to the program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Args {
    fn config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::default()
            .with_case_insensitive(!self.case_sensitive)
            .with_trap_faults(!self.no_fault_trap)
            .with_prelude(!self.no_prelude);

        if let Some(size) = self.data_stack {
            config = config.with_data_stack_size(size);
        }

        if let Some(size) = self.code_stack {
            config = config.with_code_stack_size(size);
        }

        config
    }
}

/// Log to stderr so that the program's own output on stdout stays clean.
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("SEFORTH_LOG").unwrap_or_else(|_| EnvFilter::new("error"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Read standard input a byte at a time.  Prompts are only shown to a person at a terminal.
fn repl(interpreter: &mut ForthInterpreter) -> error::Result<()> {
    let interactive = io::stdin().is_terminal();

    for byte in io::stdin().lock().bytes() {
        let byte = byte?;

        interpreter.feed_char(byte);

        if !interpreter.is_running() {
            break;
        }

        if interactive && byte == b'\n' {
            interpreter.state_mut().output().write_all(b"ok\n")?;
            interpreter.flush()?;
        }
    }

    Ok(())
}

#[cfg(feature = "source-file")]
fn run_file(interpreter: &mut ForthInterpreter, args: &Args, file: &Path) -> error::Result<()> {
    #[cfg(feature = "cli-args")]
    interpreter.feed_arguments(args.args.clone())?;

    #[cfg(not(feature = "cli-args"))]
    let _ = args;

    interpreter.feed_file(file)
}

#[cfg(not(feature = "source-file"))]
fn run_file(_: &mut ForthInterpreter, _: &Args, file: &Path) -> error::Result<()> {
    error::forth_error(
        error::ErrorCode::InvalidFile,
        &format!("Built without file support, can not run {}.", file.display()),
    )
}

/// The status the program asked for with `exit-code!`.
#[cfg(feature = "programming-tools")]
fn exit_status(interpreter: &ForthInterpreter) -> ExitCode {
    ExitCode::from((interpreter.exit_code() & 0xff) as u8)
}

#[cfg(not(feature = "programming-tools"))]
fn exit_status(_: &ForthInterpreter) -> ExitCode {
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging();

    let mut interpreter = match ForthInterpreter::with_config(args.config()) {
        Ok(interpreter) => interpreter,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.file {
        Some(file) => run_file(&mut interpreter, &args, file),
        None => repl(&mut interpreter),
    };

    let result = result.and_then(|_| interpreter.flush());

    if let Err(error) = result {
        eprintln!("{}", error);
        return ExitCode::FAILURE;
    }

    exit_status(&interpreter)
}
