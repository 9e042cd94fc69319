#![allow(dead_code)]

use seforth::{ForthInterpreter, RuntimeConfig};
use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

/// An in-memory output sink that the test keeps a handle to after the interpreter takes its own.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn interpreter_with(config: RuntimeConfig) -> (ForthInterpreter, SharedOutput) {
    let output = SharedOutput::default();
    let interpreter = ForthInterpreter::with_output(config, Box::new(output.clone())).unwrap();

    (interpreter, output)
}

pub fn interpreter() -> (ForthInterpreter, SharedOutput) {
    interpreter_with(RuntimeConfig::default())
}

/// Run source and return what it printed.
pub fn eval_output(source: &str) -> String {
    let (mut interpreter, output) = interpreter();

    interpreter.feed_str(source);
    interpreter.feed_char(b'\n');

    output.text()
}
