use std::{ any::Any,
           io::{ self as std_io, Write },
           panic::{ self, AssertUnwindSafe },
           rc::Rc };
use tracing::{ debug, error, trace };
use crate::{ lang::{ code::{ MAX_BASE, WordBody, WordNode },
                     hashing::Hash },
             runtime::{ built_ins::register_builtin_words,
                        config::RuntimeConfig,
                        data_structures::{ dictionary::{ Dictionary, Entry, EntryKind },
                                           stack::{ BoundedStack, StackKind },
                                           string_address::StringAddress },
                        error::{ self, ErrorCode, ForthError },
                        interpreter::{ ExecPosition,
                                       ExecutionControl,
                                       Interpreter,
                                       InterpreterStack,
                                       NativeWord,
                                       WordHandler,
                                       WordManagement } } };



/// What a call resolved to, taken out of the dictionary so that the dictionary is no longer
/// borrowed while the call happens.
enum Dispatch
{
    Native(Rc<WordHandler>),
    Enter,
    Push(i64),
    PushString(usize),
    Invalid(&'static str)
}


/// The runtime half of the interpreter: the dictionary, the three stacks and the execution engine
/// that threads through compiled word bodies.
pub struct ForthState
{
    /// The sizes and switches this state was built with.
    config: RuntimeConfig,

    /// Every word, constant and string known to the interpreter.
    dictionary: Dictionary,

    /// The data stack used by words to pass values.
    data: BoundedStack<i64>,

    /// Return frames, one for every compiled word that is waiting on a call.
    code: BoundedStack<ExecPosition>,

    /// Index, limit and start position of the active counted loops.
    loop_control: BoundedStack<i64>,

    /// The word and node the engine runs next.
    position: ExecPosition,

    /// Numeric base used to read and print numbers.
    base: u32,

    /// Cleared by `bye` or a top level `exit`.
    running: bool,

    output: Box<dyn Write>,

    /// String entries holding the program's arguments.
    arguments: Vec<Hash>,

    exit_code: i64,

    /// The last execution fault, kept until the host takes it.
    last_error: Option<ForthError>,

    /// Number of execution faults seen so far.
    fault_count: usize
}


impl InterpreterStack for ForthState
{
    fn stack(&self) -> &[i64]
    {
        self.data.as_slice()
    }

    fn push(&mut self, value: i64) -> error::Result<()>
    {
        self.data.push(value)
    }

    fn pop(&mut self) -> error::Result<i64>
    {
        self.data.pop()
    }

    fn pick(&self, depth: usize) -> error::Result<i64>
    {
        self.data.peek(depth).copied()
    }

    fn roll(&mut self, depth: usize) -> error::Result<()>
    {
        let value = self.data.remove(depth)?;
        self.data.push(value)
    }

    fn clear_stack(&mut self)
    {
        self.data.clear();
    }

    fn loop_push(&mut self, value: i64) -> error::Result<()>
    {
        self.loop_control.push(value)
    }

    fn loop_pop(&mut self) -> error::Result<i64>
    {
        self.loop_control.pop()
    }

    fn loop_peek(&self, depth: usize) -> error::Result<i64>
    {
        self.loop_control.peek(depth).copied()
    }
}


impl WordManagement for ForthState
{
    fn dictionary(&self) -> &Dictionary
    {
        &self.dictionary
    }

    fn dictionary_mut(&mut self) -> &mut Dictionary
    {
        &mut self.dictionary
    }

    fn add_word(&mut self,
                name: &str,
                handler: Rc<WordHandler>,
                description: &str,
                signature: &str)
    {
        let native = NativeWord::new(handler, description, signature);

        if let Err(error) = self.dictionary.insert(name, EntryKind::Native(native))
        {
            error!("Could not register native word {}: {}", name, error);
        }
    }

    fn call_by_hash(&mut self, hash: Hash) -> error::Result<()>
    {
        let ( resolved, name, dispatch ) =
            {
                let ( resolved, entry ) = self.dictionary.resolve(hash, self.config.max_alias_hops)?;

                let dispatch = match &entry.kind
                    {
                        EntryKind::Native(native)      => Dispatch::Native(native.handler()),
                        EntryKind::ForthWord(_)        => Dispatch::Enter,
                        EntryKind::Constant(value)     => Dispatch::Push(*value),
                        EntryKind::String(bytes)       => Dispatch::PushString(bytes.len()),
                        EntryKind::CompileTime { .. }  => Dispatch::Invalid("compile-time word"),
                        EntryKind::Deferred            => Dispatch::Invalid("deferred word with no action"),
                        EntryKind::Alias(_)            => Dispatch::Invalid("alias")
                    };

                ( resolved, entry.display_name(), dispatch )
            };

        trace!("Calling {} ({}).", name, resolved);

        match dispatch
        {
            Dispatch::Native(handler) => handler(self).map_err(|error|
                {
                    if error.word().is_some()
                    {
                        error
                    }
                    else
                    {
                        error.with_word(&name)
                    }
                }),

            Dispatch::Enter =>
                {
                    self.code.push(self.position)?;
                    self.position = ExecPosition::Running { word: resolved, pos: 0 };

                    Ok(())
                },

            Dispatch::Push(value) => self.data.push(value),

            Dispatch::PushString(length) =>
                {
                    self.data.push(StringAddress::new(resolved, 0).to_cell())?;
                    self.data.push(length as i64)
                },

            Dispatch::Invalid(what) =>
                {
                    Err(ForthError::new(ErrorCode::InvalidCall, format!("Can not call a {}.", what))
                            .with_word(&name))
                }
        }
    }
}


impl ExecutionControl for ForthState
{
    fn position(&self) -> ExecPosition
    {
        self.position
    }

    fn current_body(&self) -> error::Result<( &WordBody, usize )>
    {
        let ExecPosition::Running { word, pos } = self.position
            else
            {
                return ForthError::new_as_result(ErrorCode::InvalidCall,
                                                 "Control words can only be used inside a definition."
                                                     .to_string());
            };

        match self.dictionary.find(word)
        {
            Some(Entry { kind: EntryKind::ForthWord(body), .. }) => Ok(( body, pos )),

            _ => ForthError::new_as_result(ErrorCode::Impossible,
                                           format!("Running word {} has no body.", word))
        }
    }

    fn jump_to(&mut self, pos: usize) -> error::Result<()>
    {
        let length = self.current_body()?.0.len();

        match self.position
        {
            ExecPosition::Running { word, .. } if pos <= length =>
                {
                    self.position = ExecPosition::Running { word, pos };
                    Ok(())
                },

            _ => ForthError::new_as_result(ErrorCode::InvalidCall,
                                           format!("Jump to {} is outside of the running word.", pos))
        }
    }

    fn exit_word(&mut self) -> error::Result<()>
    {
        if self.code.is_empty()
        {
            debug!("Return with no caller, stopping.");

            self.running = false;
            self.position = ExecPosition::Idle;

            return Ok(());
        }

        self.position = self.code.pop()?;
        Ok(())
    }

    fn halt(&mut self)
    {
        self.running = false;
        self.position = ExecPosition::Idle;
        self.code.clear();
        self.loop_control.clear();
    }

    fn reset(&mut self)
    {
        self.reset_to_idle();
    }

    fn is_running(&self) -> bool
    {
        self.running
    }

    fn base(&self) -> u32
    {
        self.base
    }

    fn set_base(&mut self, base: i64) -> error::Result<()>
    {
        match u32::try_from(base)
        {
            Ok(base) if ( 2..=MAX_BASE ).contains(&base) =>
                {
                    self.base = base;
                    Ok(())
                },

            _ => ForthError::new_as_result(ErrorCode::Arithmetic,
                                           format!("Base {} is not between 2 and {}.", base, MAX_BASE))
        }
    }

    fn output(&mut self) -> &mut dyn Write
    {
        self.output.as_mut()
    }

    fn arguments(&self) -> &[Hash]
    {
        &self.arguments
    }

    fn set_exit_code(&mut self, code: i64)
    {
        self.exit_code = code;
    }
}


impl Interpreter for ForthState {}


/// Pull a readable message out of a caught panic.
fn panic_message(payload: &( dyn Any + Send )) -> String
{
    if let Some(message) = payload.downcast_ref::<&str>()
    {
        message.to_string()
    }
    else if let Some(message) = payload.downcast_ref::<String>()
    {
        message.clone()
    }
    else
    {
        "unknown panic".to_string()
    }
}


impl ForthState
{
    /// Create a state writing to the given output, with every native word registered.  The
    /// configuration is expected to be validated by the caller.
    pub fn new(config: RuntimeConfig, output: Box<dyn Write>) -> ForthState
    {
        let mut state = ForthState
            {
                dictionary: Dictionary::new(config.case_insensitive),

                data: BoundedStack::new(StackKind::Data, config.data_stack_size),
                code: BoundedStack::new(StackKind::Code, config.code_stack_size),
                loop_control: BoundedStack::new(StackKind::Loop, config.loop_stack_size),

                position: ExecPosition::Idle,
                base: 10,
                running: true,

                output,
                arguments: Vec::new(),
                exit_code: 0,

                last_error: None,
                fault_count: 0,

                config
            };

        register_builtin_words(&mut state);
        state
    }

    pub fn config(&self) -> &RuntimeConfig
    {
        &self.config
    }

    /// Depth of the return stack.
    pub fn call_depth(&self) -> usize
    {
        self.code.len()
    }

    pub fn loop_depth(&self) -> usize
    {
        self.loop_control.len()
    }

    pub fn set_running(&mut self, running: bool)
    {
        self.running = running;
    }

    /// Store the program's arguments in the dictionary, once, so that reading them does not add
    /// entries.
    pub fn set_arguments(&mut self, arguments: Vec<String>) -> error::Result<()>
    {
        let mut hashes = Vec::with_capacity(arguments.len());

        for argument in &arguments
        {
            hashes.push(self.dictionary.register_string(argument.as_bytes())?);
        }

        self.arguments = hashes;
        Ok(())
    }

    pub fn exit_code(&self) -> i64
    {
        self.exit_code
    }

    pub fn last_error(&self) -> Option<&ForthError>
    {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<ForthError>
    {
        self.last_error.take()
    }

    pub fn fault_count(&self) -> usize
    {
        self.fault_count
    }

    /// Put the engine back to idle with all three stacks empty.  The dictionary is kept.
    pub fn reset_to_idle(&mut self)
    {
        self.position = ExecPosition::Idle;
        self.data.clear();
        self.code.clear();
        self.loop_control.clear();
    }

    /// Record an execution fault: log it, abandon everything that was running and keep the error
    /// for the host.
    pub fn fault(&mut self, error: ForthError)
    {
        error!(code = error.code().value(), "{}", error);

        self.reset_to_idle();
        self.fault_count += 1;
        self.last_error = Some(error);
    }

    fn execute_node(&mut self, node: &WordNode) -> error::Result<()>
    {
        match node
        {
            WordNode::Call(hash)        => self.call_by_hash(*hash),
            WordNode::PushInt(value)    => self.data.push(*value),
            WordNode::PrintLiteral(text) =>
                {
                    self.output.write_all(text)?;
                    Ok(())
                },
            WordNode::PushString(hash) =>
                {
                    let length = self.dictionary
                                     .string_bytes(*hash)
                                     .map(|bytes| bytes.len())
                                     .ok_or_else(|| ForthError::new(ErrorCode::NotFound,
                                                                    format!("No string {}.", hash)))?;

                    self.data.push(StringAddress::new(*hash, 0).to_cell())?;
                    self.data.push(length as i64)
                }
        }
    }

    /// Execute one node, catching any panic raised along the way when fault trapping is on.
    fn execute_node_guarded(&mut self, node: &WordNode) -> error::Result<()>
    {
        if !self.config.trap_faults
        {
            return self.execute_node(node);
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.execute_node(node)))
        {
            Ok(result) => result,
            Err(payload) =>
                {
                    // A panic can leave any of the stacks half updated.
                    self.reset_to_idle();

                    ForthError::new_as_result(ErrorCode::RuntimeFault,
                                              format!("Fault trapped: {}.", panic_message(payload.as_ref())))
                }
        }
    }

    /// Perform one step of the running word.  Returns false when there is nothing to do.
    pub fn step(&mut self) -> error::Result<bool>
    {
        let ExecPosition::Running { word, pos } = self.position
            else
            {
                return Ok(false);
            };

        let node = match self.dictionary.find(word)
            {
                Some(Entry { kind: EntryKind::ForthWord(body), .. }) => body.get(pos).cloned(),

                _ => return ForthError::new_as_result(ErrorCode::Impossible,
                                                      format!("Running word {} has no body.", word))
            };

        match node
        {
            None => self.exit_word()?,
            Some(node) =>
                {
                    self.position = ExecPosition::Running { word, pos: pos + 1 };
                    self.execute_node_guarded(&node)?;
                }
        }

        Ok(true)
    }

    /// Step until the engine is idle again.
    pub fn run_to_completion(&mut self) -> error::Result<()>
    {
        while self.step()?
        {
        }

        Ok(())
    }

    /// Execute a node compiled from a token typed at the top level and run everything it starts.
    ///
    /// Execution faults are handled here: they are logged, the engine is reset and the fault is
    /// kept as the last error.  The only error returned is an unknown word at the top level, which
    /// the parser reports as a diagnostic without touching the stacks.
    pub fn run_node(&mut self, node: &WordNode) -> error::Result<()>
    {
        if let WordNode::Call(hash) = node
        {
            if self.dictionary.find(*hash).is_none()
            {
                return ForthError::new_as_result(ErrorCode::NotFound,
                                                 format!("Word {} is not defined.", hash));
            }
        }

        if let Err(error) = self.execute_node_guarded(node)
        {
            self.fault(error);
            return Ok(());
        }

        if let Err(error) = self.run_to_completion()
        {
            self.fault(error);
        }

        Ok(())
    }

    /// Flush whatever the output has buffered.
    pub fn flush(&mut self) -> error::Result<()>
    {
        self.output.flush()?;
        Ok(())
    }
}


impl Default for ForthState
{
    fn default() -> Self
    {
        Self::new(RuntimeConfig::default(), Box::new(std_io::stdout()))
    }
}


#[cfg(test)]
mod tests
{
    use super::*;

    fn quiet_state() -> ForthState
    {
        ForthState::new(RuntimeConfig::default(), Box::new(std_io::sink()))
    }

    struct SharedBytes(Rc<std::cell::RefCell<Vec<u8>>>);

    impl Write for SharedBytes
    {
        fn write(&mut self, buf: &[u8]) -> std_io::Result<usize>
        {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std_io::Result<()>
        {
            Ok(())
        }
    }

    #[test]
    fn calls_run_through_return_frames()
    {
        let mut state = quiet_state();
        let plus = state.dictionary().hash(b"+");

        let inner = state.dictionary_mut()
                         .insert("inner", EntryKind::ForthWord(WordBody::new(vec![ WordNode::PushInt(2),
                                                                                  WordNode::Call(plus) ])))
                         .unwrap();
        let outer = state.dictionary_mut()
                         .insert("outer", EntryKind::ForthWord(WordBody::new(vec![ WordNode::PushInt(1),
                                                                                  WordNode::Call(inner),
                                                                                  WordNode::PushInt(7) ])))
                         .unwrap();

        state.run_node(&WordNode::Call(outer)).unwrap();

        assert_eq!(state.stack(), &[ 3, 7 ]);
        assert_eq!(state.position(), ExecPosition::Idle);
        assert_eq!(state.call_depth(), 0);
        assert!(state.is_running());
    }

    #[test]
    fn constants_and_strings_are_callable()
    {
        let mut state = quiet_state();
        let answer = state.dictionary_mut().insert("answer", EntryKind::Constant(42)).unwrap();
        let text = state.dictionary_mut().register_string(b"abc").unwrap();

        state.call_by_hash(answer).unwrap();
        state.call_by_hash(text).unwrap();

        assert_eq!(state.pop().unwrap(), 3);
        assert_eq!(state.read_bytes(state.pick(0).unwrap(), 3).unwrap(), b"abc");
        assert_eq!(state.pick(1).unwrap(), 42);
    }

    #[test]
    fn literal_nodes_print_and_push_strings()
    {
        let output = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut state = ForthState::new(RuntimeConfig::default(),
                                        Box::new(SharedBytes(output.clone())));
        let text = state.dictionary_mut().register_string(b"hello").unwrap();

        state.run_node(&WordNode::PrintLiteral(b"hi ".to_vec())).unwrap();
        state.run_node(&WordNode::PushString(text)).unwrap();

        assert_eq!(output.borrow().as_slice(), b"hi ");
        assert_eq!(state.pop().unwrap(), 5);

        let address = state.pop().unwrap();
        assert_eq!(state.read_bytes(address, 5).unwrap(), b"hello");
        assert!(state.take_error().is_none());
    }

    #[test]
    fn pushing_a_missing_string_is_a_fault()
    {
        let mut state = quiet_state();
        let missing = state.dictionary_mut().allocate_unused_hash().unwrap();

        state.push(1).unwrap();
        state.run_node(&WordNode::PushString(missing)).unwrap();

        assert_eq!(state.take_error().unwrap().code(), ErrorCode::NotFound);
        assert!(state.stack().is_empty());
    }

    #[test]
    fn deferred_words_are_not_callable()
    {
        let mut state = quiet_state();
        let later = state.dictionary_mut().insert("later", EntryKind::Deferred).unwrap();

        let error = state.call_by_hash(later).unwrap_err();

        assert_eq!(error.code(), ErrorCode::InvalidCall);
        assert_eq!(error.word(), Some("later"));
    }

    #[test]
    fn faults_reset_the_engine()
    {
        let mut state = quiet_state();
        let drop = state.dictionary().hash(b"drop");
        let word = state.dictionary_mut()
                        .insert("bad", EntryKind::ForthWord(WordBody::new(vec![ WordNode::PushInt(1),
                                                                               WordNode::Call(drop),
                                                                               WordNode::Call(drop) ])))
                        .unwrap();

        state.push(5).unwrap();
        state.push(6).unwrap();
        state.run_node(&WordNode::Call(word)).unwrap();

        // The first drop removes the pushed 1, the second the 6.
        assert_eq!(state.stack(), &[ 5 ]);

        state.clear_stack();
        state.run_node(&WordNode::Call(word)).unwrap();

        let error = state.take_error().unwrap();
        assert_eq!(error.code(), ErrorCode::StackBound);
        assert_eq!(state.position(), ExecPosition::Idle);
        assert_eq!(state.fault_count(), 1);
    }

    #[test]
    fn unknown_top_level_words_do_not_reset()
    {
        let mut state = quiet_state();
        let missing = state.dictionary().hash(b"missing");

        state.push(1).unwrap();

        let error = state.run_node(&WordNode::Call(missing)).unwrap_err();

        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(state.stack(), &[ 1 ]);
        assert_eq!(state.fault_count(), 0);
    }

    #[test]
    fn panics_are_trapped()
    {
        let mut state = quiet_state();

        state.add_word("boom",
                       Rc::new(|_: &mut dyn Interpreter| -> error::Result<()> { panic!("boom") }),
                       "Always panics.",
                       " -- ");
        state.push(1).unwrap();

        let boom = state.dictionary().hash(b"boom");
        state.run_node(&WordNode::Call(boom)).unwrap();

        let error = state.take_error().unwrap();
        assert_eq!(error.code(), ErrorCode::RuntimeFault);
        assert!(error.message().contains("boom"));
        assert!(state.stack().is_empty());
    }

    #[test]
    fn exit_without_a_caller_stops_the_interpreter()
    {
        let mut state = quiet_state();

        state.exit_word().unwrap();

        assert!(!state.is_running());
    }

    #[test]
    fn base_is_bounded()
    {
        let mut state = quiet_state();

        state.set_base(16).unwrap();
        assert_eq!(state.base(), 16);

        assert_eq!(state.set_base(1).unwrap_err().code(), ErrorCode::Arithmetic);
        assert_eq!(state.set_base(37).unwrap_err().code(), ErrorCode::Arithmetic);
        assert_eq!(state.base(), 16);
    }
}
