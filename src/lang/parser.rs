use crate::{
    lang::{
        code::{WordNode, format_number},
        compile_words::{CompileWord, StringKind, register_macro},
        compiler::{
            classify_token, compile_and_register, compile_constant, is_delimiter, register_defer,
        },
        escapes::{decode_escapes, ends_in_escape, to_counted},
        hashing::Hash,
    },
    runtime::{
        config::RuntimeConfig,
        data_structures::{
            dictionary::{Entry, EntryKind},
            stack::{BoundedStack, StackKind},
        },
        error::{self, ErrorCode, ForthError},
        interpreter::{
            ExecutionControl, InterpreterStack, WordManagement, forth_state::ForthState,
        },
    },
};
use std::mem;
use tracing::{debug, error};

/// What happens to a token once it is complete.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NewWordHook {
    /// Compile the token into a single node and execute it right away.
    RunToken,

    /// Append the token to the definition being built.
    AccumulateDefinition,

    /// The token names the definition that follows.
    DefinitionName,

    /// The token names a macro; the macro's text runs up to the next `;`.
    MacroName,

    /// The token names a constant taking the top of the data stack.
    ConstantName,

    /// Replace the token with its execution token.
    ExecToken,

    /// The token names a macro whose text is the string on the data stack.
    StringMacroName,

    /// Replace the token with the code of its first character.
    CharLiteral,

    DeferName,

    /// The token names a word bound to the execution token on the data stack.
    IsName,

    /// Replace the token with the code to fetch what the named deferred word is bound to.
    ActionOfName,
}

/// What happens to a block of text read up to a terminating byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EndBlockHook {
    Unset,
    DiscardComment,
    RegisterDefinition,
    RegisterNoname,
    RegisterMacro,
    RegisterString(StringKind),
    RegisterEscapedString,
    PrintBlock,
}

/// A hook saved while a construct overrides it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SavedHook {
    NewWord(NewWordHook),
    EndBlock(EndBlockHook),
}

fn token_name(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}

/// The incremental parser.  It is fed one byte at a time and never recurses to handle nested
/// constructs; a comment inside a definition or a string inside a macro is handled by saving the
/// active hook on the hook stack and restoring it when the inner construct closes.
pub struct Parser {
    /// The token being read, or the text of a block while waiting for its terminator.
    token: Vec<u8>,

    /// Set once the token buffer has dropped input, so the overflow is reported once.
    truncated: bool,

    /// The text of the definition being accumulated.
    definition: Vec<u8>,

    /// The name of the definition or macro being built, as typed.  `None` when the name was
    /// rejected.
    custom_name: Option<Vec<u8>>,

    /// When set, bytes are collected into a block until this byte is seen.
    wait_until: Option<u8>,

    new_word_hook: NewWordHook,
    end_block_hook: EndBlockHook,
    hooks: BoundedStack<SavedHook>,

    in_word: bool,
    in_definition: bool,

    buffer_size: usize,
    name_size: usize,

    macro_depth: usize,
    max_macro_depth: usize,

    last_diagnostic: Option<ForthError>,
}

impl Parser {
    pub fn new(config: &RuntimeConfig) -> Parser {
        Parser {
            token: Vec::with_capacity(config.parser_buffer_size),
            truncated: false,
            definition: Vec::new(),
            custom_name: None,
            wait_until: None,
            new_word_hook: NewWordHook::RunToken,
            end_block_hook: EndBlockHook::Unset,
            hooks: BoundedStack::new(StackKind::Hook, config.hook_stack_size),
            in_word: false,
            in_definition: false,
            buffer_size: config.parser_buffer_size,
            name_size: config.custom_name_size,
            macro_depth: 0,
            max_macro_depth: config.max_macro_depth,
            last_diagnostic: None,
        }
    }

    /// Feed one byte of source.
    pub fn feed(&mut self, state: &mut ForthState, byte: u8) {
        if let Some(terminator) = self.wait_until {
            if byte == terminator {
                self.wait_until = None;

                let block = self.take_token();
                self.end_block(state, block);
            } else {
                self.append(byte);
            }

            return;
        }

        if is_delimiter(byte) {
            if self.in_word {
                self.in_word = false;

                let token = self.take_token();
                self.complete_token(state, token);
            }

            return;
        }

        self.in_word = true;
        self.append(byte);
    }

    pub fn feed_bytes(&mut self, state: &mut ForthState, bytes: &[u8]) {
        for byte in bytes {
            self.feed(state, *byte);
        }
    }

    /// Is a token currently being read or accumulated somewhere other than the top level?
    pub fn is_compiling(&self) -> bool {
        self.new_word_hook != NewWordHook::RunToken
    }

    pub fn in_definition(&self) -> bool {
        self.in_definition
    }

    pub fn hook_depth(&self) -> usize {
        self.hooks.len()
    }

    /// True when every construct that was opened has been closed again.
    pub fn is_balanced(&self) -> bool {
        self.hooks.is_empty()
            && self.wait_until.is_none()
            && !self.in_definition
            && self.new_word_hook == NewWordHook::RunToken
    }

    pub fn new_word_hook(&self) -> NewWordHook {
        self.new_word_hook
    }

    pub fn end_block_hook(&self) -> EndBlockHook {
        self.end_block_hook
    }

    pub fn last_diagnostic(&self) -> Option<&ForthError> {
        self.last_diagnostic.as_ref()
    }

    pub fn take_diagnostic(&mut self) -> Option<ForthError> {
        self.last_diagnostic.take()
    }

    /// Abandon whatever construct is open and go back to running tokens at the top level.  This is
    /// the way out after malformed input has left the hooks unbalanced.  The last diagnostic is
    /// kept.
    pub fn reset(&mut self) {
        self.token.clear();
        self.truncated = false;
        self.definition.clear();
        self.custom_name = None;
        self.wait_until = None;
        self.new_word_hook = NewWordHook::RunToken;
        self.end_block_hook = EndBlockHook::Unset;
        self.hooks.clear();
        self.in_word = false;
        self.in_definition = false;
        self.macro_depth = 0;
    }

    fn diagnose(&mut self, error: ForthError) {
        error!("{}", error);
        self.last_diagnostic = Some(error);
    }

    fn report(&mut self, result: error::Result<()>) {
        if let Err(error) = result {
            self.diagnose(error);
        }
    }

    fn append(&mut self, byte: u8) {
        if self.token.len() >= self.buffer_size {
            if !self.truncated {
                self.truncated = true;
                self.diagnose(ForthError::new(
                    ErrorCode::NoMemory,
                    format!(
                        "Parser buffer of {} bytes is full, input dropped.",
                        self.buffer_size
                    ),
                ));
            }

            return;
        }

        self.token.push(byte);
    }

    fn take_token(&mut self) -> Vec<u8> {
        self.truncated = false;
        mem::take(&mut self.token)
    }

    fn save_new_word_hook(&mut self) {
        let result = self.hooks.push(SavedHook::NewWord(self.new_word_hook));
        self.report(result);
    }

    fn save_end_block_hook(&mut self) {
        let result = self.hooks.push(SavedHook::EndBlock(self.end_block_hook));
        self.report(result);
    }

    fn restore_new_word_hook(&mut self) {
        match self.hooks.pop() {
            Ok(SavedHook::NewWord(hook)) => self.new_word_hook = hook,
            Ok(SavedHook::EndBlock(_)) => self.diagnose(ForthError::new(
                ErrorCode::Impossible,
                "Unbalanced hooks, found an end of block action where a word action was saved."
                    .to_string(),
            )),
            Err(error) => self.diagnose(error),
        }
    }

    fn restore_end_block_hook(&mut self) {
        match self.hooks.pop() {
            Ok(SavedHook::EndBlock(hook)) => self.end_block_hook = hook,
            Ok(SavedHook::NewWord(_)) => self.diagnose(ForthError::new(
                ErrorCode::Impossible,
                "Unbalanced hooks, found a word action where an end of block action was saved."
                    .to_string(),
            )),
            Err(error) => self.diagnose(error),
        }
    }

    /// A completed token runs a compile-time word if it names one, otherwise it goes to the current
    /// new word hook.
    fn complete_token(&mut self, state: &mut ForthState, token: Vec<u8>) {
        let compile_word = {
            let dictionary = state.dictionary();
            let hash = dictionary.hash(&token);

            match dictionary.resolve(hash, state.config().max_alias_hops) {
                Ok((
                    _,
                    Entry {
                        kind: EntryKind::CompileTime { word, payload },
                        ..
                    },
                )) => Some((*word, payload.clone())),
                _ => None,
            }
        };

        match compile_word {
            Some((word, payload)) => self.run_compile_word(state, word, payload, &token),
            None => self.run_new_word_hook(state, token),
        }
    }

    fn run_new_word_hook(&mut self, state: &mut ForthState, token: Vec<u8>) {
        match self.new_word_hook {
            NewWordHook::RunToken => self.run_token(state, &token),

            NewWordHook::AccumulateDefinition => self.accumulate(&token),

            NewWordHook::DefinitionName => self.start_definition(&token),

            NewWordHook::MacroName => {
                self.start_definition(&token);
                self.wait_until = Some(b';');
            }

            NewWordHook::ConstantName => {
                self.new_word_hook = NewWordHook::RunToken;

                let result = compile_constant(state, &token).map(|_| ());
                self.report(result);
            }

            NewWordHook::ExecToken => {
                self.restore_new_word_hook();

                let hash = state.dictionary().hash(&token);
                self.hook_number(state, hash.to_cell());
            }

            NewWordHook::StringMacroName => {
                self.restore_new_word_hook();

                let result = self.register_string_macro(state, &token);
                self.report(result);
            }

            NewWordHook::CharLiteral => {
                self.restore_new_word_hook();

                if let Some(first) = token.first() {
                    self.hook_number(state, *first as i64);
                }
            }

            NewWordHook::DeferName => {
                self.restore_new_word_hook();

                let result = register_defer(state, &token).map(|_| ());
                self.report(result);
            }

            NewWordHook::IsName => {
                self.restore_new_word_hook();

                let result = self.bind_deferred(state, &token);
                self.report(result);
            }

            NewWordHook::ActionOfName => {
                self.restore_new_word_hook();
                self.action_of(state, &token);
            }
        }
    }

    /// Feed a number to the current new word hook as if it had been typed.
    fn hook_number(&mut self, state: &mut ForthState, value: i64) {
        let text = format_number(value, state.base());
        self.run_new_word_hook(state, text.into_bytes());
    }

    /// Feed a word to the current new word hook as if it had been typed.
    fn hook_str(&mut self, state: &mut ForthState, text: &str) {
        self.run_new_word_hook(state, text.as_bytes().to_vec());
    }

    fn run_token(&mut self, state: &mut ForthState, token: &[u8]) {
        let node = classify_token(token, state.base(), state.dictionary());

        if state.run_node(&node).is_err() {
            let name = token_name(token);

            self.diagnose(
                ForthError::new(
                    ErrorCode::NotFound,
                    format!("Calling word {} which is not defined.", name),
                )
                .with_word(&name),
            );
        }
    }

    fn accumulate(&mut self, token: &[u8]) {
        if self.definition.len() + token.len() + 1 > self.buffer_size {
            self.diagnose(ForthError::new(
                ErrorCode::NoMemory,
                format!(
                    "Definition is longer than {} bytes, {} dropped.",
                    self.buffer_size,
                    token_name(token)
                ),
            ));
            return;
        }

        self.definition.extend_from_slice(token);
        self.definition.push(b' ');
    }

    fn checked_name(&mut self, token: &[u8]) -> Option<Vec<u8>> {
        if token.len() > self.name_size {
            self.diagnose(ForthError::new(
                ErrorCode::NoMemory,
                format!(
                    "Name {} is longer than {} bytes.",
                    token_name(token),
                    self.name_size
                ),
            ));
            return None;
        }

        Some(token.to_vec())
    }

    fn start_definition(&mut self, token: &[u8]) {
        self.custom_name = self.checked_name(token);
        self.definition.clear();
        self.new_word_hook = NewWordHook::AccumulateDefinition;
    }

    /// Reject a construct that can not be nested in a definition.
    fn rejected_in_definition(&mut self, token: &[u8]) -> bool {
        if self.in_definition {
            self.diagnose(ForthError::new(
                ErrorCode::InvalidCall,
                format!(
                    "Using {} in a definition is not allowed.",
                    token_name(token)
                ),
            ));
        }

        self.in_definition
    }

    /// Read text up to the terminator, then hand it to the given hook.
    fn wait_for(&mut self, terminator: u8, hook: EndBlockHook) {
        self.wait_until = Some(terminator);
        self.save_end_block_hook();
        self.end_block_hook = hook;
    }

    fn set_new_word_hook_saving(&mut self, hook: NewWordHook) {
        self.save_new_word_hook();
        self.new_word_hook = hook;
    }

    fn run_compile_word(
        &mut self,
        state: &mut ForthState,
        word: CompileWord,
        payload: Option<Vec<u8>>,
        token: &[u8],
    ) {
        match word {
            CompileWord::OpenComment => self.wait_for(b')', EndBlockHook::DiscardComment),

            CompileWord::LineComment => self.wait_for(b'\n', EndBlockHook::DiscardComment),

            CompileWord::Colon => {
                if self.rejected_in_definition(token) {
                    return;
                }

                self.in_definition = true;
                self.custom_name = None;
                self.new_word_hook = NewWordHook::DefinitionName;
                self.save_end_block_hook();
                self.end_block_hook = EndBlockHook::RegisterDefinition;
            }

            CompileWord::ColonMacro => {
                if self.rejected_in_definition(token) {
                    return;
                }

                self.save_end_block_hook();
                self.set_new_word_hook_saving(NewWordHook::MacroName);
                self.end_block_hook = EndBlockHook::RegisterMacro;
            }

            CompileWord::ColonNoname => {
                if self.rejected_in_definition(token) {
                    return;
                }

                self.in_definition = true;
                self.custom_name = None;
                self.definition.clear();
                self.new_word_hook = NewWordHook::AccumulateDefinition;
                self.save_end_block_hook();
                self.end_block_hook = EndBlockHook::RegisterNoname;
            }

            CompileWord::SemiColon => {
                if !self.in_definition {
                    self.diagnose(ForthError::new(
                        ErrorCode::InvalidCall,
                        "Using ; outside of a definition is not allowed.".to_string(),
                    ));
                    return;
                }

                self.in_definition = false;
                self.end_block(state, Vec::new());
                self.restore_end_block_hook();
                self.new_word_hook = NewWordHook::RunToken;
            }

            CompileWord::Constant => {
                if !self.rejected_in_definition(token) {
                    self.new_word_hook = NewWordHook::ConstantName;
                }
            }

            CompileWord::Tick => self.set_new_word_hook_saving(NewWordHook::ExecToken),

            CompileWord::String(kind) => self.wait_for(b'"', EndBlockHook::RegisterString(kind)),

            CompileWord::EscapedString => self.wait_for(b'"', EndBlockHook::RegisterEscapedString),

            CompileWord::CompilePrint => self.wait_for(b')', EndBlockHook::PrintBlock),

            CompileWord::MacroString => {
                if !self.rejected_in_definition(token) {
                    self.set_new_word_hook_saving(NewWordHook::StringMacroName);
                }
            }

            CompileWord::Char => self.set_new_word_hook_saving(NewWordHook::CharLiteral),

            CompileWord::Defer => {
                if !self.rejected_in_definition(token) {
                    self.set_new_word_hook_saving(NewWordHook::DeferName);
                }
            }

            CompileWord::Is => self.set_new_word_hook_saving(NewWordHook::IsName),

            CompileWord::ActionOf => self.set_new_word_hook_saving(NewWordHook::ActionOfName),

            CompileWord::Literal => match state.pop() {
                Ok(value) => self.hook_number(state, value),
                Err(error) => self.diagnose(error.with_word("literal")),
            },

            CompileWord::LeftBracket => self.set_new_word_hook_saving(NewWordHook::RunToken),

            CompileWord::RightBracket => self.restore_new_word_hook(),

            CompileWord::Macro => match payload {
                Some(text) => self.expand_macro(state, &text),
                None => self.diagnose(ForthError::new(
                    ErrorCode::Impossible,
                    format!("Macro {} has no text.", token_name(token)),
                )),
            },
        }
    }

    /// A block of text is complete, run the end of block hook on it.
    fn end_block(&mut self, state: &mut ForthState, block: Vec<u8>) {
        match self.end_block_hook {
            EndBlockHook::Unset => self.diagnose(ForthError::new(
                ErrorCode::Impossible,
                "No end of block action is set.".to_string(),
            )),

            EndBlockHook::DiscardComment => self.restore_end_block_hook(),

            EndBlockHook::RegisterDefinition => {
                let result = self.register_definition(state);
                self.report(result);
            }

            EndBlockHook::RegisterNoname => {
                let result = self.register_noname(state);
                self.report(result);
            }

            EndBlockHook::RegisterMacro => {
                let result = self.register_block_macro(state, &block);
                self.report(result);

                self.restore_new_word_hook();
                self.restore_end_block_hook();
            }

            EndBlockHook::RegisterString(kind) => {
                let result = self.register_string(state, &block, kind);
                self.report(result);

                self.restore_end_block_hook();
            }

            EndBlockHook::RegisterEscapedString => {
                if ends_in_escape(&block) {
                    // The quote was escaped, keep it and read on.
                    self.token = block;
                    self.append(b'"');
                    self.wait_until = Some(b'"');
                    return;
                }

                let result = match decode_escapes(&block) {
                    Ok(decoded) => self.register_string(state, &decoded, StringKind::Stack),
                    Err(error) => Err(error),
                };
                self.report(result);

                self.restore_end_block_hook();
            }

            EndBlockHook::PrintBlock => {
                let result = state
                    .output()
                    .write_all(&block)
                    .map_err(ForthError::from);
                self.report(result);

                self.restore_end_block_hook();
            }
        }
    }

    fn register_definition(&mut self, state: &mut ForthState) -> error::Result<()> {
        let text = mem::take(&mut self.definition);

        let Some(name) = self.custom_name.take() else {
            return Ok(());
        };

        let base = state.base();
        compile_and_register(state.dictionary_mut(), &name, None, &text, base)?;

        Ok(())
    }

    fn register_noname(&mut self, state: &mut ForthState) -> error::Result<()> {
        let text = mem::take(&mut self.definition);
        let base = state.base();

        let hash = state.dictionary_mut().allocate_unused_hash()?;
        compile_and_register(state.dictionary_mut(), b"noname", Some(hash), &text, base)?;

        state.push(hash.to_cell())
    }

    fn register_block_macro(&mut self, state: &mut ForthState, block: &[u8]) -> error::Result<()> {
        let Some(name) = self.custom_name.take() else {
            return Ok(());
        };

        debug!("Registering macro {}.", token_name(&name));

        register_macro(state.dictionary_mut(), &name, block)?;
        Ok(())
    }

    fn register_string_macro(&mut self, state: &mut ForthState, token: &[u8]) -> error::Result<()> {
        let length = state.pop_as_usize()?;
        let address = state.pop()?;
        let text = state.read_bytes(address, length)?.to_vec();

        if let Some(name) = self.checked_name(token) {
            register_macro(state.dictionary_mut(), &name, &text)?;
        }

        Ok(())
    }

    /// Run a literal node right away.  Only tokens typed at the top level get here.
    fn run_literal(&mut self, state: &mut ForthState, node: WordNode) {
        let result = state.run_node(&node);
        self.report(result);
    }

    /// Store a string literal and feed the words that make use of it.
    ///
    /// At the top level the literal runs as a single node, and text that is only printed is never
    /// stored.  Inside a definition the string's execution token is compiled in, followed by the
    /// words that use it.
    fn register_string(
        &mut self,
        state: &mut ForthState,
        text: &[u8],
        kind: StringKind,
    ) -> error::Result<()> {
        let immediate = self.new_word_hook == NewWordHook::RunToken;
        let printed_now = immediate && matches!(kind, StringKind::Print | StringKind::Abort);

        if printed_now {
            self.run_literal(state, WordNode::PrintLiteral(text.to_vec()));
        } else {
            let stored = match kind {
                StringKind::Counted => to_counted(text)?,
                _ => text.to_vec(),
            };

            let hash = state.dictionary_mut().register_string(&stored)?;

            if immediate {
                self.run_literal(state, WordNode::PushString(hash));
            } else {
                self.hook_number(state, hash.to_cell());
                self.hook_str(state, "execute");
            }
        }

        match kind {
            StringKind::Stack => {}
            StringKind::Print | StringKind::Abort => {
                if !printed_now {
                    self.hook_str(state, "type");
                }

                if kind == StringKind::Abort {
                    self.hook_str(state, "cr");
                    self.hook_str(state, "abort");
                }
            }
            // Only the address of a counted string is kept.
            StringKind::Counted => self.hook_str(state, "drop"),
        }

        Ok(())
    }

    fn bind_deferred(&mut self, state: &mut ForthState, token: &[u8]) -> error::Result<()> {
        let name = token_name(token);
        let cell = state.pop()?;

        let target = Hash::from_cell(cell).ok_or_else(|| {
            ForthError::new(
                ErrorCode::InvalidCall,
                format!("{} is not an execution token.", cell),
            )
            .with_word(&name)
        })?;

        let word_hash = state.dictionary().hash(token);
        state.dictionary_mut().set_alias(word_hash, target, &name)
    }

    fn action_of(&mut self, state: &mut ForthState, token: &[u8]) {
        let hash = state.dictionary().hash(token);

        let is_deferred = matches!(
            state.dictionary().find(hash).map(|entry| &entry.kind),
            Some(EntryKind::Alias(_)) | Some(EntryKind::Deferred)
        );

        if !is_deferred {
            self.diagnose(ForthError::new(
                ErrorCode::InvalidCall,
                format!(
                    "Using action-of on {} which is not a deferred word.",
                    token_name(token)
                ),
            ));
        }

        self.hook_number(state, hash.to_cell());
        self.hook_str(state, "defer@");
    }

    /// Feed a macro's text back into the parser, followed by a space so that its last token can
    /// not run into the next one.
    fn expand_macro(&mut self, state: &mut ForthState, text: &[u8]) {
        if self.macro_depth >= self.max_macro_depth {
            self.diagnose(ForthError::new(
                ErrorCode::StackBound,
                format!("Macros nested deeper than {} levels.", self.max_macro_depth),
            ));
            return;
        }

        self.macro_depth += 1;

        for byte in text {
            self.feed(state, *byte);
        }

        self.feed(state, b' ');
        self.macro_depth -= 1;
    }
}
