use crate::{
    lang::hashing::Hash,
    runtime::{
        data_structures::dictionary::{Dictionary, EntryKind},
        error,
    },
};

/// What a quoted string literal turns into once its text has been read.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StringKind {
    /// `s"`: address and length are pushed.
    Stack,

    /// `."`: the text is printed.
    Print,

    /// `abort"`: the text is printed and the interpreter aborts.
    Abort,

    /// `c"`: the text is stored as a counted string and only its address is pushed.
    Counted,
}

/// The words the parser runs itself.  They always take precedence over the parser's current hook,
/// which is what lets a comment or a string appear inside a definition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompileWord {
    /// `(`
    OpenComment,

    /// `\`
    LineComment,

    /// `:`
    Colon,

    /// `:macro`
    ColonMacro,

    /// `:noname`
    ColonNoname,

    /// `;`
    SemiColon,

    Constant,

    /// `'`
    Tick,

    /// `s"`, `."`, `abort"` and `c"`.
    String(StringKind),

    /// `s\"`
    EscapedString,

    /// `.(`
    CompilePrint,

    MacroString,
    Char,
    Defer,
    Is,
    ActionOf,
    Literal,

    /// `[`
    LeftBracket,

    /// `]`
    RightBracket,

    /// A user macro; the text to expand is the entry's payload.
    Macro,
}

/// The built in compile-time words and their names.
pub const COMPILE_WORDS: &[(&str, CompileWord)] = &[
    ("(", CompileWord::OpenComment),
    ("\\", CompileWord::LineComment),
    (":", CompileWord::Colon),
    (":macro", CompileWord::ColonMacro),
    (":noname", CompileWord::ColonNoname),
    (";", CompileWord::SemiColon),
    ("constant", CompileWord::Constant),
    ("'", CompileWord::Tick),
    ("s\"", CompileWord::String(StringKind::Stack)),
    (".\"", CompileWord::String(StringKind::Print)),
    ("abort\"", CompileWord::String(StringKind::Abort)),
    ("c\"", CompileWord::String(StringKind::Counted)),
    ("s\\\"", CompileWord::EscapedString),
    (".(", CompileWord::CompilePrint),
    ("macro-string", CompileWord::MacroString),
    ("char", CompileWord::Char),
    ("defer", CompileWord::Defer),
    ("is", CompileWord::Is),
    ("action-of", CompileWord::ActionOf),
    ("literal", CompileWord::Literal),
    ("[", CompileWord::LeftBracket),
    ("]", CompileWord::RightBracket),
];

/// Register every built in compile-time word.
pub fn register_compile_time_words(dictionary: &mut Dictionary) -> error::Result<()> {
    for (name, word) in COMPILE_WORDS {
        let _ = dictionary.insert(
            name,
            EntryKind::CompileTime {
                word: *word,
                payload: None,
            },
        )?;
    }

    Ok(())
}

/// Install a macro: a compile-time word whose text is fed back to the parser wherever the macro's
/// name appears.
pub fn register_macro(
    dictionary: &mut Dictionary,
    name: &[u8],
    text: &[u8],
) -> error::Result<Hash> {
    dictionary.insert_bytes(
        name,
        EntryKind::CompileTime {
            word: CompileWord::Macro,
            payload: Some(text.to_vec()),
        },
    )
}
