use crate::{
    lang::{
        code::{WordBody, WordNode, parse_number},
        hashing::Hash,
    },
    runtime::{
        data_structures::dictionary::{Dictionary, EntryKind},
        error,
        interpreter::Interpreter,
    },
};
use tracing::debug;

/// Bytes that separate tokens.
pub const DELIMITERS: &[u8] = b" \t\n\r";

pub fn is_delimiter(byte: u8) -> bool {
    DELIMITERS.contains(&byte)
}

/// Split text into its whitespace separated tokens.
pub fn split_tokens(text: &[u8]) -> impl Iterator<Item = &[u8]> {
    text.split(|byte| is_delimiter(*byte))
        .filter(|token| !token.is_empty())
}

/// Decide what a single token compiles to.
///
/// A token naming a word already in the dictionary is a call.  Otherwise a token that reads as a
/// number in the given base becomes a literal, and anything else is a call that will be resolved
/// when it runs, which is what allows recursion and late bound words.
pub fn classify_token(token: &[u8], base: u32, dictionary: &Dictionary) -> WordNode {
    let hash = dictionary.hash(token);

    if dictionary.find(hash).is_some() {
        return WordNode::Call(hash);
    }

    match parse_number(token, base) {
        Some(value) => WordNode::PushInt(value),
        None => WordNode::Call(hash),
    }
}

/// Compile a run of tokens into a word body, one node per token.
pub fn compile_sequence<'a>(
    tokens: impl IntoIterator<Item = &'a [u8]>,
    base: u32,
    dictionary: &Dictionary,
) -> WordBody {
    let nodes = tokens
        .into_iter()
        .map(|token| classify_token(token, base, dictionary))
        .collect();

    WordBody::new(nodes)
}

/// Compile the text of a definition and install it.  The word is bound under the hash of its name,
/// or under the forced hash when one is given, which is how anonymous words get their identity
/// before they exist.
pub fn compile_and_register(
    dictionary: &mut Dictionary,
    name: &[u8],
    forced_hash: Option<Hash>,
    text: &[u8],
    base: u32,
) -> error::Result<Hash> {
    let body = compile_sequence(split_tokens(text), base, dictionary);

    debug!(
        "Compiled {} into {} nodes.",
        String::from_utf8_lossy(name),
        body.len()
    );

    match forced_hash {
        Some(hash) => {
            dictionary.insert_with_hash(hash, None, EntryKind::ForthWord(body))?;
            Ok(hash)
        }

        None => dictionary.insert_bytes(name, EntryKind::ForthWord(body)),
    }
}

/// Bind the value on top of the data stack to a name.
pub fn compile_constant(interpreter: &mut dyn Interpreter, name: &[u8]) -> error::Result<Hash> {
    let value = interpreter.pop()?;

    interpreter
        .dictionary_mut()
        .insert_bytes(name, EntryKind::Constant(value))
}

/// Declare a word whose behaviour is bound later with `is`.
pub fn register_defer(interpreter: &mut dyn Interpreter, name: &[u8]) -> error::Result<Hash> {
    interpreter
        .dictionary_mut()
        .insert_bytes(name, EntryKind::Deferred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{
        config::RuntimeConfig,
        data_structures::dictionary::Entry,
        interpreter::{InterpreterStack, WordManagement, forth_state::ForthState},
    };

    #[test]
    fn tokens_split_on_all_delimiters() {
        let tokens: Vec<&[u8]> = split_tokens(b"  1\t2\r\n+  . ").collect();

        assert_eq!(tokens, vec![&b"1"[..], b"2", b"+", b"."]);
    }

    #[test]
    fn known_words_win_over_numbers() {
        let mut dictionary = Dictionary::new(true);
        let face = dictionary.insert("face", EntryKind::Constant(1)).unwrap();

        assert_eq!(classify_token(b"face", 16, &dictionary), WordNode::Call(face));
        assert_eq!(classify_token(b"beef", 16, &dictionary), WordNode::PushInt(0xbeef));
        assert_eq!(
            classify_token(b"beef", 10, &dictionary),
            WordNode::Call(dictionary.hash(b"beef"))
        );
    }

    #[test]
    fn sequences_compile_in_order() {
        let dictionary = Dictionary::new(true);
        let body = compile_sequence(split_tokens(b"1 2 +"), 10, &dictionary);

        assert_eq!(
            body.nodes(),
            &[
                WordNode::PushInt(1),
                WordNode::PushInt(2),
                WordNode::Call(dictionary.hash(b"+"))
            ]
        );
    }

    #[test]
    fn forced_hashes_leave_no_name() {
        let mut dictionary = Dictionary::new(true);
        let hash = dictionary.allocate_unused_hash().unwrap();

        let registered =
            compile_and_register(&mut dictionary, b"noname", Some(hash), b"1 2", 10).unwrap();

        assert_eq!(registered, hash);
        assert!(matches!(
            dictionary.find(hash),
            Some(Entry {
                name: None,
                kind: EntryKind::ForthWord(_),
                ..
            })
        ));
        assert!(dictionary.find_name("noname").is_none());
    }

    #[test]
    fn constants_take_the_top_of_the_stack() {
        let mut state = ForthState::new(RuntimeConfig::default(), Box::new(std::io::sink()));

        state.push(99).unwrap();
        let hash = compile_constant(&mut state, b"limit").unwrap();

        assert!(state.stack().is_empty());
        assert!(matches!(
            state.dictionary().find(hash).map(|entry| &entry.kind),
            Some(EntryKind::Constant(99))
        ));
        assert!(compile_constant(&mut state, b"empty").is_err());
    }
}
