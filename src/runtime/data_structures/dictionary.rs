use crate::{
    lang::{
        code::WordBody,
        compile_words::CompileWord,
        hashing::{Hash, SPECIAL_HASH_BIT, hash_name},
    },
    runtime::{
        error::{self, ErrorCode, ForthError},
        interpreter::NativeWord,
    },
};
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

/// What a dictionary entry holds.
#[derive(Clone, PartialEq, Debug)]
pub enum EntryKind {
    /// A word implemented in Rust.
    Native(NativeWord),

    /// A word compiled from Forth source.
    ForthWord(WordBody),

    /// A word that runs inside the parser.  Macros carry their source text as the payload.
    CompileTime {
        word: CompileWord,
        payload: Option<Vec<u8>>,
    },

    /// A value pushed when the word is called.
    Constant(i64),

    /// Bytes addressable by Forth code, usually from a string literal.
    String(Vec<u8>),

    /// A redirection to another entry.
    Alias(Hash),

    /// A word declared with `defer` that has not been bound with `is` yet.
    Deferred,
}

impl EntryKind {
    /// Short name of the kind, for listings and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Native(_) => "native",
            EntryKind::ForthWord(_) => "forth",
            EntryKind::CompileTime { payload: None, .. } => "compile",
            EntryKind::CompileTime { payload: Some(_), .. } => "macro",
            EntryKind::Constant(_) => "constant",
            EntryKind::String(_) => "string",
            EntryKind::Alias(_) => "alias",
            EntryKind::Deferred => "deferred",
        }
    }
}

/// A dictionary record: the entry's identity, its name when it has one, and its payload.
#[derive(Clone, PartialEq, Debug)]
pub struct Entry {
    pub hash: Hash,
    pub name: Option<String>,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(hash: Hash, name: Option<&str>, kind: EntryKind) -> Entry {
        Entry {
            hash,
            name: name.map(str::to_string),
            kind,
        }
    }

    /// The name if known, otherwise the printed hash.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.hash.to_string(),
        }
    }
}

/// The interpreter's symbol table.  Entries are keyed by hash and each entry exclusively owns its
/// payload; replacing an entry drops the old payload.
pub struct Dictionary {
    entries: HashMap<Hash, Entry>,
    case_insensitive: bool,
    next_special: u32,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new(true)
    }
}

/// List the named words, sorted by name.  Strings and anonymous words are not shown.
impl Display for Dictionary {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        let mut named: Vec<(&String, &Entry)> = self
            .entries
            .values()
            .filter_map(|entry| entry.name.as_ref().map(|name| (name, entry)))
            .collect();

        named.sort_by(|a, b| a.0.cmp(b.0));

        let max_size = named.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

        writeln!(formatter, "{} words defined.\n", named.len())?;

        for (name, entry) in named {
            write!(formatter, "{:width$}  {:8}", name, entry.kind.label(), width = max_size)?;

            match &entry.kind {
                EntryKind::Native(native) => writeln!(
                    formatter,
                    "  ( {} )  {}",
                    native.signature(),
                    native.description()
                )?,
                EntryKind::Constant(value) => writeln!(formatter, "  = {}", value)?,
                _ => writeln!(formatter)?,
            }
        }

        Ok(())
    }
}

impl Dictionary {
    pub fn new(case_insensitive: bool) -> Dictionary {
        Dictionary {
            entries: HashMap::new(),
            case_insensitive,
            next_special: SPECIAL_HASH_BIT,
        }
    }

    /// Hash a name the way this dictionary does.
    pub fn hash(&self, name: &[u8]) -> Hash {
        hash_name(name, self.case_insensitive)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup.  Aliases are returned as they are.
    pub fn find(&self, hash: Hash) -> Option<&Entry> {
        self.entries.get(&hash)
    }

    pub fn find_name(&self, name: &str) -> Option<&Entry> {
        self.find(self.hash(name.as_bytes()))
    }

    /// Follow alias links until a non-alias entry is found.  The chase is bounded so that a cycle
    /// is reported rather than looping forever.
    pub fn resolve(&self, hash: Hash, max_hops: usize) -> error::Result<(Hash, &Entry)> {
        let mut current = hash;

        for _ in 0..=max_hops {
            let Some(entry) = self.find(current) else {
                return ForthError::new_as_result(
                    ErrorCode::NotFound,
                    format!("Word {} is not defined.", current),
                );
            };

            match entry.kind {
                EntryKind::Alias(target) => current = target,
                _ => return Ok((current, entry)),
            }
        }

        ForthError::new_as_result(
            ErrorCode::InvalidCall,
            format!("Alias chain from {} is too long or cyclic.", hash),
        )
    }

    /// Add an entry under the hash of its name, replacing any previous entry with that hash.
    pub fn insert(&mut self, name: &str, kind: EntryKind) -> error::Result<Hash> {
        self.insert_bytes(name.as_bytes(), kind)
    }

    /// Add an entry named by raw source bytes.  The hash is taken from the bytes as typed, the
    /// stored name is only for display.
    pub fn insert_bytes(&mut self, name: &[u8], kind: EntryKind) -> error::Result<Hash> {
        let hash = self.hash(name);
        let display = String::from_utf8_lossy(name);

        self.insert_with_hash(hash, Some(display.as_ref()), kind)?;
        Ok(hash)
    }

    /// Add an entry under an explicit hash.
    pub fn insert_with_hash(
        &mut self,
        hash: Hash,
        name: Option<&str>,
        kind: EntryKind,
    ) -> error::Result<()> {
        let _ = self.entries.insert(hash, Entry::new(hash, name, kind));
        Ok(())
    }

    /// Make `word_hash` an alias of `target`.  Used by `is` to bind deferred words.
    pub fn set_alias(&mut self, word_hash: Hash, target: Hash, name: &str) -> error::Result<()> {
        if word_hash == target {
            return ForthError::new_as_result(
                ErrorCode::InvalidCall,
                format!("Can not make {} an alias of itself.", name),
            );
        }

        self.insert_with_hash(word_hash, Some(name), EntryKind::Alias(target))
    }

    /// Hand out a hash that no name can produce and that is not in use yet.
    pub fn allocate_unused_hash(&mut self) -> error::Result<Hash> {
        loop {
            let candidate = Hash::from_raw(self.next_special);

            self.next_special = match self.next_special.checked_add(1) {
                Some(next) => next,
                None => {
                    return ForthError::new_as_result(
                        ErrorCode::ConfigError,
                        "The special hash space is exhausted.".to_string(),
                    );
                }
            };

            if !self.entries.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Store a copy of the bytes under a fresh hash and return that hash.
    pub fn register_string(&mut self, bytes: &[u8]) -> error::Result<Hash> {
        let hash = self.allocate_unused_hash()?;

        self.insert_with_hash(hash, None, EntryKind::String(bytes.to_vec()))?;
        Ok(hash)
    }

    /// The bytes of a string entry.
    pub fn string_bytes(&self, hash: Hash) -> Option<&[u8]> {
        match self.find(hash) {
            Some(Entry {
                kind: EntryKind::String(bytes),
                ..
            }) => Some(bytes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_after_insert() {
        let mut dictionary = Dictionary::new(true);
        let hash = dictionary.insert("answer", EntryKind::Constant(42)).unwrap();

        let expected = Entry::new(hash, Some("answer"), EntryKind::Constant(42));
        assert!(dictionary.find(hash) == Some(&expected));
        assert!(dictionary.find_name("ANSWER") == Some(&expected));
    }

    #[test]
    fn names_that_are_not_utf8_keep_their_bytes() {
        let mut dictionary = Dictionary::new(true);
        let hash = dictionary.insert_bytes(b"caf\xe9", EntryKind::Constant(1)).unwrap();

        assert_eq!(hash, dictionary.hash(b"caf\xe9"));
        assert_ne!(hash, dictionary.hash("caf\u{fffd}".as_bytes()));
        assert_eq!(dictionary.find(hash).unwrap().name.as_deref(), Some("caf\u{fffd}"));
    }

    #[test]
    fn case_sensitive_dictionaries_keep_cases_apart() {
        let mut dictionary = Dictionary::new(false);
        dictionary.insert("Answer", EntryKind::Constant(1)).unwrap();

        assert!(dictionary.find_name("answer").is_none());
        assert!(dictionary.find_name("Answer").is_some());
    }

    #[test]
    fn insert_replaces_the_previous_entry() {
        let mut dictionary = Dictionary::new(true);
        let first = dictionary.insert("x", EntryKind::Constant(1)).unwrap();
        let second = dictionary.insert("x", EntryKind::Constant(2)).unwrap();

        assert_eq!(first, second);
        assert_eq!(dictionary.len(), 1);
        assert!(matches!(dictionary.find(first).unwrap().kind, EntryKind::Constant(2)));
    }

    #[test]
    fn resolve_follows_alias_chains() {
        let mut dictionary = Dictionary::new(true);
        let c = dictionary.insert("c", EntryKind::Constant(3)).unwrap();
        let b = dictionary.hash(b"b");
        let a = dictionary.hash(b"a");

        dictionary.set_alias(b, c, "b").unwrap();
        dictionary.set_alias(a, b, "a").unwrap();

        let (resolved, entry) = dictionary.resolve(a, 8).unwrap();
        assert_eq!(resolved, c);
        assert!(matches!(entry.kind, EntryKind::Constant(3)));

        // One hop short of the target.
        assert_eq!(dictionary.resolve(a, 1).unwrap_err().code(), ErrorCode::InvalidCall);
    }

    #[test]
    fn alias_cycles_are_detected() {
        let mut dictionary = Dictionary::new(true);
        let a = dictionary.hash(b"a");
        let b = dictionary.hash(b"b");

        dictionary.set_alias(a, b, "a").unwrap();
        dictionary.set_alias(b, a, "b").unwrap();

        assert_eq!(dictionary.resolve(a, 64).unwrap_err().code(), ErrorCode::InvalidCall);
        assert!(dictionary.set_alias(a, a, "a").is_err());
    }

    #[test]
    fn dangling_aliases_are_not_found() {
        let mut dictionary = Dictionary::new(true);
        let a = dictionary.hash(b"a");

        dictionary.set_alias(a, dictionary.hash(b"nowhere"), "a").unwrap();
        assert_eq!(dictionary.resolve(a, 64).unwrap_err().code(), ErrorCode::NotFound);
    }

    #[test]
    fn special_hashes_are_unique_and_special() {
        let mut dictionary = Dictionary::new(true);
        let first = dictionary.register_string(b"one").unwrap();
        let second = dictionary.allocate_unused_hash().unwrap();

        assert!(first.is_special());
        assert!(second.is_special());
        assert_ne!(first, second);
        assert_eq!(dictionary.string_bytes(first), Some(&b"one"[..]));
        assert_eq!(dictionary.string_bytes(second), None);
    }

    #[test]
    fn listing_shows_named_entries_only() {
        let mut dictionary = Dictionary::new(true);
        dictionary.insert("ten", EntryKind::Constant(10)).unwrap();
        dictionary.register_string(b"hidden").unwrap();

        let listing = dictionary.to_string();
        assert!(listing.starts_with("1 words defined."));
        assert!(listing.contains("ten"));
        assert!(listing.contains("= 10"));
    }
}
