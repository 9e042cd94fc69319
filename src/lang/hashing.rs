use std::fmt::{self, Display, Formatter};

/// Bit that separates the two halves of the hash space.  Hashes derived from names always have it
/// cleared, hashes handed out by the dictionary for anonymous words and string literals always
/// have it set.
pub const SPECIAL_HASH_BIT: u32 = 0x8000_0000;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// The identity of a dictionary entry.  Two names with the same hash are the same word; there is
/// no collision resolution.
///
/// Names get 31 bits, so a program with a thousand names has about a one in four thousand chance
/// of a collision, and a collision silently replaces the older word.  The width is tied to string
/// addresses, which pack a hash and a byte offset into one 64-bit cell.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Hash(u32);

impl Hash {
    pub const fn from_raw(value: u32) -> Hash {
        Hash(value)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Was this hash allocated by the dictionary rather than derived from a name?
    pub const fn is_special(&self) -> bool {
        self.0 & SPECIAL_HASH_BIT != 0
    }

    /// The hash as a stack cell, which is how execution tokens travel through Forth code.
    pub const fn to_cell(&self) -> i64 {
        self.0 as i64
    }

    /// Convert a stack cell back into a hash.  Cells outside of the 32-bit range can not be
    /// execution tokens.
    pub fn from_cell(cell: i64) -> Option<Hash> {
        u32::try_from(cell).ok().map(Hash)
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

/// Hash a word name.  This is 32-bit FNV-1a with the special bit masked off, optionally folding
/// ASCII letters to lower case first.
pub fn hash_name(name: &[u8], case_insensitive: bool) -> Hash {
    let mut hash = FNV_OFFSET_BASIS;

    for &byte in name {
        let byte = if case_insensitive {
            byte.to_ascii_lowercase()
        } else {
            byte
        };

        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    Hash(hash & !SPECIAL_HASH_BIT)
}
