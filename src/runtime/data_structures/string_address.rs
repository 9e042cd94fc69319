use crate::lang::hashing::Hash;

/// The address of a byte inside a string stored in the dictionary.  On the data stack it is a
/// single cell with the string's hash in the upper half and the byte offset in the lower half, so
/// ordinary cell arithmetic moves the address along the string.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StringAddress {
    pub hash: Hash,
    pub offset: u32,
}

impl StringAddress {
    pub fn new(hash: Hash, offset: u32) -> StringAddress {
        StringAddress { hash, offset }
    }

    pub fn to_cell(&self) -> i64 {
        (((self.hash.value() as u64) << 32) | self.offset as u64) as i64
    }

    pub fn from_cell(cell: i64) -> StringAddress {
        let bits = cell as u64;

        StringAddress {
            hash: Hash::from_raw((bits >> 32) as u32),
            offset: bits as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::hashing::SPECIAL_HASH_BIT;

    #[test]
    fn cell_arithmetic_moves_the_offset() {
        let address = StringAddress::new(Hash::from_raw(SPECIAL_HASH_BIT | 3), 0);
        let next = StringAddress::from_cell(address.to_cell() + 1);

        assert_eq!(next.hash, address.hash);
        assert_eq!(next.offset, 1);
    }
}
