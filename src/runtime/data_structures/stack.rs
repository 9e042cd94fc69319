use crate::runtime::error::{self, ErrorCode, ForthError};
use std::fmt::{self, Display, Formatter};

/// Which of the interpreter's stacks an operation touched.  Used to make bound errors readable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StackKind {
    Data,
    Code,
    Loop,
    Hook,
}

impl Display for StackKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            StackKind::Data => "data",
            StackKind::Code => "code",
            StackKind::Loop => "loop_control",
            StackKind::Hook => "hooks",
        };

        write!(f, "{}", name)
    }
}

/// A LIFO stack with a fixed maximum depth.  Going past either end is reported as an error rather
/// than a panic so that the interpreter can reset itself.
#[derive(Clone, Debug)]
pub struct BoundedStack<T> {
    items: Vec<T>,
    capacity: usize,
    kind: StackKind,
}

impl<T> BoundedStack<T> {
    pub fn new(kind: StackKind, capacity: usize) -> Self {
        BoundedStack {
            items: Vec::with_capacity(capacity),
            capacity,
            kind,
        }
    }

    fn overflow(&self) -> ForthError {
        ForthError::new(
            ErrorCode::StackBound,
            format!("Stack `{}` overflow (depth {}).", self.kind, self.capacity),
        )
    }

    fn underflow(&self) -> ForthError {
        ForthError::new(
            ErrorCode::StackBound,
            format!("Stack `{}` underflow.", self.kind),
        )
    }

    fn index_of(&self, depth: usize) -> Option<usize> {
        self.items.len().checked_sub(depth)?.checked_sub(1)
    }

    pub fn push(&mut self, value: T) -> error::Result<()> {
        if self.items.len() >= self.capacity {
            return Err(self.overflow());
        }

        self.items.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> error::Result<T> {
        self.items.pop().ok_or_else(|| self.underflow())
    }

    /// Look at an item without removing it; depth 0 is the top of the stack.
    pub fn peek(&self, depth: usize) -> error::Result<&T> {
        self.index_of(depth)
            .and_then(|index| self.items.get(index))
            .ok_or_else(|| self.underflow())
    }

    pub fn peek_mut(&mut self, depth: usize) -> error::Result<&mut T> {
        match self.index_of(depth) {
            Some(index) => Ok(&mut self.items[index]),
            None => Err(self.underflow()),
        }
    }

    /// Remove the item at the given depth and return it, closing the gap.
    pub fn remove(&mut self, depth: usize) -> error::Result<T> {
        match self.index_of(depth) {
            Some(index) => Ok(self.items.remove(index)),
            None => Err(self.underflow()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The items from bottom to top.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_round_trips() {
        let mut stack = BoundedStack::new(StackKind::Data, 4);

        for value in [0, 1, -1, i64::MAX, i64::MIN] {
            stack.push(7).unwrap();
            let depth = stack.len();

            stack.push(value).unwrap();
            assert_eq!(stack.pop().unwrap(), value);
            assert_eq!(stack.len(), depth);

            stack.clear();
        }
    }

    #[test]
    fn bounds_are_errors() {
        let mut stack = BoundedStack::new(StackKind::Loop, 2);

        stack.push(1).unwrap();
        stack.push(2).unwrap();

        let error = stack.push(3).unwrap_err();
        assert_eq!(error.code(), ErrorCode::StackBound);
        assert!(error.message().contains("loop_control"));

        stack.clear();
        assert_eq!(stack.pop().unwrap_err().code(), ErrorCode::StackBound);
    }

    #[test]
    fn peeking_and_removing_by_depth() {
        let mut stack = BoundedStack::new(StackKind::Data, 8);

        for value in 1..=4 {
            stack.push(value).unwrap();
        }

        assert_eq!(*stack.peek(0).unwrap(), 4);
        assert_eq!(*stack.peek(3).unwrap(), 1);
        assert!(stack.peek(4).is_err());

        *stack.peek_mut(1).unwrap() = 30;
        assert_eq!(stack.remove(3).unwrap(), 1);
        assert_eq!(stack.as_slice(), &[2, 30, 4]);
    }
}
