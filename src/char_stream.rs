//! Positioned character sequences (spec component A).

use std::fmt;
use std::rc::Rc;

use crate::error::{PyshError, PyshErrorKind};
use crate::position::Position;

/// A single Unicode scalar paired with its position in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Char {
    pub val: char,
    pub position: Position,
}

impl Char {
    pub fn new(val: char, position: Position) -> Self {
        Self { val, position }
    }
}

impl fmt::Display for Char {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.val)
    }
}

/// A finite, immutable, positioned view over a sequence of [`Char`]s.
///
/// Backed by a shared `Rc<[Char]>` plus a start offset, so `tail()` never
/// reallocates the underlying character vector — cloning a `CharStream` is
/// an `Rc` bump plus a `usize` copy.
#[derive(Debug, Clone)]
pub struct CharStream {
    chars: Rc<[Char]>,
    offset: usize,
}

impl CharStream {
    /// Loads a string into a stream of positioned characters, advancing a
    /// running [`Position`] one char at a time.
    pub fn load(s: &str) -> Self {
        let mut pos = Position::default();
        let mut chars = Vec::with_capacity(s.len());
        for c in s.chars() {
            chars.push(Char::new(c, pos));
            pos = pos.advance(c);
        }
        CharStream {
            chars: Rc::from(chars),
            offset: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.chars.len()
    }

    pub fn len(&self) -> usize {
        self.chars.len() - self.offset
    }

    /// Byte-ish offset into the original load, used for diagnostic spans.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The position of the next unconsumed char, or the position just past
    /// the end of input if the stream is empty.
    pub fn position(&self) -> Position {
        self.chars
            .get(self.offset)
            .map(|c| c.position)
            .or_else(|| self.chars.last().map(|c| c.position.advance(c.val)))
            .unwrap_or_default()
    }

    pub fn head(&self) -> Result<Char, PyshError> {
        self.chars.get(self.offset).copied().ok_or_else(|| {
            PyshError::leaf(
                PyshErrorKind::State,
                self.clone(),
                "head from empty char stream",
            )
        })
    }

    pub fn tail(&self) -> Result<CharStream, PyshError> {
        if self.is_empty() {
            return Err(PyshError::leaf(
                PyshErrorKind::State,
                self.clone(),
                "tail from empty char stream",
            ));
        }
        Ok(CharStream {
            chars: self.chars.clone(),
            offset: self.offset + 1,
        })
    }

    /// The slice of chars consumed between `self` (earlier) and `later`.
    pub fn slice_to(&self, later: &CharStream) -> &[Char] {
        &self.chars[self.offset..later.offset]
    }

    pub fn as_slice(&self) -> &[Char] {
        &self.chars[self.offset..]
    }
}

impl fmt::Display for CharStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self.as_slice().iter().map(|c| c.val).collect();
        write!(f, "{s:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_tracks_positions_across_newline() {
        let s = CharStream::load("a\nb");
        assert_eq!(s.head().unwrap().position, Position::new(0, 0));
        let s = s.tail().unwrap();
        assert_eq!(s.head().unwrap().position, Position::new(0, 1));
        let s = s.tail().unwrap();
        assert_eq!(s.head().unwrap().position, Position::new(1, 0));
    }

    #[test]
    fn head_and_tail_of_empty_stream_fail() {
        let s = CharStream::load("");
        assert!(s.head().is_err());
        assert!(s.tail().is_err());
    }

    #[test]
    fn tail_shares_storage() {
        let s = CharStream::load("abc");
        let t = s.tail().unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.head().unwrap().val, 'b');
    }
}
