//! Extraction of bits and bitfields from fixed-width unsigned words.
//!
//! Bits are numbered from 0, the least significant. Ranges are half-open, `[start, end)`,
//! and extracted fields are right aligned:
//!
//! ```
//! use bitfields::{Bit, BitRange};
//!
//! let word = 0x27bd_ffe8_u32;
//! assert_eq!(word.bitfield::<26, 32>(), 0x09);
//! assert_eq!(word.extract_bitfield(BitRange::new(0, 16)?), 0xffe8);
//! assert!(word.extract_bit(3));
//! # Ok::<(), bitfields::Error>(())
//! ```

mod error;
mod range;
mod word;
pub mod bit;
pub mod layout;

#[cfg(test)]
mod test;

pub use bit::{Bit, BitSet, SignExtend};
pub use error::Error;
pub use layout::{Layout, LayoutError};
pub use range::BitRange;
pub use word::Word;

/// Whether bit `index` of `value` is set.
///
/// Panics if `index` is outside the word.
#[must_use]
#[track_caller]
pub fn extract_bit<W: Bit>(value: W, index: usize) -> bool {
    value.extract_bit(index)
}

/// The bits `[start, end)` of `value`, right aligned.
///
/// Panics if `start >= end` or `end` is outside the word.
#[must_use]
#[track_caller]
pub fn extract_bitfield<W: Bit>(value: W, start: usize, end: usize) -> W {
    match BitRange::new(start, end) {
        Ok(range) => value.extract_bitfield(range),
        Err(err) => panic!("{err}"),
    }
}

/// Like [`extract_bitfield`], but returns an error instead of panicking.
pub fn checked_extract_bitfield<W: Bit>(value: W, start: usize, end: usize) -> Result<W, Error> {
    value.checked_extract_bitfield(BitRange::new(start, end)?)
}
