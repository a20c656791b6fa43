use crate::error::Error;
use crate::word::Word;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::ops::Range;

/// Width of the widest word.
const MAX_BITS: usize = <u128 as Word>::BITS;

/// Half-open range of bit positions `[start, end)`.
///
/// A `BitRange` is never empty or reversed. Whether it fits a given word is
/// checked when it's used, see [`BitRange::fits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange", into = "RawRange")]
pub struct BitRange {
    start: usize,
    end: usize,
}

impl BitRange {
    pub const fn new(start: usize, end: usize) -> Result<Self, Error> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(Error::InvalidRange { start, end })
        }
    }

    /// Range from the least significant bit `ls` to the most significant bit `ms`, both inclusive.
    pub const fn inclusive(ls: usize, ms: usize) -> Result<Self, Error> {
        let Some(end) = ms.checked_add(1) else {
            return Err(Error::OutOfRange { index: ms, width: MAX_BITS });
        };
        Self::new(ls, end)
    }

    /// The single bit at `index`.
    pub const fn bit(index: usize) -> Result<Self, Error> {
        match index.checked_add(1) {
            Some(end) => Ok(Self { start: index, end }),
            None => Err(Error::OutOfRange { index, width: MAX_BITS }),
        }
    }

    /// The whole word `W`.
    pub const fn full<W: Word>() -> Self {
        Self { start: 0, end: W::BITS }
    }

    pub const fn start(self) -> usize {
        self.start
    }

    pub const fn end(self) -> usize {
        self.end
    }

    /// Number of bits in the range. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    pub const fn contains(self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub const fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check that the range lies within `W`.
    pub fn fits<W: Word>(self) -> Result<(), Error> {
        if self.end <= W::BITS {
            Ok(())
        } else {
            Err(Error::out_of_range(self.end, W::BITS))
        }
    }

    /// Right aligned mask with the lowest `len` bits set.
    ///
    /// The range must fit `W`. A full width range gives `W::MAX`, since `1 << W::BITS`
    /// can't be computed in `W`.
    #[inline(always)]
    pub fn mask<W: Word>(self) -> W {
        debug_assert!(self.end <= W::BITS);
        W::MAX >> (W::BITS - self.len())
    }
}

impl TryFrom<Range<usize>> for BitRange {
    type Error = Error;

    fn try_from(range: Range<usize>) -> Result<Self, Error> {
        Self::new(range.start, range.end)
    }
}

impl TryFrom<(usize, usize)> for BitRange {
    type Error = Error;

    fn try_from((start, end): (usize, usize)) -> Result<Self, Error> {
        Self::new(start, end)
    }
}

impl From<BitRange> for Range<usize> {
    fn from(range: BitRange) -> Self {
        range.start..range.end
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Serialized form, validated through `BitRange::new`.
#[derive(Serialize, Deserialize)]
struct RawRange {
    start: usize,
    end: usize,
}

impl TryFrom<RawRange> for BitRange {
    type Error = Error;

    fn try_from(raw: RawRange) -> Result<Self, Error> {
        Self::new(raw.start, raw.end)
    }
}

impl From<BitRange> for RawRange {
    fn from(range: BitRange) -> Self {
        Self { start: range.start, end: range.end }
    }
}

#[cfg(test)]
use crate::bit::Bit;

#[test]
fn new_rejects_empty_and_reversed() {
    assert_eq!(BitRange::new(10, 5), Err(Error::InvalidRange { start: 10, end: 5 }));
    assert_eq!(BitRange::new(7, 7), Err(Error::InvalidRange { start: 7, end: 7 }));
    assert!(BitRange::new(0, 1).is_ok());
}

#[test]
fn inclusive() {
    let range = BitRange::inclusive(26, 31).unwrap();
    assert_eq!(range, BitRange::new(26, 32).unwrap());
    assert_eq!(range.len(), 6);

    assert_eq!(BitRange::inclusive(3, 3), BitRange::bit(3));
    assert!(BitRange::inclusive(4, 3).is_err());
}

#[test]
fn constructors_do_not_overflow() {
    let past_any_word = Error::OutOfRange { index: usize::MAX, width: 128 };
    assert_eq!(BitRange::bit(usize::MAX), Err(past_any_word));
    assert_eq!(BitRange::inclusive(0, usize::MAX), Err(past_any_word));
    assert_eq!(BitRange::inclusive(usize::MAX, usize::MAX), Err(past_any_word));

    let last = BitRange::bit(usize::MAX - 1).unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(
        (1_u64 << 63).checked_extract_bitfield(last),
        Err(Error::OutOfRange { index: usize::MAX, width: 64 }),
    );
    assert_eq!(
        (1_u64 << 63).checked_extract_bit(usize::MAX),
        Err(Error::OutOfRange { index: usize::MAX, width: 64 }),
    );
}

#[test]
fn fits() {
    let range = BitRange::new(60, 70).unwrap();
    assert_eq!(range.fits::<u64>(), Err(Error::OutOfRange { index: 70, width: 64 }));
    assert_eq!(range.fits::<u128>(), Ok(()));

    assert_eq!(BitRange::full::<u64>().fits::<u64>(), Ok(()));
    assert!(BitRange::full::<u64>().fits::<u32>().is_err());
}

#[test]
fn mask() {
    assert_eq!(BitRange::new(4, 8).unwrap().mask::<u64>(), 0xf);
    assert_eq!(BitRange::bit(63).unwrap().mask::<u64>(), 1);
    assert_eq!(BitRange::full::<u64>().mask::<u64>(), u64::MAX);
    assert_eq!(BitRange::full::<u8>().mask::<u8>(), u8::MAX);
    assert_eq!(BitRange::new(1, 8).unwrap().mask::<u8>(), 0x7f);
}

#[test]
fn overlaps() {
    let a = BitRange::new(0, 8).unwrap();
    let b = BitRange::new(8, 16).unwrap();
    let c = BitRange::new(4, 12).unwrap();

    assert!(!a.overlaps(b));
    assert!(a.overlaps(c));
    assert!(c.overlaps(b));
    assert!(a.contains(7));
    assert!(!a.contains(8));
}

#[test]
fn conversions() {
    let range: BitRange = (4..8).try_into().unwrap();
    assert_eq!(range, BitRange::new(4, 8).unwrap());
    assert_eq!(Range::from(range), 4..8);
    assert_eq!(range.to_string(), "4..8");

    let reversed: Result<BitRange, _> = (10, 5).try_into();
    assert!(reversed.is_err());
}

#[test]
fn serde_round_trip() {
    let range = BitRange::new(4, 8).unwrap();
    let string = toml::to_string(&range).unwrap();
    assert_eq!(string, "start = 4\nend = 8\n");
    assert_eq!(toml::from_str::<BitRange>(&string).unwrap(), range);

    let reversed = toml::from_str::<BitRange>("start = 10\nend = 5").unwrap_err();
    assert!(reversed.to_string().contains("invalid bit range 10..5"), "{reversed}");

    let empty = toml::from_str::<BitRange>("start = 3\nend = 3").unwrap_err();
    assert!(empty.to_string().contains("invalid bit range 3..3"), "{empty}");
}
