//! Fixed-width unsigned words.
//!
//! Bits are indexed from 0, the least significant, up to `BITS - 1`.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Shl, Shr};

pub trait Word:
    Copy
    + Eq
    + Ord
    + Default
    + fmt::Debug
    + fmt::Binary
    + fmt::LowerHex
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + Shl<usize, Output = Self>
    + Shr<usize, Output = Self>
{
    /// Number of bits in the word.
    const BITS: usize;
    /// Number of bytes in the word.
    const BYTES: usize;

    const MAX: Self;

    /// The signed integer of the same width.
    type Signed: Copy + Eq + Ord + fmt::Debug;

    /// Reinterpret as two's complement of the same width.
    fn as_signed(self) -> Self::Signed;

    /// Zero-extend to 128 bits.
    fn widen(self) -> u128;

    /// Number of bits needed to represent the value, 0 for zero.
    fn significant_bits(self) -> usize;
}

macro_rules! impl_word {
    ($(($ut:ty, $st:ty)),*) => {
        $(
            impl Word for $ut {
                const BYTES: usize = std::mem::size_of::<$ut>();
                const BITS: usize = 8 * Self::BYTES;

                const MAX: Self = <$ut>::MAX;

                type Signed = $st;

                #[inline(always)]
                fn as_signed(self) -> $st {
                    self as $st
                }

                #[inline(always)]
                fn widen(self) -> u128 {
                    self as u128
                }

                #[inline(always)]
                fn significant_bits(self) -> usize {
                    <Self as Word>::BITS - self.leading_zeros() as usize
                }
            }
        )*
    };
}

impl_word! {
    (u8, i8), (u16, i16), (u32, i32), (u64, i64), (u128, i128), (usize, isize)
}

#[test]
fn widths() {
    assert_eq!(<u8 as Word>::BITS, 8);
    assert_eq!(<u16 as Word>::BITS, 16);
    assert_eq!(<u32 as Word>::BITS, 32);
    assert_eq!(<u64 as Word>::BITS, 64);
    assert_eq!(<u128 as Word>::BITS, 128);
    assert_eq!(<usize as Word>::BITS, usize::BITS as usize);
    assert_eq!(<u64 as Word>::BYTES, 8);
    assert_eq!(<u16 as Word>::MAX, u16::MAX);
}

#[test]
fn significant_bits() {
    assert_eq!(0_u64.significant_bits(), 0);
    assert_eq!(1_u64.significant_bits(), 1);
    assert_eq!(0b1010_u8.significant_bits(), 4);
    assert_eq!(u32::MAX.significant_bits(), 32);
}

#[test]
fn as_signed() {
    assert_eq!(0xff_u8.as_signed(), -1_i8);
    assert_eq!(0x7fff_u16.as_signed(), i16::MAX);
    assert_eq!((1_u64 << 63).as_signed(), i64::MIN);
}
