use crate::error::Error;
use crate::range::BitRange;
use crate::word::Word;

macro_rules! impl_bit {
    ($($t:ty),*) => {
        $(
            impl Bit for $t {
                #[inline(always)]
                fn checked_extract_bit(self, index: usize) -> Result<bool, Error> {
                    if index < <$t as Word>::BITS {
                        Ok((self >> index) & 1 == 1)
                    } else {
                        Err(Error::out_of_range(index, <$t as Word>::BITS))
                    }
                }

                #[inline(always)]
                fn checked_extract_bitfield(self, range: BitRange) -> Result<Self, Error> {
                    range.fits::<$t>()?;
                    Ok((self >> range.start()) & range.mask::<$t>())
                }

                #[inline(always)]
                fn bit<const INDEX: usize>(self) -> bool {
                    const { assert!(INDEX < <$t as Word>::BITS, "bit index out of range") };
                    (self >> INDEX) & 1 == 1
                }

                #[inline(always)]
                fn bitfield<const START: usize, const END: usize>(self) -> Self {
                    const {
                        assert!(START < END, "bit range is empty or reversed");
                        assert!(END <= <$t as Word>::BITS, "bit range out of range");
                    };
                    let mask = <$t>::MAX >> (<$t as Word>::BITS - (END - START));
                    (self >> START) & mask
                }
            }
        )*
    };
}

macro_rules! impl_bit_set {
    ($($t:ty),*) => {
        $(
            impl BitSet for $t {
                #[inline(always)]
                fn checked_set_bit(self, index: usize, val: bool) -> Result<Self, Error> {
                    if index < <$t as Word>::BITS {
                        Ok((self & !(1 << index)) | ((val as Self) << index))
                    } else {
                        Err(Error::out_of_range(index, <$t as Word>::BITS))
                    }
                }

                #[inline]
                #[track_caller]
                fn set_bitfield(self, range: BitRange, val: Self) -> Self {
                    if let Err(err) = range.fits::<$t>() {
                        panic!("{err}");
                    }
                    let mask = range.mask::<$t>();
                    (self & !(mask << range.start())) | ((val & mask) << range.start())
                }

                fn checked_set_bitfield(self, range: BitRange, val: Self) -> Result<Self, Error> {
                    range.fits::<$t>()?;
                    let value_bits = val.significant_bits();
                    if value_bits > range.len() {
                        return Err(Error::ValueTooWide { value_bits, len: range.len() });
                    }
                    Ok(self.set_bitfield(range, val))
                }
            }
        )*
    };
}

macro_rules! impl_sign_extend {
    ($($t:ty),*) => {
        $(
            impl SignExtend for $t {
                #[inline(always)]
                fn checked_sign_extend(self, width: usize) -> Result<Self::Signed, Error> {
                    if width == 0 || width > <$t as Word>::BITS {
                        return Err(Error::out_of_range(width, <$t as Word>::BITS));
                    }
                    let shamt = <$t as Word>::BITS - width;
                    Ok((self << shamt).as_signed() >> shamt)
                }
            }
        )*
    };
}

impl_bit!(u8, u16, u32, u64, u128, usize);
impl_bit_set!(u8, u16, u32, u64, u128, usize);
impl_sign_extend!(u8, u16, u32, u64, u128, usize);

/// Trait to extract single bits and bitfields from a word.
///
/// Every operation comes in three flavours:
/// - `checked_*` returns an [`Error`] for an index or range outside the word.
/// - The plain form panics in the same cases. Use it when the index comes from
///   code that already guarantees it's valid.
/// - `bit` and `bitfield` take the positions as const parameters and are rejected
///   at compile time when they're out of range.
///
/// Only unsigned words implement `Bit`. Reinterpret a signed value as its unsigned
/// counterpart first, and use [`SignExtend`] to get signed fields back.
pub trait Bit: Word {
    /// Extract a single bit.
    fn checked_extract_bit(self, index: usize) -> Result<bool, Error>;

    /// Extract the bits in `range`, right aligned so that bit `range.start()` of
    /// `self` becomes bit 0 of the result. All bits above `range.len()` are zero.
    fn checked_extract_bitfield(self, range: BitRange) -> Result<Self, Error>;

    /// Extract bit `INDEX`.
    ///
    /// ```compile_fail
    /// use bitfields::Bit;
    /// 0_u8.bit::<8>();
    /// ```
    fn bit<const INDEX: usize>(self) -> bool;

    /// Extract the bits in `[START, END)`.
    ///
    /// ```
    /// use bitfields::Bit;
    /// assert_eq!(0xabcd_u16.bitfield::<4, 12>(), 0xbc);
    /// ```
    ///
    /// ```compile_fail
    /// use bitfields::Bit;
    /// 0_u64.bitfield::<10, 5>();
    /// ```
    fn bitfield<const START: usize, const END: usize>(self) -> Self;

    /// Like [`Bit::checked_extract_bit`], but panics if `index` is out of range.
    #[must_use]
    #[track_caller]
    fn extract_bit(self, index: usize) -> bool {
        self.checked_extract_bit(index).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Like [`Bit::checked_extract_bitfield`], but panics if `range` is out of range.
    #[must_use]
    #[track_caller]
    fn extract_bitfield(self, range: BitRange) -> Self {
        self.checked_extract_bitfield(range).unwrap_or_else(|err| panic!("{err}"))
    }
}

/// Trait to replace single bits and bitfields in a word.
pub trait BitSet: Bit {
    /// Set bit `index` to `val`.
    fn checked_set_bit(self, index: usize, val: bool) -> Result<Self, Error>;

    /// Replace `range` with the lowest `range.len()` bits of `val`. The rest of `val` is ignored.
    /// Panics if `range` doesn't fit the word.
    #[must_use]
    fn set_bitfield(self, range: BitRange, val: Self) -> Self;

    /// Replace `range` with `val`. Fails if `val` doesn't fit in `range.len()` bits.
    fn checked_set_bitfield(self, range: BitRange, val: Self) -> Result<Self, Error>;

    /// Like [`BitSet::checked_set_bit`], but panics if `index` is out of range.
    #[must_use]
    #[track_caller]
    fn set_bit(self, index: usize, val: bool) -> Self {
        self.checked_set_bit(index, val).unwrap_or_else(|err| panic!("{err}"))
    }
}

/// Sign extend a value from an unsigned value to a signed one.
pub trait SignExtend: Bit {
    /// Interpret the lowest `width` bits as a two's complement value of `width` bits.
    /// `width` must be between 1 and the width of the word.
    fn checked_sign_extend(self, width: usize) -> Result<Self::Signed, Error>;

    #[must_use]
    #[track_caller]
    fn sign_extend(self, width: usize) -> Self::Signed {
        self.checked_sign_extend(width).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Extract `range` and sign extend it from bit `range.len() - 1`.
    fn checked_extract_signed_bitfield(self, range: BitRange) -> Result<Self::Signed, Error> {
        self.checked_extract_bitfield(range)?.checked_sign_extend(range.len())
    }

    #[must_use]
    #[track_caller]
    fn extract_signed_bitfield(self, range: BitRange) -> Self::Signed {
        self.checked_extract_signed_bitfield(range).unwrap_or_else(|err| panic!("{err}"))
    }
}

#[cfg(test)]
fn range(start: usize, end: usize) -> BitRange {
    BitRange::new(start, end).unwrap()
}

#[test]
fn test_extract_bit() {
    let a = 0b1011_0010_u8;
    let expected = [false, true, false, false, true, true, false, true];
    for (i, bit) in expected.into_iter().enumerate() {
        assert_eq!(a.extract_bit(i), bit, "bit {i}");
    }

    assert!((1_u64 << 63).extract_bit(63));
    assert_eq!(0_u64.checked_extract_bit(64), Err(Error::OutOfRange { index: 64, width: 64 }));
}

#[test]
fn test_extract_bitfield() {
    let a = 0xdead_beef_u32;
    assert_eq!(a.extract_bitfield(range(0, 16)), 0xbeef);
    assert_eq!(a.extract_bitfield(range(16, 32)), 0xdead);
    assert_eq!(a.extract_bitfield(range(4, 8)), 0xe);
    assert_eq!(a.extract_bitfield(range(0, 32)), a);
    assert_eq!(a.extract_bitfield(range(31, 32)), 1);

    assert_eq!(
        a.checked_extract_bitfield(range(28, 33)),
        Err(Error::OutOfRange { index: 33, width: 32 }),
    );
}

#[test]
fn test_const_forms() {
    // `addiu $sp, $sp, -24`.
    let ins = 0x27bd_ffe8_u32;
    assert_eq!(ins.bitfield::<26, 32>(), 0x09);
    assert_eq!(ins.bitfield::<21, 26>(), 29);
    assert_eq!(ins.bitfield::<16, 21>(), 29);
    assert_eq!(ins.bitfield::<0, 16>(), 0xffe8);
    assert_eq!(ins.bitfield::<0, 32>(), ins);
    assert!(ins.bit::<0>() == ins.extract_bit(0));
    assert!(ins.bit::<31>() == ins.extract_bit(31));
}

#[test]
#[should_panic(expected = "bit 64 is out of range for a 64-bit word")]
fn test_extract_bit_panics() {
    let _ = u64::MAX.extract_bit(64);
}

#[test]
#[should_panic(expected = "bit 70 is out of range for a 64-bit word")]
fn test_extract_bitfield_panics() {
    let _ = u64::MAX.extract_bitfield(range(60, 70));
}

#[test]
fn test_set_bitfield() {
    let a = 0_u32.set_bitfield(range(3, 5), 0b11);
    assert_eq!(0b11000, a);

    let a = 0_u32.set_bitfield(range(0, 11), u32::MAX);
    assert_eq!(0b11111111111, a);

    let a = 0_u32.set_bitfield(range(0, 11), 0b0101010101);
    assert_eq!(0b0101010101, a);

    let a = 0_u32.set_bitfield(range(1, 3), 0b11);
    assert_eq!(0b110, a);

    let a = u64::MAX.set_bitfield(BitRange::full::<u64>(), 0x1234);
    assert_eq!(0x1234, a);
}

#[test]
#[should_panic(expected = "bit 17 is out of range for a 16-bit word")]
fn test_set_bitfield_panics() {
    let _ = 0_u16.set_bitfield(range(12, 17), 0);
}

#[test]
fn test_checked_set_bitfield() {
    assert_eq!(0_u16.checked_set_bitfield(range(4, 8), 0xf), Ok(0xf0));
    assert_eq!(
        0_u16.checked_set_bitfield(range(4, 8), 0x10),
        Err(Error::ValueTooWide { value_bits: 5, len: 4 }),
    );
    assert_eq!(
        0_u16.checked_set_bitfield(range(12, 17), 0),
        Err(Error::OutOfRange { index: 17, width: 16 }),
    );
}

#[test]
fn test_set_bit() {
    let a = 0_u32.set_bit(0, true);
    assert_eq!(1, a);

    let a = 0_u32.set_bit(2, true);
    assert_eq!(0b100, a);

    let a = 0b111_u32.set_bit(2, false);
    assert_eq!(0b011, a);

    assert!(0_u8.checked_set_bit(8, true).is_err());
}

#[test]
fn test_sign_extend() {
    assert_eq!(0xffe8_u32.sign_extend(16), -24);
    assert_eq!(0x7fe8_u32.sign_extend(16), 0x7fe8);
    assert_eq!(0b1_u8.sign_extend(1), -1);
    assert_eq!(0b0_u8.sign_extend(1), 0);
    assert_eq!(u64::MAX.sign_extend(64), -1);
    assert_eq!(0b100_u64.sign_extend(3), -4);

    assert!(0_u32.checked_sign_extend(0).is_err());
    assert!(0_u32.checked_sign_extend(33).is_err());
}

#[test]
fn test_extract_signed_bitfield() {
    let ins = 0x27bd_ffe8_u32;
    assert_eq!(ins.extract_signed_bitfield(range(0, 16)), -24);
    assert_eq!(ins.extract_signed_bitfield(range(26, 32)), 0x09);
    assert_eq!(u128::MAX.extract_signed_bitfield(range(100, 128)), -1);
}
