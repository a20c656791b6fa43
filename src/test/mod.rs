
/// Bits `[start, end)` of `value`, computed one bit at a time.
fn reference_bitfield(value: u128, start: usize, end: usize) -> u128 {
    (start..end).rev().fold(0, |acc, i| (acc << 1) | ((value >> i) & 1))
}

/// Bits `[start, end)` of `value`, computed by slicing its binary string.
fn reference_bitfield_str(value: u64, start: usize, end: usize) -> u64 {
    let bits: String = format!("{value:064b}").chars().rev().collect();
    let field: String = bits[start..end].chars().rev().collect();
    u64::from_str_radix(&field, 2).unwrap()
}
