//! 32-bit FNV-1a string hashing.
//!
//! Used to pre-filter uniform name lookups; a hash match is always confirmed by
//! a full string comparison, so collisions never change lookup results.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Hashes `bytes` with 32-bit FNV-1a.
#[inline]
pub const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Hashes a string's UTF-8 bytes with 32-bit FNV-1a.
#[inline]
pub const fn fnv1a_str(s: &str) -> u32 {
    fnv1a(s.as_bytes())
}
