//! Name hashing
//!
//! Constants and render targets are addressed by 64-bit name hashes so that
//! hot paths never touch strings. FNV-1a is used; it is stable across runs
//! and platforms, which keeps hashed names usable in serialized data.

const FNV1A_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1A_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash a name to its 64-bit FNV-1a value.
#[must_use]
pub const fn hash_name(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash = FNV1A_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV1A_PRIME);
        i += 1;
    }
    hash
}
