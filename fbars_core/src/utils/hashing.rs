//! Hashing helpers used to derive collision free auxiliary ids
use std::hash::{DefaultHasher, Hash, Hasher};

fn calculate_hash<T: Hash + ?Sized>(t: &T) -> u64 {
    let mut s = DefaultHasher::new();
    t.hash(&mut s);
    s.finish()
}

/// Hex digest of `t`, stable within one process
pub(crate) fn hash_as_hex_string<T: Hash + ?Sized>(t: &T) -> String {
    format!("{:x}", calculate_hash(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_digest() {
        assert_eq!(hash_as_hex_string("EX_glc"), hash_as_hex_string("EX_glc"));
        assert_ne!(hash_as_hex_string("EX_glc"), hash_as_hex_string("EX_o2"));
    }
}
