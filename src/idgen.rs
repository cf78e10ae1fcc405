//! Random identifiers for throwaway databases

use rand::Rng;

const ID_ALPHABET: &[u8] = b"qwertyuiopasdfghjklzxcvbnmQWERTYUIOPASDFGHJKLZXCVBNM123456789";
const ID_LENGTH: usize = 10;

/// Generate a 10 character identifier drawn from letters and the digits 1-9.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
