//! Random identifier generation.
//!
//! Room codes are short and human-shareable (typed into a join screen), so
//! they use an unambiguous uppercase alphabet. Client ids are longer and
//! only machines see them.

use rand::distr::{Alphanumeric, SampleString};
use rand::Rng;

const ROOM_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random room code of `len` characters from the uppercase
/// alphanumeric alphabet.
pub fn room_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ROOM_ALPHABET[rng.random_range(0..ROOM_ALPHABET.len())] as char)
        .collect()
}

/// Generates a 21-character mixed-case alphanumeric client id.
pub fn client_id() -> String {
    random_id(21)
}

/// Generates a random alphanumeric string of `len` characters.
pub fn random_id(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), len)
}
