use rand::{Rng, rngs::OsRng};

/// The length of a session token in characters.
pub const SESSION_TOKEN_LEN: usize = 32;

/// Mixed-case ASCII letters; tokens never need escaping in a cookie.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a new random session token.
///
/// # Returns
///
/// A fixed-length string of mixed-case letters drawn from the OS RNG.
pub fn generate_session_token() -> String {
    let mut rng = OsRng;
    (0..SESSION_TOKEN_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
