use rand::Rng;

pub const CODE_LENGTH: usize = 10;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a redemption code of [`CODE_LENGTH`] characters from `[A-Z0-9]`.
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Canonical form of a code typed by a user.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
