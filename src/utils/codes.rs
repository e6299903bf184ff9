use chrono::{DateTime, Utc};
use rand::Rng;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const CONFIRMATION_CODE_LEN: usize = 8;

fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Booking reference shown to the passenger. Not checked for uniqueness
/// against existing reservations.
pub fn generate_confirmation_code() -> String {
    random_token(CONFIRMATION_CODE_LEN)
}

// TXN-<unix millis>-<6 random chars>
pub fn generate_transaction_id(now: DateTime<Utc>) -> String {
    format!("TXN-{}-{}", now.timestamp_millis(), random_token(6))
}

pub fn is_confirmation_code(code: &str) -> bool {
    code.len() == CONFIRMATION_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
