//! Random strings for share codes and session tokens.

use std::sync::Arc;

use rand::Rng;

const CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Produces a random string of the requested length.
pub type CodeGenerator = Arc<dyn Fn(usize) -> String + Send + Sync>;

fn from_charset(charset: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}

/// Lowercase alphanumeric code, easy to read out over the phone.
pub fn code(len: usize) -> String {
    from_charset(CODE_CHARSET, len)
}

pub fn token(len: usize) -> String {
    from_charset(TOKEN_CHARSET, len)
}

pub fn code_generator() -> CodeGenerator {
    Arc::new(code)
}

/// A generator that always returns `value`, ignoring the requested length.
pub fn fixed_code(value: &str) -> CodeGenerator {
    let value = value.to_string();
    Arc::new(move |_| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_charset_and_length() {
        let value = code(12);
        assert_eq!(value.len(), 12);
        assert!(value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_token_length() {
        assert_eq!(token(32).len(), 32);
        assert_ne!(token(32), token(32));
    }
}
