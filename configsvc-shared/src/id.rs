/// Sortable identifier generation and validation
///
/// Identifiers are 26-character, time-prefixed strings encoded with the
/// Crockford base-32 alphabet (no `I`, `L`, `O`, `U`). The first 10 characters
/// carry a 48-bit millisecond timestamp, the remaining 16 carry 80 random bits.
/// Lexicographic order therefore follows creation order.
///
/// # Example
///
/// ```
/// use configsvc_shared::id::{is_valid, new_id};
///
/// let id = new_id();
/// assert_eq!(id.len(), 26);
/// assert!(is_valid(&id));
/// assert!(!is_valid("not-an-identifier"));
/// ```

use chrono::Utc;
use rand::Rng;
use std::sync::Mutex;
use thiserror::Error;

/// Crockford base-32 alphabet
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of an encoded identifier (characters)
pub const ID_LENGTH: usize = 26;

/// Number of characters holding the timestamp
const TIME_LENGTH: usize = 10;

const RANDOM_BITS: u32 = 80;
const RANDOM_MASK: u128 = (1u128 << RANDOM_BITS) - 1;
const MAX_TIMESTAMP_MS: u64 = (1u64 << 48) - 1;

/// Last (timestamp, random) pair handed out by this process.
static LAST: Mutex<(u64, u128)> = Mutex::new((0, 0));

/// Identifier parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    /// Wrong number of characters
    #[error("Invalid identifier length: expected {ID_LENGTH}, got {0}")]
    InvalidLength(usize),

    /// Character outside of the base-32 alphabet
    #[error("Invalid identifier character: {0:?}")]
    InvalidCharacter(char),
}

/// Generates a new sortable identifier
///
/// Identifiers generated by one process are strictly increasing: when two
/// identifiers share a millisecond (or the wall clock steps backwards), the
/// random part of the previous one is incremented instead of drawn afresh.
pub fn new_id() -> String {
    let now_ms = (Utc::now().timestamp_millis().max(0) as u64).min(MAX_TIMESTAMP_MS);

    let mut last = LAST.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let (last_ms, last_random) = *last;

    let (ms, random) = if now_ms > last_ms {
        (now_ms, rand::thread_rng().gen::<u128>() & RANDOM_MASK)
    } else if last_random < RANDOM_MASK {
        (last_ms, last_random + 1)
    } else {
        // Random space exhausted for this millisecond, borrow the next one
        (last_ms + 1, 0)
    };

    *last = (ms, random);
    drop(last);

    encode(ms, random)
}

/// Checks that `s` is a well-formed identifier
///
/// Equivalent to matching the character class `[0-9A-HJKMNP-TV-Z]{26}`.
pub fn is_valid(s: &str) -> bool {
    s.len() == ID_LENGTH && s.bytes().all(|b| ALPHABET.contains(&b))
}

/// Validates `s` and returns it as an owned identifier
///
/// # Errors
///
/// Returns an [`IdError`] describing the first problem found.
pub fn parse_id(s: &str) -> Result<String, IdError> {
    let length = s.chars().count();
    if length != ID_LENGTH {
        return Err(IdError::InvalidLength(length));
    }

    if let Some(bad) = s.chars().find(|c| !c.is_ascii() || !ALPHABET.contains(&(*c as u8))) {
        return Err(IdError::InvalidCharacter(bad));
    }

    Ok(s.to_string())
}

/// Decodes the millisecond timestamp embedded in an identifier
///
/// Returns `None` if `s` is not a valid identifier.
pub fn timestamp_ms(s: &str) -> Option<u64> {
    if !is_valid(s) {
        return None;
    }

    s.bytes().take(TIME_LENGTH).try_fold(0u64, |acc, b| {
        let digit = ALPHABET.iter().position(|&a| a == b)? as u64;
        Some((acc << 5) | digit)
    })
}

fn encode(ms: u64, random: u128) -> String {
    let value = ((ms as u128) << RANDOM_BITS) | (random & RANDOM_MASK);

    // 26 characters * 5 bits = 130 bits, so the leading character holds 3 bits
    (0..ID_LENGTH)
        .map(|i| {
            let shift = 5 * (ID_LENGTH - 1 - i);
            ALPHABET[((value >> shift) & 0x1F) as usize] as char
        })
        .collect()
}
