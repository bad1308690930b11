//! Short code generation and validation.
//!
//! Codes are fixed-length strings over the 62-character base62 alphabet
//! (digits, uppercase, lowercase), drawn uniformly from OS entropy.

use metrics::counter;
use std::io;
use tracing::warn;

/// Characters a short code may contain.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Code length used when none is configured.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Shortest configurable code length.
pub const MIN_CODE_LENGTH: usize = 4;

/// Longest configurable code length. The store column holds up to 16.
pub const MAX_CODE_LENGTH: usize = 10;

/// Bytes at or above this value are rejected so that `byte % 62` stays uniform.
const ACCEPT_BELOW: u8 = 248;

/// Extra bytes requested per refill to absorb rejections.
const SPARE_BYTES: usize = 8;

type EntropySource = fn(&mut [u8]) -> io::Result<()>;

/// Produces and checks short codes.
///
/// `generate` never fails: callers rely on always receiving a candidate so
/// the shorten path only has to deal with collisions.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    /// Returns a new candidate code.
    fn generate(&self) -> String;

    /// Returns true if `code` has the configured length and only alphabet characters.
    ///
    /// Purely syntactic; does not check whether the code exists.
    fn validate(&self, code: &str) -> bool;
}

/// Base62 generator backed by the operating system's CSPRNG.
pub struct Base62Generator {
    length: usize,
    entropy: EntropySource,
}

impl Base62Generator {
    /// Creates a generator for codes of `length` characters.
    ///
    /// A length of 0 selects [`DEFAULT_CODE_LENGTH`].
    pub fn new(length: usize) -> Self {
        Self::with_entropy(length, os_entropy)
    }

    fn with_entropy(length: usize, entropy: EntropySource) -> Self {
        let length = if length == 0 {
            DEFAULT_CODE_LENGTH
        } else {
            length
        };

        Self { length, entropy }
    }

    /// Configured code length.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for Base62Generator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for Base62Generator {
    /// Draws each character uniformly by rejection sampling.
    ///
    /// If the entropy source fails, the affected positions fall back to
    /// `(position * 17) % 62`. The code is still returned, but the fallback is
    /// logged and counted so a persistently broken RNG gets noticed.
    fn generate(&self) -> String {
        let mut code = String::with_capacity(self.length);
        let mut buf = vec![0u8; self.length + SPARE_BYTES];
        let mut cursor = buf.len();
        let mut fallback_positions = 0usize;

        while code.len() < self.length {
            if cursor == buf.len() {
                if let Err(e) = (self.entropy)(&mut buf) {
                    if fallback_positions == 0 {
                        warn!(error = %e, "Entropy source failed, using positional fallback");
                    }
                    let position = code.len();
                    code.push(ALPHABET[position * 17 % ALPHABET.len()] as char);
                    fallback_positions += 1;
                    continue;
                }
                cursor = 0;
            }

            let byte = buf[cursor];
            cursor += 1;

            if byte < ACCEPT_BELOW {
                code.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
            }
        }

        if fallback_positions > 0 {
            counter!("shortcode_entropy_fallback_total").increment(1);
        }

        code
    }

    fn validate(&self, code: &str) -> bool {
        code.len() == self.length && code.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}

fn os_entropy(buf: &mut [u8]) -> io::Result<()> {
    getrandom::fill(buf).map_err(io::Error::other)
}
