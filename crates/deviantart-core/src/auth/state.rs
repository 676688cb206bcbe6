use std::fmt;

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

const STATE_LEN: usize = 32;

/// Anti-forgery token round-tripped through the authorization redirect.
///
/// A fresh value is drawn from the thread-local CSPRNG for every attempt. The
/// `Debug` impl is redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct StateToken(String);

impl StateToken {
    pub fn generate() -> Self {
        Self(random_string(STATE_LEN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against the value returned by the provider without
    /// short-circuiting on the first differing byte.
    pub fn verify(&self, returned: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), returned.as_bytes())
    }
}

impl fmt::Debug for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateToken(..)")
    }
}

fn random_string(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
