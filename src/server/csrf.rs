//! Anti-forgery tokens for state-changing form posts.
//!
//! Tokens are minted per action and, for authenticated actions, bound to the
//! caller's session. They are derived rather than stored: a truncated hash of
//! the server secret, the action name, the scope and a coarse time tick, so
//! verification needs no state and tokens expire on their own.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub const ACTION_LOAD_MORE: &str = "load_more_events";
pub const ACTION_EVENT_EDIT: &str = "event_edit";

/// Tokens from the previous tick still verify, so the effective lifetime is
/// between one and two ticks.
const TICK_SECONDS: u64 = 43_200;
const TOKEN_CHARS: usize = 24;

pub struct TokenForge {
    secret: Vec<u8>,
}

impl TokenForge {
    /// A forge with the configured secret, or a random per-process secret
    /// when none is configured (outstanding tokens then stop verifying when
    /// the server restarts).
    pub fn new(secret: Option<Vec<u8>>) -> Self {
        let secret = secret.unwrap_or_else(|| {
            let random: [u8; 32] = rand::rng().random();
            random.to_vec()
        });
        TokenForge { secret }
    }

    fn digest(&self, action: &str, scope: &str, tick: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update([0x1f]);
        hasher.update(action.as_bytes());
        hasher.update([0x1f]);
        hasher.update(scope.as_bytes());
        hasher.update([0x1f]);
        hasher.update(tick.to_le_bytes());
        let encoded = URL_SAFE_NO_PAD.encode(hasher.finalize());
        encoded[..TOKEN_CHARS].to_string()
    }

    fn current_tick() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            / TICK_SECONDS
    }

    /// Mints a token for an action. `scope` binds the token to a session
    /// token; pass an empty scope for actions open to anonymous visitors.
    pub fn mint(&self, action: &str, scope: &str) -> String {
        self.digest(action, scope, Self::current_tick())
    }

    /// Accepts tokens minted in the current or the previous tick.
    pub fn verify(&self, action: &str, scope: &str, token: &str) -> bool {
        let tick = Self::current_tick();
        token == self.digest(action, scope, tick)
            || (tick > 0 && token == self.digest(action, scope, tick - 1))
    }
}
