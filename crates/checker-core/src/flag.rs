//! Flag generation and tick-to-timestamp derivation.
//!
//! A flag is addressed by (team, service, timestamp, payload). The timestamp
//! is `start_time + tick_duration * tick`, so the same tick always maps to
//! the same flag and nothing has to be persisted between rounds.
//!
//! Token layout produced by [`HmacFlagGenerator`]:
//!
//! ```text
//! prefix ‖ hex( timestamp:u64be ‖ team:u32be ‖ service:u32be ‖ payload:[u8; 8] ‖ mac:[u8; 9] )
//! ```
//!
//! where `mac` is the leading bytes of HMAC-SHA256 over everything before it.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use crate::types::{ServiceId, TeamId, Tick, Timestamp};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_FLAG_PREFIX: &str = "FLAG_";

/// Tick length used until the runner configures one.
pub const DEFAULT_TICK_DURATION: Duration = Duration::from_secs(180);

/// Fixed payload width inside a token.
pub const PAYLOAD_LEN: usize = 8;

const MAC_LEN: usize = 9;
const PROTECTED_LEN: usize = 8 + 4 + 4 + PAYLOAD_LEN;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("payload is {0} bytes, at most 8 fit in a flag")]
    PayloadTooLong(usize),

    #[error("timestamp for tick {0} overflows")]
    TimestampOverflow(Tick),

    #[error("tick duration must be a positive whole number of seconds, got {0:?}")]
    InvalidTickDuration(Duration),

    #[error("no flag secret configured")]
    MissingSecret,

    #[error("malformed flag: {0}")]
    InvalidFormat(String),

    #[error("flag MAC does not match")]
    InvalidMac,

    #[error("flag generator failed: {0}")]
    Generator(String),
}

/// Produces the flag token for one (team, service, payload, timestamp).
///
/// Implementations must be pure: identical inputs give identical tokens.
pub trait FlagGenerator {
    fn generate(
        &self,
        team: TeamId,
        service: ServiceId,
        payload: Option<&[u8]>,
        timestamp: Timestamp,
    ) -> Result<String, FlagError>;
}

impl<G: FlagGenerator + ?Sized> FlagGenerator for &G {
    fn generate(
        &self,
        team: TeamId,
        service: ServiceId,
        payload: Option<&[u8]>,
        timestamp: Timestamp,
    ) -> Result<String, FlagError> {
        (**self).generate(team, service, payload, timestamp)
    }
}

/// Decoded contents of an authenticated flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagInfo {
    pub timestamp: Timestamp,
    pub team: TeamId,
    pub service: ServiceId,
    pub payload: [u8; PAYLOAD_LEN],
}

/// HMAC-SHA256 flag generator keyed by a shared competition secret.
#[derive(Clone)]
pub struct HmacFlagGenerator {
    secret: Vec<u8>,
    prefix: String,
}

impl std::fmt::Debug for HmacFlagGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacFlagGenerator")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl HmacFlagGenerator {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            prefix: DEFAULT_FLAG_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn mac(&self) -> Result<HmacSha256, FlagError> {
        if self.secret.is_empty() {
            return Err(FlagError::MissingSecret);
        }
        HmacSha256::new_from_slice(&self.secret).map_err(|e| FlagError::Generator(e.to_string()))
    }

    /// Check a token's prefix and MAC and decode its fields.
    pub fn verify(&self, token: &str) -> Result<FlagInfo, FlagError> {
        let body = token
            .trim()
            .strip_prefix(&self.prefix)
            .ok_or_else(|| FlagError::InvalidFormat(format!("missing prefix {:?}", self.prefix)))?;
        let raw = hex::decode(body).map_err(|e| FlagError::InvalidFormat(e.to_string()))?;
        if raw.len() != PROTECTED_LEN + MAC_LEN {
            return Err(FlagError::InvalidFormat(format!(
                "expected {} bytes, got {}",
                PROTECTED_LEN + MAC_LEN,
                raw.len()
            )));
        }

        let (protected, tag) = raw.split_at(PROTECTED_LEN);
        let mut mac = self.mac()?;
        mac.update(protected);
        mac.verify_truncated_left(tag)
            .map_err(|_| FlagError::InvalidMac)?;

        let mut timestamp = [0u8; 8];
        let mut team = [0u8; 4];
        let mut service = [0u8; 4];
        let mut payload = [0u8; PAYLOAD_LEN];
        timestamp.copy_from_slice(&protected[0..8]);
        team.copy_from_slice(&protected[8..12]);
        service.copy_from_slice(&protected[12..16]);
        payload.copy_from_slice(&protected[16..]);

        Ok(FlagInfo {
            timestamp: u64::from_be_bytes(timestamp),
            team: TeamId(u32::from_be_bytes(team)),
            service: ServiceId(u32::from_be_bytes(service)),
            payload,
        })
    }
}

impl FlagGenerator for HmacFlagGenerator {
    fn generate(
        &self,
        team: TeamId,
        service: ServiceId,
        payload: Option<&[u8]>,
        timestamp: Timestamp,
    ) -> Result<String, FlagError> {
        let payload = payload.unwrap_or_default();
        if payload.len() > PAYLOAD_LEN {
            return Err(FlagError::PayloadTooLong(payload.len()));
        }

        let mut data = Vec::with_capacity(PROTECTED_LEN + MAC_LEN);
        data.extend_from_slice(&timestamp.to_be_bytes());
        data.extend_from_slice(&team.0.to_be_bytes());
        data.extend_from_slice(&service.0.to_be_bytes());
        data.extend_from_slice(payload);
        data.resize(PROTECTED_LEN, 0);

        let mut mac = self.mac()?;
        mac.update(&data);
        let tag = mac.finalize().into_bytes();
        data.extend_from_slice(&tag[..MAC_LEN]);

        Ok(format!("{}{}", self.prefix, hex::encode(data)))
    }
}

/// Timestamps are whole seconds, so a tick must be too.
pub fn check_tick_duration(tick_duration: Duration) -> Result<Duration, FlagError> {
    if tick_duration.is_zero() || tick_duration.subsec_nanos() != 0 {
        return Err(FlagError::InvalidTickDuration(tick_duration));
    }
    Ok(tick_duration)
}

/// Maps ticks onto the competition clock and asks a generator for the flag.
#[derive(Debug, Clone)]
pub struct FlagDeriver<G> {
    team: TeamId,
    service: ServiceId,
    start_time: Timestamp,
    tick_duration: Duration,
    generator: G,
}

impl<G: FlagGenerator> FlagDeriver<G> {
    /// A deriver starting at timestamp 0 with the default tick duration.
    pub fn new(team: TeamId, service: ServiceId, generator: G) -> Self {
        Self {
            team,
            service,
            start_time: 0,
            tick_duration: DEFAULT_TICK_DURATION,
            generator,
        }
    }

    pub fn with_clock(
        mut self,
        start_time: Timestamp,
        tick_duration: Duration,
    ) -> Result<Self, FlagError> {
        self.start_time = start_time;
        self.tick_duration = check_tick_duration(tick_duration)?;
        Ok(self)
    }

    pub fn set_start_time(&mut self, start_time: Timestamp) {
        self.start_time = start_time;
    }

    pub fn set_tick_duration(&mut self, tick_duration: Duration) -> Result<(), FlagError> {
        self.tick_duration = check_tick_duration(tick_duration)?;
        Ok(())
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Absolute timestamp of `tick`.
    pub fn timestamp_for(&self, tick: Tick) -> Result<Timestamp, FlagError> {
        self.tick_duration
            .as_secs()
            .checked_mul(tick)
            .and_then(|offset| self.start_time.checked_add(offset))
            .ok_or(FlagError::TimestampOverflow(tick))
    }

    /// Tick containing `timestamp`, or `None` before the start.
    pub fn tick_for(&self, timestamp: Timestamp) -> Option<Tick> {
        let secs = self.tick_duration.as_secs();
        if secs == 0 {
            return None;
        }
        timestamp.checked_sub(self.start_time).map(|elapsed| elapsed / secs)
    }

    /// The flag for `tick`, optionally carrying `payload`.
    pub fn derive(&self, tick: Tick, payload: Option<&[u8]>) -> Result<String, FlagError> {
        let timestamp = self.timestamp_for(tick)?;
        debug!(team = %self.team, service = %self.service, tick, timestamp, "deriving flag");
        self.generator
            .generate(self.team, self.service, payload, timestamp)
    }
}
