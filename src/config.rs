//! Configuration for the station connection, sounds and chuff pacing.
//!
//! Uses `heapless::String` for host names so every config value has a
//! fixed size.
//!
//! # Example
//!
//! ```rust
//! use loco_sound::config::{Config, SoundConfig, Z21Config};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.z21.port, 21105);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_z21(Z21Config::default().with_host("192.168.1.50"))
//!     .with_sound(SoundConfig::default().with_brake_on_stop(true))
//!     .with_locos(&[3, 42]);
//! assert_eq!(config.locos, vec![3, 42]);
//! ```

use heapless::String as HString;

/// Maximum length for short config strings (hostnames)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Default Z21 UDP port.
pub const DEFAULT_Z21_PORT: u16 = 21105;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Command station connection
    pub z21: Z21Config,
    /// Sound behaviour
    pub sound: SoundConfig,
    /// Chuff pacing curve
    pub chuff: ChuffProfile,
    /// Locomotive addresses to simulate
    pub locos: Vec<u16>,
    /// Sleep between poll loop iterations in milliseconds
    pub poll_interval_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            z21: Z21Config::default(),
            sound: SoundConfig::default(),
            chuff: ChuffProfile::default(),
            locos: vec![232, 2],
            poll_interval_ms: 1,
        }
    }
}

impl Config {
    /// Set station configuration
    pub fn with_z21(mut self, z21: Z21Config) -> Self {
        self.z21 = z21;
        self
    }

    /// Set sound configuration
    pub fn with_sound(mut self, sound: SoundConfig) -> Self {
        self.sound = sound;
        self
    }

    /// Set the chuff pacing curve
    pub fn with_chuff(mut self, chuff: ChuffProfile) -> Self {
        self.chuff = chuff;
        self
    }

    /// Set the simulated locomotive addresses
    pub fn with_locos(mut self, locos: &[u16]) -> Self {
        self.locos = locos.to_vec();
        self
    }

    /// Set the poll loop sleep
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }
}

// ============================================================================
// Z21 Config
// ============================================================================

/// Command station connection configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Z21Config {
    /// Station hostname or IP
    pub host: ShortString,
    /// Station UDP port (also bound locally)
    pub port: u16,
    /// Re-login interval in seconds; the station drops silent clients
    pub keep_alive_secs: u16,
    /// Subscribe to every locomotive instead of one request per address
    pub subscribe_all: bool,
}

impl Default for Z21Config {
    fn default() -> Self {
        Self {
            host: short_string("192.168.0.111"),
            port: DEFAULT_Z21_PORT,
            keep_alive_secs: 30,
            subscribe_all: true,
        }
    }
}

impl Z21Config {
    /// Set the station host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the station port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the keep-alive interval
    pub fn with_keep_alive_secs(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Choose between broadcast and per-locomotive subscription
    pub fn with_subscribe_all(mut self, all: bool) -> Self {
        self.subscribe_all = all;
        self
    }

    /// Keep-alive interval in milliseconds
    pub fn keep_alive_ms(&self) -> u64 {
        u64::from(self.keep_alive_secs) * 1000
    }
}

// ============================================================================
// Sound Config
// ============================================================================

/// Per-locomotive sound behaviour
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundConfig {
    /// Volume of the start (steam release) sound, 0.0 to 1.0
    pub start_volume: f32,
    /// Volume of the brake sound, 0.0 to 1.0
    pub brake_volume: f32,
    /// Play the brake sound when the locomotive comes to a stop
    pub brake_on_stop: bool,
    /// Number of cylinder sounds chuffs cycle through (at least 1)
    pub cylinders: u8,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            start_volume: 0.15,
            brake_volume: 0.2,
            brake_on_stop: false,
            cylinders: 2,
        }
    }
}

impl SoundConfig {
    /// Set the start sound volume
    pub fn with_start_volume(mut self, level: f32) -> Self {
        self.start_volume = level.clamp(0.0, 1.0);
        self
    }

    /// Set the brake sound volume
    pub fn with_brake_volume(mut self, level: f32) -> Self {
        self.brake_volume = level.clamp(0.0, 1.0);
        self
    }

    /// Enable or disable the brake sound on stop
    pub fn with_brake_on_stop(mut self, enabled: bool) -> Self {
        self.brake_on_stop = enabled;
        self
    }

    /// Set the number of cylinder sounds
    pub fn with_cylinders(mut self, cylinders: u8) -> Self {
        self.cylinders = cylinders.max(1);
        self
    }
}

// ============================================================================
// Chuff Profile
// ============================================================================

/// Chuff interval curve: `interval = coefficient_s * speed^exponent` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChuffProfile {
    /// Interval at speed 1, in seconds
    pub coefficient_s: f64,
    /// Power applied to the speed (negative: faster means shorter)
    pub exponent: f64,
}

impl Default for ChuffProfile {
    fn default() -> Self {
        Self {
            coefficient_s: 4.6,
            exponent: -0.75,
        }
    }
}

impl ChuffProfile {
    /// Set the coefficient
    pub fn with_coefficient_s(mut self, seconds: f64) -> Self {
        self.coefficient_s = seconds;
        self
    }

    /// Set the exponent
    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    /// Chuff interval rounded to whole milliseconds, `None` when stopped.
    ///
    /// ```rust
    /// use loco_sound::config::ChuffProfile;
    ///
    /// let profile = ChuffProfile::default();
    /// assert_eq!(profile.interval_ms(0), None);
    /// assert_eq!(profile.interval_ms(1), Some(4600));
    /// assert_eq!(profile.interval_ms(60), Some(213));
    /// ```
    pub fn interval_ms(&self, speed: u16) -> Option<u64> {
        if speed == 0 {
            return None;
        }
        let seconds = self.coefficient_s * f64::from(speed).powf(self.exponent);
        Some((seconds * 1000.0).round() as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================
