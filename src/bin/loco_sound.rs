//! Command line runner: listens to a Z21 and plays locomotive sounds.
//!
//! Runs a poll loop that:
//! - Keeps the station session alive
//! - Decodes locomotive status reports
//! - Feeds them to the registered engines
//! - Fires due chuffs
//!
//! Sounds go through [`LogPlayer`], so every playback shows up as a log line.
//!
//! # Environment
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `Z21_HOST` | `192.168.0.111` | Station address |
//! | `Z21_PORT` | `21105` | Station UDP port |
//! | `LOCO_ADDRESSES` | `232,2` | Comma separated locomotive addresses |
//! | `RUST_LOG` | `loco_sound=info` | Log filter |
//!
//! # Build
//!
//! ```bash
//! cargo run --features cli
//! ```

use std::thread;
use std::time::Duration;

use anyhow::Context;
use loco_sound::hal::{LogPlayer, SystemClock, UdpTransport};
use loco_sound::traits::Clock;
use loco_sound::{Collector, Config, Z21Client, Z21Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("loco_sound=info")),
        )
        .init();

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = load_config()?;
    info!(
        host = config.z21.host.as_str(),
        port = config.z21.port,
        locos = ?config.locos,
        "starting"
    );

    // =========================================================================
    // Collaborators
    // =========================================================================
    let clock = SystemClock::new();
    let transport = UdpTransport::connect(&config.z21)
        .with_context(|| format!("connecting to {}:{}", config.z21.host, config.z21.port))?;
    let mut client = Z21Client::new(transport, &config.z21);
    let mut collector = Collector::with_config(LogPlayer::new(), config.sound, config.chuff);
    for &address in &config.locos {
        collector.register(address);
    }

    // =========================================================================
    // Session
    // =========================================================================
    client.login(clock.now_ms()).context("login")?;
    if config.z21.subscribe_all {
        client.subscribe_all_locos().context("subscribe")?;
    } else {
        for &address in &config.locos {
            client
                .subscribe_loco(address)
                .with_context(|| format!("subscribe loco {address}"))?;
        }
    }

    // =========================================================================
    // Main Loop
    // =========================================================================
    let poll_interval = Duration::from_millis(u64::from(config.poll_interval_ms));
    loop {
        collector.service(&mut client, clock.now_ms());
        thread::sleep(poll_interval);
    }
}

/// Default configuration overridden from the environment.
fn load_config() -> anyhow::Result<Config> {
    let mut z21 = Z21Config::default();
    if let Ok(host) = std::env::var("Z21_HOST") {
        z21 = z21.with_host(&host);
    }
    if let Ok(port) = std::env::var("Z21_PORT") {
        z21 = z21.with_port(port.parse().context("Z21_PORT")?);
    }

    let mut config = Config::default().with_z21(z21);
    if let Ok(list) = std::env::var("LOCO_ADDRESSES") {
        let locos = list
            .split(',')
            .map(|part| part.trim().parse::<u16>())
            .collect::<Result<Vec<_>, _>>()
            .context("LOCO_ADDRESSES")?;
        config = config.with_locos(&locos);
    }
    Ok(config)
}
