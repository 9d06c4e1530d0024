//! Runtime configuration sourced from the environment, with sane defaults
//! for every knob so the binary runs with no setup.

use std::env;

#[derive(Debug, Clone)]
pub struct StridefeedConfig {
    /// Display name the local session posts and likes under.
    pub local_user: String,
    pub channel: ChannelConfig,
    pub sim: SimConfig,
}

impl StridefeedConfig {
    pub fn from_env() -> Self {
        let local_user = env::var("STRIDEFEED_LOCAL_USER")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "You".to_string());

        Self {
            local_user,
            channel: ChannelConfig::from_env(),
            sim: SimConfig::from_env(),
        }
    }
}

impl Default for StridefeedConfig {
    fn default() -> Self {
        Self {
            local_user: "You".to_string(),
            channel: ChannelConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Capacity of the broadcast channel carrying server events to clients.
    pub event_buffer: usize,
    /// Capacity of the queue collecting client emissions for the relay.
    pub emit_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            event_buffer: 128,
            emit_buffer: 256,
        }
    }
}

impl ChannelConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            event_buffer: parse_env("STRIDEFEED_CHANNEL_BUFFER", defaults.event_buffer),
            emit_buffer: parse_env("STRIDEFEED_EMIT_BUFFER", defaults.emit_buffer),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Milliseconds between synthetic peer actions during a demo session.
    pub tick_ms: u64,
    /// How long the demo session runs before printing the final view.
    pub duration_secs: u64,
    /// Fixed RNG seed for reproducible synthetic activity.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1500,
            duration_secs: 20,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_ms: parse_env("STRIDEFEED_TICK_MS", defaults.tick_ms),
            duration_secs: parse_env("STRIDEFEED_SIM_SECS", defaults.duration_secs),
            seed: env::var("STRIDEFEED_SIM_SEED")
                .ok()
                .and_then(|raw| raw.parse().ok()),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = StridefeedConfig::default();
        assert_eq!(config.local_user, "You");
        assert_eq!(config.channel.event_buffer, 128);
        assert_eq!(config.channel.emit_buffer, 256);
        assert_eq!(config.sim.tick_ms, 1500);
        assert!(config.sim.seed.is_none());
    }
}
