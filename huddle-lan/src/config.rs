//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

/// Host configuration. File: ~/.config/huddle/config.toml or
/// /etc/huddle/config.toml. Env overrides: HUDDLE_DISCOVERY_PORT,
/// HUDDLE_SESSION_PORT, HUDDLE_SERVICE, HUDDLE_DISPLAY_NAME.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Discovery UDP port (default 45710).
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    /// Session TCP port (default 45711).
    #[serde(default = "default_session_port")]
    pub session_port: u16,
    /// Advertised service name; only peers with the same service connect.
    #[serde(default = "default_service")]
    pub service: String,
    /// Display name shown to peers.
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

fn default_discovery_port() -> u16 {
    45710
}
fn default_session_port() -> u16 {
    45711
}
fn default_service() -> String {
    "huddle".to_string()
}
fn default_display_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "huddle".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery_port: default_discovery_port(),
            session_port: default_session_port(),
            service: default_service(),
            display_name: default_display_name(),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_else(Config::default);
    if let Ok(s) = std::env::var("HUDDLE_DISCOVERY_PORT") {
        if let Ok(p) = s.parse::<u16>() {
            c.discovery_port = p;
        }
    }
    if let Ok(s) = std::env::var("HUDDLE_SESSION_PORT") {
        if let Ok(p) = s.parse::<u16>() {
            c.session_port = p;
        }
    }
    if let Ok(s) = std::env::var("HUDDLE_SERVICE") {
        if !s.is_empty() {
            c.service = s;
        }
    }
    if let Ok(s) = std::env::var("HUDDLE_DISPLAY_NAME") {
        if !s.is_empty() {
            c.display_name = s;
        }
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/huddle/config.toml"));
    }
    out.push(PathBuf::from("/etc/huddle/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            if let Ok(s) = std::fs::read_to_string(&p) {
                if let Ok(c) = toml::from_str::<Config>(&s) {
                    return Some(c);
                }
            }
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c.discovery_port, 45710);
        assert_eq!(c.session_port, 45711);
        assert_eq!(c.service, "huddle");
    }

    #[test]
    fn file_overrides_ports() {
        let c: Config = toml::from_str(
            "discovery_port = 50000\nsession_port = 50001\nservice = \"doodle\"\n",
        )
        .unwrap();
        assert_eq!(c.discovery_port, 50000);
        assert_eq!(c.session_port, 50001);
        assert_eq!(c.service, "doodle");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("proxy_port = 3128\n").is_err());
    }
}
