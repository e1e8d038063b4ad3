//! Configuration loading and resolution.
//!
//! Every setting is taken from the command line first, then the
//! environment, then a built-in default.

use crate::session::SessionConfig;
use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_COOKIE_FILE: &str = "cookies.json";

/// How browser sessions are allocated to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SessionMode {
    /// One browser for the whole process; requests take turns.
    #[default]
    Shared,
    /// A fresh browser per request, closed afterwards.
    PerRequest,
}

impl SessionMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "shared" => Some(SessionMode::Shared),
            "per-request" | "request" => Some(SessionMode::PerRequest),
            _ => None,
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Shared => f.write_str("shared"),
            SessionMode::PerRequest => f.write_str("per-request"),
        }
    }
}

/// Browser flags shared by `serve` and `scrape`.
#[derive(Debug, Clone, Default, Args)]
pub struct BrowserArgs {
    /// Run Chromium without a window
    #[arg(long)]
    pub headless: bool,

    /// Cookie file to load on start and save on shutdown
    #[arg(long, value_name = "PATH")]
    pub cookies: Option<PathBuf>,

    /// Do not read or write the cookie file
    #[arg(long)]
    pub no_cookies: bool,

    /// Directory for diagnostic screenshots
    #[arg(long, value_name = "DIR")]
    pub debug_dir: Option<PathBuf>,
}

/// Flags for `serve`.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub browser: BrowserArgs,

    /// Port to listen on
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Session allocation strategy
    #[arg(long, value_enum)]
    pub mode: Option<SessionMode>,
}

/// Fully resolved server settings.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub addr: SocketAddr,
    pub mode: SessionMode,
    pub session: SessionConfig,
}

impl ServeConfig {
    /// Resolve against the process environment.
    pub fn resolve(args: &ServeArgs) -> Result<Self> {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn resolve_with(args: &ServeArgs, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match args.port {
            Some(port) => port,
            None => match env("PORT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid PORT value {raw:?}"))?,
                None => DEFAULT_PORT,
            },
        };

        let host = args
            .host
            .clone()
            .or_else(|| env("JOBSCOUT_HOST"))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid listen address {host}:{port}"))?;

        let mode = match args.mode {
            Some(mode) => mode,
            None => match env("JOBSCOUT_SESSION_MODE") {
                Some(raw) => match SessionMode::parse(&raw) {
                    Some(mode) => mode,
                    None => bail!("invalid JOBSCOUT_SESSION_MODE value {raw:?}"),
                },
                None => SessionMode::default(),
            },
        };

        Ok(Self {
            addr,
            mode,
            session: session_config_with(&args.browser, env),
        })
    }
}

/// Session settings for the current process environment.
pub fn session_config(args: &BrowserArgs) -> SessionConfig {
    session_config_with(args, |key| std::env::var(key).ok())
}

pub fn session_config_with(
    args: &BrowserArgs,
    env: impl Fn(&str) -> Option<String>,
) -> SessionConfig {
    let headless = args.headless || env("JOBSCOUT_HEADLESS").is_some_and(|v| truthy(&v));
    let use_cookies = !(args.no_cookies || env("JOBSCOUT_NO_COOKIES").is_some_and(|v| truthy(&v)));
    let cookie_file = args
        .cookies
        .clone()
        .or_else(|| env("JOBSCOUT_COOKIES").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIE_FILE));
    let diagnostics_dir = args
        .debug_dir
        .clone()
        .or_else(|| env("JOBSCOUT_DEBUG_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    SessionConfig {
        headless,
        use_cookies,
        cookie_file,
        diagnostics_dir,
        ..SessionConfig::default()
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServeConfig::resolve_with(&ServeArgs::default(), env_of(&[])).unwrap();
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.mode, SessionMode::Shared);
        assert!(!config.session.headless);
        assert!(config.session.use_cookies);
        assert_eq!(config.session.cookie_file, PathBuf::from("cookies.json"));
        assert_eq!(config.session.diagnostics_dir, PathBuf::from("."));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let env = env_of(&[
            ("PORT", "8080"),
            ("JOBSCOUT_HOST", "127.0.0.1"),
            ("JOBSCOUT_SESSION_MODE", "per-request"),
            ("JOBSCOUT_HEADLESS", "true"),
            ("JOBSCOUT_NO_COOKIES", "1"),
            ("JOBSCOUT_COOKIES", "/tmp/c.json"),
        ]);
        let config = ServeConfig::resolve_with(&ServeArgs::default(), env).unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.mode, SessionMode::PerRequest);
        assert!(config.session.headless);
        assert!(!config.session.use_cookies);
        assert_eq!(config.session.cookie_file, PathBuf::from("/tmp/c.json"));
    }

    #[test]
    fn test_flags_override_env() {
        let args = ServeArgs {
            port: Some(9000),
            mode: Some(SessionMode::Shared),
            browser: BrowserArgs {
                cookies: Some(PathBuf::from("mine.json")),
                ..BrowserArgs::default()
            },
            ..ServeArgs::default()
        };
        let env = env_of(&[
            ("PORT", "8080"),
            ("JOBSCOUT_SESSION_MODE", "per-request"),
            ("JOBSCOUT_COOKIES", "theirs.json"),
        ]);
        let config = ServeConfig::resolve_with(&args, env).unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.mode, SessionMode::Shared);
        assert_eq!(config.session.cookie_file, PathBuf::from("mine.json"));
    }

    #[test]
    fn test_invalid_env_values_are_errors() {
        let bad_port = ServeConfig::resolve_with(&ServeArgs::default(), env_of(&[("PORT", "http")]));
        assert!(bad_port.is_err());

        let bad_mode = ServeConfig::resolve_with(
            &ServeArgs::default(),
            env_of(&[("JOBSCOUT_SESSION_MODE", "pooled")]),
        );
        assert!(bad_mode.is_err());
    }

    #[test]
    fn test_falsey_env_flags() {
        let env = env_of(&[("JOBSCOUT_HEADLESS", "no"), ("JOBSCOUT_NO_COOKIES", "0")]);
        let session = session_config_with(&BrowserArgs::default(), env);
        assert!(!session.headless);
        assert!(session.use_cookies);
    }
}
