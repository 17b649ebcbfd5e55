use std::time::Duration;

use tracing::warn;

use crate::render::{Style, Theme};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// `VERBOSE_LANG=1` turns on the aggregator's diagnostic trace. Exposed on
/// its own because logging is set up before the rest of the config is read.
pub fn verbose_languages<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup("VERBOSE_LANG").as_deref() == Some("1")
}

/// Process-wide settings, read from the environment once at startup and then
/// passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: Option<String>,
    pub verbose_languages: bool,
    pub api_base: String,
    pub timeout: Duration,
    pub style: Style,
    pub theme: Theme,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup instead of the real
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("GITHUB_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let verbose_languages = verbose_languages(&lookup);

        let api_base = lookup("GITHUB_API_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let style = match lookup("GH_LANGSTATS_STYLE") {
            None => Style::Dashboard,
            Some(raw) => Style::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown GH_LANGSTATS_STYLE, using dashboard");
                Style::Dashboard
            }),
        };

        let theme = match lookup("GH_LANGSTATS_THEME") {
            None => Theme::Dark,
            Some(raw) => Theme::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown GH_LANGSTATS_THEME, using dark");
                Theme::Dark
            }),
        };

        Self {
            token,
            verbose_languages,
            api_base,
            timeout: REQUEST_TIMEOUT,
            style,
            theme,
        }
    }
}
