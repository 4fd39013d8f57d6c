use std::{env, net::SocketAddr};

use dotenvy::dotenv;
use tracing::Level;
use url::Url;

use crate::error::ConfigError;

const DEFAULT_API_BASE_URL: &str = "http://localhost:9096";

#[derive(Debug, Clone)]
pub struct Config {
    pub teloxide_token: String,
    pub api_base_url: Url,
    pub log_level: Level,
    /// Public URL and local listen address for webhook mode.
    pub webhook: Option<(Url, SocketAddr)>,
    /// Seconds allowed for quizzes that carry no time limit themselves.
    pub default_time_limit: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let teloxide_token =
            env::var("TELOXIDE_TOKEN").map_err(|_| ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let api_base_url = match parse_var::<Url>("API_BASE_URL")? {
            Some(url) => url,
            None => parse_value("API_BASE_URL", DEFAULT_API_BASE_URL)?,
        };

        let log_level = parse_var("LOG_LEVEL")?.unwrap_or(Level::INFO);

        let webhook = match (parse_var::<Url>("NGROK_URL")?, parse_var::<SocketAddr>("NGROK_ADDR")?) {
            (Some(url), Some(addr)) => Some((url, addr)),
            _ => None,
        };

        let default_time_limit = parse_var::<u32>("QUIZ_TIME_LIMIT_SECS")?.filter(|secs| *secs > 0);

        Ok(Self {
            teloxide_token,
            api_base_url,
            log_level,
            webhook,
            default_time_limit,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse_value(name, &value).map(Some),
        _ => Ok(None),
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_parsed_or_reported() {
        assert_eq!(parse_value::<u32>("X", " 90 ").unwrap(), 90);
        assert_eq!(parse_value::<Level>("LOG_LEVEL", "debug").unwrap(), Level::DEBUG);
        let err = parse_value::<Url>("API_BASE_URL", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "API_BASE_URL", .. }));
    }
}
