use secrecy::SecretString;
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path, time::Duration};

use crate::{chat::ChatSite, Error, InternalResult};

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Prefix that marks a message as a command, e.g. `!!help`.
    #[serde(default = "default_trigger")]
    pub trigger: String,

    #[serde(default)]
    pub site: ChatSite,

    #[serde(default)]
    pub rooms: Vec<u64>,

    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Messages from this user are never dispatched.
    #[serde(default)]
    pub bot_user_id: Option<u64>,

    #[serde(default = "default_initial_delay", with = "duration_ms")]
    pub initial_delay: Duration,

    #[serde(default = "default_query_interval", with = "duration_ms")]
    pub query_interval: Duration,

    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            site: ChatSite::default(),
            rooms: Vec::new(),
            credentials: None,
            bot_user_id: None,
            initial_delay: default_initial_delay(),
            query_interval: default_query_interval(),
            max_message_length: default_max_message_length(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl BotConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        from_file(path)
    }

    pub fn validate(&self) -> InternalResult<()> {
        if self.trigger.is_empty() {
            return Err(Error::Config("trigger must not be empty".to_string()));
        }
        if self.query_interval.is_zero() {
            return Err(Error::Config(
                "query interval must be greater than 0".to_string(),
            ));
        }
        if self.max_message_length == 0 {
            return Err(Error::Config(
                "max message length must be greater than 0".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(Error::Config(
                "channel capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Login credentials for the chat service.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let file = File::open(path)
        .map_err(|e| Error::Config(format!("Failed to open config file: {}", e)))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

fn default_trigger() -> String {
    "!!".to_string()
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_query_interval() -> Duration {
    Duration::from_secs(3)
}

// chat service limit for a single message
fn default_max_message_length() -> usize {
    500
}

fn default_channel_capacity() -> usize {
    100
}

mod duration_ms {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
