use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::UserId, errors::Error, Result};

/// Typed configuration, loaded from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    // Access control
    pub owner_id: i64,
    /// Operators ("sudo users"). Always contains the owner.
    pub operator_ids: Vec<i64>,

    // Storage
    pub directory_file: PathBuf,

    // Timing
    pub broadcast_delay: Duration,
    pub lookup_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let owner_id = env_str("OWNER_ID")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                Error::Config("OWNER_ID environment variable is required (numeric)".to_string())
            })?;
        let operator_ids = with_owner(owner_id, parse_csv_i64(env_str("SUDO_USERS")));

        let directory_file = PathBuf::from(
            env_str("DIRECTORY_FILE").unwrap_or("/tmp/tgdir-directory.json".to_string()),
        );
        if let Some(parent) = directory_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let broadcast_delay =
            Duration::from_millis(env_u64("BROADCAST_DELAY_MS").unwrap_or(100));
        let lookup_timeout = Duration::from_millis(env_u64("LOOKUP_TIMEOUT_MS").unwrap_or(5_000));

        Ok(Self {
            telegram_bot_token,
            owner_id,
            operator_ids,
            directory_file,
            broadcast_delay,
            lookup_timeout,
        })
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        user_id.0 == self.owner_id
    }

    pub fn is_operator(&self, user_id: UserId) -> bool {
        self.operator_ids.contains(&user_id.0)
    }
}

fn with_owner(owner_id: i64, mut operators: Vec<i64>) -> Vec<i64> {
    if !operators.contains(&owner_id) {
        operators.insert(0, owner_id);
    }
    operators
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}
