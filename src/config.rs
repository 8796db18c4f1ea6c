pub const API_BASE_URL: &'static str = "https://hack-or-snooze-v3.herokuapp.com";
pub const TOKEN_STORAGE_KEY: &'static str = "token";
pub const USERNAME_STORAGE_KEY: &'static str = "username";
pub const LOG_LEVEL: &'static str = "info";

/// Runtime settings. Every field falls back to its default when missing,
/// so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub token_key: String,
    pub username_key: String,
    /// `log` level name such as "debug" or "warn".
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: API_BASE_URL.into(),
            token_key: TOKEN_STORAGE_KEY.into(),
            username_key: USERNAME_STORAGE_KEY.into(),
            log_level: LOG_LEVEL.into(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Falls back to `Info` for names `log` does not know.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"api_base_url": "http://localhost:5000"}"#).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.token_key, "token");
        assert_eq!(config.username_key, "username");
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn log_level_names() {
        let config = Config::from_json(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);

        let config = Config::from_json(r#"{"log_level": "loud"}"#).unwrap();
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(Config::from_json("not json").is_err());
    }
}
