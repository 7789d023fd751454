use crate::app::AppError;
use crate::domain::keys::HistoryKeyMode;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub http_bind: String,
    pub cors_allowed_origin: Option<String>,
    pub history_key_mode: HistoryKeyMode,
    pub api_url: Option<String>,
    pub remote_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let history_key_mode = match non_empty(&lookup, "HISTORY_KEY_MODE") {
            Some(raw) => raw
                .parse::<HistoryKeyMode>()
                .map_err(|_| AppError::config("HISTORY_KEY_MODE must be 'time' or 'date'"))?,
            None => HistoryKeyMode::default(),
        };

        let api_url = non_empty(&lookup, "LEDGER_API_URL");
        if let Some(url) = &api_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(AppError::config(
                "LEDGER_API_URL must start with http:// or https://",
            ));
        }

        Ok(Self {
            db_path: non_empty(&lookup, "LEDGER_DB_PATH")
                .unwrap_or_else(|| "/var/lib/event-ledger/ledger.db".to_string()),
            http_bind: non_empty(&lookup, "HTTP_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            cors_allowed_origin: non_empty(&lookup, "CORS_ALLOWED_ORIGIN"),
            history_key_mode,
            api_url,
            remote_timeout_ms: parse_or_default(&lookup, "REMOTE_TIMEOUT_MS", 5000_u64)?,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use crate::domain::keys::HistoryKeyMode;

    #[test]
    fn applies_defaults_for_optional_fields() {
        let result = AppConfig::from_lookup(|_| None).expect("config should be valid");

        assert_eq!(result.db_path, "/var/lib/event-ledger/ledger.db");
        assert_eq!(result.http_bind, "0.0.0.0:8080");
        assert_eq!(result.cors_allowed_origin, None);
        assert_eq!(result.history_key_mode, HistoryKeyMode::Time);
        assert_eq!(result.api_url, None);
        assert_eq!(result.remote_timeout_ms, 5000);
    }

    #[test]
    fn reads_explicit_values() {
        let result = AppConfig::from_lookup(|key| match key {
            "LEDGER_DB_PATH" => Some(" ./data/ledger.db ".to_string()),
            "CORS_ALLOWED_ORIGIN" => Some("http://localhost:5173".to_string()),
            "HISTORY_KEY_MODE" => Some("date".to_string()),
            "LEDGER_API_URL" => Some("http://127.0.0.1:8080".to_string()),
            _ => None,
        })
        .expect("config should be valid");

        assert_eq!(result.db_path, "./data/ledger.db");
        assert_eq!(
            result.cors_allowed_origin.as_deref(),
            Some("http://localhost:5173")
        );
        assert_eq!(result.history_key_mode, HistoryKeyMode::Date);
        assert_eq!(result.api_url.as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn rejects_unknown_history_key_mode() {
        let result = AppConfig::from_lookup(|key| match key {
            "HISTORY_KEY_MODE" => Some("weekly".to_string()),
            _ => None,
        });

        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid configuration: HISTORY_KEY_MODE must be 'time' or 'date'"
        );
    }

    #[test]
    fn rejects_invalid_numeric_values() {
        let result = AppConfig::from_lookup(|key| match key {
            "REMOTE_TIMEOUT_MS" => Some("abc".to_string()),
            _ => None,
        });

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid configuration: REMOTE_TIMEOUT_MS must be a valid number"
        );
    }

    #[test]
    fn rejects_api_url_without_scheme() {
        let result = AppConfig::from_lookup(|key| match key {
            "LEDGER_API_URL" => Some("ledger.local:8080".to_string()),
            _ => None,
        });

        assert!(result.is_err());
    }
}
