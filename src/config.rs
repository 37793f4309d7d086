use std::env;
use std::path::PathBuf;

pub const TRANSCRIPTION_KEY_ENV: &str = "TOK_API_KEY";
pub const LLM_KEY_ENV: &str = "AWANLLM_API_KEY";
pub const HANDLE_ENV: &str = "REVIEWREEL_HANDLE";
pub const MODEL_ENV: &str = "REVIEWREEL_MODEL";
pub const LLM_URL_ENV: &str = "REVIEWREEL_LLM_URL";
pub const TRANSCRIPTION_URL_ENV: &str = "REVIEWREEL_TRANSCRIBE_URL";

pub const DEFAULT_HANDLE: &str = "itsthathelim";
pub const DEFAULT_MODEL: &str = "Meta-Llama-3-8B-Instruct";
pub const DEFAULT_LLM_URL: &str = "https://api.awanllm.com/v1/chat/completions";
pub const DEFAULT_TRANSCRIPTION_URL: &str = "https://tt.tokbackup.com/fetchTikTokData";

pub const PROCESSED_LEDGER_FILE: &str = "processed_videos.json";
pub const REVIEW_LEDGER_FILE: &str = "reviews.json";

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPaths {
    pub processed: PathBuf,
    pub reviews: PathBuf,
}

impl Default for LedgerPaths {
    fn default() -> Self {
        Self {
            processed: PathBuf::from(PROCESSED_LEDGER_FILE),
            reviews: PathBuf::from(REVIEW_LEDGER_FILE),
        }
    }
}

/// Everything a run needs, resolved once at start-up and handed to each stage.
#[derive(Debug, Clone)]
pub struct Config {
    pub handle: String,
    pub transcription_api_key: String,
    pub llm_api_key: String,
    pub ledger_paths: LedgerPaths,
    pub model: String,
    pub llm_url: String,
    pub transcription_url: String,
    pub json_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            handle: DEFAULT_HANDLE.to_string(),
            transcription_api_key: String::new(),
            llm_api_key: String::new(),
            ledger_paths: LedgerPaths::default(),
            model: DEFAULT_MODEL.to_string(),
            llm_url: DEFAULT_LLM_URL.to_string(),
            transcription_url: DEFAULT_TRANSCRIPTION_URL.to_string(),
            json_mode: false,
        }
    }
}

impl Config {
    /// Missing credentials are only warned about: the upstream call reports
    /// the authentication failure itself.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let transcription_api_key = non_empty(TRANSCRIPTION_KEY_ENV).unwrap_or_else(|| {
            tracing::warn!("{TRANSCRIPTION_KEY_ENV} is not set; transcription requests will be rejected");
            String::new()
        });
        let llm_api_key = non_empty(LLM_KEY_ENV).unwrap_or_else(|| {
            tracing::warn!("{LLM_KEY_ENV} is not set; classification requests will be rejected");
            String::new()
        });

        Self {
            handle: non_empty(HANDLE_ENV).unwrap_or(defaults.handle),
            transcription_api_key,
            llm_api_key,
            ledger_paths: defaults.ledger_paths,
            model: non_empty(MODEL_ENV).unwrap_or(defaults.model),
            llm_url: non_empty(LLM_URL_ENV).unwrap_or(defaults.llm_url),
            transcription_url: non_empty(TRANSCRIPTION_URL_ENV)
                .unwrap_or(defaults.transcription_url),
            json_mode: defaults.json_mode,
        }
    }

    pub fn with_handle(mut self, handle: Option<String>) -> Self {
        if let Some(handle) = handle {
            self.handle = handle.trim().trim_start_matches('@').to_string();
        }
        self
    }

    pub fn with_ledger_paths(mut self, processed: Option<PathBuf>, reviews: Option<PathBuf>) -> Self {
        if let Some(processed) = processed {
            self.ledger_paths.processed = processed;
        }
        if let Some(reviews) = reviews {
            self.ledger_paths.reviews = reviews;
        }
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = Config::from_lookup(lookup_from(&[]));
        assert_eq!(cfg.handle, DEFAULT_HANDLE);
        assert!(cfg.transcription_api_key.is_empty());
        assert!(cfg.llm_api_key.is_empty());
        assert_eq!(cfg.ledger_paths, LedgerPaths::default());
        assert_eq!(cfg.llm_url, DEFAULT_LLM_URL);
    }

    #[test]
    fn reads_credentials_and_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[
            (TRANSCRIPTION_KEY_ENV, "tok"),
            (LLM_KEY_ENV, "llm"),
            (HANDLE_ENV, "someone"),
            (MODEL_ENV, "   "),
        ]));
        assert_eq!(cfg.transcription_api_key, "tok");
        assert_eq!(cfg.llm_api_key, "llm");
        assert_eq!(cfg.handle, "someone");
        assert_eq!(cfg.model, DEFAULT_MODEL);
    }

    #[test]
    fn cli_overrides_win() {
        let cfg = Config::default()
            .with_handle(Some("@chef".into()))
            .with_ledger_paths(Some("a.json".into()), None)
            .with_json_mode(true);
        assert_eq!(cfg.handle, "chef");
        assert_eq!(cfg.ledger_paths.processed, PathBuf::from("a.json"));
        assert_eq!(cfg.ledger_paths.reviews, PathBuf::from(REVIEW_LEDGER_FILE));
        assert!(cfg.json_mode);
    }
}
