use anyhow::{Context, Result};
use bankdesk_core::lookup::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use bankdesk_core::{
    AccountNumber, HttpBankingApi, IntentRouter, KeywordRouter, LlmRouter, LlmRouterConfig,
    LoanId, LoanLookupTable,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variables that may be referenced as `${VAR}` in the config
const ALLOWED_ENV_VARS: &[&str] = &["OPENAI_API_KEY", "BANKDESK_API_URL"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankdeskConfig {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub loan_overrides: Vec<LoanOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_lookup_base_url")]
    pub base_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: default_lookup_base_url(),
            timeout_secs: default_lookup_timeout(),
        }
    }
}

fn default_lookup_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_lookup_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_bind")]
    pub bind: String,
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
            data_file: default_data_file(),
        }
    }
}

fn default_server_bind() -> String {
    "127.0.0.1:8085".to_string()
}
fn default_data_file() -> String {
    "data/sample_data.json".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
    #[default]
    Keyword,
    Llm,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub mode: RouterMode,
    #[serde(default = "default_router_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_router_model")]
    pub model: String,
    #[serde(default = "default_router_temperature")]
    pub temperature: f64,
    #[serde(default = "default_router_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterConfig")
            .field("mode", &self.mode)
            .field("base_url", &self.base_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mode: RouterMode::default(),
            base_url: default_router_base_url(),
            api_key: String::new(),
            model: default_router_model(),
            temperature: default_router_temperature(),
            timeout_secs: default_router_timeout(),
        }
    }
}

fn default_router_base_url() -> String {
    LlmRouterConfig::default().base_url
}
fn default_router_model() -> String {
    LlmRouterConfig::default().model
}
fn default_router_temperature() -> f64 {
    0.3
}
fn default_router_timeout() -> u64 {
    LlmRouterConfig::default().timeout.as_secs()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

fn default_max_rounds() -> usize {
    10
}

/// Extra account → loan pairs for the lookup table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOverride {
    pub account_number: String,
    pub loan_id: String,
}

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bankdesk")
}

impl BankdeskConfig {
    /// Load from `custom_path`, or `~/.bankdesk/config.toml`.
    ///
    /// A missing default file falls back to built-in defaults; a missing
    /// custom file is an error.
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = match custom_path {
            Some(path) => path.clone(),
            None => {
                let path = config_dir().join("config.toml");
                if !path.exists() {
                    warn!(
                        "No config at {}, using defaults. Run `bankdesk init` to create one.",
                        path.display()
                    );
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;

        if !config.router.api_key.is_empty() && !content.contains("${OPENAI_API_KEY}") {
            warn!(
                "Router API key is hardcoded in config file. For security, use environment variables: api_key = \"${{OPENAI_API_KEY}}\""
            );
        }

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text after `${VAR}` expansion
    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        Ok(toml::from_str(&expanded)?)
    }

    /// TOML for display, with secrets masked
    pub fn render(&self) -> Result<String> {
        let mut shown = self.clone();
        shown.router.api_key = mask_secret(&shown.router.api_key);
        Ok(toml::to_string_pretty(&shown)?)
    }

    pub fn banking_api(&self) -> Result<HttpBankingApi> {
        HttpBankingApi::new(
            self.lookup.base_url.clone(),
            Duration::from_secs(self.lookup.timeout_secs),
        )
    }

    pub fn loan_table(&self) -> Result<LoanLookupTable> {
        let overrides = self.loan_overrides.iter().map(|o| {
            (
                AccountNumber::new(o.account_number.clone()),
                LoanId::new(o.loan_id.clone()),
            )
        });
        LoanLookupTable::builtin()
            .with_overrides(overrides)
            .context("Invalid [[loan_overrides]]")
    }

    pub fn intent_router(&self) -> Result<Arc<dyn IntentRouter>> {
        match self.router.mode {
            RouterMode::Keyword => Ok(Arc::new(KeywordRouter)),
            RouterMode::Llm => {
                let router = LlmRouter::new(LlmRouterConfig {
                    base_url: self.router.base_url.clone(),
                    api_key: self.router.api_key.clone(),
                    model: self.router.model.clone(),
                    temperature: self.router.temperature as f32,
                    timeout: Duration::from_secs(self.router.timeout_secs),
                })?;
                Ok(Arc::new(router))
            }
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("Invalid server bind address: {}", self.server.bind))
    }
}

fn expand_env_vars(s: &str) -> String {
    expand_with(s, |name| std::env::var(name).ok())
}

/// Replace allowlisted `${VAR}` references using `lookup`; others stay as written
fn expand_with(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        let Some(start) = result[pos..].find("${") else {
            break;
        };
        let abs_start = pos + start;
        let Some(end) = result[abs_start..].find('}') else {
            break;
        };
        let var_name = result[abs_start + 2..abs_start + end].to_string();

        if !ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
            warn!(
                "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                var_name
            );
            pos = abs_start + end + 1;
            continue;
        }

        let value = lookup(&var_name).unwrap_or_default();
        let value_len = value.len();
        result = format!(
            "{}{}{}",
            &result[..abs_start],
            value,
            &result[abs_start + end + 1..]
        );
        pos = abs_start + value_len;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BankdeskConfig::default();
        assert_eq!(config.lookup.base_url, "http://localhost:8085");
        assert_eq!(config.lookup.timeout_secs, 10);
        assert_eq!(config.router.mode, RouterMode::Keyword);
        assert_eq!(config.chat.max_rounds, 10);
        assert!(config.loan_overrides.is_empty());
        assert!(config.bind_addr().is_ok());
    }

    #[test]
    fn test_shipped_default_config_parses() {
        let config = BankdeskConfig::parse(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.router.mode, RouterMode::Keyword);
        assert_eq!(config.server.data_file, "data/sample_data.json");
        assert_eq!(config.chat.max_rounds, 10);
        assert_eq!(config.loan_table().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_sections_and_overrides() {
        let config = BankdeskConfig::parse(
            r#"
            [lookup]
            base_url = "http://bank.internal:9000"

            [router]
            mode = "llm"
            model = "gpt-4o-mini"

            [[loan_overrides]]
            account_number = "555666777"
            loan_id = "LN2001"
            "#,
        )
        .unwrap();

        assert_eq!(config.lookup.base_url, "http://bank.internal:9000");
        assert_eq!(config.lookup.timeout_secs, 10);
        assert_eq!(config.router.mode, RouterMode::Llm);
        assert_eq!(config.router.model, "gpt-4o-mini");

        let table = config.loan_table().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table
                .lookup_loan_id_for_account(&AccountNumber::new("555666777"))
                .map(|l| l.as_str().to_string()),
            Some("LN2001".to_string())
        );
        assert!(config.intent_router().is_ok());
    }

    #[test]
    fn test_router_backends() {
        let keyword = BankdeskConfig::default().intent_router().unwrap();
        assert_eq!(keyword.backend(), "keyword");
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = BankdeskConfig::default();
        config.server.bind = "not-an-address".to_string();
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_load_custom_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[chat]\nmax_rounds = 3\n").unwrap();
        let config = BankdeskConfig::load(&Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.chat.max_rounds, 3);
    }

    #[test]
    fn test_load_missing_custom_path_fails() {
        let missing = Some(PathBuf::from("/nonexistent/bankdesk.toml"));
        assert!(BankdeskConfig::load(&missing).is_err());
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[chat\nmax_rounds = ").unwrap();
        assert!(BankdeskConfig::load(&Some(file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_expand_allowlisted_vars_only() {
        let lookup = |name: &str| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "HOME" => Some("/root".to_string()),
            _ => None,
        };
        let out = expand_with(
            r#"api_key = "${OPENAI_API_KEY}" home = "${HOME}" url = "${BANKDESK_API_URL}""#,
            lookup,
        );
        assert_eq!(out, r#"api_key = "sk-test" home = "${HOME}" url = """#);
    }

    #[test]
    fn test_expand_unterminated() {
        let out = expand_with("value = \"${OPENAI_API_KEY\"", |_| Some("x".to_string()));
        assert_eq!(out, "value = \"${OPENAI_API_KEY\"");
    }

    #[test]
    fn test_render_masks_expanded_key() {
        let content = expand_with(
            "[router]\napi_key = \"${OPENAI_API_KEY}\"\n",
            |_| Some("sk-live-SECRET123456".to_string()),
        );
        let config: BankdeskConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.router.api_key, "sk-live-SECRET123456");

        let rendered = config.render().unwrap();
        assert!(!rendered.contains("SECRET123456"));
        assert!(rendered.contains("api_key = \"sk-...3456\""));
    }

    #[test]
    fn test_render_keeps_temperature_readable() {
        let rendered = BankdeskConfig::default().render().unwrap();
        assert!(rendered.contains("temperature = 0.3\n"));

        let parsed = BankdeskConfig::parse("[router]\ntemperature = 0.7\n").unwrap();
        assert!(parsed.render().unwrap().contains("temperature = 0.7\n"));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "(empty)");
        assert_eq!(mask_secret("short"), "***");
        assert_eq!(mask_secret("sk-abcdefghijkl"), "sk-...ijkl");

        let mut config = RouterConfig::default();
        config.api_key = "sk-abcdefghijkl".to_string();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("abcdefghijkl"));
        assert!(debug.contains("sk-...ijkl"));
    }
}
