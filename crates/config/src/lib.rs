use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "pharmatrade-client";
const KEYCHAIN_SERVICE: &str = "pharmatrade.credentials";

/// Keychain entry for the opaque login token. The token is only used for
/// the local "is logged in" check; authenticated calls carry the plain
/// pharmacist identity header instead.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: Session,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// "mock" | "http"
    #[serde(default = "default_backend_kind")]
    pub kind: String,
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            base_url: None,
            request_timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_secs(),
        }
    }
}

fn default_backend_kind() -> String {
    "mock".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_secs() -> u64 {
    30
}

/// Persisted identity of the logged-in pharmacist. The auth token lives
/// in the OS keychain, not here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Session {
    pub pharmacist_id: Option<String>,
    pub user_id: Option<String>,
    pub pharmacy_id: Option<String>,
    #[serde(default)]
    pub logged_in: bool,
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

/// Persist a session after a successful login.
pub fn save_session(cfg: &mut AppConfig, session: Session, auth_token: &str) -> Result<()> {
    store_secret(AUTH_TOKEN_KEY, auth_token)?;
    cfg.session = Session {
        logged_in: true,
        ..session
    };
    store(cfg)
}

/// Drop the persisted session and its keychain token.
pub fn clear_session(cfg: &mut AppConfig) -> Result<()> {
    let _ = delete_secret(AUTH_TOKEN_KEY);
    cfg.session = Session::default();
    store(cfg)
}

/// Local login check: a session is valid when the flag is set and the
/// keychain still holds a token.
pub fn is_logged_in(cfg: &AppConfig) -> bool {
    cfg.session.logged_in && get_secret(AUTH_TOKEN_KEY).is_ok()
}

/// Store a secret in the OS keychain
pub fn store_secret(key: &str, value: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

/// Retrieve a secret from the OS keychain
pub fn get_secret(key: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    let password = entry.get_password()?;
    Ok(password)
}

/// Delete a secret from the OS keychain
pub fn delete_secret(key: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.delete_password()?;
    Ok(())
}
