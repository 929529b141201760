use anyhow::{Context, Result};
use directories::UserDirs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
#[cfg(unix)]
use tokio::fs::File;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Shared secret used when neither the config file nor the environment supplies one.
pub const FALLBACK_API_KEY: &str = "mysecretkey";

const CONFIG_DIR_ENV: &str = "HONEYPOT_CONFIG_DIR";
const CONFIG_FILE_NAME: &str = "config.toml";

// ── Top-level config ──────────────────────────────────────────────

/// Top-level honeypot configuration, loaded from `config.toml`.
///
/// Resolution order: `HONEYPOT_CONFIG_DIR` env → `~/.honeypot/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Shared secret compared against the `x-api-key` header. Overridden by
    /// `HONEYPOT_API_KEY` or `API_KEY` env vars. Default: `"mysecretkey"`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// HTTP gateway configuration: host, port, limits (`[gateway]`).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Persona behaviour: keywords, triggers, reply pools (`[persona]`).
    #[serde(default)]
    pub persona: PersonaConfig,
}

// ── Gateway ──────────────────────────────────────────────────────

/// Gateway server configuration (`[gateway]` section).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GatewayConfig {
    /// Gateway port (default: 8000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Largest request body read before the body is treated as absent.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ── Persona ──────────────────────────────────────────────────────

/// Persona configuration (`[persona]` section).
///
/// Every list here is matched as a plain lower-case substring against the
/// lower-cased message text.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersonaConfig {
    /// Session id used when a request carries neither `sessionId` nor `session_id`.
    #[serde(default = "default_session_id")]
    pub default_session_id: String,
    /// Substrings that flag a message as scam-like.
    #[serde(default = "default_scam_keywords")]
    pub scam_keywords: Vec<String>,
    /// Substrings that route a scam message to the OTP pool.
    #[serde(default = "default_otp_triggers")]
    pub otp_triggers: Vec<String>,
    /// Substrings that route a scam message to the link pool.
    #[serde(default = "default_link_triggers")]
    pub link_triggers: Vec<String>,
    /// Interaction count at which generic scam replies switch from confused to helper.
    #[serde(default = "default_helper_after_messages")]
    pub helper_after_messages: u64,
    /// Reply for messages with no scam indicators.
    #[serde(default = "default_neutral_reply")]
    pub neutral_reply: String,
    /// Canned reply pools (`[persona.replies]`).
    #[serde(default)]
    pub replies: ReplyPoolsConfig,
}

/// Reply pools sampled by the persona (`[persona.replies]` section).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReplyPoolsConfig {
    #[serde(default = "default_confused_replies")]
    pub confused: Vec<String>,
    #[serde(default = "default_helper_replies")]
    pub helper: Vec<String>,
    #[serde(default = "default_otp_replies")]
    pub otp: Vec<String>,
    #[serde(default = "default_link_replies")]
    pub link: Vec<String>,
}

fn default_session_id() -> String {
    "tester-session".into()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_scam_keywords() -> Vec<String> {
    strings(&[
        "account",
        "blocked",
        "verify",
        "urgent",
        "upi",
        "otp",
        "bank",
        "suspended",
        "click",
        "link",
        "reward",
        "winner",
        "kyc",
        "credit",
    ])
}

fn default_otp_triggers() -> Vec<String> {
    strings(&["otp", "code"])
}

fn default_link_triggers() -> Vec<String> {
    strings(&["link", "http", "click"])
}

fn default_helper_after_messages() -> u64 {
    3
}

fn default_neutral_reply() -> String {
    "Okay.".into()
}

fn default_confused_replies() -> Vec<String> {
    strings(&[
        "What is this message?",
        "I don\u{2019}t understand this.",
        "Why am I getting this?",
    ])
}

fn default_helper_replies() -> Vec<String> {
    strings(&[
        "Okay, I want to fix this. What should I do first?",
        "I am trying to help, please tell me the steps slowly.",
        "My grandson usually does this for me. Can you guide me?",
        "I don\u{2019}t want my account closed. What do you need from me?",
    ])
}

fn default_otp_replies() -> Vec<String> {
    strings(&[
        "Which code? I got many messages today.",
        "The code is not showing on my phone yet. Can you send it again?",
        "Is it the number from the bank or from the other app?",
    ])
}

fn default_link_replies() -> Vec<String> {
    strings(&[
        "The link is not opening on my phone.",
        "I clicked it but the page is blank. Is that normal?",
        "Can you send the link again? I think I deleted it.",
    ])
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            default_session_id: default_session_id(),
            scam_keywords: default_scam_keywords(),
            otp_triggers: default_otp_triggers(),
            link_triggers: default_link_triggers(),
            helper_after_messages: default_helper_after_messages(),
            neutral_reply: default_neutral_reply(),
            replies: ReplyPoolsConfig::default(),
        }
    }
}

impl Default for ReplyPoolsConfig {
    fn default() -> Self {
        Self {
            confused: default_confused_replies(),
            helper: default_helper_replies(),
            otp: default_otp_replies(),
            link: default_link_replies(),
        }
    }
}

// ── Config impl ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        Self {
            config_path: home.join(".honeypot").join(CONFIG_FILE_NAME),
            api_key: None,
            gateway: GatewayConfig::default(),
            persona: PersonaConfig::default(),
        }
    }
}

fn default_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".honeypot"))
}

fn read_env(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var(fallback))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

impl Config {
    /// Load from the default location, writing a fresh default config on first run.
    pub async fn load_or_init() -> Result<Self> {
        let dir = default_config_dir()?;
        Self::load_or_init_in(&dir).await
    }

    /// Load `config.toml` from `dir`, creating the directory and a default file if needed.
    pub async fn load_or_init_in(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let (mut config, initialized) = if config_path.exists() {
            // Warn if config file is world-readable (may contain the API key)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(meta) = fs::metadata(&config_path).await {
                    if meta.permissions().mode() & 0o004 != 0 {
                        tracing::warn!(
                            "Config file {:?} is world-readable (mode {:o}). \
                             Consider restricting with: chmod 600 {:?}",
                            config_path,
                            meta.permissions().mode() & 0o777,
                            config_path,
                        );
                    }
                }
            }

            let contents = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path.clone();
            (config, false)
        } else {
            let mut config = Config::default();
            config.config_path = config_path.clone();
            config.save().await?;

            // Restrict permissions on newly created config file (may contain the API key)
            #[cfg(unix)]
            {
                use std::{fs::Permissions, os::unix::fs::PermissionsExt};
                let _ = fs::set_permissions(&config_path, Permissions::from_mode(0o600)).await;
            }
            (config, true)
        };

        config.apply_env_overrides();
        config.validate()?;
        tracing::info!(
            path = %config.config_path.display(),
            initialized,
            "Config loaded"
        );
        Ok(config)
    }

    /// The secret callers must present in `x-api-key`, with the built-in fallback.
    pub fn effective_api_key(&self) -> &str {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .unwrap_or(FALLBACK_API_KEY)
    }

    /// Validate configuration values that would break request handling.
    pub fn validate(&self) -> Result<()> {
        // Gateway
        if self.gateway.host.trim().is_empty() {
            anyhow::bail!("gateway.host must not be empty");
        }
        if self.gateway.max_body_bytes == 0 {
            anyhow::bail!("gateway.max_body_bytes must be greater than 0");
        }
        if self.gateway.request_timeout_secs == 0 {
            anyhow::bail!("gateway.request_timeout_secs must be greater than 0");
        }

        // Persona
        let persona = &self.persona;
        if persona.default_session_id.is_empty() {
            anyhow::bail!("persona.default_session_id must not be empty");
        }
        if persona.helper_after_messages == 0 {
            anyhow::bail!("persona.helper_after_messages must be greater than 0");
        }
        for (field, list) in [
            ("persona.scam_keywords", &persona.scam_keywords),
            ("persona.otp_triggers", &persona.otp_triggers),
            ("persona.link_triggers", &persona.link_triggers),
        ] {
            if let Some(i) = list.iter().position(|k| k.trim().is_empty()) {
                anyhow::bail!("{field}[{i}] must not be empty");
            }
        }
        for (field, pool) in [
            ("persona.replies.confused", &persona.replies.confused),
            ("persona.replies.helper", &persona.replies.helper),
            ("persona.replies.otp", &persona.replies.otp),
            ("persona.replies.link", &persona.replies.link),
        ] {
            if pool.is_empty() {
                anyhow::bail!("{field} must contain at least one reply");
            }
        }

        Ok(())
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        // API key: HONEYPOT_API_KEY or API_KEY (generic)
        if let Some(key) = read_env("HONEYPOT_API_KEY", "API_KEY") {
            self.api_key = Some(key);
        }

        // Gateway port: HONEYPOT_PORT or PORT
        if let Some(port_str) = read_env("HONEYPOT_PORT", "PORT") {
            match port_str.trim().parse::<u16>() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(port = %port_str, "Ignoring invalid port override"),
            }
        }

        // Gateway host: HONEYPOT_HOST or HOST
        if let Some(host) = read_env("HONEYPOT_HOST", "HOST") {
            self.gateway.host = host;
        }

        if let Ok(session) = std::env::var("HONEYPOT_DEFAULT_SESSION") {
            if !session.is_empty() {
                self.persona.default_session_id = session;
            }
        }
    }

    pub async fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let parent_dir = self
            .config_path
            .parent()
            .context("Config path must have a parent directory")?;

        fs::create_dir_all(parent_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                parent_dir.display()
            )
        })?;

        let file_name = self
            .config_path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or(CONFIG_FILE_NAME);
        let temp_path = parent_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));

        let mut temp_file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create temporary config file: {}",
                    temp_path.display()
                )
            })?;
        temp_file
            .write_all(toml_str.as_bytes())
            .await
            .context("Failed to write temporary config contents")?;
        temp_file
            .sync_all()
            .await
            .context("Failed to fsync temporary config file")?;
        drop(temp_file);

        if let Err(e) = fs::rename(&temp_path, &self.config_path).await {
            let _ = fs::remove_file(&temp_path).await;
            anyhow::bail!("Failed to atomically replace config file: {e}");
        }

        sync_directory(parent_dir).await
    }
}

async fn sync_directory(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        let dir = File::open(path)
            .await
            .with_context(|| format!("Failed to open directory for fsync: {}", path.display()))?;
        dir.sync_all()
            .await
            .with_context(|| format!("Failed to fsync directory metadata: {}", path.display()))?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}
