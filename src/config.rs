use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::{debug, warn};

/// Config files probed, in order, when `CONFIG_PATH` is not set.
const DEFAULT_CONFIG_PATHS: [&str; 3] = ["conf.yaml", "conf.yml", "conf.json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub bedrock_config: BedrockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the browser UI assets, served as the router fallback.
    #[serde(default)]
    pub static_dir: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

/// Everything needed to reach the remote agent.
#[derive(Clone, Serialize, Deserialize)]
pub struct BedrockConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_alias_id: Option<String>,
    /// Shared by every request; all callers land in one remote conversation.
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_session_id() -> String {
    "default-session".to_string()
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            agent_id: None,
            agent_alias_id: None,
            session_id: default_session_id(),
        }
    }
}

impl fmt::Debug for BedrockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BedrockConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("agent_id", &self.agent_id)
            .field("agent_alias_id", &self.agent_alias_id)
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl BedrockConfig {
    /// Agent and alias identifiers, only when both are configured.
    pub fn agent_target(&self) -> Option<(&str, &str)> {
        match (self.agent_id.as_deref(), self.agent_alias_id.as_deref()) {
            (Some(agent_id), Some(alias_id)) => Some((agent_id, alias_id)),
            _ => None,
        }
    }

    /// Static access key pair, when both halves are configured.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key_id.as_deref(), self.secret_access_key.as_deref()) {
            (Some(key_id), Some(secret)) => Some((key_id, secret)),
            _ => None,
        }
    }

    fn normalize(&mut self) {
        for field in [
            &mut self.access_key_id,
            &mut self.secret_access_key,
            &mut self.session_token,
            &mut self.agent_id,
            &mut self.agent_alias_id,
        ] {
            *field = field.take().and_then(non_blank);
        }
        if self.region.trim().is_empty() {
            self.region = default_region();
        }
        if self.session_id.trim().is_empty() {
            self.session_id = default_session_id();
        }
    }
}

impl Config {
    /// Load a YAML or JSON config file, expanding `${VAR}` placeholders from the environment.
    pub fn load(path: &str) -> Result<Self> {
        let content = load_text_file(path)?;
        let content = substitute_env_vars(&content, |name| std::env::var(name).ok())?;

        let path_lower = path.to_lowercase();
        let mut config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON config: {}", path))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML config: {}", path))?
        };
        config.normalize();
        Ok(config)
    }

    /// Build the config from process environment variables alone.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).and_then(non_blank);

        let mut system_config = SystemConfig::default();
        if let Some(host) = var("HOST") {
            system_config.host = host;
        }
        if let Some(port) = var("PORT") {
            system_config.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }
        system_config.static_dir = var("STATIC_DIR");

        let mut bedrock_config = BedrockConfig {
            region: var("AWS_REGION").unwrap_or_else(default_region),
            access_key_id: var("AWS_ACCESS_KEY_ID"),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            session_token: var("AWS_SESSION_TOKEN"),
            agent_id: var("BEDROCK_AGENT_ID"),
            agent_alias_id: var("BEDROCK_AGENT_ALIAS_ID"),
            session_id: var("SESSION_ID").unwrap_or_else(default_session_id),
        };
        bedrock_config.normalize();

        Ok(Self {
            system_config,
            bedrock_config,
        })
    }

    /// Resolve the process configuration: `CONFIG_PATH`, then the default
    /// config files, then the environment. Returns where it came from.
    pub fn discover() -> Result<(Self, String)> {
        if let Some(path) = std::env::var("CONFIG_PATH").ok().and_then(non_blank) {
            let config = Self::load(&path)?;
            return Ok((config, path));
        }

        for path in DEFAULT_CONFIG_PATHS {
            if Path::new(path).exists() {
                let config = Self::load(path)?;
                return Ok((config, path.to_string()));
            }
            debug!("No config file at {}", path);
        }

        Ok((Self::from_env()?, "environment".to_string()))
    }

    /// Warn about settings that will make every chat request fail.
    pub fn log_warnings(&self) {
        let bedrock = &self.bedrock_config;
        if bedrock.agent_target().is_none() {
            warn!("BEDROCK_AGENT_ID / BEDROCK_AGENT_ALIAS_ID not set; chat requests will be rejected");
        }
        if bedrock.static_credentials().is_none() {
            warn!("AWS access key pair not set; falling back to the default AWS credential chain");
        }
        if bedrock.session_id == default_session_id() {
            warn!("Using the shared default session id; all callers share one agent conversation");
        }
    }

    fn normalize(&mut self) {
        self.system_config.static_dir = self.system_config.static_dir.take().and_then(non_blank);
        self.bedrock_config.normalize();
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Replace `${VAR_NAME}` with the looked-up value, or nothing when unset.
pub fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &Captures| {
        lookup(&caps[1]).unwrap_or_default()
    });
    Ok(replaced.into_owned())
}

/// Read a UTF-8 text file, dropping a leading byte order mark.
fn load_text_file(path: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Configuration file not found: {}", path))?;
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if had_errors {
        anyhow::bail!("Configuration file is not valid UTF-8: {}", path);
    }
    Ok(text.into_owned())
}
