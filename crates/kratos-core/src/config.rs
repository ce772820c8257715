//! Configuration management for Kratos services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`KRATOS__` prefix, `__` separator, e.g. `KRATOS__LLM__API_KEY`).
//!    `KRATOS__PIPELINE__INTENT_CATEGORIES` takes a comma-separated list.
//! 2. Config file (`kratos.toml`, optional)
//! 3. Defaults

use serde::Deserialize;

use crate::types::DEFAULT_INTENT_CATEGORIES;

/// Top-level settings, one section per component.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub neo4j: Neo4jSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

impl Settings {
    /// Load settings from `{file_prefix}.toml` (if present) and the environment.
    pub fn load(file_prefix: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(environment())
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        tracing::debug!(
            neo4j_uri = %settings.neo4j.uri,
            llm_model = %settings.llm.model,
            "Settings loaded"
        );
        Ok(settings)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("KRATOS")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("pipeline.intent_categories")
        .try_parsing(true)
}

/// `[neo4j]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_neo4j_uri")]
    pub uri: String,
    #[serde(default = "default_neo4j_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Target database; the server default when unset.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

/// `[llm]` section. Any OpenAI-compatible chat-completions endpoint works.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub temperature: f32,
    /// Per-request timeout. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_intent_categories")]
    pub intent_categories: Vec<String>,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default = "default_max_context_rows")]
    pub max_context_rows: usize,
    /// Upper bound for variable-length relationship hops.
    #[serde(default = "default_max_path_hops")]
    pub max_path_hops: u32,
    /// Directory for run traces. Tracing to disk is off when unset.
    #[serde(default)]
    pub trace_dir: Option<String>,
}

/// `[server]` section for the agent transport.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_neo4j_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_intent_categories() -> Vec<String> {
    DEFAULT_INTENT_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_max_context_rows() -> usize {
    50
}

fn default_max_path_hops() -> u32 {
    5
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_agent_id() -> String {
    "kratos-graphrag".to_string()
}

fn default_protocol() -> String {
    "A2A-v1.2".to_string()
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_neo4j_uri(),
            user: default_neo4j_user(),
            password: String::new(),
            database: None,
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: String::new(),
            temperature: 0.0,
            request_timeout_secs: None,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            intent_categories: default_intent_categories(),
            query_timeout_ms: default_query_timeout_ms(),
            max_context_rows: default_max_context_rows(),
            max_path_hops: default_max_path_hops(),
            trace_dir: None,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            agent_id: default_agent_id(),
            protocol: default_protocol(),
        }
    }
}
