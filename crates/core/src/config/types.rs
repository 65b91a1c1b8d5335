use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
    pub targets: TargetsConfig,
    /// Document type -> queue capacity hint.
    #[serde(default)]
    pub doc_types: BTreeMap<String, u32>,
    #[serde(default)]
    pub invoker: InvokerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration. Operational records, queues and staged payments
/// share one SQLite file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("payflow.db")
}

/// Settings of the payment stream this process serves.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Country handled by this deployment (e.g. "AR").
    pub country_code: String,
    /// Leading segment of every hashId and queue name.
    pub prefix: String,
    /// Statuses that block a new dispatch while present for a hashId.
    #[serde(default)]
    pub not_accepted_statuses: Vec<String>,
    #[serde(default = "default_status_ok")]
    pub status_ok: String,
    #[serde(default = "default_status_error")]
    pub status_error: String,
    #[serde(default)]
    pub sql_config_file_pre: String,
    #[serde(default)]
    pub sql_config_file_post: String,
    /// Name reported by the dispatch engine in error reports.
    #[serde(default = "default_get_payments_function")]
    pub get_payments_function: String,
    /// Name reported by the reconciler in error reports.
    #[serde(default = "default_init_process_function")]
    pub init_process_function: String,
    /// Legacy comma list of doc types, e.g. "invoice,receipt".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_types_list: Option<String>,
    /// Legacy comma list of `{docType}_{count}` capacity hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqs_max_queues: Option<String>,
}

fn default_status_ok() -> String {
    "OK".to_string()
}

fn default_status_error() -> String {
    "ERROR".to_string()
}

fn default_get_payments_function() -> String {
    "init-get-payments".to_string()
}

fn default_init_process_function() -> String {
    "init-process".to_string()
}

/// Downstream targets, by role.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetsConfig {
    /// Receives enriched payment payloads from the dispatch engine.
    pub dispatch: String,
    /// Receives error reports from both handlers.
    pub error_report: String,
    /// Creates the queues of a create batch.
    pub create_queues: String,
    /// Enqueues work into existing queues; also the follow-up of a create batch.
    pub enqueue: String,
    /// Deletes stale queues.
    pub delete_queues: String,
    /// Attached to configs whose queue is being created.
    pub create_provisional: String,
    /// Attached to configs whose queue already exists.
    pub to_provisional: String,
    /// Error target handed to downstream jobs.
    pub on_error: String,
}

impl TargetsConfig {
    /// (role, target) pairs, for validation and display.
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("dispatch", &self.dispatch),
            ("error_report", &self.error_report),
            ("create_queues", &self.create_queues),
            ("enqueue", &self.enqueue),
            ("delete_queues", &self.delete_queues),
            ("create_provisional", &self.create_provisional),
            ("to_provisional", &self.to_provisional),
            ("on_error", &self.on_error),
        ]
    }
}

/// Downstream invoker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvokerConfig {
    /// Base url; each target is a path segment under it.
    #[serde(default = "default_invoker_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_invoker_timeout")]
    pub timeout_secs: u32,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            base_url: default_invoker_url(),
            timeout_secs: default_invoker_timeout(),
        }
    }
}

fn default_invoker_url() -> String {
    "http://127.0.0.1:9000/invoke".to_string()
}

fn default_invoker_timeout() -> u32 {
    10
}

/// Queue service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Prefix of every queue url.
    #[serde(default = "default_queue_url")]
    pub base_url: String,
    /// How long a received message stays hidden (default: 30)
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_url: default_queue_url(),
            visibility_timeout_secs: default_visibility_timeout(),
        }
    }
}

fn default_queue_url() -> String {
    "local://queues".to_string()
}

fn default_visibility_timeout() -> u64 {
    30
}

/// Sanitized config for API responses (endpoint urls redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
    pub targets: TargetsConfig,
    pub doc_types: BTreeMap<String, u32>,
    pub invoker: SanitizedInvokerConfig,
    pub queue: QueueConfig,
}

/// Sanitized invoker config (base url hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedInvokerConfig {
    pub base_url_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            pipeline: config.pipeline.clone(),
            targets: config.targets.clone(),
            doc_types: config.doc_types.clone(),
            invoker: SanitizedInvokerConfig {
                base_url_configured: !config.invoker.base_url.is_empty(),
                timeout_secs: config.invoker.timeout_secs,
            },
            queue: config.queue.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const MINIMAL_TOML: &str = r#"
[pipeline]
country_code = "AR"
prefix = "pfx"
not_accepted_statuses = ["PROCESSING", "BLOCKED"]

[targets]
dispatch = "get-payments-ar"
error_report = "get-errors"
create_queues = "create-queues"
enqueue = "enqueue"
delete_queues = "delete-queues"
create_provisional = "create-provisional-operational"
to_provisional = "to-provisional-operational"
on_error = "to-error"

[doc_types]
invoice = 3
receipt = 1
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL_TOML).unwrap();
        assert_eq!(config.pipeline.country_code, "AR");
        assert_eq!(config.pipeline.status_ok, "OK");
        assert_eq!(config.pipeline.status_error, "ERROR");
        assert_eq!(config.pipeline.get_payments_function, "init-get-payments");
        assert_eq!(config.pipeline.not_accepted_statuses.len(), 2);
        assert_eq!(config.doc_types.get("invoice"), Some(&3));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.queue.visibility_timeout_secs, 30);
        assert_eq!(config.invoker.timeout_secs, 10);
    }

    #[test]
    fn test_deserialize_missing_targets_fails() {
        let toml = r#"
[pipeline]
country_code = "AR"
prefix = "pfx"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_invoker_url() {
        let config: Config = toml::from_str(MINIMAL_TOML).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_value(&sanitized).unwrap();
        assert_eq!(json["invoker"]["base_url_configured"], true);
        assert!(json["invoker"].get("base_url").is_none());
        assert_eq!(json["targets"]["dispatch"], "get-payments-ar");
    }

    #[test]
    fn test_target_entries_cover_every_role() {
        let config: Config = toml::from_str(MINIMAL_TOML).unwrap();
        let roles: Vec<_> = config.targets.entries().iter().map(|(r, _)| *r).collect();
        assert!(roles.contains(&"error_report"));
        assert_eq!(roles.len(), 8);
    }
}
