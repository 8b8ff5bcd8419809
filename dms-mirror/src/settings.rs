//! Command-line and environment configuration
//!
//! Every connection parameter and operational knob can be given as a flag
//! or through its environment variable.

use clap::{Parser, Subcommand, ValueEnum};
use dms_mirror_common::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// DMS REST API generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DmsApiVersion {
    /// Older API: artifacts carry name/packaging/classifier, bytes come via the repository
    #[value(name = "2")]
    V2,
    /// Newer API: detailed artifact lookup and direct download
    #[value(name = "3")]
    V3,
}

/// Command-line arguments for dms-mirror
#[derive(Parser, Debug, Clone)]
#[command(name = "dms-mirror")]
#[command(about = "Mirror artifacts from DMS to MVN")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub args: MirrorArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Mirror every configured component, then exit
    Run,
    /// Serve the webhook receiver
    Serve {
        /// <host:port> binding
        #[arg(long, default_value = "0.0.0.0:5400", env = "WS_BIND")]
        ws_bind: String,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct MirrorArgs {
    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Path to the components configuration file
    #[arg(long, default_value = "config.json", env = "DMS_MIRROR_CONFIG")]
    pub config_file: PathBuf,

    /// Path to the generic GAV template configuration file
    #[arg(long, default_value = "gav_template_config.json", env = "DMS_MIRROR_GAV_TEMPLATE")]
    pub gav_template_config_file: PathBuf,

    /// Attempts for remote calls failing with transient errors
    #[arg(long, default_value_t = 5, env = "RETRIES_COUNT")]
    pub retries_count: u32,

    /// Seconds to sleep between two attempts
    #[arg(long, default_value_t = 30, env = "RETRY_DELAY_SECS")]
    pub retry_delay_secs: u64,

    /// GroupId prefix for destination coordinates
    #[arg(long, default_value = "com.example", env = "MVN_PREFIX")]
    pub mvn_prefix: String,

    #[arg(long, env = "MVN_URL")]
    pub mvn_url: Option<String>,

    #[arg(long, env = "MVN_USER")]
    pub mvn_user: Option<String>,

    #[arg(long, env = "MVN_PASSWORD")]
    pub mvn_password: Option<String>,

    /// Repository to upload to
    #[arg(long, default_value = "dms-mirror", env = "MVN_UPLOAD_REPO")]
    pub mvn_upload_repo: String,

    /// Repository to check existence in and download from
    #[arg(long, default_value = "maven-virtual", env = "MVN_DOWNLOAD_REPO")]
    pub mvn_download_repo: String,

    /// DMS REST API version to use
    #[arg(long, value_enum, default_value = "3", env = "DMS_API_VERSION")]
    pub dms_api_version: DmsApiVersion,

    /// DMS component registry URL (API v2 only)
    #[arg(long, env = "DMS_CRS_URL")]
    pub dms_crs_url: Option<String>,

    #[arg(long, env = "DMS_TOKEN")]
    pub dms_token: Option<String>,

    #[arg(long, env = "DMS_URL")]
    pub dms_url: Option<String>,

    #[arg(long, env = "DMS_USER")]
    pub dms_user: Option<String>,

    #[arg(long, env = "DMS_PASSWORD")]
    pub dms_password: Option<String>,

    #[arg(long, env = "PG_URL")]
    pub pg_url: Option<String>,

    #[arg(long, env = "PG_USER")]
    pub pg_user: Option<String>,

    #[arg(long, env = "PG_PASSWORD")]
    pub pg_password: Option<String>,

    /// Message broker HTTP API URL
    #[arg(long, env = "AMQP_URL")]
    pub amqp_url: Option<String>,

    #[arg(long, env = "AMQP_USER")]
    pub amqp_username: Option<String>,

    #[arg(long, env = "AMQP_PASSWORD")]
    pub amqp_password: Option<String>,

    /// Destination queue for registration messages
    #[arg(long, default_value = "dlartifacts.input", env = "QUEUE_NAME")]
    pub queue: String,

    #[arg(long, default_value_t = 1, env = "QUEUE_PRIORITY")]
    pub priority: u8,

    /// Components processed in parallel
    #[arg(long, default_value_t = 3, env = "DMS_PROCESSES")]
    pub dms_processes: usize,

    /// Register artifacts that already exist in the target repository
    #[arg(long, default_value_t = false, env = "ALWAYS_ENQUEUE")]
    pub always_enqueue: bool,

    /// Create relational-store records for components first seen via webhook
    #[arg(long, default_value_t = false, env = "AUTO_REGISTER")]
    pub auto_register: bool,

    /// CI type for release notes artifacts
    #[arg(long, default_value = "RELEASENOTES")]
    pub ci_type_release_notes: String,

    /// CI type for documentation artifacts
    #[arg(long, default_value = "DOCS")]
    pub ci_type_documentation: String,
}

/// Settings the mirroring pipeline reads while processing artifacts
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    pub mvn_prefix: String,
    pub mvn_upload_repo: String,
    pub mvn_download_repo: String,
    pub always_enqueue: bool,
    pub auto_register: bool,
    pub ci_type_documentation: String,
    pub ci_type_release_notes: String,
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            mvn_prefix: "com.example".to_string(),
            mvn_upload_repo: "dms-mirror".to_string(),
            mvn_download_repo: "maven-virtual".to_string(),
            always_enqueue: false,
            auto_register: false,
            ci_type_documentation: "DOCS".to_string(),
            ci_type_release_notes: "RELEASENOTES".to_string(),
            workers: 3,
            retry: RetryPolicy::default(),
        }
    }
}

impl MirrorSettings {
    /// Registration category forced by artifact type, if any
    pub fn static_ci_type(&self, artifact_type: &str) -> Option<&str> {
        match artifact_type {
            "documentation" => Some(self.ci_type_documentation.as_str()),
            "notes" | "report" => Some(self.ci_type_release_notes.as_str()),
            _ => None,
        }
    }
}

impl MirrorArgs {
    /// Make config file paths absolute against the current directory
    pub fn absolutize_paths(&mut self) -> std::io::Result<()> {
        self.config_file = std::path::absolute(&self.config_file)?;
        self.gav_template_config_file = std::path::absolute(&self.gav_template_config_file)?;
        Ok(())
    }

    pub fn mirror_settings(&self) -> MirrorSettings {
        MirrorSettings {
            mvn_prefix: self.mvn_prefix.clone(),
            mvn_upload_repo: self.mvn_upload_repo.clone(),
            mvn_download_repo: self.mvn_download_repo.clone(),
            always_enqueue: self.always_enqueue,
            auto_register: self.auto_register,
            ci_type_documentation: self.ci_type_documentation.clone(),
            ci_type_release_notes: self.ci_type_release_notes.clone(),
            workers: self.dms_processes.max(1),
            retry: RetryPolicy::new(self.retries_count, Duration::from_secs(self.retry_delay_secs)),
        }
    }

    /// Settings as printable `(NAME, value)` pairs, secrets masked
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();

        let entries: Vec<(&'static str, String)> = vec![
            ("log_level", self.log_level.clone()),
            ("config_file", self.config_file.display().to_string()),
            ("gav_template_config_file", self.gav_template_config_file.display().to_string()),
            ("retries_count", self.retries_count.to_string()),
            ("retry_delay_secs", self.retry_delay_secs.to_string()),
            ("mvn_prefix", self.mvn_prefix.clone()),
            ("mvn_url", opt(&self.mvn_url)),
            ("mvn_user", opt(&self.mvn_user)),
            ("mvn_password", opt(&self.mvn_password)),
            ("mvn_upload_repo", self.mvn_upload_repo.clone()),
            ("mvn_download_repo", self.mvn_download_repo.clone()),
            ("dms_api_version", format!("{:?}", self.dms_api_version)),
            ("dms_crs_url", opt(&self.dms_crs_url)),
            ("dms_token", opt(&self.dms_token)),
            ("dms_url", opt(&self.dms_url)),
            ("dms_user", opt(&self.dms_user)),
            ("dms_password", opt(&self.dms_password)),
            ("pg_url", opt(&self.pg_url)),
            ("pg_user", opt(&self.pg_user)),
            ("pg_password", opt(&self.pg_password)),
            ("amqp_url", opt(&self.amqp_url)),
            ("amqp_username", opt(&self.amqp_username)),
            ("amqp_password", opt(&self.amqp_password)),
            ("queue", self.queue.clone()),
            ("priority", self.priority.to_string()),
            ("dms_processes", self.dms_processes.to_string()),
            ("always_enqueue", self.always_enqueue.to_string()),
            ("auto_register", self.auto_register.to_string()),
            ("ci_type_release_notes", self.ci_type_release_notes.clone()),
            ("ci_type_documentation", self.ci_type_documentation.clone()),
        ];

        entries
            .into_iter()
            .map(|(name, value)| {
                if name.ends_with("password") || name.ends_with("token") {
                    (name, "*".repeat(value.chars().count()))
                } else {
                    (name, value)
                }
            })
            .collect()
    }

    pub fn log_summary(&self) {
        for (name, value) in self.summary() {
            info!("{}:\t[{}]", name.to_uppercase(), value);
        }
    }
}
