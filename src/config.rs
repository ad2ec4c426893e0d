// src/config.rs

//! Manages server configuration: loading, resolving defaults, and validation.
//! Every embedder-facing setter named in SPEC_FULL.md §6 has a
//! `config.toml` field here, since a deployed binary starts from a config
//! file rather than a hand-assembled builder.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

/// Admin-plane settings, restated from
/// `examples/original_source/src/cerver/admin.c`'s
/// `max_admins`/`max_admin_connections`/`n_bad_packets_limit` setters.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdminConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_admin_host")]
    pub host: String,
    #[serde(default = "default_admin_port")]
    pub port: u16,
    #[serde(default = "default_max_admins")]
    pub max_admins: usize,
    #[serde(default = "default_max_admin_connections")]
    pub max_admin_connections: usize,
    #[serde(default = "default_n_bad_packets_limit")]
    pub n_bad_packets_limit: u32,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_max_n_fds")]
    pub max_n_fds: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_admin_host(),
            port: default_admin_port(),
            max_admins: default_max_admins(),
            max_admin_connections: default_max_admin_connections(),
            n_bad_packets_limit: default_n_bad_packets_limit(),
            poll_timeout_ms: default_poll_timeout_ms(),
            max_n_fds: default_max_n_fds(),
        }
    }
}

fn default_admin_host() -> String {
    "127.0.0.1".to_string()
}
fn default_admin_port() -> u16 {
    7001
}
fn default_max_admins() -> usize {
    4
}
fn default_max_admin_connections() -> usize {
    8
}
fn default_n_bad_packets_limit() -> u32 {
    5
}
fn default_poll_timeout_ms() -> u64 {
    2000
}
fn default_max_n_fds() -> usize {
    1024
}

/// A frame-paced "update" thread (§4.8): ticks `ticks_per_second` times a
/// second, busy-pacing the remainder of each tick.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateConfig {
    pub ticks_per_second: u32,
}

/// An "interval" thread (§4.8): fires once every `seconds`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IntervalConfig {
    pub seconds: u64,
}

/// A raw representation of the config file before defaults are filled in and
/// the result validated.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    use_ipv6: bool,
    #[serde(default = "default_connection_queue")]
    connection_queue: u32,
    #[serde(default = "default_poll_timeout_ms")]
    poll_timeout_ms: u64,
    #[serde(default = "default_receive_buffer_size")]
    receive_buffer_size: usize,
    #[serde(default = "default_worker_pool_size")]
    worker_pool_size: usize,
    #[serde(default = "default_job_queue_capacity")]
    job_queue_capacity: usize,
    #[serde(default)]
    welcome_message: Option<String>,
    #[serde(default = "default_max_n_fds")]
    max_n_fds: usize,
    #[serde(default = "default_n_bad_packets_limit")]
    n_bad_packets_limit: u32,
    #[serde(default = "default_check_packets")]
    check_packets: bool,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    admin: AdminConfig,
    #[serde(default)]
    update: Option<UpdateConfig>,
    #[serde(default)]
    interval: Option<IntervalConfig>,
}

fn default_name() -> String {
    "cerver".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    7000
}
fn default_connection_queue() -> u32 {
    128
}
fn default_receive_buffer_size() -> usize {
    8192
}
fn default_worker_pool_size() -> usize {
    4
}
fn default_job_queue_capacity() -> usize {
    1024
}
fn default_check_packets() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

/// The final, validated, resolved server configuration. Loaded once at
/// process start and immutable after `Cerver::start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub use_ipv6: bool,
    pub connection_queue: u32,
    pub poll_timeout_ms: u64,
    pub receive_buffer_size: usize,
    pub worker_pool_size: usize,
    /// Bound on each `JobQueue`'s depth (§3: "a bounded job queue (FIFO)").
    /// `Dispatcher::dispatch` drops the packet and logs rather than push
    /// past this (§7: "full job queue ... producer logs and drops").
    pub job_queue_capacity: usize,
    pub welcome_message: Option<String>,
    pub max_n_fds: usize,
    pub n_bad_packets_limit: u32,
    pub check_packets: bool,
    pub log_level: String,
    pub admin: AdminConfig,
    pub update: Option<UpdateConfig>,
    pub interval: Option<IntervalConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            host: default_host(),
            port: default_port(),
            use_ipv6: false,
            connection_queue: default_connection_queue(),
            poll_timeout_ms: default_poll_timeout_ms(),
            receive_buffer_size: default_receive_buffer_size(),
            worker_pool_size: default_worker_pool_size(),
            job_queue_capacity: default_job_queue_capacity(),
            welcome_message: None,
            max_n_fds: default_max_n_fds(),
            n_bad_packets_limit: default_n_bad_packets_limit(),
            check_packets: default_check_packets(),
            log_level: default_log_level(),
            admin: AdminConfig::default(),
            update: None,
            interval: None,
        }
    }
}

impl Config {
    /// Reads and parses a TOML config file, falling back to built-in
    /// defaults for any field the file omits. Per §6 ("`--config <path>`,
    /// default `cerver.toml`, falling back to built-in defaults if
    /// absent"), a missing file is not an error: it resolves to
    /// `Config::default()` (still validated). A file that exists but fails
    /// to read (permissions, not a regular file, ...) or fails to parse is
    /// still fatal — only its *absence* has a fallback.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path, "config file not found, falling back to built-in defaults");
                let config = Config::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read config file at '{path}'")),
        };
        let raw: RawConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;

        let config = Config {
            name: raw.name,
            host: raw.host,
            port: raw.port,
            use_ipv6: raw.use_ipv6,
            connection_queue: raw.connection_queue,
            poll_timeout_ms: raw.poll_timeout_ms,
            receive_buffer_size: raw.receive_buffer_size,
            worker_pool_size: raw.worker_pool_size,
            job_queue_capacity: raw.job_queue_capacity,
            welcome_message: raw.welcome_message,
            max_n_fds: raw.max_n_fds,
            n_bad_packets_limit: raw.n_bad_packets_limit,
            check_packets: raw.check_packets,
            log_level: raw.log_level,
            admin: raw.admin,
            update: raw.update,
            interval: raw.interval,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates logical consistency beyond what serde defaults can enforce.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_n_fds == 0 {
            return Err(anyhow!("max_n_fds cannot be 0"));
        }
        if self.worker_pool_size == 0 {
            return Err(anyhow!("worker_pool_size cannot be 0"));
        }
        if self.job_queue_capacity == 0 {
            return Err(anyhow!("job_queue_capacity cannot be 0"));
        }
        if self.receive_buffer_size < crate::core::protocol::HEADER_SIZE {
            return Err(anyhow!(
                "receive_buffer_size must be at least the header size ({} bytes)",
                crate::core::protocol::HEADER_SIZE
            ));
        }

        if let Some(update) = &self.update
            && update.ticks_per_second == 0
        {
            return Err(anyhow!("update.ticks_per_second cannot be 0"));
        }
        if let Some(interval) = &self.interval
            && interval.seconds == 0
        {
            return Err(anyhow!("interval.seconds cannot be 0"));
        }

        if self.admin.enabled {
            if self.admin.port == 0 {
                return Err(anyhow!("admin.port cannot be 0"));
            }
            if self.admin.port == self.port && self.admin.host == self.host {
                return Err(anyhow!(
                    "admin.port cannot be the same as the main server port on the same host"
                ));
            }
            if self.admin.max_admin_connections < self.admin.max_admins {
                return Err(anyhow!(
                    "admin.max_admin_connections ({}) cannot be less than admin.max_admins ({})",
                    self.admin.max_admin_connections,
                    self.admin.max_admins
                ));
            }
            if self.admin.max_n_fds == 0 {
                return Err(anyhow!("admin.max_n_fds cannot be 0"));
            }
        }

        if self.n_bad_packets_limit == 0 {
            warn!("n_bad_packets_limit is 0; any malformed packet will drop the connection");
        }

        Ok(())
    }
}
