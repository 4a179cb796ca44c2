//! Gateway configuration.
//!
//! Provides [`CourierConfig`], loaded from environment variables with
//! defaults suitable for a local single-node gateway.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Gateway configuration.
///
/// # Examples
///
/// ```
/// use courier_s3_core::config::CourierConfig;
///
/// let config = CourierConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8000");
/// assert_eq!(config.max_body_size, 512 * 1024 * 1024);
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CourierConfig {
    /// Bind address for the gateway.
    #[builder(default = String::from("0.0.0.0:8000"))]
    pub gateway_listen: String,

    /// Log level filter used when `RUST_LOG` is unset.
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Value returned by `GetBucketLocation`.
    #[builder(default = String::from("us-east-1"))]
    pub location_constraint: String,

    /// Largest accepted request body, in bytes.
    #[builder(default = 536_870_912)]
    pub max_body_size: usize,

    /// Seconds allowed for receiving a request body.
    #[builder(default = 600)]
    pub body_read_timeout_secs: u64,

    /// Seconds allowed for a single backend chunk fetch.
    #[builder(default = 60)]
    pub chunk_fetch_timeout_secs: u64,

    /// Age in seconds after which an unfinished multipart upload is purged.
    #[builder(default = 86_400)]
    pub upload_ttl_secs: u64,

    /// Seconds between stale-upload sweeps.
    #[builder(default = 3_600)]
    pub upload_sweep_interval_secs: u64,

    /// Datacenter of the gateway's own transport account.
    #[builder(default = 2)]
    pub home_datacenter: u32,

    /// Number of transport datacenters, numbered from 1.
    #[builder(default = 5)]
    pub datacenters: u32,

    /// Access key of the user seeded at startup.
    #[builder(default = String::from("test"))]
    pub access_key: String,

    /// Secret key of the user seeded at startup.
    #[builder(default = String::from("test"))]
    pub secret_key: String,

    /// Display name of the user seeded at startup.
    #[builder(default = String::from("courier"))]
    pub display_name: String,

    /// Trust the access key in the `Authorization` header without checking
    /// the signature. Development only.
    #[builder(default = false)]
    pub skip_signature_validation: bool,
}

impl std::fmt::Debug for CourierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierConfig")
            .field("gateway_listen", &self.gateway_listen)
            .field("log_level", &self.log_level)
            .field("location_constraint", &self.location_constraint)
            .field("max_body_size", &self.max_body_size)
            .field("body_read_timeout_secs", &self.body_read_timeout_secs)
            .field("chunk_fetch_timeout_secs", &self.chunk_fetch_timeout_secs)
            .field("upload_ttl_secs", &self.upload_ttl_secs)
            .field("upload_sweep_interval_secs", &self.upload_sweep_interval_secs)
            .field("home_datacenter", &self.home_datacenter)
            .field("datacenters", &self.datacenters)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("skip_signature_validation", &self.skip_signature_validation)
            .finish()
    }
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CourierConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8000` |
    /// | `LOG_LEVEL` | `info` |
    /// | `LOCATION_CONSTRAINT` | `us-east-1` |
    /// | `MAX_BODY_SIZE` | `536870912` |
    /// | `BODY_READ_TIMEOUT` | `600` |
    /// | `CHUNK_FETCH_TIMEOUT` | `60` |
    /// | `UPLOAD_TTL` | `86400` |
    /// | `UPLOAD_SWEEP_INTERVAL` | `3600` |
    /// | `HOME_DATACENTER` | `2` |
    /// | `DATACENTERS` | `5` |
    /// | `ACCESS_KEY` | `test` |
    /// | `SECRET_KEY` | `test` |
    /// | `DISPLAY_NAME` | `courier` |
    /// | `SKIP_SIGNATURE_VALIDATION` | `false` |
    ///
    /// Unparsable numbers keep their default, as do zero timeouts and a zero
    /// sweep interval.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOCATION_CONSTRAINT") {
            config.location_constraint = v;
        }
        parse_into(&lookup, "MAX_BODY_SIZE", &mut config.max_body_size);
        parse_nonzero_into(&lookup, "BODY_READ_TIMEOUT", &mut config.body_read_timeout_secs);
        parse_nonzero_into(&lookup, "CHUNK_FETCH_TIMEOUT", &mut config.chunk_fetch_timeout_secs);
        parse_into(&lookup, "UPLOAD_TTL", &mut config.upload_ttl_secs);
        parse_nonzero_into(
            &lookup,
            "UPLOAD_SWEEP_INTERVAL",
            &mut config.upload_sweep_interval_secs,
        );
        parse_into(&lookup, "HOME_DATACENTER", &mut config.home_datacenter);
        parse_into(&lookup, "DATACENTERS", &mut config.datacenters);
        if let Some(v) = lookup("ACCESS_KEY") {
            config.access_key = v;
        }
        if let Some(v) = lookup("SECRET_KEY") {
            config.secret_key = v;
        }
        if let Some(v) = lookup("DISPLAY_NAME") {
            config.display_name = v;
        }
        if let Some(v) = lookup("SKIP_SIGNATURE_VALIDATION") {
            config.skip_signature_validation = matches!(v.trim(), "1" | "true" | "TRUE" | "True");
        }

        config
    }

    /// Body read timeout as a [`Duration`], at least one second.
    #[must_use]
    pub fn body_read_timeout(&self) -> Duration {
        Duration::from_secs(self.body_read_timeout_secs.max(1))
    }

    /// Chunk fetch timeout as a [`Duration`], at least one second.
    #[must_use]
    pub fn chunk_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_fetch_timeout_secs.max(1))
    }

    /// Multipart upload TTL as a [`Duration`].
    #[must_use]
    pub fn upload_ttl(&self) -> Duration {
        Duration::from_secs(self.upload_ttl_secs)
    }

    /// Reaper sweep interval as a [`Duration`], at least one second.
    #[must_use]
    pub fn upload_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.upload_sweep_interval_secs.max(1))
    }

    /// Datacenter ids `1..=datacenters`.
    #[must_use]
    pub fn datacenter_ids(&self) -> Vec<u32> {
        (1..=self.datacenters.max(1)).collect()
    }
}

fn parse_into<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    target: &mut T,
) {
    if let Some(value) = lookup(name).and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

fn parse_nonzero_into(lookup: &impl Fn(&str) -> Option<String>, name: &str, target: &mut u64) {
    let mut value = *target;
    parse_into(lookup, name, &mut value);
    if value > 0 {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_should_create_default_config() {
        let config = CourierConfig::default();
        assert_eq!(config.gateway_listen, "0.0.0.0:8000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.location_constraint, "us-east-1");
        assert_eq!(config.max_body_size, 536_870_912);
        assert_eq!(config.body_read_timeout(), Duration::from_secs(600));
        assert_eq!(config.chunk_fetch_timeout(), Duration::from_secs(60));
        assert_eq!(config.upload_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.home_datacenter, 2);
        assert_eq!(config.datacenter_ids(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_should_load_overrides_from_lookup() {
        let config = CourierConfig::from_lookup(lookup_from(&[
            ("GATEWAY_LISTEN", "127.0.0.1:9000"),
            ("MAX_BODY_SIZE", "1024"),
            ("HOME_DATACENTER", "4"),
            ("SECRET_KEY", "s3cr3t"),
            ("SKIP_SIGNATURE_VALIDATION", "true"),
        ]));
        assert_eq!(config.gateway_listen, "127.0.0.1:9000");
        assert_eq!(config.max_body_size, 1024);
        assert_eq!(config.home_datacenter, 4);
        assert_eq!(config.secret_key, "s3cr3t");
        assert!(config.skip_signature_validation);
    }

    #[test]
    fn test_should_keep_default_for_unparsable_number() {
        let config = CourierConfig::from_lookup(lookup_from(&[("UPLOAD_TTL", "soon")]));
        assert_eq!(config.upload_ttl_secs, 86_400);
    }

    #[test]
    fn test_should_ignore_zero_intervals_and_timeouts() {
        let config = CourierConfig::from_lookup(lookup_from(&[
            ("UPLOAD_SWEEP_INTERVAL", "0"),
            ("CHUNK_FETCH_TIMEOUT", "0"),
            ("BODY_READ_TIMEOUT", "0"),
            ("UPLOAD_TTL", "0"),
        ]));
        assert_eq!(config.upload_sweep_interval_secs, 3_600);
        assert_eq!(config.chunk_fetch_timeout_secs, 60);
        assert_eq!(config.body_read_timeout_secs, 600);
        assert_eq!(config.upload_ttl_secs, 0);

        let built = CourierConfig::builder().upload_sweep_interval_secs(0).build();
        assert_eq!(built.upload_sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = CourierConfig::builder()
            .location_constraint("eu-west-1".into())
            .datacenters(3)
            .build();
        assert_eq!(config.location_constraint, "eu-west-1");
        assert_eq!(config.datacenter_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let json = serde_json::to_string(&CourierConfig::default()).expect("test serialization");
        assert!(json.contains("gatewayListen"));
        assert!(json.contains("uploadTtlSecs"));
    }

    #[test]
    fn test_should_redact_secret_in_debug() {
        let config = CourierConfig::builder().secret_key("hunter2".into()).build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
