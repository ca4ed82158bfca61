//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables, falling back to
//! defaults when a variable is unset or unparsable.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::signature::SignatureMethod;
use crate::web::pipeline::{PipelineConfig, DEFAULT_MAX_BODY_BYTES};

/// Default route for inbound SMS webhooks.
pub const DEFAULT_INBOUND_SMS_PATH: &str = "/webhooks/inbound-sms";

/// Default route for delivery receipt webhooks.
pub const DEFAULT_DELIVERY_RECEIPT_PATH: &str = "/webhooks/delivery-receipt";

/// Route of the health check endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret for inbound SMS signature verification
    pub signature_secret: Option<String>,

    /// Algorithm the provider signs with
    pub signature_method: SignatureMethod,

    /// Whether requests continue down the chain after a webhook pipeline
    pub invoke_next: bool,

    /// Route for inbound SMS webhooks
    pub inbound_sms_path: String,

    /// Route for delivery receipt webhooks
    pub delivery_receipt_path: String,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_or("PORT", 8080),

            signature_secret: env::var("SIGNATURE_SECRET").ok(),

            signature_method: parse_or("SIGNATURE_METHOD", SignatureMethod::default()),

            invoke_next: parse_bool("WEBHOOK_INVOKE_NEXT", false),

            inbound_sms_path: parse_path("INBOUND_SMS_PATH", DEFAULT_INBOUND_SMS_PATH),

            delivery_receipt_path: parse_path("DELIVERY_RECEIPT_PATH", DEFAULT_DELIVERY_RECEIPT_PATH),

            max_body_bytes: parse_or("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
        .with_distinct_paths()
    }

    /// Fall back to the default routes when the configured ones collide with
    /// each other or with the health check.
    fn with_distinct_paths(mut self) -> Self {
        let collides = self.inbound_sms_path == self.delivery_receipt_path
            || self.inbound_sms_path == HEALTH_PATH
            || self.delivery_receipt_path == HEALTH_PATH;

        if collides {
            warn!(
                inbound_sms_path = %self.inbound_sms_path,
                delivery_receipt_path = %self.delivery_receipt_path,
                "Conflicting webhook paths, using defaults"
            );
            self.inbound_sms_path = DEFAULT_INBOUND_SMS_PATH.to_string();
            self.delivery_receipt_path = DEFAULT_DELIVERY_RECEIPT_PATH.to_string();
        }
        self
    }

    /// Immutable settings shared by every request on a webhook route.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_optional_secret(self.signature_secret.clone())
            .with_method(self.signature_method)
            .invoke_next(self.invoke_next)
            .with_max_body_bytes(self.max_body_bytes)
    }
}

/// Parse a variable with `FromStr`, warning and falling back on bad input.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Read a static route path: it must start with `/` and hold no whitespace
/// or router capture syntax.
fn parse_path(name: &str, default: &str) -> String {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default.to_string(),
    };

    let path = raw.trim();
    let valid = path.starts_with('/')
        && !path
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | '*' | '{' | '}'));

    if valid {
        path.to_string()
    } else {
        warn!(env_var = name, value = %raw, "Invalid route path, using default");
        default.to_string()
    }
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no`, `on/off`.
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_valid() {
        env::set_var("TEST_SIGNATURE_METHOD", "sha256");
        let result = parse_or("TEST_SIGNATURE_METHOD", SignatureMethod::Md5Hash);
        assert_eq!(result, SignatureMethod::Sha256);
        env::remove_var("TEST_SIGNATURE_METHOD");
    }

    #[test]
    fn test_parse_or_invalid_falls_back() {
        env::set_var("TEST_BAD_PORT", "eighty");
        assert_eq!(parse_or("TEST_BAD_PORT", 8080u16), 8080);
        env::remove_var("TEST_BAD_PORT");
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or("NONEXISTENT_VAR", 42usize), 42);
    }

    #[test]
    fn test_parse_bool() {
        env::set_var("TEST_BOOL_ON", "Yes");
        env::set_var("TEST_BOOL_OFF", "0");
        env::set_var("TEST_BOOL_BAD", "sometimes");
        assert!(parse_bool("TEST_BOOL_ON", false));
        assert!(!parse_bool("TEST_BOOL_OFF", true));
        assert!(parse_bool("TEST_BOOL_BAD", true));
        assert!(!parse_bool("NONEXISTENT_BOOL", false));
        env::remove_var("TEST_BOOL_ON");
        env::remove_var("TEST_BOOL_OFF");
        env::remove_var("TEST_BOOL_BAD");
    }

    #[test]
    fn test_parse_path() {
        env::set_var("TEST_PATH_OK", " /hooks/sms ");
        env::set_var("TEST_PATH_NO_SLASH", "webhooks/sms");
        env::set_var("TEST_PATH_SPACE", "/hooks/s ms");
        env::set_var("TEST_PATH_CAPTURE", "/hooks/:id");
        assert_eq!(parse_path("TEST_PATH_OK", "/default"), "/hooks/sms");
        assert_eq!(parse_path("TEST_PATH_NO_SLASH", "/default"), "/default");
        assert_eq!(parse_path("TEST_PATH_SPACE", "/default"), "/default");
        assert_eq!(parse_path("TEST_PATH_CAPTURE", "/default"), "/default");
        assert_eq!(parse_path("NONEXISTENT_PATH", "/default"), "/default");
        env::remove_var("TEST_PATH_OK");
        env::remove_var("TEST_PATH_NO_SLASH");
        env::remove_var("TEST_PATH_SPACE");
        env::remove_var("TEST_PATH_CAPTURE");
    }

    #[test]
    fn test_conflicting_paths_fall_back() {
        let mut config = sample_config();
        config.inbound_sms_path = "/hooks".to_string();
        config.delivery_receipt_path = "/hooks".to_string();
        let config = config.with_distinct_paths();
        assert_eq!(config.inbound_sms_path, DEFAULT_INBOUND_SMS_PATH);
        assert_eq!(config.delivery_receipt_path, DEFAULT_DELIVERY_RECEIPT_PATH);

        let mut config = sample_config();
        config.delivery_receipt_path = HEALTH_PATH.to_string();
        let config = config.with_distinct_paths();
        assert_eq!(config.delivery_receipt_path, DEFAULT_DELIVERY_RECEIPT_PATH);

        let mut config = sample_config();
        config.inbound_sms_path = "/hooks/sms".to_string();
        let config = config.with_distinct_paths();
        assert_eq!(config.inbound_sms_path, "/hooks/sms");
    }

    fn sample_config() -> Config {
        Config {
            port: 8080,
            signature_secret: None,
            signature_method: SignatureMethod::Md5Hash,
            invoke_next: false,
            inbound_sms_path: DEFAULT_INBOUND_SMS_PATH.to_string(),
            delivery_receipt_path: DEFAULT_DELIVERY_RECEIPT_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    #[test]
    fn test_pipeline_config_from_fields() {
        let config = Config {
            port: 8080,
            signature_secret: Some("s3cr3t".to_string()),
            signature_method: SignatureMethod::Sha1,
            invoke_next: true,
            inbound_sms_path: DEFAULT_INBOUND_SMS_PATH.to_string(),
            delivery_receipt_path: DEFAULT_DELIVERY_RECEIPT_PATH.to_string(),
            max_body_bytes: 1024,
        };
        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.secret(), Some("s3cr3t"));
        assert_eq!(pipeline.method(), SignatureMethod::Sha1);
        assert!(pipeline.invokes_next());
        assert_eq!(pipeline.max_body_bytes(), 1024);
    }
}
