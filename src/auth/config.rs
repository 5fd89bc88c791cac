//! Auth configuration: secrets, token lifetimes, and binding policy.
//!
//! All secret material is handed in at construction time; nothing here reads
//! the environment. Secrets are held as [`SecretString`] so they stay out of
//! `Debug` output and logs.

use secrecy::SecretString;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_BCRYPT_COST: u32 = 10;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 15 * 60;

/// How a refresh-token binding mismatch (IP or user agent) is handled.
///
/// `Enforce` rejects the refresh outright. `Advisory` logs the mismatch but
/// lets the rotation proceed, for deployments behind proxies or mobile
/// clients with unstable addresses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BindingPolicy {
    Enforce,
    Advisory,
}

impl BindingPolicy {
    /// Parse a policy name as given on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "enforce" => Some(Self::Enforce),
            "advisory" => Some(Self::Advisory),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_secret: SecretString,
    refresh_secret: SecretString,
    token_hash_secret: SecretString,
    pepper: SecretString,
    bcrypt_cost: u32,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    sweep_interval_seconds: u64,
    binding_policy: BindingPolicy,
    cookie_secure: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(
        access_secret: SecretString,
        refresh_secret: SecretString,
        token_hash_secret: SecretString,
        pepper: SecretString,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            token_hash_secret,
            pepper,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
            binding_policy: BindingPolicy::Enforce,
            cookie_secure: true,
        }
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_sweep_interval_seconds(mut self, seconds: u64) -> Self {
        self.sweep_interval_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_binding_policy(mut self, policy: BindingPolicy) -> Self {
        self.binding_policy = policy;
        self
    }

    /// Only disable for plain-HTTP local development.
    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn access_secret(&self) -> &SecretString {
        &self.access_secret
    }

    #[must_use]
    pub fn refresh_secret(&self) -> &SecretString {
        &self.refresh_secret
    }

    #[must_use]
    pub fn token_hash_secret(&self) -> &SecretString {
        &self.token_hash_secret
    }

    #[must_use]
    pub fn pepper(&self) -> &SecretString {
        &self.pepper
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn sweep_interval_seconds(&self) -> u64 {
        self.sweep_interval_seconds
    }

    #[must_use]
    pub fn binding_policy(&self) -> BindingPolicy {
        self.binding_policy
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthConfig, BindingPolicy};
    use secrecy::SecretString;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access"),
            SecretString::from("refresh"),
            SecretString::from("hash"),
            SecretString::from("pepper"),
        )
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = config();

        assert_eq!(
            config.access_ttl_seconds(),
            super::DEFAULT_ACCESS_TTL_SECONDS
        );
        assert_eq!(
            config.refresh_ttl_seconds(),
            super::DEFAULT_REFRESH_TTL_SECONDS
        );
        assert_eq!(config.bcrypt_cost(), super::DEFAULT_BCRYPT_COST);
        assert_eq!(config.binding_policy(), BindingPolicy::Enforce);
        assert!(config.cookie_secure());

        let config = config
            .with_bcrypt_cost(4)
            .with_access_ttl_seconds(60)
            .with_refresh_ttl_seconds(3600)
            .with_sweep_interval_seconds(30)
            .with_binding_policy(BindingPolicy::Advisory)
            .with_cookie_secure(false);

        assert_eq!(config.bcrypt_cost(), 4);
        assert_eq!(config.access_ttl_seconds(), 60);
        assert_eq!(config.refresh_ttl_seconds(), 3600);
        assert_eq!(config.sweep_interval_seconds(), 30);
        assert_eq!(config.binding_policy(), BindingPolicy::Advisory);
        assert!(!config.cookie_secure());
    }

    #[test]
    fn binding_policy_parses_known_names() {
        assert_eq!(BindingPolicy::parse("enforce"), Some(BindingPolicy::Enforce));
        assert_eq!(
            BindingPolicy::parse("Advisory"),
            Some(BindingPolicy::Advisory)
        );
        assert_eq!(BindingPolicy::parse("strict"), None);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        // SecretString's Debug impl prints a redaction marker, never the value.
        let config = AuthConfig::new(
            SecretString::from("s3cret-a"),
            SecretString::from("s3cret-b"),
            SecretString::from("s3cret-c"),
            SecretString::from("s3cret-d"),
        );
        let output = format!("{config:?}");
        assert!(!output.contains("s3cret"));
        assert!(output.contains("REDACTED"));
    }
}
