//! # ambkit-config
//!
//! Configuration for the ambkit tools, extracted once from the
//! environment at startup and threaded into entry points as plain
//! values. There is no ambient global state: every binary builds the
//! config it needs and passes it down.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use eyre::{eyre, Result};
use std::{env, path::PathBuf};

/// The AWS region used when neither `AWS_DEFAULT_REGION` nor
/// `AWS_REGION` is set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// The AWS CLI output format written into the credentials profile.
pub const DEFAULT_OUTPUT: &str = "json";

/// The credentials-file section the temporary credentials are stored
/// under, so the default profile is never clobbered.
pub const DEFAULT_PROFILE_SECTION: &str = "saml";

/// The IdP-initiated sign-on URL that starts the authentication process.
pub const DEFAULT_IDP_ENTRY_URL: &str = "https://auth.nist.gov/adfs/ls/idpinitiatedsignon.aspx?loginToRp=urn:amazon:webservices&RequestedAuthenticationContext=urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport";

/// The AD realm prepended to the username as `<realm>\<user>`.
pub const DEFAULT_IDP_REALM: &str = "nist";

/// Settings for the AWS credentials profile the SAML tool writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AwsProfileConfig {
    /// Region configured in the profile and used for all API calls.
    pub region: String,
    /// AWS CLI output format configured in the profile.
    pub output: String,
    /// The shared-credentials file the profile section is written to.
    pub credentials_file: PathBuf,
    /// The named section holding the temporary credentials.
    pub section: String,
}

impl AwsProfileConfig {
    /// Reads the profile settings from the environment.
    ///
    /// `AWS_DEFAULT_REGION` takes precedence over `AWS_REGION`; the
    /// credentials file defaults to `~/.aws/credentials`.
    pub fn from_env() -> Result<Self> {
        let credentials_file = match env::var_os("AWS_SHARED_CREDENTIALS_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_credentials_file()?,
        };
        Ok(Self {
            region: var_opt("AWS_DEFAULT_REGION")
                .or_else(|| var_opt("AWS_REGION"))
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            output: var_with_default("AWS_DEFAULT_OUTPUT", DEFAULT_OUTPUT),
            credentials_file,
            section: var_with_default("AWS_PROFILE_SECTION", DEFAULT_PROFILE_SECTION),
        })
    }
}

/// Settings for the identity provider the SAML tool authenticates with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdpConfig {
    /// The initial URL that starts the authentication process.
    pub entry_url: String,
    /// The AD realm prepended to the username.
    pub realm: String,
    /// Whether strict TLS certificate verification is performed.
    /// Disabling this is only acceptable against dev/test providers.
    pub verify_tls: bool,
    /// Username, if provided via `IDP_USER`; prompted for otherwise.
    pub user: Option<String>,
    /// Password, if provided via `IDP_PASS`; prompted for otherwise.
    pub pass: Option<String>,
}

impl IdpConfig {
    /// Reads the identity-provider settings from the environment.
    pub fn from_env() -> Self {
        Self {
            entry_url: var_with_default("IDP_ENTRY_URL", DEFAULT_IDP_ENTRY_URL),
            realm: var_with_default("IDP_REALM", DEFAULT_IDP_REALM),
            verify_tls: env::var("IDP_VERIFY_TLS").map_or(true, |v| parse_bool(&v)),
            user: var_opt("IDP_USER"),
            pass: var_opt("IDP_PASS"),
        }
    }
}

/// The default shared-credentials file, `~/.aws/credentials`.
pub fn default_credentials_file() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".aws").join("credentials"))
        .ok_or_else(|| eyre!("could not determine the home directory"))
}

fn var_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn var_with_default(name: &str, default: &str) -> String {
    var_opt(name).unwrap_or_else(|| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_values() {
        for falsy in ["0", "false", "FALSE", "no", " off "] {
            assert!(!parse_bool(falsy), "{falsy}");
        }
        for truthy in ["1", "true", "yes", "anything"] {
            assert!(parse_bool(truthy), "{truthy}");
        }
    }

    #[test]
    fn credentials_file_under_home() {
        let path = default_credentials_file().unwrap();
        assert!(path.ends_with(".aws/credentials"));
    }
}
