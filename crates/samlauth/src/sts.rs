//! Exchange of the SAML assertion for temporary credentials.

use crate::assertion::RoleBinding;
use aws_config::Region;
use eyre::{eyre, Result, WrapErr};
use tracing::debug;

/// Short-lived credentials returned by the token service.
#[derive(Clone)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

/// Calls `AssumeRoleWithSAML` with the selected role and the raw
/// base64 assertion. The operation authenticates with the assertion
/// itself, so no AWS credentials are required.
pub async fn assume_with_saml(
    region: &str,
    role: &RoleBinding,
    assertion_b64: &str,
) -> Result<TemporaryCredentials> {
    debug!(role_arn = %role.role_arn, "assuming role with SAML");
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .no_credentials()
        .load()
        .await;
    let client = aws_sdk_sts::Client::new(&config);

    let out = client
        .assume_role_with_saml()
        .role_arn(role.role_arn.as_str())
        .principal_arn(role.principal_arn.as_str())
        .saml_assertion(assertion_b64)
        .send()
        .await
        .wrap_err("AssumeRoleWithSAML failed")?;

    let credentials =
        out.credentials.ok_or_else(|| eyre!("the STS response is missing credentials"))?;
    Ok(TemporaryCredentials {
        access_key_id: credentials.access_key_id,
        secret_access_key: credentials.secret_access_key,
        session_token: credentials.session_token,
    })
}
