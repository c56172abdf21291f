//! Browser-style SAML federation against an identity provider.
//!
//! The flow is strictly linear: fetch the login form, classify its
//! fields, post the credentials, lift the SAML assertion out of the
//! response, pick a role and exchange the assertion for temporary
//! credentials, which end up in the shared-credentials file. Every step
//! is a plain function over the previous step's output so the fragile
//! parts (field classification, assertion parsing) stay unit-testable
//! away from the HTTP session.

use eyre::{Result, WrapErr};
use reqwest::Url;

pub mod assertion;
pub mod credentials;
pub mod form;
pub mod sts;

/// The cookie-carrying HTTP session against the identity provider.
pub struct IdpClient {
    http: reqwest::Client,
}

impl IdpClient {
    /// Builds the session client. Redirects are followed implicitly;
    /// certificate verification is only relaxed for dev/test providers.
    pub fn new(verify_tls: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .wrap_err("failed to build the HTTP client")?;
        Ok(Self { http })
    }

    /// Opens the entry URL, following every redirect, and returns the
    /// final landing URL (the default form-submission target) together
    /// with the login page HTML.
    ///
    /// A non-success status is not an error here: the flow fails later,
    /// at assertion extraction, exactly as it does for a rejected login.
    pub async fn fetch_login_form(&self, entry_url: &str) -> Result<(Url, String)> {
        let response = self
            .http
            .get(entry_url)
            .send()
            .await
            .wrap_err("failed to reach the identity provider")?;
        let landing_url = response.url().clone();
        let html = response.text().await.wrap_err("failed to read the login page")?;
        Ok((landing_url, html))
    }

    /// Posts the login form payload, following redirects, and returns
    /// the response HTML.
    pub async fn submit_form(&self, url: Url, payload: &[(String, String)]) -> Result<String> {
        let response = self
            .http
            .post(url)
            .form(payload)
            .send()
            .await
            .wrap_err("failed to submit the login form")?;
        response.text().await.wrap_err("failed to read the login response")
    }
}

/// Picks the role to assume.
///
/// A single available role is selected without interaction; with more
/// than one the caller must pass the index the user chose, and an index
/// past the end of the list is a validation error.
pub fn select_role(
    roles: &[assertion::RoleBinding],
    chosen: Option<usize>,
) -> Result<&assertion::RoleBinding> {
    if roles.len() == 1 {
        return Ok(&roles[0]);
    }
    let index = chosen.ok_or_else(|| eyre::eyre!("a role must be selected"))?;
    roles
        .get(index)
        .ok_or_else(|| eyre::eyre!("you selected an invalid role index, please try again"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertion::RoleBinding;

    fn role(n: u32) -> RoleBinding {
        RoleBinding {
            role_arn: format!("arn:aws:iam::111122223333:role/role-{n}"),
            principal_arn: "arn:aws:iam::111122223333:saml-provider/idp".to_string(),
        }
    }

    #[test]
    fn single_role_needs_no_selection() {
        let roles = [role(0)];
        let selected = select_role(&roles, None).unwrap();
        assert_eq!(selected, &roles[0]);
    }

    #[test]
    fn multiple_roles_require_a_selection() {
        let roles = [role(0), role(1)];
        assert!(select_role(&roles, None).is_err());
        assert_eq!(select_role(&roles, Some(1)).unwrap(), &roles[1]);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let roles = [role(0), role(1)];
        assert!(select_role(&roles, Some(2)).is_err());
    }
}
