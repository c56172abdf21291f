//! Login-form discovery.
//!
//! Identity providers do not agree on field names, so fields are
//! classified by name substring. The heuristic is deliberately narrow
//! and isolated here so it can be swapped or tested without driving the
//! HTTP flow.

use eyre::{eyre, Result};
use reqwest::Url;
use scraper::{Html, Selector};

/// What a login-form input field is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRole {
    /// The field receives the username.
    Username,
    /// The field receives the password.
    Password,
    /// The field keeps whatever value the form already carries
    /// (hidden state, view-state tokens and the like).
    Passthrough,
}

/// Classifies a form field by its name.
///
/// `user` and `email` mark the username field (some providers label the
/// username field as email), `pass` the password field; the match is
/// case-insensitive.
pub fn classify_field(name: &str) -> FieldRole {
    let name = name.to_lowercase();
    if name.contains("user") || name.contains("email") {
        FieldRole::Username
    } else if name.contains("pass") {
        FieldRole::Password
    } else {
        FieldRole::Passthrough
    }
}

/// The discovered login form: the POST payload with the credentials
/// filled in, and the explicit `action` of a `form#loginForm`, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginForm {
    pub payload: Vec<(String, String)>,
    pub action: Option<String>,
}

/// Walks every `<input>` of the login page and builds the submission
/// payload, substituting the credentials into the classified fields and
/// passing every other field through with its existing value.
pub fn parse_login_form(html: &str, username: &str, password: &str) -> Result<LoginForm> {
    let document = Html::parse_document(html);
    let inputs = selector("input")?;
    let forms = selector("form")?;

    let mut payload = Vec::new();
    for input in document.select(&inputs) {
        let Some(name) = input.value().attr("name") else { continue };
        let value = match classify_field(name) {
            FieldRole::Username => username,
            FieldRole::Password => password,
            FieldRole::Passthrough => input.value().attr("value").unwrap_or_default(),
        };
        payload.push((name.to_string(), value.to_string()));
    }

    // Some providers don't set an explicit form action; when the login
    // form carries one it overrides the landing URL as the POST target.
    let action = document
        .select(&forms)
        .filter(|form| form.value().attr("id") == Some("loginForm"))
        .find_map(|form| form.value().attr("action"))
        .map(ToString::to_string);

    Ok(LoginForm { payload, action })
}

/// Resolves the form-submission URL: the landing URL after the entry
/// redirects, unless the login form carries an explicit action, in
/// which case the action path is applied to the entry URL's origin.
pub fn resolve_submit_url(entry_url: &Url, landing_url: Url, action: Option<&str>) -> Result<Url> {
    match action {
        Some(action) => {
            let origin = entry_url.origin().ascii_serialization();
            Url::parse(&format!("{origin}{action}"))
                .map_err(|err| eyre!("invalid form action `{action}`: {err}"))
        }
        None => Ok(landing_url),
    }
}

/// Extracts the base64 SAML assertion from the login response, if the
/// provider returned one.
pub fn extract_saml_response(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let inputs = selector("input")?;
    Ok(document
        .select(&inputs)
        .filter(|input| input.value().attr("name") == Some("SAMLResponse"))
        .find_map(|input| input.value().attr("value"))
        .map(ToString::to_string))
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| eyre!("invalid css selector `{css}`: {err}"))
}
