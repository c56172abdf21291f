//! SAML assertion parsing and role extraction.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

const ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
const ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

/// Marker distinguishing a provider ARN from a role ARN inside a role
/// attribute value.
const PROVIDER_MARKER: &str = "saml-provider";

/// Failures while decoding or interpreting an assertion.
#[derive(Debug, thiserror::Error)]
pub enum AssertionError {
    #[error("the assertion is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("the assertion is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("the assertion is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("malformed role attribute value `{0}`")]
    MalformedRole(String),
}

/// An assumable role as asserted by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleBinding {
    pub role_arn: String,
    pub principal_arn: String,
}

impl RoleBinding {
    /// Parses a `role_arn,principal_arn` attribute value.
    ///
    /// Providers are inconsistent about the component order, so a pair
    /// whose first component carries the provider marker is swapped
    /// into canonical role-first order.
    pub fn parse(value: &str) -> Result<Self, AssertionError> {
        let (first, second) = value
            .split_once(',')
            .ok_or_else(|| AssertionError::MalformedRole(value.to_string()))?;
        let (role_arn, principal_arn) = if first.contains(PROVIDER_MARKER) {
            (second, first)
        } else {
            (first, second)
        };
        Ok(Self { role_arn: role_arn.to_string(), principal_arn: principal_arn.to_string() })
    }
}

/// Decodes the base64 assertion into its XML text.
pub fn decode_assertion(assertion_b64: &str) -> Result<String, AssertionError> {
    Ok(String::from_utf8(BASE64.decode(assertion_b64)?)?)
}

/// Collects every assumable role asserted by the identity provider, in
/// document order, each in canonical role-first form.
pub fn roles_from_assertion(xml: &str) -> Result<Vec<RoleBinding>, AssertionError> {
    let document = roxmltree::Document::parse(xml)?;
    document
        .descendants()
        .filter(|node| {
            node.has_tag_name((ASSERTION_NS, "Attribute"))
                && node.attribute("Name") == Some(ROLE_ATTRIBUTE)
        })
        .flat_map(|attribute| {
            attribute
                .children()
                .filter(|node| node.has_tag_name((ASSERTION_NS, "AttributeValue")))
                .filter_map(|node| node.text())
                .map(|value| RoleBinding::parse(value.trim()))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
                xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">
  <saml:Assertion>
    <saml:AttributeStatement>
      <saml:Attribute Name="https://aws.amazon.com/SAML/Attributes/RoleSessionName">
        <saml:AttributeValue>someone</saml:AttributeValue>
      </saml:Attribute>
      <saml:Attribute Name="https://aws.amazon.com/SAML/Attributes/Role">
        <saml:AttributeValue>arn:aws:iam::111122223333:role/admin,arn:aws:iam::111122223333:saml-provider/idp</saml:AttributeValue>
        <saml:AttributeValue>arn:aws:iam::111122223333:saml-provider/idp,arn:aws:iam::111122223333:role/dev</saml:AttributeValue>
      </saml:Attribute>
    </saml:AttributeStatement>
  </saml:Assertion>
</samlp:Response>"#;

    #[test]
    fn collects_roles_in_canonical_order() {
        let roles = roles_from_assertion(RESPONSE).unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].role_arn, "arn:aws:iam::111122223333:role/admin");
        assert_eq!(roles[0].principal_arn, "arn:aws:iam::111122223333:saml-provider/idp");
        // Provider-first values are swapped into role-first order.
        assert_eq!(roles[1].role_arn, "arn:aws:iam::111122223333:role/dev");
        assert_eq!(roles[1].principal_arn, "arn:aws:iam::111122223333:saml-provider/idp");
    }

    #[test]
    fn ignores_unrelated_attributes() {
        let roles = roles_from_assertion(RESPONSE).unwrap();
        assert!(roles.iter().all(|role| role.role_arn.contains(":role/")));
    }

    #[test]
    fn rejects_values_without_a_separator() {
        let err = RoleBinding::parse("arn:aws:iam::111122223333:role/admin").unwrap_err();
        assert!(matches!(err, AssertionError::MalformedRole(_)));
    }

    #[test]
    fn decodes_base64_assertions() {
        let encoded = BASE64.encode(RESPONSE);
        assert_eq!(decode_assertion(&encoded).unwrap(), RESPONSE);
        assert!(decode_assertion("not base64!").is_err());
    }
}
