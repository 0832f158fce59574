//! # Resident Identity
//!
//! The identity persisted by the login flow and read by every mounted form.
//! Forms never mutate it; only login/logout flows replace it.
//!
//! All attributes are optional. A missing or malformed stored record reads
//! as [`Identity::default()`] and the identity-bound fields simply render
//! empty.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::ValidationError;

/// Identity attributes known to the session store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    /// Resident's full name.
    pub name: Option<String>,
    /// Contact e-mail address.
    pub email: Option<String>,
    /// Barangay the resident is registered in.
    pub barangay: Option<String>,
}

/// Selector for one attribute of an [`Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityAttr {
    Name,
    Email,
    Barangay,
}

impl Identity {
    /// Convenience constructor for an identity with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Read one attribute. Blank strings read as absent.
    pub fn get(&self, attr: IdentityAttr) -> Option<&str> {
        let value = match attr {
            IdentityAttr::Name => self.name.as_deref(),
            IdentityAttr::Email => self.email.as_deref(),
            IdentityAttr::Barangay => self.barangay.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Whether no attribute is present.
    pub fn is_empty(&self) -> bool {
        [IdentityAttr::Name, IdentityAttr::Email, IdentityAttr::Barangay]
            .into_iter()
            .all(|attr| self.get(attr).is_none())
    }
}

impl fmt::Display for IdentityAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Email => f.write_str("email"),
            Self::Barangay => f.write_str("barangay"),
        }
    }
}

/// Opaque bearer token issued at login.
///
/// The inner string is zeroized on drop and the `Debug` impl redacts it so
/// the token cannot leak through log output.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Zeroizing<String>);

impl_validating_deserialize!(SessionToken);

impl SessionToken {
    /// Wrap a token string, rejecting values that cannot be sent in an
    /// `Authorization: Bearer` header.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(ValidationError::InvalidToken("token is empty"));
        }
        if !raw.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(ValidationError::InvalidToken(
                "token must be printable ASCII without whitespace",
            ));
        }
        Ok(Self(Zeroizing::new(raw)))
    }

    /// Expose the raw token for header construction.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

impl Serialize for SessionToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.expose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_attributes_read_as_absent() {
        let identity = Identity {
            name: Some("   ".into()),
            email: None,
            barangay: Some("San Isidro".into()),
        };
        assert_eq!(identity.get(IdentityAttr::Name), None);
        assert_eq!(identity.get(IdentityAttr::Barangay), Some("San Isidro"));
        assert!(!identity.is_empty());
        assert!(Identity::default().is_empty());
    }

    #[test]
    fn identity_ignores_unknown_stored_fields() {
        let identity: Identity = serde_json::from_str(
            r#"{"name":"Juan Dela Cruz","role":"user","_id":"abc"}"#,
        )
        .unwrap();
        assert_eq!(identity, Identity::named("Juan Dela Cruz"));
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = SessionToken::new("eyJhbGciOi.secret.sig").unwrap();
        let printed = format!("{token:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn token_rejects_whitespace_and_empty() {
        assert!(SessionToken::new("").is_err());
        assert!(SessionToken::new("abc def").is_err());
        assert!(SessionToken::new("abc\n").is_err());
    }

    #[test]
    fn token_deserialize_validates() {
        let ok: SessionToken = serde_json::from_str("\"tok-123\"").unwrap();
        assert_eq!(ok.expose(), "tok-123");
        assert!(serde_json::from_str::<SessionToken>("\"\"").is_err());
    }
}
