//! Claim shapes: the raw JWT body and the verified result handed back to callers.

use std::collections::HashSet;

use serde::Deserialize;

use usion_types::{RoomId, SessionId, UserId};

/// Raw claims as they appear in the token body. `aud` and `permissions` are
/// deserialized loosely (single string or array) to tolerate either shape
/// from the issuing side.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawClaims {
    pub sub: String,
    pub room_id: Option<String>,
    pub session_id: Option<String>,
    pub service_id: Option<String>,
    pub iss: String,
    #[serde(deserialize_with = "string_or_seq")]
    pub aud: Vec<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub permissions: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct StringOrSeq;

    impl<'de> Visitor<'de> for StringOrSeq {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a sequence of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Vec<String>, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Vec<String>, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                out.push(item);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(StringOrSeq)
}

/// Verified claim set returned by [`crate::TokenVerifier::verify`] on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub subject: UserId,
    pub room_id: Option<RoomId>,
    pub session_id: SessionId,
    pub service_id: String,
    pub expires_at: i64,
    pub issued_at: i64,
    pub permissions: HashSet<String>,
}

impl ClaimSet {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}
