use {serde::*, serde_json::Value};

//
// Credentials
//

/// A bearer credential pair.
///
/// Both tokens are always present together; "no session" is represented by the
/// *absence* of a [Credentials], never by a half-set pair.
///
/// The serialized form uses the backend's camelCase field names.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Access token, sent as the bearer `Authorization` header.
    pub access_token: String,

    /// Refresh token, sent to the refresh endpoint when the access token is
    /// rejected.
    pub refresh_token: String,
}

impl Credentials {
    /// Constructor.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Extract a credential pair from a JSON body.
    ///
    /// Extra fields (e.g. the user record in a login response) are ignored.
    pub fn from_json(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
