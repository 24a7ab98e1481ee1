//! The inbound authorization request and the enumerations derived from it.
//!
//! An [`AuthorizationRequest`] is created at ingress (query/form parameters,
//! a pushed authorization request, or a request object JWT) and is immutable
//! from then on. Everything the validator chain learns about it is stored in
//! the validation context, never written back into the request.

use serde::{Deserialize, Deserializer, Serialize};

/// Values of the `response_type` parameter.
pub mod response_types {
    pub const CODE: &str = "code";
    pub const ID_TOKEN: &str = "id_token";
    pub const TOKEN: &str = "token";
}

/// Values of the `prompt` parameter.
pub mod prompts {
    pub const NONE: &str = "none";
    pub const LOGIN: &str = "login";
    pub const CONSENT: &str = "consent";
    pub const SELECT_ACCOUNT: &str = "select_account";
}

/// How the authorization response is delivered back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Query,
    Fragment,
    FormPost,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Query => "query",
            ResponseMode::Fragment => "fragment",
            ResponseMode::FormPost => "form_post",
        }
    }

    /// Exact-match parsing. Matching is case-sensitive: `Query`, `JWT` and
    /// other unknown values are rejected by returning `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "query" => Some(ResponseMode::Query),
            "fragment" => Some(ResponseMode::Fragment),
            "form_post" => Some(ResponseMode::FormPost),
            _ => None,
        }
    }
}

/// The authorization flow selected from the `response_type` composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    AuthorizationCode,
    Implicit,
    Hybrid,
}

impl FlowType {
    /// The natural response mode of the flow: `query` for the code flow,
    /// `fragment` for any flow that places tokens in the response.
    pub fn default_response_mode(&self) -> ResponseMode {
        match self {
            FlowType::AuthorizationCode => ResponseMode::Query,
            FlowType::Implicit | FlowType::Hybrid => ResponseMode::Fragment,
        }
    }

    /// Whether `response_mode` is an acceptable delivery mechanism for this
    /// flow. Implicit and hybrid responses carry tokens, so `query` is
    /// forbidden for them.
    pub fn allows_response_mode(&self, response_mode: ResponseMode) -> bool {
        match self {
            FlowType::AuthorizationCode => true,
            FlowType::Implicit | FlowType::Hybrid => response_mode != ResponseMode::Query,
        }
    }
}

/// The `claims` request parameter: individually requested claims, keyed by
/// delivery destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestedClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A raw authorization request, as received by the authorization endpoint.
///
/// `response_type`, `scope` and `resources` accept either their wire form
/// (space-delimited string, repeated parameter) or a JSON array, so the same
/// model deserializes from query parameters, PAR storage and request object
/// payloads alike.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_opt_space_delimited"
    )]
    pub response_type: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_space_delimited"
    )]
    pub scope: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_locales: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims_locales: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr_values: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_uri: Option<String>,

    #[serde(
        default,
        rename = "resource",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_space_delimited"
    )]
    pub resources: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<RequestedClaims>,
}

impl AuthorizationRequest {
    /// Case-insensitive membership test over `response_type` components.
    pub fn has_response_type(&self, value: &str) -> bool {
        self.response_type
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|part| part.eq_ignore_ascii_case(value))
    }

    /// The `response_type` components with case-insensitive duplicates
    /// removed, order preserved.
    pub fn distinct_response_types(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for part in self.response_type.as_deref().unwrap_or_default() {
            let lowered = part.to_ascii_lowercase();
            if !seen.contains(&lowered) {
                seen.push(lowered);
            }
        }
        seen
    }

    /// Whether the `prompt` parameter contains the given value.
    pub fn has_prompt(&self, value: &str) -> bool {
        self.prompt
            .as_deref()
            .unwrap_or_default()
            .split_ascii_whitespace()
            .any(|part| part == value)
    }
}

fn split_space_delimited(value: &str) -> Vec<String> {
    value
        .split_ascii_whitespace()
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrSeq {
    String(String),
    Seq(Vec<String>),
}

impl From<StringOrSeq> for Vec<String> {
    fn from(value: StringOrSeq) -> Self {
        match value {
            StringOrSeq::String(s) => split_space_delimited(&s),
            StringOrSeq::Seq(items) => items,
        }
    }
}

fn deserialize_space_delimited<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(StringOrSeq::deserialize(deserializer)?.into())
}

fn deserialize_opt_space_delimited<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrSeq>::deserialize(deserializer)?.map(Into::into))
}
