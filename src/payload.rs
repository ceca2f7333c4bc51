use serde_json::Value as JsonValue;

/// Decoded response body handed back by a successful fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Body of a response whose content type mentions `json`.
    Json(JsonValue),
    /// Any other body, as text.
    Text(String),
}

impl Payload {
    /// Decodes `body` according to its declared content type.
    ///
    /// The check is a loose, case-insensitive `json` substring match, so
    /// `application/json`, `application/problem+json` and
    /// `text/x-json; charset=utf-8` all decode as JSON.
    pub fn decode(content_type: Option<&str>, body: String) -> Result<Self, serde_json::Error> {
        if content_type.is_some_and(is_json_content_type) {
            serde_json::from_str(&body).map(Self::Json)
        } else {
            Ok(Self::Text(body))
        }
    }

    /// Size logged for this payload.
    ///
    /// Both variants count characters, not bytes. JSON is counted on its
    /// compact re-serialization (no spaces after `,` or `:`, non-ASCII kept
    /// unescaped), so it is smaller than a pretty or ASCII-escaped rendering
    /// of the same document.
    pub fn size(&self) -> u64 {
        let len = match self {
            Self::Json(value) => {
                serde_json::to_string(value).map_or(0, |text| text.chars().count())
            }
            Self::Text(text) => text.chars().count(),
        };
        len as u64
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    pub fn into_json(self) -> Option<JsonValue> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("json")
}
