use serde_json::Value;
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body representation for the outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    /// No body.
    Empty,
    /// Raw text sent as-is.
    Text(String),
    /// JSON document.
    Json(Value),
    /// Form-encoded string.
    Form(String),
}

impl OutboundBody {
    /// Chooses the representation for a decoded body given the outbound headers.
    ///
    /// A flat object is form-encoded only when the headers declare a form
    /// content type.
    #[must_use]
    pub fn from_value(body: &Value, headers: &[(String, String)]) -> Self {
        match body {
            Value::Null => Self::Empty,
            Value::String(text) => Self::Text(text.clone()),
            Value::Object(fields) if declares_form(headers) => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (key, value) in fields {
                    match value {
                        Value::String(text) => serializer.append_pair(key, text),
                        Value::Null => serializer.append_pair(key, ""),
                        other => serializer.append_pair(key, other.to_string().as_str()),
                    };
                }
                Self::Form(serializer.finish())
            }
            other => Self::Json(other.clone()),
        }
    }
}

fn declares_form(headers: &[(String, String)]) -> bool {
    headers.iter().any(|(name, value)| {
        name.eq_ignore_ascii_case("content-type")
            && value.to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE)
    })
}
