use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Structured record extracted from one opportunity page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerOpportunity {
    pub organization_name: String,
    pub activity_type: String,
    pub location: String,
    /// `F` for flexible, otherwise a weekday pattern like `Su M T W Th F Sa`.
    pub time_slot: String,
    pub slot_availability: Vec<String>,
    pub contact_email: String,
    /// Digits only; 0 when the page lists no phone number.
    pub contact_number: i64,
    pub extra: String,
    pub tags: Vec<String>,
    /// Source page, filled in after extraction.
    #[serde(default)]
    pub url: String,
}

impl VolunteerOpportunity {
    pub fn schema() -> Value {
        let text = |description: &str| json!({ "type": "string", "description": description });
        let list = |description: &str| {
            json!({ "type": "array", "items": { "type": "string" }, "description": description })
        };

        json!({
            "type": "object",
            "additionalProperties": false,
            "required": [
                "organization_name", "activity_type", "location", "time_slot",
                "slot_availability", "contact_email", "contact_number", "extra", "tags"
            ],
            "properties": {
                "organization_name": text("Full organization name running the opportunity; prefer the most prominent branding on the page."),
                "activity_type": text("3-10 word specific activity summary, e.g. \"environmental cleanup and service projects\". Avoid generic phrasing."),
                "location": text("Street address, city, state only. \"N/A\" if absent."),
                "time_slot": text("\"F\" for flexible or drop-in; recurring pattern like \"Su M T W Th F Sa\"; specific dates go in extra unless clearly recurring."),
                "slot_availability": list("One or more of: \"individual drop-in welcome\", \"individual application required\", \"corporate group drop-in welcome\", \"corporate group application required\"; else [\"N/A\"]."),
                "contact_email": text("Most relevant email or \"N/A\"."),
                "contact_number": { "type": "integer", "description": "Primary phone, digits only; 0 if none." },
                "extra": text("Important details that do not fit other fields. \"N/A\" if none."),
                "tags": list("1-3 tags from: environment, food security, education, community, healthcare, animal welfare, disaster relief, homeless support, advocacy.")
            }
        })
    }
}

/// Selector pair as proposed by the model, before defaults are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposedSelectors {
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
}

impl ProposedSelectors {
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["include", "exclude"],
            "properties": {
                "include": {
                    "type": "string",
                    "description": "Comma-separated minimal CSS selectors capturing only the core descriptive content, e.g. '#main, article, .content'."
                },
                "exclude": {
                    "type": "string",
                    "description": "Comma-separated selectors removing navigation, headers, footers, sidebars, share widgets, scripts and styles."
                }
            }
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request constrained to a JSON schema.
#[derive(Debug, Serialize)]
pub struct StructuredRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

impl StructuredRequest {
    pub fn new(
        model: impl Into<String>,
        schema_name: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
        schema: Value,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::system(system), Message::user(user)],
            temperature: Some(0.0),
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: schema_name.into(),
                    strict: true,
                    schema,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    pub json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseRaw {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
}
