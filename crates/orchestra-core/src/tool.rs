//! Tool Catalog
//!
//! Static tool definitions bound to providers, the function-call shapes the
//! reasoning model emits and consumes, and the executor contract the provider
//! registry implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::Result;

/// Reserved call name handled by the dispatch client itself
pub const DELEGATE_FUNCTION: &str = "delegate_to_agent";

/// Providers whose id starts with this prefix bypass the credential check
pub const INTERNAL_PROVIDER_PREFIX: &str = "internal";

/// Provider the delegation declaration is bound to
pub const ORCHESTRA_PROVIDER: &str = "internal_orchestra";

/// Whether a provider id is exempt from authentication
pub fn is_internal_provider(provider_id: &str) -> bool {
    provider_id.starts_with(INTERNAL_PROVIDER_PREFIX)
}

/// Function call requested by the reasoning model
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Call ID for pairing with the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Tool identifier; models occasionally omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Arguments object
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            args,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Name, treating an empty string the same as a missing one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// String argument lookup
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }
}

/// Tool result fed back to the model, keyed by the originating call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub id: String,
    pub name: String,
    pub response: Value,
}

/// JSON Schema primitive types used by tool parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    /// Homogeneous array of the boxed item type
    Array(Box<ParamType>),
}

impl ParamType {
    fn to_schema(&self) -> Value {
        match self {
            Self::String => json!({"type": "string"}),
            Self::Number => json!({"type": "number"}),
            Self::Integer => json!({"type": "integer"}),
            Self::Boolean => json!({"type": "boolean"}),
            Self::Array(items) => json!({"type": "array", "items": items.to_schema()}),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// A callable capability declared on an agent and bound to one provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique within the agent; the routing key for function calls
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Provider id gating execution
    pub provider: String,

    /// Parameter definitions in declaration order
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            provider: provider.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, param: ParameterSchema) -> Self {
        self.parameters.push(param);
        self
    }

    /// Object schema in the shape function-calling APIs expect
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut schema = param.param_type.to_schema();
            schema["description"] = Value::String(param.description.clone());
            properties.insert(param.name.clone(), schema);
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Declaration advertised to the reasoning model
    pub fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters_schema(),
        }
    }
}

/// What the reasoning model is told it may call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Provider-side tool execution (implemented by the provider registry)
///
/// Implementations must fail with [`AgentError::AuthRequired`] when a
/// non-internal provider has no stored credential.
///
/// [`AgentError::AuthRequired`]: crate::error::AgentError::AuthRequired
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute `tool_name` against `provider_id`, returning the payload
    async fn execute(&self, tool_name: &str, args: &Value, provider_id: &str) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instagram_tool() -> ToolSpec {
        ToolSpec::new("post_instagram_video", "Posts a video", "instagram")
            .param(ParameterSchema::required("video_url", ParamType::String, "URL"))
            .param(ParameterSchema::required("caption", ParamType::String, "Caption"))
            .param(ParameterSchema::optional(
                "tags",
                ParamType::Array(Box::new(ParamType::String)),
                "Hashtags",
            ))
    }

    #[test]
    fn test_parameters_schema() {
        let schema = instagram_tool().parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["caption"]["type"], "string");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(schema["required"], json!(["video_url", "caption"]));
    }

    #[test]
    fn test_function_call_name_handling() {
        let call = FunctionCall {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(call.name().is_none());

        let call = FunctionCall::new("get_seo_report", json!({"domain": "kloud.io"}));
        assert_eq!(call.name(), Some("get_seo_report"));
        assert_eq!(call.str_arg("domain"), Some("kloud.io"));
        assert_eq!(call.str_arg("missing"), None);
    }

    #[test]
    fn test_internal_prefix() {
        assert!(is_internal_provider(ORCHESTRA_PROVIDER));
        assert!(!is_internal_provider("jira"));
    }
}
