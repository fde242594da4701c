//! Tool descriptors.
//!
//! `Tool` is what adapters see; `ServerTool` additionally records which
//! tool server owns the tool and never leaves the core/mcp boundary.

use serde::{Deserialize, Serialize};

use super::chat::function_type;

/// Tool definition for function calling (OpenAI-compatible).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool type - always "function".
    #[serde(default = "function_type")]
    pub r#type: String,
    /// Function definition.
    pub function: FunctionDefinition,
}

/// Function definition within a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,
    /// Description of what the function does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for function parameters.
    #[serde(default = "empty_object_schema")]
    pub parameters: serde_json::Value,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl Tool {
    /// Create a function tool with an empty object schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            r#type: function_type(),
            function: FunctionDefinition {
                name: name.into(),
                description: None,
                parameters: empty_object_schema(),
            },
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.function.description = Some(desc.into());
        self
    }

    /// Set the parameter schema. `null` schemas fall back to an empty object.
    #[must_use]
    pub fn with_parameters(mut self, schema: serde_json::Value) -> Self {
        self.function.parameters = if schema.is_null() {
            empty_object_schema()
        } else {
            schema
        };
        self
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Description, or the empty string.
    pub fn description(&self) -> &str {
        self.function.description.as_deref().unwrap_or_default()
    }
}

/// A tool tagged with the id of the server that exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTool {
    pub server_id: String,
    #[serde(flatten)]
    pub tool: Tool,
}

impl ServerTool {
    pub fn new(server_id: impl Into<String>, tool: Tool) -> Self {
        Self {
            server_id: server_id.into(),
            tool,
        }
    }

    /// Function name.
    pub fn name(&self) -> &str {
        self.tool.name()
    }

    /// Drop the server tag.
    pub fn into_tool(self) -> Tool {
        self.tool
    }
}
