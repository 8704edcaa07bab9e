// crates/shared/src/schemas/mod.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A tool as advertised to the model: name, description and parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub type_name: String,
    pub description: String,
    pub required: bool,
}

/// Ollama/OpenAI function-calling format (for API requests)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn param(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.push_param(name.into(), type_name.into(), description.into(), true)
    }

    pub fn optional_param(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.push_param(name.into(), type_name.into(), description.into(), false)
    }

    fn push_param(mut self, name: String, type_name: String, description: String, required: bool) -> Self {
        self.parameters.push(ParameterSpec {
            name,
            type_name,
            description,
            required,
        });
        self
    }

    /// JSON schema object describing the parameters.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = vec![];

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.type_name,
                    "description": param.description
                }),
            );
            if param.required {
                required.push(param.name.as_str());
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    pub fn to_tool(&self) -> Tool {
        Tool {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: self.parameters_schema(),
            },
        }
    }
}
