//! Declarative parameter descriptors and the schema derived from them.
//!
//! Every action declares its parameters once as a list of [`ParamSpec`]s.
//! The same list drives both the schema shown to the model and the argument
//! parsing in [`crate::tools::catalog`], so the two cannot drift apart.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::llm::types::{FunctionDef, ToolDef};
use crate::tools::catalog::ActionSpec;

/// Semantic type of an action parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    /// May be omitted (or sent as `null`); never required.
    Optional(Box<ParamType>),
    /// A type with no schema mapping; presented to the model as a string.
    Other(&'static str),
}

impl ParamType {
    pub fn optional(inner: ParamType) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// The type with every `Optional` wrapper removed.
    pub fn unwrapped(&self) -> &ParamType {
        match self {
            Self::Optional(inner) => inner.unwrapped(),
            other => other,
        }
    }

    /// JSON-schema type name.
    pub fn schema_type(&self) -> &'static str {
        match self.unwrapped() {
            Self::Integer => "integer",
            Self::Float => "number",
            Self::Boolean => "boolean",
            Self::String | Self::Other(_) | Self::Optional(_) => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub default: Option<Value>,
    pub description: Option<&'static str>,
}

impl ParamSpec {
    pub fn new(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            default: None,
            description: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Required iff there is no default and the type is not optional.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.ty.is_optional()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySchema {
    pub name: String,
    #[serde(rename = "type")]
    pub schema_type: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Externally visible description of one action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// Properties in declaration order.
    pub properties: Vec<PropertySchema>,
    pub required: Vec<String>,
}

impl ToolSchema {
    /// JSON-schema object for the `parameters` field of a function tool.
    pub fn parameters_json(&self) -> Value {
        let mut properties = Map::new();
        for prop in &self.properties {
            let mut entry = json!({
                "type": prop.schema_type,
                "description": prop.description,
            });
            if let Some(default) = &prop.default {
                entry["default"] = default.clone();
            }
            properties.insert(prop.name.clone(), entry);
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }

    /// OpenAI-compatible function tool definition.
    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef {
            def_type: "function".into(),
            function: FunctionDef {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: self.parameters_json(),
            },
        }
    }
}

/// Derive the schema for `action`. Pure: the same action and description
/// always produce an identical schema.
pub fn derive_schema(action: &ActionSpec, description: &str) -> ToolSchema {
    let properties = action
        .params
        .iter()
        .map(|p| PropertySchema {
            name: p.name.to_string(),
            schema_type: p.ty.schema_type(),
            description: p
                .description
                .map(str::to_string)
                .unwrap_or_else(|| humanize(p.name)),
            default: p.default.clone(),
        })
        .collect();

    let required = action
        .params
        .iter()
        .filter(|p| p.is_required())
        .map(|p| p.name.to_string())
        .collect();

    ToolSchema {
        name: action.name().to_string(),
        description: description.to_string(),
        properties,
        required,
    }
}

/// `duration_ms` → `Duration Ms`.
pub fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::{ActionKind, ActionSpec};

    fn sample() -> ActionSpec {
        ActionSpec::new(ActionKind::AndroidSwipe)
            .param(ParamSpec::new("x1", ParamType::Integer))
            .param(ParamSpec::new("label", ParamType::optional(ParamType::Float)))
            .param(ParamSpec::new("duration_ms", ParamType::Integer).with_default(json!(300)))
            .param(ParamSpec::new("flag", ParamType::Boolean).describe("Toggle it"))
            .param(ParamSpec::new("blob", ParamType::Other("Path")))
    }

    #[test]
    fn types_map_to_schema_names() {
        let schema = derive_schema(&sample(), "Swipe");
        let types: Vec<_> = schema.properties.iter().map(|p| p.schema_type).collect();
        assert_eq!(types, vec!["integer", "number", "integer", "boolean", "string"]);
    }

    #[test]
    fn nested_optional_unwraps_to_inner_type() {
        let ty = ParamType::optional(ParamType::optional(ParamType::Integer));
        assert_eq!(ty.schema_type(), "integer");
        assert!(ty.is_optional());
    }

    #[test]
    fn required_excludes_defaults_and_optionals() {
        let schema = derive_schema(&sample(), "Swipe");
        assert_eq!(schema.required, vec!["x1", "flag", "blob"]);
    }

    #[test]
    fn default_is_embedded() {
        let params = derive_schema(&sample(), "Swipe").parameters_json();
        assert_eq!(params["properties"]["duration_ms"]["default"], json!(300));
        assert!(params["properties"]["x1"].get("default").is_none());
    }

    #[test]
    fn descriptions_come_from_names_unless_explicit() {
        let schema = derive_schema(&sample(), "Swipe");
        assert_eq!(schema.properties[0].description, "X1");
        assert_eq!(schema.properties[2].description, "Duration Ms");
        assert_eq!(schema.properties[3].description, "Toggle it");
    }

    #[test]
    fn humanize_handles_edge_underscores() {
        assert_eq!(humanize("filepath"), "Filepath");
        assert_eq!(humanize("_leading__double_"), "Leading Double");
    }

    #[test]
    fn derivation_is_byte_identical_across_runs() {
        let action = sample();
        let first = serde_json::to_string(&derive_schema(&action, "Swipe").to_tool_def()).unwrap();
        let second = serde_json::to_string(&derive_schema(&action, "Swipe").to_tool_def()).unwrap();
        assert_eq!(first, second);
    }
}
