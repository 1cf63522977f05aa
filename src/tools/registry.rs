use std::collections::HashMap;

use crate::errors::{DroidClawError, DroidClawResult};
use crate::llm::types::ToolDef;
use crate::tools::catalog::{ActionKind, ActionSpec};
use crate::tools::schema::{derive_schema, ToolSchema};

/// An action bound to the schema derived from it.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    pub action: ActionSpec,
    pub schema: ToolSchema,
}

/// Single source of truth for what the model may call.
///
/// Built once before the loop starts and shared read-only afterwards.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the whole built-in catalog in [`ActionKind::ALL`] order.
    pub fn builtin() -> DroidClawResult<Self> {
        let mut registry = Self::new();
        for kind in ActionKind::ALL {
            registry.register(kind.spec(), kind.description())?;
        }
        tracing::debug!(tools = registry.len(), "built-in tool registry ready");
        Ok(registry)
    }

    /// Derive the schema for `action` and store both. Names are unique.
    pub fn register(&mut self, action: ActionSpec, description: &str) -> DroidClawResult<()> {
        let name = action.name();
        if self.by_name.contains_key(name) {
            return Err(DroidClawError::Registration(format!(
                "tool '{name}' is already registered"
            )));
        }
        let schema = derive_schema(&action, description);
        self.by_name.insert(name, self.tools.len());
        self.tools.push(RegisteredTool { action, schema });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    /// Schemas in registration order.
    pub fn schemas(&self) -> impl Iterator<Item = &ToolSchema> {
        self.tools.iter().map(|t| &t.schema)
    }

    pub fn tool_defs(&self) -> Vec<ToolDef> {
        self.schemas().map(ToolSchema::to_tool_def).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
