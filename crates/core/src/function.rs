//! Function declarations — callable functions advertised to the model.
//!
//! Declarations are owned by an external catalog; the memory store only reads
//! them, and charges their serialized description against the prompt budget.

use serde::{Deserialize, Serialize};

/// A function definition sent to the LLM so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// The function name
    pub name: String,

    /// Description of what the function does
    pub description: String,

    /// JSON Schema describing the function's arguments
    pub parameters: serde_json::Value,
}

impl FunctionDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Compact JSON form of the argument schema.
    pub fn schema_text(&self) -> String {
        serde_json::to_string(&self.parameters).unwrap_or_default()
    }
}

/// Read-only source of function declarations.
pub trait FunctionCatalog: Send + Sync {
    /// The declarations in the order they are sent to the model.
    fn declarations(&self) -> Vec<FunctionDeclaration>;
}

impl FunctionCatalog for Vec<FunctionDeclaration> {
    fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.clone()
    }
}

/// A fixed, ordered catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticFunctionCatalog {
    functions: Vec<FunctionDeclaration>,
}

impl StaticFunctionCatalog {
    pub fn new(functions: Vec<FunctionDeclaration>) -> Self {
        Self { functions }
    }

    /// Register a declaration. A declaration with the same name is replaced in place.
    pub fn register(&mut self, declaration: FunctionDeclaration) {
        match self.functions.iter_mut().find(|f| f.name == declaration.name) {
            Some(existing) => *existing = declaration,
            None => self.functions.push(declaration),
        }
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FunctionCatalog for StaticFunctionCatalog {
    fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.functions.clone()
    }
}
