use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub tools: Vec<FunctionDeclaration>,
}

/// Name, description and JSON parameter schema of one tool, in the shape
/// function-calling model APIs expect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorObj {
    pub code: String,
    pub message: String,
}
