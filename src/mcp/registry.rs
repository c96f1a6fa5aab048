use crate::{config::Config, errors::AppError, mcp::types::FunctionDeclaration};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

pub type DynTool = Arc<dyn Tool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<(String, DynTool)>,
}

impl ToolRegistry {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        use crate::tools::{exec::ExecTool, fs_list::FsListTool, fs_read::FsReadTool};
        let tools: Vec<DynTool> = vec![
            Arc::new(FsListTool::new(cfg)?),
            Arc::new(FsReadTool::new(cfg)?),
            Arc::new(ExecTool::new(cfg)?),
        ];
        let mut tools: Vec<(String, DynTool)> = tools.into_iter().map(|t| (t.name().to_string(), t)).collect();
        tools.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { tools })
    }

    pub fn get(&self, name: &str) -> Option<DynTool> { self.tools.iter().find(|(n, _)| n == name).map(|(_, t)| t.clone()) }
    pub fn list_names(&self) -> Vec<String> { self.tools.iter().map(|(n, _)| n.clone()).collect() }
    pub fn declarations(&self) -> Vec<FunctionDeclaration> { self.tools.iter().map(|(_, t)| t.declaration()).collect() }

    pub async fn call(&self, name: &str, params: serde_json::Value) -> Result<String, AppError> {
        let tool = self.get(name).ok_or_else(|| AppError::UnknownTool(name.to_string()))?;
        tool.call(params).await
    }
}

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub error: Option<super::types::ErrorObj>,
}

/// Decodes tool params; a missing or null params value counts as `{}`.
pub fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, AppError> {
    let params = if params.is_null() { serde_json::Value::Object(Default::default()) } else { params };
    serde_json::from_value(params).map_err(|e| AppError::InvalidParams(e.to_string()))
}

/// A callable the agent can pick. Results are always text: tool failures come
/// back as `Ok("Error: ...")`, and `Err` is reserved for undecodable params.
#[async_trait]
pub trait Tool {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> serde_json::Value;
    async fn call(&self, params: serde_json::Value) -> Result<String, AppError>;

    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}
