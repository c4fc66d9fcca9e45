//! Custom handler invocation module
//!
//! Wire types for the invocation protocol spoken with the Functions host, and
//! the glue that runs the function for one invocation:
//!
//! - request: `{"Data": {"req": {...}}, "Metadata": {"sys": {"RandGuid": ...}}}`
//! - response: `{"Outputs": {"res": {...}}, "Logs": [...], "ReturnValue": null}`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::FunctionConfig;
use crate::function::{HttpExample, HttpRequest, HttpResponse, InvocationContext, InvocationError};
use crate::logger;

/// Invocation payload POSTed by the host
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationRequest {
    /// Input bindings by name
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    /// Trigger metadata, including `sys`
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl InvocationRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, InvocationError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Decode the HTTP trigger input binding called `name`
    pub fn http_binding(&self, name: &str) -> Result<HttpRequest, InvocationError> {
        let value = self
            .data
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| InvocationError::MissingBinding(name.to_string()))?;
        Ok(HttpRequest::deserialize(value)?)
    }

    /// Host-assigned invocation id (`Metadata.sys.RandGuid`)
    pub fn invocation_id(&self) -> Option<String> {
        self.metadata
            .get("sys")?
            .get("RandGuid")?
            .as_str()
            .map(ToString::to_string)
    }
}

/// Invocation result returned to the host
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationResponse {
    /// Output bindings by name
    pub outputs: HashMap<String, HttpResponse>,
    pub logs: Vec<String>,
    pub return_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationResponse {
    /// Build the result from a finished context
    ///
    /// An empty response slot leaves `Outputs` empty.
    pub fn from_context(
        ctx: InvocationContext,
        output_binding: &str,
        result: Result<(), InvocationError>,
    ) -> Self {
        let (logs, res) = ctx.into_parts();
        let mut outputs = HashMap::new();
        if result.is_ok() {
            if let Some(res) = res {
                outputs.insert(output_binding.to_string(), res);
            }
        }
        Self {
            outputs,
            logs,
            return_value: None,
            error: result.err().as_ref().map(ToString::to_string),
        }
    }
}

/// Run the function once and flush its log lines
pub async fn invoke(
    function: &HttpExample,
    function_name: &str,
    req: &HttpRequest,
    invocation_id: Option<String>,
) -> (InvocationContext, Result<(), InvocationError>) {
    let mut ctx = InvocationContext::new(function_name, invocation_id);
    let result = function.run(&mut ctx, req).await;

    for line in ctx.logs() {
        logger::log_function(ctx.function_name(), ctx.invocation_id(), line);
    }
    if let Err(ref e) = result {
        logger::log_error(&format!(
            "Function.{} (Id={}) failed: {e}",
            ctx.function_name(),
            ctx.invocation_id()
        ));
    }

    (ctx, result)
}

/// Handle one invocation payload end to end
///
/// Payload and binding errors are returned as `Err`; function errors are
/// reported inside the `InvocationResponse`.
pub async fn handle_payload(
    body: &[u8],
    function: &HttpExample,
    config: &FunctionConfig,
) -> Result<InvocationResponse, InvocationError> {
    let payload = InvocationRequest::from_slice(body)?;
    let req = payload.http_binding(&config.input_binding)?;

    let (ctx, result) = invoke(function, &config.name, &req, payload.invocation_id()).await;
    Ok(InvocationResponse::from_context(
        ctx,
        &config.output_binding,
        result,
    ))
}
