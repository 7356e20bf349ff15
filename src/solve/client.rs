use crate::error::SolveError;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

pub const CALCULATE_PATH: &str = "calculate";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolveRequest {
    /// PNG snapshot as a `data:image/png;base64,` URL.
    pub image: String,
    #[serde(rename = "dict_of_vars")]
    pub variables: BTreeMap<String, String>,
}

/// One element of the solver's answer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolveResult {
    pub expr: String,
    pub result: String,
    pub assign: bool,
}

impl SolveResult {
    pub fn new(expr: impl Into<String>, result: impl Into<String>, assign: bool) -> Self {
        Self {
            expr: expr.into(),
            result: result.into(),
            assign,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SolveResultDe {
    #[serde(default)]
    expr: Value,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    assign: Option<Value>,
}

impl<'de> Deserialize<'de> for SolveResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let decoded = SolveResultDe::deserialize(deserializer)?;
        let assign = match decoded.assign {
            Some(Value::Bool(flag)) => flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            Some(Value::Number(flag)) => flag.as_f64().is_some_and(|n| n != 0.0),
            Some(_) | None => false,
        };
        Ok(Self {
            expr: value_text(decoded.expr),
            result: value_text(decoded.result),
            assign,
        })
    }
}

/// Solver answers carry numbers as often as strings.
fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SolveResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Vec<SolveResult>,
}

/// Parses a solver response body into its ordered result list.
pub fn parse_response(body: &str) -> Result<Vec<SolveResult>, SolveError> {
    let response: SolveResponse = serde_json::from_str(body)
        .map_err(|err| SolveError::MalformedResponse(err.to_string()))?;
    if response
        .status
        .as_deref()
        .is_some_and(|status| status.eq_ignore_ascii_case("error"))
    {
        return Err(SolveError::SolveRequestFailed(
            response
                .message
                .unwrap_or_else(|| "solver reported an error".into()),
        ));
    }
    Ok(response.data)
}

/// The external recognition service: one image plus the known variables in,
/// an ordered list of results out.
pub trait SolverClient: Send + Sync {
    fn solve(&self, request: &SolveRequest) -> Result<Vec<SolveResult>, SolveError>;
}

#[derive(Debug, Clone)]
pub struct HttpSolverClient {
    client: Client,
    endpoint: Url,
}

impl HttpSolverClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = calculate_endpoint(base_url)?;
        let client = Client::builder()
            .user_agent("ink-calc solver client")
            .timeout(timeout)
            .build()
            .context("build solver http client")?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub fn calculate_endpoint(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let base = Url::parse(&format!("{trimmed}/"))
        .with_context(|| format!("parse solver url {base_url:?}"))?;
    base.join(CALCULATE_PATH)
        .with_context(|| format!("build calculate endpoint from {base_url:?}"))
}

impl SolverClient for HttpSolverClient {
    fn solve(&self, request: &SolveRequest) -> Result<Vec<SolveResult>, SolveError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| SolveError::SolveRequestFailed(err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|err| SolveError::SolveRequestFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolveError::SolveRequestFailed(format!(
                "solver responded with HTTP {status}"
            )));
        }
        let text = response
            .text()
            .map_err(|err| SolveError::SolveRequestFailed(err.to_string()))?;
        parse_response(&text)
    }
}
