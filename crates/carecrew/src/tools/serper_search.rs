use carecrew_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_RESULT_COUNT: usize = 10;

#[derive(Deserialize, JsonSchema)]
pub struct SearchParameters {
    #[schemars(
        description = "Mandatory search query you want to use to search the internet."
    )]
    search_query: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize, Default)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}

/// Google search through the Serper API.
pub struct SerperSearchTool {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    result_count: usize,
    parameter_schema: Value,
}

impl SerperSearchTool {
    pub const NAME: &'static str = "search_the_internet_with_serper";

    /// Creates a search tool calling `{base_url}/search`.
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        base_url: &str,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: format!("{}/search", base_url.trim_end_matches('/')),
            result_count: DEFAULT_RESULT_COUNT,
            parameter_schema: schema_for!(SearchParameters).to_value(),
        }
    }
}

impl Tool for SerperSearchTool {
    type Input = SearchParameters;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "A tool that can be used to search the internet with a search_query. \
         Returns the title, link and snippet of the top results."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let request = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: &input.search_query,
                num: self.result_count,
            });
        async move {
            debug!("searching for {:?}", input.search_query);
            let resp = request.send().await.map_err(|err| {
                ToolError::execution_error()
                    .with_reason(format!("search request failed: {err}"))
            })?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ToolError::execution_error()
                    .with_reason(format!("search service returned {status}")));
            }
            let body: SearchResponse = resp.json().await.map_err(|err| {
                ToolError::execution_error()
                    .with_reason(format!("unreadable search results: {err}"))
            })?;
            Ok(format_results(&body.organic))
        }
    }
}

fn format_results(results: &[OrganicResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_owned();
    }
    let blocks = results
        .iter()
        .map(|result| {
            format!(
                "Title: {}\nLink: {}\nSnippet: {}\n---",
                result.title,
                result.link,
                result.snippet.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>();
    format!("Search results:\n{}", blocks.join("\n"))
}
