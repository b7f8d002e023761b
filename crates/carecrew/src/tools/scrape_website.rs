use std::sync::Arc;

use carecrew_core::tool::{Error as ToolError, Tool, ToolResult};
use regex::{Captures, Regex};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::lookup_host;
use url::Url;

use super::guard;

/// Bytes read from a page before the rest is dropped.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
/// Characters handed back to the model; keeps a page within the context
/// window of a 16k-token model.
const MAX_TEXT_CHARS: usize = 12_000;

#[derive(Deserialize, JsonSchema)]
pub struct ScrapeParameters {
    #[schemars(description = "Mandatory website url to read the file.")]
    website_url: String,
}

/// Reads a web page and returns its visible text.
pub struct ScrapeWebsiteTool {
    client: reqwest::Client,
    extractor: Arc<TextExtractor>,
    parameter_schema: Value,
}

impl ScrapeWebsiteTool {
    pub const NAME: &'static str = "read_website_content";

    pub fn new(client: reqwest::Client) -> Result<Self, regex::Error> {
        Ok(Self {
            client,
            extractor: Arc::new(TextExtractor::new()?),
            parameter_schema: schema_for!(ScrapeParameters).to_value(),
        })
    }
}

impl Tool for ScrapeWebsiteTool {
    type Input = ScrapeParameters;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "A tool that can be used to read a website content. \
         Returns the visible text of the page."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: ScrapeParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let extractor = Arc::clone(&self.extractor);
        async move {
            let url = parse_web_url(&input.website_url)?;
            ensure_public_address(&url).await?;
            debug!("reading {url}");
            let resp = client.get(url.clone()).send().await.map_err(|err| {
                ToolError::execution_error()
                    .with_reason(format!("failed to fetch {url}: {err}"))
            })?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ToolError::execution_error()
                    .with_reason(format!("{url} returned {status}")));
            }
            let (body, body_cut) = read_capped(resp, MAX_BODY_BYTES)
                .await
                .map_err(|err| {
                    ToolError::execution_error()
                        .with_reason(format!("failed to read {url}: {err}"))
                })?;
            if body_cut {
                info!("{url} is larger than {MAX_BODY_BYTES} bytes, reading a prefix");
            }
            let text = extractor.extract(&String::from_utf8_lossy(&body));
            Ok(limit_text(text, MAX_TEXT_CHARS, body_cut))
        }
    }
}

fn parse_web_url(raw: &str) -> Result<Url, ToolError> {
    let url = Url::parse(raw.trim()).map_err(|err| {
        ToolError::invalid_input().with_reason(format!("invalid url: {err}"))
    })?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ToolError::invalid_input()
                .with_reason(format!("unsupported url scheme `{scheme}`")));
        }
    }
    guard::check_host(&url)
        .map_err(|reason| ToolError::invalid_input().with_reason(reason))?;
    Ok(url)
}

/// Resolves the host and rejects it if any address is internal.
async fn ensure_public_address(url: &Url) -> Result<(), ToolError> {
    let (Some(host), Some(port)) = (url.host_str(), url.port_or_known_default())
    else {
        return Err(ToolError::invalid_input().with_reason("url has no host"));
    };
    // IPv6 literals come back bracketed.
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let addrs = lookup_host((host, port)).await.map_err(|err| {
        ToolError::execution_error()
            .with_reason(format!("failed to resolve {host}: {err}"))
    })?;
    guard::check_resolved(addrs)
        .map_err(|reason| ToolError::invalid_input().with_reason(reason))
}

/// Reads at most `limit` bytes of the body. The flag tells whether more was
/// available.
async fn read_capped(
    mut resp: reqwest::Response,
    limit: usize,
) -> reqwest::Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}

fn limit_text(text: String, max_chars: usize, body_cut: bool) -> String {
    let total = text.chars().count();
    if total <= max_chars && !body_cut {
        return text;
    }
    let (kept, note) = match text.char_indices().nth(max_chars) {
        Some((end, _)) => (
            &text[..end],
            format!(
                "[Content truncated at {max_chars} characters. Original length: {total} characters]"
            ),
        ),
        None => (
            text.as_str(),
            format!(
                "[Content truncated at {total} characters. The page was too large to read in full]"
            ),
        ),
    };
    format!("{kept}\n\n{note}")
}

/// Strips markup from HTML, leaving the text a reader would see.
struct TextExtractor {
    hidden: Regex,
    tag: Regex,
    entity: Regex,
    space: Regex,
}

impl TextExtractor {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            hidden: Regex::new(
                r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>",
            )?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            entity: Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);")?,
            space: Regex::new(r"\s+")?,
        })
    }

    fn extract(&self, html: &str) -> String {
        let text = self.hidden.replace_all(html, " ");
        let text = self.tag.replace_all(&text, " ");
        let text = self
            .entity
            .replace_all(&text, |caps: &Captures<'_>| decode_entity(&caps[0], &caps[1]));
        self.space.replace_all(&text, " ").trim().to_owned()
    }
}

fn decode_entity(whole: &str, name: &str) -> String {
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) =
                name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()
            } else {
                name.strip_prefix('#').and_then(|dec| dec.parse().ok())
            };
            code.and_then(char::from_u32)
        }
    };
    match decoded {
        Some(ch) => ch.to_string(),
        // Unknown entities are left as written.
        None => whole.to_owned(),
    }
}
