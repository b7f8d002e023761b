//! Web tools the medical agents can call.

mod guard;
mod scrape_website;
mod serper_search;

pub use scrape_website::ScrapeWebsiteTool;
pub use serper_search::SerperSearchTool;

/// Sent with page fetches; some sites refuse clients without one.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

const MAX_REDIRECTS: usize = 5;

/// Builds the HTTP client the tools share.
///
/// Redirects are followed only towards hosts that pass the same check as
/// the requested URL.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    let redirect = reqwest::redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match guard::check_host(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(reason) => attempt.error(reason),
        }
    });
    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .redirect(redirect)
        .build()
}
