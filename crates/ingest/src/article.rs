//! URL fetching and article text extraction.

use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::info;

use crate::error::IngestError;
use crate::MIN_USABLE_CHARS;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Containers tried in order when locating the article body.
const ARTICLE_SELECTORS: [&str; 8] = [
    "article",
    "main",
    "#content",
    "#main-content",
    ".article-body",
    ".post-content",
    ".entry-content",
    "body",
];

/// Elements whose text is kept.
const TEXT_SELECTOR: &str = "p, h1, h2, h3, h4, li, blockquote";

/// Boilerplate containers; text inside them is ignored.
const NOISE_TAGS: [&str; 11] = [
    "nav",
    "header",
    "footer",
    "aside",
    "script",
    "style",
    "noscript",
    "form",
    "button",
    "advertisement",
    "figure",
];

/// Fragments this short are captions, labels and bylines.
const MIN_FRAGMENT_CHARS: usize = 40;

pub struct ArticleScraper {
    client: reqwest::Client,
}

impl ArticleScraper {
    pub fn new() -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| IngestError::Fetch {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Fetch a URL and return clean article text.
    pub async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        info!(url = %url, "fetching article");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| IngestError::Fetch {
                url: url.to_string(),
                reason: describe_request_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(IngestError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let html = response.text().await.map_err(|e| IngestError::Fetch {
            url: url.to_string(),
            reason: format!("failed to read response body: {}", e),
        })?;

        let text = extract_article_text(&html, url)?;
        info!(url = %url, chars = text.chars().count(), "fetched article text");
        Ok(text)
    }
}

fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out after {}s", FETCH_TIMEOUT.as_secs())
    } else if error.is_connect() {
        format!("could not connect: {}", error)
    } else {
        error.to_string()
    }
}

/// Parse HTML and return the article text, one fragment per paragraph.
pub fn extract_article_text(html: &str, url: &str) -> Result<String, IngestError> {
    let document = Html::parse_document(html);

    let article = ARTICLE_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .find(|candidate| !is_noise(candidate) && !inside_noise(candidate))
        })
        .ok_or_else(|| IngestError::NoArticleBody(url.to_string()))?;

    let text_selector =
        Selector::parse(TEXT_SELECTOR).map_err(|_| IngestError::NoArticleBody(url.to_string()))?;

    let fragments: Vec<String> = article
        .select(&text_selector)
        .filter(|element| !inside_noise(element))
        .map(|element| {
            element
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| text.chars().count() > MIN_FRAGMENT_CHARS)
        .collect();

    let text = fragments.join("\n\n");
    let chars = text.chars().count();
    if chars < MIN_USABLE_CHARS {
        return Err(IngestError::TooShort {
            chars,
            min: MIN_USABLE_CHARS,
        });
    }
    Ok(text)
}

fn is_noise(element: &ElementRef<'_>) -> bool {
    NOISE_TAGS.contains(&element.value().name())
}

fn inside_noise(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map(|e| NOISE_TAGS.contains(&e.name()))
            .unwrap_or(false)
    })
}
