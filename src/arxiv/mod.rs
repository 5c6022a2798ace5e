// ArXiv module
// This module fetches paper metadata from the ArXiv Atom API and downloads
// PDFs into the papers directory


use anyhow::{Context, Result, anyhow};
use fancy_regex::Regex;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

const DEFAULT_API_URL: &str = "http://export.arxiv.org/api/query";
const DEFAULT_PDF_URL: &str = "https://arxiv.org/pdf/";
const USER_AGENT: &str = concat!("paper-triage/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
const MAX_PDF_BYTES: u64 = 100 * 1024 * 1024;
const MAX_FILENAME_TITLE_CHARS: usize = 100;

static ABS_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"arxiv\.org/abs/(.+?)(?:v\d+)?$").expect("valid regex"));

/// Paper metadata from one ArXiv feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivPaper {
    pub arxiv_id: String,
    pub title: String,
    pub abstract_text: String,
    pub authors: String,
    pub published: String,
    pub categories: String,
}

/// Blocking HTTP client for the ArXiv query API.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    api_url: Url,
    pdf_base_url: Url,
    agent: ureq::Agent,
    retry_attempts: u32,
}

impl ArxivClient {
    #[inline]
    pub fn new() -> Result<Self> {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .user_agent(USER_AGENT)
            .build()
            .into();

        Ok(Self {
            api_url: Url::parse(DEFAULT_API_URL).context("Failed to parse ArXiv API URL")?,
            pdf_base_url: Url::parse(DEFAULT_PDF_URL).context("Failed to parse ArXiv PDF URL")?,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = api_url;
        self
    }

    #[inline]
    pub fn with_pdf_url(mut self, pdf_base_url: Url) -> Self {
        self.pdf_base_url = pdf_base_url;
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Searches ArXiv for papers matching the query, most relevant first.
    /// An all-fields search that comes back empty is retried once as a
    /// title-only search, which copes better with quoted phrases.
    #[inline]
    pub fn search(&self, query: &str, max_results: u32) -> Result<Vec<ArxivPaper>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(anyhow!("Search query is empty"));
        }

        info!("Searching ArXiv for '{}'", query);

        let papers = self.query_feed(&format!("all:{}", query), max_results)?;
        if !papers.is_empty() {
            return Ok(papers);
        }

        debug!("All-fields search returned nothing, retrying as title search");
        self.query_feed(&format!("ti:{}", query), max_results)
    }

    /// Fetches a single paper by its ArXiv id. An optional `arXiv:` prefix is
    /// accepted and stripped.
    #[inline]
    pub fn fetch_by_id(&self, arxiv_id: &str) -> Result<Option<ArxivPaper>> {
        let trimmed = arxiv_id.trim();
        let id = trimmed
            .strip_prefix("arXiv:")
            .or_else(|| trimmed.strip_prefix("arxiv:"))
            .unwrap_or(trimmed);
        if id.is_empty() {
            return Err(anyhow!("ArXiv id is empty"));
        }

        info!("Fetching ArXiv paper {}", id);

        let mut url = self.api_url.clone();
        url.query_pairs_mut().append_pair("id_list", id);

        let body = self.fetch_feed(&url)?;
        let papers = parse_feed(&body)?;

        Ok(papers.into_iter().next())
    }

    /// Downloads the PDF for a paper into `dir`, creating the directory when
    /// missing. Returns the path to the written file.
    #[inline]
    pub fn download_pdf(&self, arxiv_id: &str, title: &str, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create papers directory: {}", dir.display()))?;

        let url = self
            .pdf_base_url
            .join(&format!("{}.pdf", arxiv_id))
            .context("Failed to build PDF URL")?;

        info!("Downloading PDF from {}", url);

        let bytes = self
            .make_request_with_retry(|| {
                self.agent.get(url.as_str()).call().and_then(|mut resp| {
                    resp.body_mut()
                        .with_config()
                        .limit(MAX_PDF_BYTES)
                        .read_to_vec()
                })
            })
            .context("Failed to download PDF")?;

        let filename = format!(
            "[{}] {}.pdf",
            arxiv_id.replace('/', "-"),
            clean_filename(title)
        );
        let path = dir.join(filename);
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write PDF to {}", path.display()))?;

        info!("Downloaded PDF: {} ({} bytes)", path.display(), bytes.len());

        Ok(path)
    }

    fn query_feed(&self, search_query: &str, max_results: u32) -> Result<Vec<ArxivPaper>> {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("search_query", search_query)
            .append_pair("start", "0")
            .append_pair("max_results", &max_results.to_string())
            .append_pair("sortBy", "relevance")
            .append_pair("sortOrder", "descending");

        let body = self.fetch_feed(&url)?;
        parse_feed(&body)
    }

    fn fetch_feed(&self, url: &Url) -> Result<String> {
        debug!("Requesting ArXiv feed: {}", url);

        self.make_request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Failed to query the ArXiv API")
    }

    fn make_request_with_retry<T, F>(&self, mut request_fn: F) -> Result<T>
    where
        F: FnMut() -> Result<T, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true // Retry server errors
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true // Retry transport errors
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false // Don't retry other errors
                        }
                    };

                    if !should_retry {
                        return Err(anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow!("Request error: {}", error));

                    // Wait before retry (exponential backoff)
                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for ArXiv request");

        Err(last_error.unwrap_or_else(|| anyhow!("Request failed after retries")))
    }
}

/// Parses an ArXiv Atom feed. Entries missing a title, an abstract, or a
/// recognizable ArXiv id are skipped, which also filters out the error
/// entries the API returns for unknown ids.
fn parse_feed(body: &str) -> Result<Vec<ArxivPaper>> {
    let document = Html::parse_document(body);

    let entry_selector = selector("entry")?;
    let title_selector = selector("title")?;
    let summary_selector = selector("summary")?;
    let id_selector = selector("id")?;
    let author_selector = selector("author > name")?;
    let published_selector = selector("published")?;
    let category_selector = selector("category")?;

    let mut papers = Vec::new();

    for entry in document.select(&entry_selector) {
        let title = entry
            .select(&title_selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default();
        if title.is_empty() {
            warn!("Skipping feed entry without a title");
            continue;
        }

        let abstract_text = entry
            .select(&summary_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        if abstract_text.is_empty() {
            warn!("Skipping feed entry '{}' without an abstract", title);
            continue;
        }

        let id_url = entry
            .select(&id_selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();
        let Some(arxiv_id) = extract_arxiv_id(&id_url) else {
            warn!("Skipping feed entry '{}' without an ArXiv id", title);
            continue;
        };

        let authors = entry
            .select(&author_selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let published = entry
            .select(&published_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().chars().take(10).collect())
            .unwrap_or_default();

        let categories = entry
            .select(&category_selector)
            .filter_map(|el| el.value().attr("term"))
            .collect::<Vec<_>>()
            .join(", ");

        papers.push(ArxivPaper {
            arxiv_id,
            title,
            abstract_text,
            authors,
            published,
            categories,
        });
    }

    debug!("Parsed {} papers from feed", papers.len());

    Ok(papers)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Failed to create CSS selector: {:?}", e))
}

/// Pulls the bare ArXiv id out of an entry id URL, dropping any version
/// suffix: `http://arxiv.org/abs/2301.01234v2` becomes `2301.01234`.
fn extract_arxiv_id(id_url: &str) -> Option<String> {
    if let Ok(Some(captures)) = ABS_ID_REGEX.captures(id_url.trim()) {
        captures.get(1).map(|m| m.as_str().to_string())
    } else {
        None
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Makes a paper title safe to use in a filename: characters that are invalid
/// on common filesystems become spaces, whitespace runs collapse, and very
/// long titles are truncated.
fn clean_filename(title: &str) -> String {
    const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    let replaced: String = title
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { ' ' } else { c })
        .collect();
    let cleaned = collapse_whitespace(&replaced);

    if cleaned.chars().count() > MAX_FILENAME_TITLE_CHARS {
        let truncated: String = cleaned.chars().take(MAX_FILENAME_TITLE_CHARS).collect();
        format!("{}...", truncated)
    } else {
        cleaned
    }
}
