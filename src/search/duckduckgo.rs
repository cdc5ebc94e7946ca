//! DuckDuckGo HTML搜索，无需API KEY

use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};

use super::{SearchError, SearchProvider, SearchResult};

const PROVIDER: &str = "DuckDuckGo";
const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

pub struct DuckDuckGoProvider {
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .post(ENDPOINT)
            .form(&[("q", query)])
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|error| SearchError::Request {
                provider: PROVIDER,
                error,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|error| SearchError::Request {
            provider: PROVIDER,
            error,
        })?;

        let results = parse_results(&body, max_results);
        tracing::debug!(query, results = results.len(), "duckduckgo search finished");
        Ok(results)
    }
}

/// 解析DuckDuckGo HTML结果页
///
/// `Html` 不是 `Send`，解析必须在同步函数里完成，不能跨越 `.await`。
pub fn parse_results(body: &str, max_results: usize) -> Vec<SearchResult> {
    let document = Html::parse_document(body);
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for result in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }
        // 广告位同样带有 .result 类
        if result.value().classes().any(|class| class == "result--ad") {
            continue;
        }

        let Some(link) = result.select(&link_sel).next() else {
            continue;
        };
        let title = collapse_whitespace(&link.text().collect::<String>());
        let url = resolve_result_url(link.value().attr("href").unwrap_or_default());
        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default();

        if title.is_empty() || !url.starts_with("http") {
            continue;
        }
        results.push(SearchResult {
            title,
            url,
            snippet,
        });
    }
    results
}

/// 结果链接可能是 `//duckduckgo.com/l/?uddg=<encoded>&rut=...` 形式的跳转地址，
/// 取出并解码真实地址
pub fn resolve_result_url(href: &str) -> String {
    let href = href.trim();
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    if let Ok(url) = Url::parse(&absolute)
        && url.path().starts_with("/l/")
        && let Some((_, target)) = url.query_pairs().find(|(key, _)| key == "uddg")
    {
        return target.into_owned();
    }
    absolute
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
