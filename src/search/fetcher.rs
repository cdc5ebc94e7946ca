//! 网页正文抓取

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;

use crate::utils::text::truncate_chars;

/// 抓取页面并提取可读文本
///
/// 抓取失败（超时、非200、解析失败）时返回空字符串，不中断调研。
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> String;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(super::USER_AGENT)
            .build()?;
        Ok(Self { client, max_chars })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            anyhow::bail!("HTTP {}", status.as_u16());
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> String {
        match self.fetch_html(url).await {
            Ok(html) => {
                let text = html_to_text(&html);
                truncate_chars(&text, self.max_chars).to_string()
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "page fetch failed, using empty content");
                String::new()
            }
        }
    }
}

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// 去掉脚本与样式后的页面文本，空白折叠为单个空格
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_strips_script_and_style() {
        let html = r#"
<html>
  <head>
    <title>NVIDIA Q3</title>
    <style>body { color: red; }</style>
    <script>var tracking = "secret";</script>
  </head>
  <body>
    <h1>Record   revenue</h1>
    <p>Data center revenue was <b>$30.8 billion</b>.</p>
    <noscript>Enable JavaScript</noscript>
  </body>
</html>"#;

        let text = html_to_text(html);

        assert_eq!(
            text,
            "NVIDIA Q3 Record revenue Data center revenue was $30.8 billion ."
        );
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_html_to_text_plain_text_body() {
        assert_eq!(html_to_text("just some\n\ttext"), "just some text");
    }

    #[tokio::test]
    async fn test_fetch_unreachable_returns_empty() {
        let fetcher = HttpPageFetcher::new(Duration::from_millis(500), 100).unwrap();
        let content = fetcher.fetch("http://127.0.0.1:9/nothing-here").await;
        assert_eq!(content, "");
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_returns_empty() {
        let fetcher = HttpPageFetcher::new(Duration::from_millis(500), 100).unwrap();
        assert_eq!(fetcher.fetch("not a url").await, "");
    }
}
