//! 引用溯源校验：发现里的source_url必须来自该角度实际拿到的搜索结果

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::generator::research::types::{ResearchFinding, SectionFindings};
use crate::search::SearchResult;

/// 单个章节的溯源结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingReport {
    pub angle: String,
    pub grounded: usize,
    pub ungrounded: Vec<ResearchFinding>,
}

impl GroundingReport {
    pub fn is_clean(&self) -> bool {
        self.ungrounded.is_empty()
    }
}

/// 比较时忽略协议、`www.`、fragment与结尾的 `/`；只有主机名不区分大小写
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split('#').next().unwrap_or(url);
    let url = url.find("://").map_or(url, |i| &url[i + 3..]);
    let (host, rest) = url.split_at(url.find(['/', '?']).unwrap_or(url.len()));
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    format!("{}{}", host, rest).trim_end_matches('/').to_string()
}

pub fn audit_section(section: &SectionFindings, sources: &[SearchResult]) -> GroundingReport {
    let known: HashSet<String> = sources.iter().map(|s| normalize_url(&s.url)).collect();

    let (grounded, ungrounded): (Vec<_>, Vec<_>) = section
        .findings
        .iter()
        .partition(|finding| known.contains(&normalize_url(&finding.source_url)));

    GroundingReport {
        angle: section.angle.clone(),
        grounded: grounded.len(),
        ungrounded: ungrounded.into_iter().cloned().collect(),
    }
}

/// 去掉未溯源的发现，返回被移除的数量
pub fn retain_grounded(section: &mut SectionFindings, sources: &[SearchResult]) -> usize {
    let known: HashSet<String> = sources.iter().map(|s| normalize_url(&s.url)).collect();
    let before = section.findings.len();
    section
        .findings
        .retain(|finding| known.contains(&normalize_url(&finding.source_url)));
    before - section.findings.len()
}
