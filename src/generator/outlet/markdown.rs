use crate::generator::research::grounding::GroundingReport;
use crate::generator::research::types::{DeepResearchReport, FinalReport};

/// 结构化报告转为可读的markdown
pub fn report_to_markdown(report: &DeepResearchReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    if !report.title.trim().is_empty() {
        lines.push(format!("# {}", report.title.trim()));
        lines.push(String::new());
    }

    lines.push("## Executive summary".to_string());
    lines.push(String::new());
    lines.push(report.executive_summary.clone());
    lines.push(String::new());

    for section in &report.sections {
        lines.push(format!("## {}", section.angle));
        lines.push(String::new());
        if !section.summary.trim().is_empty() {
            lines.push(section.summary.clone());
            lines.push(String::new());
        }
        if !section.findings.is_empty() {
            lines.push("**Evidence**".to_string());
            lines.push(String::new());
            for finding in &section.findings {
                lines.push(format!("- {}", finding.claim));
                lines.push(format!(
                    "  Source: [{}]({})",
                    finding.source_title, finding.source_url
                ));
            }
            lines.push(String::new());
        }
    }

    if !report.risks_and_uncertainties.trim().is_empty() {
        lines.push("## Risks and uncertainties".to_string());
        lines.push(String::new());
        lines.push(report.risks_and_uncertainties.clone());
        lines.push(String::new());
    }

    if !report.watch_list.is_empty() {
        lines.push("## What to watch next".to_string());
        lines.push(String::new());
        for item in &report.watch_list {
            lines.push(format!("- {}", item));
        }
        lines.push(String::new());
    }

    lines.join("\n").trim().to_string()
}

pub fn render_final_report(report: &FinalReport) -> String {
    match report {
        FinalReport::Structured(report) => report_to_markdown(report),
        FinalReport::Markdown(markdown) => markdown.trim().to_string(),
    }
}

/// 未溯源引用的附注，全部溯源时返回None
pub fn grounding_notes(grounding: &[GroundingReport]) -> Option<String> {
    let flagged: Vec<_> = grounding.iter().filter(|g| !g.is_clean()).collect();
    if flagged.is_empty() {
        return None;
    }

    let mut lines = vec![
        "## Citation check".to_string(),
        String::new(),
        "The following citations point to URLs that were not among the search results for their angle:"
            .to_string(),
        String::new(),
    ];
    for report in flagged {
        for finding in &report.ungrounded {
            lines.push(format!(
                "- {}: {} ({})",
                report.angle, finding.claim, finding.source_url
            ));
        }
    }
    Some(lines.join("\n"))
}
