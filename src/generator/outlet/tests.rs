#[cfg(test)]
mod tests {
    use crate::generator::outlet::{ChatTurn, DiskOutlet, Outlet, render_transcript};
    use crate::generator::research::ResearchOutcome;
    use crate::generator::research::grounding::GroundingReport;
    use crate::generator::research::types::{
        DeepResearchReport, FinalReport, ResearchFinding, SectionFindings,
    };
    use std::fs;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn outcome() -> ResearchOutcome {
        let finding = ResearchFinding {
            claim: "Invented figure".to_string(),
            source_title: "Unknown".to_string(),
            source_url: "https://nowhere.example".to_string(),
            evidence: String::new(),
        };
        ResearchOutcome {
            run_id: Uuid::new_v4(),
            classification: None,
            angles: vec!["Outlook".to_string()],
            report: FinalReport::Structured(DeepResearchReport {
                title: "Renewable energy outlook".to_string(),
                executive_summary: "Growth continues.".to_string(),
                sections: vec![SectionFindings {
                    angle: "Outlook".to_string(),
                    summary: "Solar leads.".to_string(),
                    findings: vec![finding.clone()],
                }],
                risks_and_uncertainties: "Policy changes.".to_string(),
                watch_list: vec![],
            }),
            grounding: vec![GroundingReport {
                angle: "Outlook".to_string(),
                grounded: 0,
                ungrounded: vec![finding],
            }],
        }
    }

    #[tokio::test]
    async fn test_save_into_directory() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = DiskOutlet::new(temp_dir.path().join("reports"));

        let path = outlet
            .save("What is the outlook for renewable energy?", &outcome())
            .await
            .unwrap();

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("what-is-the-outlook-for-renewable-energy-"));
        assert!(file_name.ends_with(".md"));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Renewable energy outlook"));
        assert!(content.contains("## Citation check"));
    }

    #[tokio::test]
    async fn test_save_to_explicit_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out").join("report.json");
        let outlet = DiskOutlet::new(target.clone());

        let path = outlet.save("NVDA", &outcome()).await.unwrap();
        assert_eq!(path, target);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["report"]["format"], "structured");
        assert_eq!(value["report"]["report"]["title"], "Renewable energy outlook");
        assert_eq!(value["angles"][0], "Outlook");
    }

    #[test]
    fn test_save_transcript() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = DiskOutlet::new(temp_dir.path().to_path_buf());
        let turns = vec![ChatTurn {
            user: "NVDA".to_string(),
            assistant: "**Error:** search failed".to_string(),
        }];

        let path = outlet.save_transcript(&turns).unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, render_transcript(&turns));
        assert!(content.contains("## User\n\nNVDA\n\n## Assistant\n\n**Error:** search failed\n"));
    }
}
