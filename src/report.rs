use crate::types::{BatchReport, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Renders a finished batch into the persisted text report.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Filename derived from the model identifier and fine-tune, if any.
    pub fn filename(&self, base_model: &str, fine_tune: Option<&str>) -> String {
        match fine_tune {
            Some(ft) => format!("eval_results_{}_{}.txt", tail(base_model), tail(ft)),
            None => format!("eval_results_{}.txt", tail(base_model)),
        }
    }

    pub fn render(&self, report: &BatchReport, base_model: &str, fine_tune: Option<&str>) -> String {
        let mut out = String::new();
        out.push_str(&"=".repeat(40));
        out.push('\n');
        out.push_str(&format!(
            "EVALUATION REPORT - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("Model: {}\n", base_model));
        if let Some(ft) = fine_tune {
            out.push_str(&format!("LoRA: {}\n", ft));
        }
        out.push_str(&"=".repeat(40));
        out.push_str("\n\n");

        out.push_str("SUMMARY STATS:\n");
        out.push_str(&format!("- Total Tasks: {}\n", report.total));
        out.push_str(&format!("- Average Score: {:.4}\n", report.average_score));
        out.push_str(&format!(
            "- Average Time Per Episode: {:.2}s\n\n",
            report.average_time
        ));

        out.push_str("DETAILED RESULTS:\n");
        out.push_str(&format!(
            "{:<10} | {:<15} | {:<7} | {:<8} | {:<7}\n",
            "Task ID", "Name", "Score", "Success", "Time"
        ));
        out.push_str(&"-".repeat(60));
        out.push('\n');
        for result in &report.results {
            out.push_str(&format!(
                "{:<10} | {:<15} | {:<7} | {:<8} | {:<7.2}s\n",
                result.task_id, result.task_name, result.score, result.success, result.time_taken
            ));
            if let Some(error) = &result.error {
                out.push_str(&format!("   └─ Error: {}\n", error));
            }
        }
        out
    }

    /// Render and persist; returns the written path.
    pub fn write(
        &self,
        report: &BatchReport,
        base_model: &str,
        fine_tune: Option<&str>,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(self.filename(base_model, fine_tune));
        fs::write(&path, self.render(report, base_model, fine_tune))?;
        info!("evaluation report written to {}", path.display());
        Ok(path)
    }
}

fn tail(identifier: &str) -> &str {
    Path::new(identifier)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(identifier)
}
