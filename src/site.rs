use std::path::{Path, PathBuf};

use anyhow::Context;
use pulldown_cmark::{html, Event, Options, Parser};
use tracing::{info, warn};

use crate::dimensions;
use crate::models::EvaluationReport;

const STYLE: &str = r#"body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 0; background: #f7f7f8; color: #1f2328; }
header { background: #111827; color: #fff; padding: 16px 24px; }
header a { color: #fff; text-decoration: none; }
.container { max-width: 960px; margin: 0 auto; padding: 24px; }
table { width: 100%; border-collapse: collapse; background: #fff; }
th, td { text-align: left; padding: 10px 12px; border-bottom: 1px solid #e5e7eb; }
.score { font-weight: 700; font-variant-numeric: tabular-nums; }
.overall { background: #fff; border-radius: 8px; padding: 16px; margin-bottom: 24px; }
.dimension-card { background: #fff; border-radius: 8px; padding: 16px; margin-bottom: 16px; }
.dimension-card h3 { margin: 0 0 8px; display: flex; justify-content: space-between; }
.dimension-card .error { color: #b91c1c; font-size: 13px; }
.meta { color: #6b7280; font-size: 13px; }
"#;

/// A parsed log file and the page generated for it.
#[derive(Debug, Clone)]
pub struct SiteEntry {
    pub page: String,
    pub report: EvaluationReport,
}

/// Load every `*.json` report in `logs_dir`, sorted by company name.
pub fn load_reports(logs_dir: &Path) -> anyhow::Result<Vec<SiteEntry>> {
    let mut entries = Vec::new();
    let dir = std::fs::read_dir(logs_dir)
        .with_context(|| format!("failed to read {}", logs_dir.display()))?;

    for file in dir {
        let path = file?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let page = format!("{stem}.html");

        let parsed = std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str::<EvaluationReport>(&content)?));
        match parsed {
            Ok(report) => entries.push(SiteEntry { page, report }),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable report"),
        }
    }

    entries.sort_by(|a, b| {
        a.report
            .metadata
            .company_name
            .cmp(&b.report.metadata.company_name)
    });
    Ok(entries)
}

/// Write `index.html`, one page per report and the stylesheet into `out_dir`.
pub fn generate_site(logs_dir: &Path, out_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = load_reports(logs_dir)?;
    let css_dir = out_dir.join("static").join("css");
    std::fs::create_dir_all(&css_dir)
        .with_context(|| format!("failed to create {}", css_dir.display()))?;
    std::fs::write(css_dir.join("style.css"), STYLE)?;

    let mut written = Vec::with_capacity(entries.len() + 1);
    let index = out_dir.join("index.html");
    std::fs::write(&index, render_index(&entries))?;
    written.push(index);

    for entry in &entries {
        let path = out_dir.join(&entry.page);
        std::fs::write(&path, render_report(&entry.report))?;
        written.push(path);
    }

    info!(
        out_dir = %out_dir.display(),
        reports = entries.len(),
        "Static site generated"
    );
    Ok(written)
}

pub fn render_index(entries: &[SiteEntry]) -> String {
    let mut rows = String::new();

    if entries.is_empty() {
        rows.push_str(r#"<tr><td colspan="3" class="meta">No evaluations found yet. Run the evaluate command to populate the logs.</td></tr>"#);
    }

    for entry in entries {
        let metadata = &entry.report.metadata;
        rows.push_str(&format!(
            r#"<tr><td><a href="{page}">{name}</a></td><td class="meta">{date}</td><td class="score">{score:.2}</td></tr>"#,
            page = html_escape(&entry.page),
            name = html_escape(&metadata.company_name),
            date = html_escape(&metadata.evaluation_date),
            score = entry.report.overall.score,
        ));
    }

    let content = format!(
        r#"<div class="container"><h2>Startup Evaluations</h2>
<table><thead><tr><th>Company</th><th>Evaluated</th><th>Overall</th></tr></thead><tbody>{rows}</tbody></table></div>"#
    );

    build_page("Startup Evaluations", &content)
}

pub fn render_report(report: &EvaluationReport) -> String {
    let metadata = &report.metadata;
    let overall = &report.overall;
    let mut cards = String::new();

    for (name, result) in &report.dimensions {
        let summary = dimensions::find(name).map(|d| d.summary).unwrap_or("");
        let error = match &result.error {
            Some(e) => format!(r#"<p class="error">Evaluation failed: {}</p>"#, html_escape(e)),
            None => String::new(),
        };
        cards.push_str(&format!(
            r#"<div class="dimension-card">
    <h3><span title="{summary}">{name}</span><span class="score">{score}</span></h3>
    {error}{rationale}
</div>"#,
            summary = html_escape(summary),
            name = html_escape(name),
            score = result.score,
            rationale = markdown(&result.rationale),
        ));
    }

    let content = format!(
        r#"<div class="container">
<h2>{company}</h2>
<p class="meta">Evaluated {date} in {elapsed} (version {version})</p>
<div class="overall"><h3>Overall <span class="score">{score:.2}</span></h3><p>{rationale} ({ok} of {total} dimensions succeeded)</p></div>
{cards}
<p><a href="index.html">Back to all evaluations</a></p>
</div>"#,
        company = html_escape(&metadata.company_name),
        date = html_escape(&metadata.evaluation_date),
        elapsed = html_escape(&metadata.total_evaluation_time),
        version = html_escape(&metadata.evaluation_version),
        score = overall.score,
        rationale = html_escape(&overall.rationale),
        ok = overall.successful_evaluations,
        total = overall.total_dimensions,
    );

    build_page(&metadata.company_name, &content)
}

/// Render a rationale as markdown. Every line break starts a new block, and
/// raw HTML in the reply is escaped rather than passed through.
fn markdown(text: &str) -> String {
    let source = text.trim().replace('\n', "\n\n");
    let events = Parser::new_ext(&source, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut output = String::new();
    html::push_html(&mut output, events);
    output
}

fn build_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="static/css/style.css">
</head>
<body>
<header><a href="index.html"><strong>Startup Scorecard</strong></a></header>
{content}
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DimensionResult, Metadata, OverallResult, EVALUATION_VERSION};
    use crate::runner::save_report;

    fn report(name: &str, score: f64) -> EvaluationReport {
        EvaluationReport {
            metadata: Metadata {
                company_name: name.to_string(),
                evaluation_date: "2026-10-14T09:00:00Z".to_string(),
                evaluation_version: EVALUATION_VERSION.to_string(),
                total_evaluation_time: "12.50s".to_string(),
            },
            dimensions: vec![
                (
                    "Founder Edge".to_string(),
                    DimensionResult::new(4, "Repeat founder.\n\nSold <Previous> Co."),
                ),
                (
                    "Novel Wedge".to_string(),
                    DimensionResult::failed(1, "timeout"),
                ),
            ],
            overall: OverallResult {
                score,
                rationale: "Average score across 1 of 2 dimensions".to_string(),
                successful_evaluations: 1,
                total_dimensions: 2,
            },
        }
    }

    #[test]
    fn report_page_escapes_and_renders_rationale() {
        let html = render_report(&report("Acme & Sons", 4.0));
        assert!(html.contains("<h2>Acme &amp; Sons</h2>"));
        assert!(html.contains("<p>Repeat founder.</p>\n<p>Sold &lt;Previous&gt; Co.</p>"));
        assert!(html.contains(r#"title="Assesses the founder&#39;s unique advantages"#));
        assert!(html.contains(r#"<p class="error">Evaluation failed: timeout</p>"#));
        assert!(html.contains("1 of 2 dimensions succeeded"));
    }

    #[test]
    fn rationale_markdown_is_rendered() {
        let rationale = "**Strong** team:\n- repeat founder\n- <script>alert(1)</script>";
        let html = markdown(rationale);
        assert!(html.contains("<strong>Strong</strong> team:"), "{html}");
        assert!(html.contains("<ul>"), "{html}");
        assert!(html.contains("repeat founder"), "{html}");
        assert!(!html.contains("<script>"), "{html}");
        assert!(html.contains("&lt;script&gt;"), "{html}");
    }

    #[test]
    fn empty_index_explains_itself() {
        assert!(render_index(&[]).contains("No evaluations found yet"));
    }

    #[test]
    fn generates_pages_from_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let out = dir.path().join("site");
        save_report(&report("Zeta Labs", 2.5), &logs).unwrap();
        save_report(&report("Acme Robotics", 4.0), &logs).unwrap();
        std::fs::write(logs.join("broken.json"), "{not json").unwrap();
        std::fs::write(logs.join("notes.txt"), "ignored").unwrap();

        let written = generate_site(&logs, &out).unwrap();
        assert_eq!(written.len(), 3);
        assert!(out.join("static/css/style.css").exists());
        assert!(out.join("acme_robotics.html").exists());

        let index = std::fs::read_to_string(out.join("index.html")).unwrap();
        let acme = index.find("Acme Robotics").unwrap();
        let zeta = index.find("Zeta Labs").unwrap();
        assert!(acme < zeta);
        assert!(index.contains(r#"<a href="zeta_labs.html">"#));
        assert!(index.contains("2.50"));
    }
}
