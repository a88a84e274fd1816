//! HTML report rendering for translation results.
//!
//! The renderer turns a finalized [`JobResult`] into a self-contained
//! HTML fragment: one collapsible section per translated query with a
//! side-by-side line diff, plus warning blocks for failed translations
//! and for transient errors logged during polling. The document is
//! host-agnostic; callers embed it wherever HTML can be displayed.
//!
//! Every piece of service-supplied text is escaped before it reaches
//! the document. Translated SQL can contain arbitrary characters, so
//! this is a correctness requirement, not cosmetics.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::diff::{LineKind, side_by_side};
use crate::error::ShiftResult;
use crate::model::{JobResult, PollError, TranslatedModel, TranslationOutcome};

/// Rendered report, opaque to callers.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    html: String,
}

impl ReportDocument {
    pub fn as_html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    /// Write the document to a file.
    pub fn write_to(&self, path: &Path) -> ShiftResult<()> {
        fs::write(path, &self.html)?;
        Ok(())
    }
}

impl fmt::Display for ReportDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

/// Render `result` as an HTML report.
///
/// `source_label` and `target_label` become the diff column headers,
/// title-cased. Models are ordered naturally by the first run of
/// digits in their identifier, so `query_2` sorts before `query_10`.
pub fn render_report(
    result: &JobResult,
    source_label: &str,
    target_label: &str,
) -> ReportDocument {
    if result.models.is_empty() && result.polling_errors.is_empty() {
        return ReportDocument {
            html: "No queries were translated.".to_string(),
        };
    }

    let mut html = String::new();
    html.push_str(STYLE);
    html.push_str(SCRIPT);

    if !result.polling_errors.is_empty() {
        render_polling_warnings(&mut html, &result.polling_errors);
    }

    if result.models.is_empty() {
        html.push_str("<p>No queries were translated.</p>");
        return ReportDocument { html };
    }

    let mut ordered: Vec<&TranslatedModel> = result.models.iter().collect();
    ordered.sort_by(|a, b| natural_key(a.identifier()).cmp(&natural_key(b.identifier())));

    for model in ordered {
        let marker = if model.outcome == TranslationOutcome::Valid {
            "✅"
        } else {
            "⚠️"
        };
        html.push_str(&format!(
            "<button class=\"collapsible\" onclick=\"toggleCollapse(this)\">{marker} {}</button>\n",
            escape(model.identifier())
        ));
        html.push_str("<div class=\"content\">\n");
        render_model(&mut html, model, source_label, target_label);
        html.push_str("</div>\n");
    }

    ReportDocument { html }
}

fn render_polling_warnings(html: &mut String, errors: &[PollError]) {
    let noun = if errors.len() == 1 { "error" } else { "errors" };
    html.push_str(&format!(
        "<button class=\"collapsible\" onclick=\"toggleCollapse(this)\">⚠️ {} transient {noun} while polling</button>\n",
        errors.len()
    ));
    html.push_str("<div class=\"content\"><div class=\"warning-box\">\n");
    html.push_str("<div class=\"warning-title\">⚠ Transient errors during polling</div>\n");
    for error in errors {
        html.push_str(&format!(
            "<div class=\"failure-text\">[{}] {}</div>\n",
            escape(&error.kind),
            escape(&error.message)
        ));
    }
    html.push_str("</div></div>\n");
}

fn render_model(
    html: &mut String,
    model: &TranslatedModel,
    source_label: &str,
    target_label: &str,
) {
    let translated = model
        .target_text
        .as_deref()
        .filter(|text| !text.trim().is_empty());

    let mut content = String::new();
    if model.outcome != TranslationOutcome::Valid {
        render_warning(&mut content, model);
    }
    if let Some(target_text) = translated {
        render_diff(
            &mut content,
            &model.source_text,
            target_text,
            source_label,
            target_label,
        );
    }
    if content.is_empty() {
        content.push_str("<p>No translation results available.</p>\n");
    }
    html.push_str(&content);
}

fn render_warning(html: &mut String, model: &TranslatedModel) {
    html.push_str("<div class=\"warning-box\">\n");
    html.push_str("<div class=\"warning-title\">⚠ Translation Failed</div>\n");

    match &model.failure_detail {
        Some(detail) => {
            failure_field(html, "Problem", &detail.problem);
            if let Some(location) = detail
                .location
                .as_deref()
                .filter(|loc| !loc.trim().is_empty())
            {
                failure_field(html, "Location", location);
            }
            failure_field(html, "Error", &detail.error_message);
            failure_field(html, "Solution", &detail.solution);
            failure_field(html, "Reason", &detail.reason);
        }
        None => {
            html.push_str(&format!(
                "<div class=\"warning-message\">The translation for \"{}\" could not be completed. Status: {}</div>\n",
                escape(model.identifier()),
                model.outcome
            ));
        }
    }

    html.push_str("</div>\n");
}

fn failure_field(html: &mut String, label: &str, text: &str) {
    html.push_str(&format!(
        "<div class=\"failure-section\"><div class=\"failure-label\">{label}:</div><div class=\"failure-text\">{}</div></div>\n",
        escape(text)
    ));
}

fn render_diff(
    html: &mut String,
    source_text: &str,
    target_text: &str,
    source_label: &str,
    target_label: &str,
) {
    let diff = side_by_side(source_text, target_text);

    html.push_str("<div class=\"sql-container\">\n");
    for (label, lines) in [
        (source_label, &diff.source),
        (target_label, &diff.target),
    ] {
        html.push_str("<div class=\"sql-column\">\n");
        html.push_str(&format!("<h3>{} SQL</h3>\n", escape(&title_case(label))));
        for line in lines {
            let class = match line.kind {
                LineKind::Unchanged => "unchanged",
                LineKind::Removed => "removed",
                LineKind::Added => "added",
            };
            html.push_str(&format!(
                "<div class=\"line {class}\">{}</div>\n",
                escape(&line.text)
            ));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");
}

/// Escape text for inclusion in HTML. Covers the characters that can
/// open markup or break out of attribute values.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Sort key for natural ordering: the integer value of the first run
/// of ASCII digits (0 when there are none), then the identifier
/// itself. A run too long for u64 sorts after everything else.
fn natural_key(identifier: &str) -> (u64, &str) {
    let number = identifier
        .find(|c: char| c.is_ascii_digit())
        .map(|start| {
            let run = &identifier[start..];
            let end = run
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(run.len());
            run[..end].parse::<u64>().unwrap_or(u64::MAX)
        })
        .unwrap_or(0);
    (number, identifier)
}

/// Capitalize the first letter of each whitespace-separated word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

const STYLE: &str = r#"<style>
    .collapsible {
        background-color: #f1f1f1;
        color: #333;
        cursor: pointer;
        padding: 18px;
        width: 100%;
        border: 1px solid #ddd;
        text-align: left;
        outline: none;
        font-size: 16px;
        font-family: sans-serif;
        margin-top: 10px;
        transition: background-color 0.3s;
    }
    .collapsible:hover {
        background-color: #e0e0e0;
    }
    .collapsible.active {
        background-color: #d0d0d0;
    }
    .collapsible::before {
        content: '▶ ';
        display: inline-block;
        margin-right: 8px;
        transition: transform 0.3s;
    }
    .collapsible.active::before {
        transform: rotate(90deg);
    }
    .content {
        padding: 0 18px;
        max-height: 0;
        overflow: hidden;
        transition: max-height 0.3s ease-out;
        background-color: white;
    }
    .content.active {
        max-height: 10000px;
        padding: 18px;
    }
    .warning-box {
        background-color: #fff3cd;
        border: 1px solid #ffc107;
        border-left: 4px solid #ff9800;
        padding: 20px;
        margin: 10px 0;
        font-family: sans-serif;
    }
    .warning-title {
        color: #856404;
        font-weight: bold;
        font-size: 16px;
        margin-bottom: 15px;
    }
    .warning-message {
        color: #856404;
    }
    .failure-section {
        margin: 12px 0;
    }
    .failure-label {
        color: #856404;
        font-weight: bold;
        font-size: 13px;
        margin-bottom: 4px;
    }
    .failure-text {
        color: #856404;
        font-size: 13px;
        line-height: 1.5;
        white-space: pre-wrap;
    }
    .sql-container {
        display: flex;
        gap: 20px;
        font-family: monospace;
    }
    .sql-column {
        flex: 1;
        border: 1px solid #ddd;
        padding: 15px;
        background-color: #f5f5f5;
        overflow-x: auto;
    }
    .sql-column h3 {
        margin-top: 0;
        color: #333;
        font-family: sans-serif;
    }
    .line {
        font-size: 12px;
        line-height: 1.6;
        padding: 2px 4px;
        white-space: pre-wrap;
    }
    .unchanged {
        background-color: transparent;
    }
    .removed {
        background-color: #ffecec;
        color: #d73a49;
    }
    .added {
        background-color: #e6ffec;
        color: #22863a;
    }
</style>
"#;

const SCRIPT: &str = r#"<script>
    function toggleCollapse(element) {
        element.classList.toggle('active');
        const content = element.nextElementSibling;
        content.classList.toggle('active');
    }
</script>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_natural_key_orders_digit_runs() {
        let mut names = vec!["query_10.sql", "query_2.sql", "query_21.sql"];
        names.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        assert_eq!(names, vec!["query_2.sql", "query_10.sql", "query_21.sql"]);
    }

    #[test]
    fn test_natural_key_without_digits_sorts_first() {
        let mut names = vec!["query_1.sql", "zeta.sql", "alpha.sql"];
        names.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        assert_eq!(names, vec!["alpha.sql", "zeta.sql", "query_1.sql"]);
    }

    #[test]
    fn test_natural_key_ties_break_alphabetically() {
        let mut names = vec!["b_7", "a_7"];
        names.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        assert_eq!(names, vec!["a_7", "b_7"]);
    }

    #[test]
    fn test_escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"SELECT '<a>' & "b""#),
            "SELECT &#39;&lt;a&gt;&#39; &amp; &quot;b&quot;"
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("snowflake"), "Snowflake");
        assert_eq!(title_case("sql server"), "Sql Server");
        assert_eq!(title_case(""), "");
    }
}
