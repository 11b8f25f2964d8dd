//! Reports produced by the `grove` binary.

use std::path::{Path, PathBuf};

use grove_ast::{dump, BuildResult, ConvertError, ConvertOptions, DumpFormat};
use grove_core::{PositionError, PositionIndex, TextSize};
use grove_types::{Diagnostic, Severity};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedDiagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    /// 1-based position of the span start, when there is a span.
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    /// Nodes flagged as recovered from syntax errors.
    pub recovered: usize,
    /// Assignments and declarations that lost a synthetic value.
    pub collapsed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub file: PathBuf,
    pub diagnostics: Vec<ReportedDiagnostic>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump: Option<String>,
}

impl ParseReport {
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }
}

/// Convert `text` and describe the outcome.
pub fn parse_source(
    file: &Path,
    text: &str,
    options: &ConvertOptions,
    dump_format: Option<DumpFormat>,
) -> Result<ParseReport, ConvertError> {
    let result = grove_ast::build_module(text, options)?;
    tracing::debug!(
        target: "grove.cli",
        file = %file.display(),
        diagnostics = result.diagnostics.len(),
        recovered = result.recovery.recovered.len(),
        "parsed file"
    );
    let index = PositionIndex::new(text);
    report(file, &index, &result, dump_format).map_err(ConvertError::from)
}

fn report(
    file: &Path,
    index: &PositionIndex,
    result: &BuildResult,
    dump_format: Option<DumpFormat>,
) -> Result<ParseReport, PositionError> {
    let diagnostics = result
        .diagnostics
        .iter()
        .map(|d| reported(index, d))
        .collect::<Result<Vec<_>, _>>()?;
    let count = |severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    let summary = Summary {
        errors: count(Severity::Error),
        warnings: count(Severity::Warning),
        recovered: result.recovery.recovered.len(),
        collapsed: result.recovery.collapsed,
    };
    Ok(ParseReport {
        file: file.to_path_buf(),
        summary,
        diagnostics,
        dump: dump_format.map(|format| dump(&result.module, format)),
    })
}

fn reported(index: &PositionIndex, diagnostic: &Diagnostic) -> Result<ReportedDiagnostic, PositionError> {
    let start = match diagnostic.span {
        Some(span) => Some(index.row_col(TextSize::from(span.start as u32))?),
        None => None,
    };
    Ok(ReportedDiagnostic {
        severity: diagnostic.severity,
        code: diagnostic.code,
        message: diagnostic.message.clone(),
        line: start.map(|pos| pos.line),
        column: start.map(|pos| pos.col),
        start: diagnostic.span.map(|span| span.start),
        end: diagnostic.span.map(|span| span.end),
    })
}

/// `file:line:col: error[code] message` lines, then the summary.
pub fn render_human(report: &ParseReport) -> String {
    let mut out = String::new();
    for d in &report.diagnostics {
        let severity = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        match (d.line, d.column) {
            (Some(line), Some(column)) => out.push_str(&format!(
                "{}:{line}:{column}: {severity}[{}] {}\n",
                report.file.display(),
                d.code,
                d.message
            )),
            _ => out.push_str(&format!(
                "{}: {severity}[{}] {}\n",
                report.file.display(),
                d.code,
                d.message
            )),
        }
    }
    out.push_str(&format!(
        "summary: {} errors, {} warnings, {} recovered nodes\n",
        report.summary.errors, report.summary.warnings, report.summary.recovered
    ));
    if let Some(dump) = &report.dump {
        out.push('\n');
        out.push_str(dump);
        if !dump.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_positions_of_syntax_errors() {
        let report = parse_source(
            Path::new("Main.groovy"),
            "def a = 1\nx =\n",
            &ConvertOptions::default(),
            None,
        )
        .unwrap();
        assert!(report.has_errors());
        assert_eq!(report.summary.collapsed, 1);
        let first = &report.diagnostics[0];
        assert_eq!(first.code, grove_ast::SYNTAX_ERROR);
        assert_eq!(first.line, Some(2));

        let human = render_human(&report);
        assert!(human.starts_with("Main.groovy:2:"), "{human}");
        assert!(human.contains("error[syntax-error]"), "{human}");
    }

    #[test]
    fn clean_files_summarize_to_zero() {
        let report = parse_source(
            Path::new("ok.groovy"),
            "class A {\n  int x = 1\n}\n",
            &ConvertOptions::default(),
            Some(DumpFormat::Tree),
        )
        .unwrap();
        assert_eq!(report.summary, Summary::default());
        assert_eq!(
            render_human(&report).lines().next(),
            Some("summary: 0 errors, 0 warnings, 0 recovered nodes")
        );
        assert!(report.dump.as_deref().unwrap().starts_with("Type A ["));
    }
}
