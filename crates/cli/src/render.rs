//! Pretty diagnostic rendering using ariadne.
//!
//! Diagnostics carry spans in token indices. For display, the tokens are
//! joined into a single command line and each span is mapped onto the byte
//! range of the tokens it covers. Falls back to structured JSON when the
//! output is piped or when the user explicitly requests it.

use std::io::{self, IsTerminal};
use std::ops::Range;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use posarg_diagnostics::{Diagnostic, Severity, Span};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for diagnostic rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or detect from whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: &Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warn => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Blue,
        _ => Color::White,
    }
}

// ── Command line reconstruction ─────────────────────────────────────────

/// The tokens joined by single spaces, plus the byte range of each token.
///
/// A trailing space is kept so a span pointing past the last token still
/// has something to underline.
pub(crate) struct CommandLine {
    text: String,
    offsets: Vec<Range<usize>>,
}

impl CommandLine {
    pub(crate) fn new(tokens: &[String]) -> Self {
        let mut text = String::new();
        let mut offsets = Vec::with_capacity(tokens.len());
        for token in tokens {
            let start = text.len();
            text.push_str(token);
            offsets.push(start..text.len());
            text.push(' ');
        }
        if text.is_empty() {
            text.push(' ');
        }
        Self { text, offsets }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// Byte range covered by a token span.
    ///
    /// An empty span marks the token at its position, or the end of the
    /// line when it points past the last token.
    pub(crate) fn byte_range(&self, span: Span) -> Range<usize> {
        let end_of_line = self.text.len() - 1..self.text.len();
        if span.is_empty() {
            return self.offsets.get(span.start).cloned().unwrap_or(end_of_line);
        }
        match (self.offsets.get(span.start), self.offsets.get(span.end - 1)) {
            (Some(first), Some(last)) => first.start..last.end,
            (Some(first), None) => first.start..self.text.len(),
            _ => end_of_line,
        }
    }
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render a slice of diagnostics in pretty (ariadne) format to stderr.
///
/// Diagnostics with a [`Span`] are rendered against the reconstructed
/// command line. Those without a span are rendered as standalone messages.
pub(crate) fn render_diagnostics_pretty(line: &CommandLine, name: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default()
        .with_compact(false)
        .with_index_type(IndexType::Byte);
    let mut cache = (name, Source::from(line.text()));

    for diag in diagnostics {
        if let Some(span) = diag.span {
            let range = line.byte_range(span);

            let mut builder = Report::build(report_kind(&diag.severity), (name, range.clone()))
                .with_code(diag.id.as_ref())
                .with_message(&diag.message)
                .with_config(config);

            builder = builder.with_label(
                Label::new((name, range))
                    .with_message(make_label_message(diag))
                    .with_color(severity_color(&diag.severity)),
            );

            if let Some(explanation) = diag.explain() {
                builder = builder.with_help(explanation);
            }

            builder.finish().eprint(&mut cache).ok();
        } else {
            let kind_str = match diag.severity {
                Severity::Error => "error",
                Severity::Warn => "warning",
                Severity::Info => "info",
                _ => "diagnostic",
            };
            eprintln!("{kind_str}[{}]: {}", diag.id, diag.message);

            if let Some(ctx) = &diag.context {
                let note: String = ctx
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                eprintln!("  = note: {note}");
            }

            if let Some(explanation) = diag.explain() {
                eprintln!("  = help: {explanation}");
            }
        }
    }
}

/// Build a concise label message from diagnostic context, avoiding
/// duplication with the report header message.
fn make_label_message(diag: &Diagnostic) -> String {
    if let Some(ctx) = &diag.context
        && !ctx.is_empty()
    {
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        diag.message.clone()
    }
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured summary line showing error/warning/info counts.
///
/// Example: `2 errors, 1 warning`
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    use ariadne::Fmt;

    let (mut errors, mut warnings, mut infos) = (0usize, 0usize, 0usize);
    for d in diagnostics {
        match d.severity {
            Severity::Error => errors += 1,
            Severity::Warn => warnings += 1,
            Severity::Info => infos += 1,
            _ => warnings += 1,
        }
    }

    if errors + warnings + infos == 0 {
        return;
    }

    let mut parts = Vec::new();
    if errors > 0 {
        let s = if errors == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{errors} error{s}").fg(Color::Red)));
    }
    if warnings > 0 {
        let s = if warnings == 1 { "" } else { "s" };
        parts.push(format!(
            "{}",
            format!("{warnings} warning{s}").fg(Color::Yellow)
        ));
    }
    if infos > 0 {
        parts.push(format!("{}", format!("{infos} info").fg(Color::Blue)));
    }
    eprintln!("{}", parts.join(", "));
}
