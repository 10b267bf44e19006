use std::io::{self, IsTerminal, Write};

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::span::Span;

/// A problem found while reading a `.dsy` file.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, message.into(), span)
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, message.into(), span)
    }

    fn with_severity(severity: Severity, message: String, span: Span) -> Self {
        Self {
            severity,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render to stderr, colored when stderr is a terminal.
    pub fn render(&self, filename: &str, source: &str) {
        let stderr = io::stderr();
        let color = stderr.is_terminal();
        if let Err(e) = self.write_to(filename, source, stderr.lock(), color) {
            eprintln!("error: cannot render diagnostic: {}", e);
        }
    }

    pub fn write_to(
        &self,
        filename: &str,
        source: &str,
        out: impl Write,
        color: bool,
    ) -> io::Result<()> {
        let (kind, tint) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        // A span at end of file must still point into the source.
        let end = (self.span.end as usize).min(source.len());
        let start = (self.span.start as usize).min(end);

        let mut label = Label::new((filename, start..end)).with_message(&self.message);
        if color {
            label = label.with_color(tint);
        }
        let mut report = Report::build(kind, filename, start)
            .with_config(Config::default().with_color(color))
            .with_message(&self.message)
            .with_label(label);
        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }
        report.finish().write((filename, Source::from(source)), out)
    }
}

pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(d: &Diagnostic, source: &str) -> String {
        let mut out = Vec::new();
        d.write_to("test.dsy", source, &mut out, false)
            .expect("write to memory");
        String::from_utf8(out).expect("utf-8 report")
    }

    #[test]
    fn test_builders() {
        let d = Diagnostic::warning("binding 'x' is never used", Span::new(4, 5))
            .with_note("first")
            .with_help("remove it")
            .with_note("second");
        assert!(!d.is_error());
        assert_eq!(d.span.range(), 4..5);
        assert_eq!(d.notes, vec!["first", "second"]);
        assert_eq!(d.help.as_deref(), Some("remove it"));
        assert!(Diagnostic::error("boom", Span::default()).is_error());
    }

    #[test]
    fn test_report_mentions_message_file_and_help() {
        let source = "let a = add(1, b)\na\n";
        let d = Diagnostic::error("unknown name 'b'", Span::new(15, 16))
            .with_help("bind it with `let` first");
        let text = plain(&d, source);
        assert!(text.contains("unknown name 'b'"));
        assert!(text.contains("test.dsy"));
        assert!(text.contains("bind it with `let` first"));
        assert!(!text.contains('\u{1b}'), "no escape codes without color");
    }

    #[test]
    fn test_span_past_end_is_clamped() {
        let d = Diagnostic::error("missing root expression", Span::new(40, 41));
        assert!(plain(&d, "let a = 1\n").contains("missing root expression"));
    }
}
