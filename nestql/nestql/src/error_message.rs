use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use serde::Serialize;

use nestql_parser::{Error, Span};

/// A failed compile, ready for presentation. The pipeline stops at the
/// first failure, so one [Error] becomes exactly one message.
#[derive(Clone, Serialize)]
pub struct ErrorMessage {
    /// Stable machine readable identifier, eg "E0005".
    pub code: String,
    /// What went wrong, in plain text.
    pub reason: String,
    /// Suggested fixes.
    pub hints: Vec<String>,
    /// Character offsets of the failure within the query text.
    pub span: Option<Span>,
    /// The query text annotated with the failure; built by
    /// [ErrorMessage::composed].
    pub display: Option<String>,
    /// Line and column of the failure within the query text.
    pub location: Option<SourceLocation>,
}

/// 0-based (line, column) endpoints of a span within the query text.
#[derive(Debug, Clone, Serialize)]
pub struct SourceLocation {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

impl From<Error> for ErrorMessage {
    fn from(e: Error) -> Self {
        log::debug!("{e:?}");
        ErrorMessage {
            code: e.code().to_string(),
            reason: e.reason.to_string(),
            hints: e.hints,
            span: e.span,
            display: None,
            location: None,
        }
    }
}

impl ErrorMessage {
    /// Resolves the message against the query text it came from: the line
    /// and column of its span, plus the annotated display.
    pub fn composed(mut self, source: &str) -> Self {
        let Some(mut span) = self.span else {
            return self;
        };
        let chars = source.chars().count();
        if chars == 0 {
            return self;
        }
        // clamp so spans pointing at the end of input still annotate
        span.start = span.start.min(chars - 1);
        span.end = span.end.clamp(span.start + 1, chars);

        self.location = locate(&Source::from(source), span);
        self.display = self.annotate(source, span);
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Renders the query text with the failure underlined. There is only
    /// ever one source here, so everything reports under the fixed id
    /// `query`.
    fn annotate(&self, source: &str, span: Span) -> Option<String> {
        let range = Range::from(span);
        let mut report = Report::build(ReportKind::Error, "query", range.start)
            // color is always on; `compile` strips it for plain output
            .with_config(Config::default().with_color(true))
            .with_code(&self.code)
            .with_label(Label::new(("query", range)).with_message(&self.reason));

        // ariadne offers one help slot and one note slot; any hints beyond
        // those two only appear in the fallback rendering
        let mut hints = self.hints.iter();
        if let Some(help) = hints.next() {
            report.set_help(help);
        }
        if let Some(note) = hints.next() {
            report.set_note(note);
        }

        let mut out = Vec::new();
        report
            .finish()
            .write(("query", Source::from(source)), &mut out)
            .ok()?;
        String::from_utf8(out).ok()
    }
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.display {
            // ariadne pads line ends; trim them so the output is stable
            Some(display) => {
                let mut lines = display.split('\n');
                if let Some(first) = lines.next() {
                    f.write_str(first.trim_end())?;
                }
                for line in lines {
                    f.write_str("\n")?;
                    f.write_str(line.trim_end())?;
                }
                Ok(())
            }
            None => {
                writeln!(f, "[{}] Error: {}", self.code, self.reason)?;
                for hint in &self.hints {
                    writeln!(f, "Hint: {hint}")?;
                }
                Ok(())
            }
        }
    }
}

// doctest mains and `unwrap` report through Debug; show the same annotated
// text there
impl Debug for ErrorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl StdError for ErrorMessage {}

fn locate<I: AsRef<str>>(source: &Source<I>, span: Span) -> Option<SourceLocation> {
    let start = source.get_offset_line(span.start)?;
    let end = source.get_offset_line(span.end.saturating_sub(1))?;
    Some(SourceLocation {
        start: (start.1, start.2),
        end: (end.1, end.2),
    })
}
