// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use tracing::{Level, event};
use wiring_model::{SourceLocation, TypeRef};

use crate::{Error, ErrorKind};

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The build must fail.
    Error,

    /// Something was ignored; generation proceeds.
    Warning,

    /// Extra context for another diagnostic.
    Note,
}

impl Severity {
    /// Lowercase label used when rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
        }
    }
}

/// One message for the developer, anchored at a source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    location: SourceLocation,
    message: String,
    subject: Option<TypeRef>,
    kind: Option<ErrorKind>,
}

impl Diagnostic {
    /// A diagnostic without subject or error kind.
    #[must_use]
    pub fn new(severity: Severity, location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            severity,
            location,
            message: message.into(),
            subject: None,
            kind: None,
        }
    }

    /// Names the injection target or singleton holder the diagnostic belongs to.
    #[must_use]
    pub fn with_subject(mut self, subject: TypeRef) -> Self {
        self.subject = Some(subject);
        self
    }

    /// How serious the finding is.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Where the developer must look.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// The rendered message, without location or severity.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The injection target or singleton holder whose resolution raised this diagnostic.
    #[must_use]
    pub const fn subject(&self) -> Option<&TypeRef> {
        self.subject.as_ref()
    }

    /// The error classification, for diagnostics raised from an [`Error`].
    #[must_use]
    pub const fn kind(&self) -> Option<&ErrorKind> {
        self.kind.as_ref()
    }
}

impl From<Error> for Diagnostic {
    fn from(error: Error) -> Self {
        Self {
            severity: Severity::Error,
            message: error.to_string(),
            location: error.location().clone(),
            subject: None,
            kind: Some(error.kind().clone()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity.as_str(), self.message)
    }
}

/// Receives the diagnostics of a compilation.
pub trait DiagnosticSink {
    /// Takes one diagnostic; called in failure order, errors before warnings.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Keeps every reported diagnostic in memory, in report order.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether any error was reported, which means the build must fail.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Takes the reported diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Forwards every diagnostic to `tracing` as an event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let subject = diagnostic.subject.as_ref().map(ToString::to_string).unwrap_or_default();
        match diagnostic.severity {
            Severity::Error => event!(
                Level::ERROR,
                message = %diagnostic.message,
                location = %diagnostic.location,
                subject = %subject
            ),
            Severity::Warning => event!(
                Level::WARN,
                message = %diagnostic.message,
                location = %diagnostic.location,
                subject = %subject
            ),
            Severity::Note => event!(
                Level::INFO,
                message = %diagnostic.message,
                location = %diagnostic.location,
                subject = %subject
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use testing_aids::LogCapture;
    use wiring_model::BindingKey;

    use super::*;

    fn ambiguous() -> Error {
        Error::new(
            ErrorKind::AmbiguousBinding {
                key: BindingKey::unqualified("a.Api"),
                competitors: vec!["a.One".to_owned(), "a.Two".to_owned()],
            },
            SourceLocation::new("Main.java", 7, 3),
        )
    }

    #[test]
    fn from_error_keeps_kind_and_location() {
        let diagnostic = Diagnostic::from(ambiguous()).with_subject(TypeRef::new("a.Main"));

        assert_eq!(diagnostic.severity(), Severity::Error);
        assert_eq!(diagnostic.location(), &SourceLocation::new("Main.java", 7, 3));
        assert_eq!(diagnostic.subject(), Some(&TypeRef::new("a.Main")));
        assert!(matches!(diagnostic.kind(), Some(ErrorKind::AmbiguousBinding { .. })));
        assert_eq!(
            diagnostic.to_string(),
            "Main.java:7:3: error: ambiguous binding for `a.Api`: a.One, a.Two"
        );
    }

    #[test]
    fn collecting_sink_tracks_errors() {
        let mut sink = CollectingSink::new();
        sink.report(Diagnostic::new(Severity::Warning, SourceLocation::default(), "unused"));
        assert!(!sink.has_errors());

        sink.report(ambiguous().into());
        assert!(sink.has_errors());
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn sink_by_mutable_reference() {
        fn report_into(mut sink: impl DiagnosticSink) {
            sink.report(Diagnostic::new(Severity::Note, SourceLocation::default(), "note"));
        }

        let mut sink = CollectingSink::new();
        report_into(&mut sink);

        assert_eq!(sink.into_diagnostics().len(), 1);
    }

    #[test]
    fn tracing_sink_emits_events() {
        let capture = LogCapture::record(|| {
            TracingSink.report(Diagnostic::from(ambiguous()).with_subject(TypeRef::new("a.Main")));
        });

        capture.assert_contains("ambiguous binding for `a.Api`: a.One, a.Two");
        capture.assert_contains("ERROR");
        capture.assert_contains("subject=a.Main");
    }
}
