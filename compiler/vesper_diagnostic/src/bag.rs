//! Span-keyed diagnostic collection.
//!
//! Diagnostics are pushed as they are discovered, in whatever order the
//! lowering visits clauses; `flush` returns them sorted by primary span so
//! output is stable regardless of traversal order.

use crate::{Diagnostic, ErrorGuaranteed, Severity};

/// Collects diagnostics for one compilation; never throws.
///
/// ```
/// use vesper_diagnostic::{Diagnostic, DiagnosticBag, ErrorCode};
/// use vesper_ir::Span;
///
/// let mut bag = DiagnosticBag::new();
/// bag.push(Diagnostic::warning(ErrorCode::E3003).with_label(Span::new(4, 9), "unreachable"));
/// let guarantee = bag.emit_error(
///     Diagnostic::error(ErrorCode::E3006).with_label(Span::new(1, 2), "expected 2 elements"),
/// );
/// assert_eq!(bag.error_count(), 1);
/// assert_eq!(bag.has_errors(), Some(guarantee));
/// let sorted = bag.flush();
/// assert_eq!(sorted[0].code, ErrorCode::E3006); // earlier span first
/// ```
#[derive(Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        DiagnosticBag::default()
    }

    /// Add a diagnostic of any severity.
    pub fn push(&mut self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
    }

    /// Add an error diagnostic, receiving proof it was recorded.
    ///
    /// The diagnostic's severity is forced to `Error`.
    pub fn emit_error(&mut self, mut diag: Diagnostic) -> ErrorGuaranteed {
        diag.severity = Severity::Error;
        self.error_count += 1;
        self.diagnostics.push(diag);
        ErrorGuaranteed::new()
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Proof token if any error has been recorded.
    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        (self.error_count > 0).then(ErrorGuaranteed::new)
    }

    /// Total number of diagnostics of all severities.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterate without draining, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Drain all diagnostics sorted by (primary span, code).
    ///
    /// Skips sorting if already in order, which is the common case when
    /// clauses are visited top to bottom.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        let sort_key = |d: &Diagnostic| {
            let span = d.primary_span();
            (span.start, span.end, d.code.as_str())
        };
        let already_sorted = self
            .diagnostics
            .windows(2)
            .all(|w| sort_key(&w[0]) <= sort_key(&w[1]));
        if !already_sorted {
            self.diagnostics.sort_by_key(sort_key);
        }
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use vesper_ir::Span;

    fn warning_at(start: u32) -> Diagnostic {
        Diagnostic::warning(ErrorCode::E3003)
            .with_message("unreachable")
            .with_label(Span::new(start, start + 1), "here")
    }

    #[test]
    fn flush_sorts_by_span() {
        let mut bag = DiagnosticBag::new();
        bag.push(warning_at(30));
        bag.push(warning_at(10));
        bag.push(warning_at(20));
        let sorted = bag.flush();
        let starts: Vec<u32> = sorted.iter().map(|d| d.primary_span().start).collect();
        assert_eq!(starts, vec![10, 20, 30]);
        assert!(bag.is_empty());
    }

    #[test]
    fn error_counting_and_guarantee() {
        let mut bag = DiagnosticBag::new();
        assert!(bag.has_errors().is_none());
        bag.push(warning_at(0));
        assert!(bag.has_errors().is_none());
        let _guarantee: ErrorGuaranteed =
            bag.emit_error(Diagnostic::error(ErrorCode::E3006).with_message("arity"));
        assert_eq!(bag.error_count(), 1);
        assert!(bag.has_errors().is_some());
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn emit_error_forces_severity() {
        let mut bag = DiagnosticBag::new();
        // A diagnostic built as a warning but emitted as an error counts.
        bag.emit_error(Diagnostic::warning(ErrorCode::E3007).with_message("not comparable"));
        assert_eq!(bag.error_count(), 1);
        let flushed = bag.flush();
        assert!(flushed[0].severity.is_error());
    }

    #[test]
    fn stable_order_for_equal_spans() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::warning(ErrorCode::E3004).with_label(Span::new(5, 6), "a"));
        bag.push(Diagnostic::warning(ErrorCode::E3003).with_label(Span::new(5, 6), "b"));
        let sorted = bag.flush();
        // Same span: code breaks the tie.
        assert_eq!(sorted[0].code, ErrorCode::E3003);
        assert_eq!(sorted[1].code, ErrorCode::E3004);
    }
}
