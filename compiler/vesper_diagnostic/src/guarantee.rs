//! Type-level proof that an error was reported.

/// Zero-sized witness that at least one error diagnostic was emitted.
///
/// Only [`DiagnosticBag::emit_error`](crate::DiagnosticBag::emit_error) and
/// [`DiagnosticBag::has_errors`](crate::DiagnosticBag::has_errors) mint
/// values of this type, so holding one proves the user has been told about
/// a failure. Phases that bail out early return
/// `Result<T, ErrorGuaranteed>` instead of silently producing garbage.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    /// Crate-private constructor; see the type docs.
    pub(crate) const fn new() -> Self {
        ErrorGuaranteed(())
    }
}
