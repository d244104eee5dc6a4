//! Diagnostic system for the Vesper compiler's semantic layer.
//!
//! - Error codes for searchability
//! - Clear messages (what went wrong)
//! - Primary span (where it went wrong)
//! - Context labels (why it's wrong)
//!
//! # Error Guarantees
//!
//! The `ErrorGuaranteed` type provides type-level proof that at least one
//! error was emitted. This prevents "forgotten" error conditions where code
//! fails silently without reporting an error.
//!
//! ```text
//! // Can only get ErrorGuaranteed by emitting an error
//! let guarantee = bag.emit_error(diagnostic);
//!
//! // Functions can return ErrorGuaranteed to prove they reported errors
//! fn lower_clause() -> Result<NodeId, ErrorGuaranteed> { ... }
//! ```
//!
//! Diagnostics accumulate in a [`DiagnosticBag`] keyed by source span and
//! are never thrown; one malformed construct cannot abort its siblings.

mod bag;
mod diagnostic;
mod error_code;
mod guarantee;

pub use bag::DiagnosticBag;
pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
