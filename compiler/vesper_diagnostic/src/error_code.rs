//! Error codes for semantic-layer diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E3001`) with the first
//! digit indicating the compiler phase. This crate ships the pattern-match
//! phase; other phases reserve their own ranges:
//! - E0xxx: Lexer errors
//! - E1xxx: Parser errors
//! - E2xxx: Type errors
//! - E3xxx: Pattern errors
//! - E9xxx: Internal compiler errors

use std::fmt;

/// Error codes for pattern-match diagnostics (E3xxx range).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Duplicate pattern-variable declaration in overlapping scope
    E3001,
    /// Pattern variable possibly unassigned at a use point
    E3002,
    /// Unreachable clause/arm (an earlier clause always matches first)
    E3003,
    /// Pattern always matches (informational)
    E3004,
    /// Pattern never matches
    E3005,
    /// Deconstruction arity mismatch
    E3006,
    /// Relational pattern applied to a non-comparable type
    E3007,
    /// Malformed pattern from an earlier phase
    E3008,
}

impl ErrorCode {
    /// All error code variants, for exhaustive testing.
    ///
    /// Kept in sync with `as_str()` which is exhaustive (Rust match
    /// enforces it). When adding a new variant: add it to the enum,
    /// `as_str()`, `description()`, and here.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E3004,
        ErrorCode::E3005,
        ErrorCode::E3006,
        ErrorCode::E3007,
        ErrorCode::E3008,
    ];

    /// The code as it appears in output, e.g. `"E3001"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E3005 => "E3005",
            ErrorCode::E3006 => "E3006",
            ErrorCode::E3007 => "E3007",
            ErrorCode::E3008 => "E3008",
        }
    }

    /// One-line description for `--explain` lookups.
    pub const fn description(self) -> &'static str {
        match self {
            ErrorCode::E3001 => "a pattern variable is declared twice in overlapping scope",
            ErrorCode::E3002 => "a pattern variable may be unassigned where it is used",
            ErrorCode::E3003 => "this clause can never be selected",
            ErrorCode::E3004 => "this pattern matches every value of the input type",
            ErrorCode::E3005 => "this pattern matches no value of the input type",
            ErrorCode::E3006 => {
                "the positional pattern count does not match the deconstructor's arity"
            }
            ErrorCode::E3007 => "relational patterns require a numeric or char operand",
            ErrorCode::E3008 => "this pattern was malformed in an earlier phase",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
