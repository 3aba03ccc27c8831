//! The error taxonomy shared by every crate in the workspace (spec §7).
//!
//! `SolverStatus` (see `pslp-lp`) is deliberately *not* part of this taxonomy:
//! the ILP layer never turns a solver status into an error, it returns it as
//! a value.

use context_error::ErrorKind;

/// The kinds of failure the core can report, matching spec §7's taxonomy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum PslpErrorKind {
    /// Empty or malformed numeric input (median, quantile, rank).
    #[default]
    InvalidRange,
    /// Accessing a column/row beyond an LP model.
    IndexOutOfRange,
    /// A parameter outside its accepted domain (negative tolerance, `q ∉ (0,100]`, …).
    InvalidValue,
    /// Input text does not match the required grammar.
    ParseError,
    /// An ILP was built with zero variables or zero rows.
    EmptyModel,
    /// An external file/format operation failed.
    Io,
}

impl ErrorKind for PslpErrorKind {
    type Settings = ();

    fn descriptor(&self) -> &'static str {
        match self {
            Self::InvalidRange => "invalid range",
            Self::IndexOutOfRange => "index out of range",
            Self::InvalidValue => "invalid value",
            Self::ParseError => "parse error",
            Self::EmptyModel => "empty model",
            Self::Io => "io error",
        }
    }

    fn ignored(&self, (): Self::Settings) -> bool {
        false
    }

    fn is_error(&self, (): Self::Settings) -> bool {
        true
    }
}

/// The error type returned throughout the workspace: a boxed, context-carrying
/// error keyed by [`PslpErrorKind`].
pub type Error = context_error::BoxedError<'static, PslpErrorKind>;

/// Shorthand for a `Result` using the workspace's [`Error`] type.
pub type PslpResult<T> = Result<T, Error>;

/// Build an [`Error`] with no extra context, the common case for the numeric
/// kernels in [`crate::numeric`].
pub fn simple(kind: PslpErrorKind, message: &'static str) -> Error {
    context_error::BoxedError::small(kind, message, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_are_distinct() {
        let kinds = [
            PslpErrorKind::InvalidRange,
            PslpErrorKind::IndexOutOfRange,
            PslpErrorKind::InvalidValue,
            PslpErrorKind::ParseError,
            PslpErrorKind::EmptyModel,
            PslpErrorKind::Io,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.descriptor(), b.descriptor());
            }
        }
    }
}
