//! The translator's error hierarchy (spec §7).
//!
//! Bundle-resolution misses are deliberately *not* part of this hierarchy:
//! they are collected into a `Vec<String>` and handed back alongside
//! whatever did resolve (see [`crate::bundle::extract_bundle`]); the caller
//! decides whether an incomplete bundle is fatal.

use thiserror::Error;

/// A source construct the translator has no lowering for. These always
/// abort the run (exit code 2 at the CLI boundary).
#[derive(Debug, Error)]
pub enum UnsupportedFeature {
    /// `super` used as a bare identifier rather than `super.f(...)`.
    #[error("`super` cannot be used as a value")]
    BareSuper,
    /// Inline assembly block.
    #[error("inline assembly is not supported")]
    InlineAssembly,
    /// `throw` or `emit`, neither of which the model checker's runtime
    /// library can represent.
    #[error("`{0}` statements are not supported")]
    Statement(&'static str),
    /// A function declares more than one return value.
    #[error("function `{0}` declares multiple return values, which is not supported")]
    MultipleReturns(String),
    /// Any other construct named at the point of failure.
    #[error("unsupported language feature: {0}")]
    Other(String),
}

/// An internal consistency failure: either the frontend produced an AST
/// this translator does not expect, or an analysis pass has a bug. These
/// abort with a distinct diagnostic class (exit code 3 at the CLI
/// boundary) because they are not actionable by changing the input.
#[derive(Debug, Error)]
pub enum InvariantViolation {
    /// A single state-variable field was constructed with more than one
    /// distinct concrete contract type across the linearization (spec
    /// §4.2, §9 open question 2).
    #[error("field `{field}` of `{contract}` is specialised to more than one concrete type")]
    AmbiguousSpecialisation { contract: String, field: String },
    /// [`crate::strings::StringLookup`] looked up a non-string literal.
    #[error("attempted to intern a non-string literal")]
    NonStringLookup,
    /// [`crate::strings::StringLookup`]'s index counter overflowed.
    #[error("string lookup table exhausted")]
    LookupExhausted,
    /// Two [`crate::tight_bundle::BundleContract`] nodes were assigned the
    /// same address; the shared counter in [`crate::tight_bundle`] has a
    /// bug if this is ever observed.
    #[error("duplicate tight-bundle address {0}")]
    DuplicateAddress(u64),
    /// The call graph worklist revisited a node it should have already
    /// closed over; the frontend should reject recursive allocation, so
    /// this indicates a translator bug rather than bad input.
    #[error("call graph cycle detected at `{0}`")]
    CallGraphCycle(String),
    /// Anything else: naming the invariant that broke.
    #[error("internal invariant violated: {0}")]
    Other(String),
}

/// The union of hard translation errors. Bundle misses are not part of
/// this type; see the module docs.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeature),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl TranslateError {
    /// The process exit code this error maps to at the CLI boundary
    /// (spec §6 "Exit codes").
    pub fn exit_code(&self) -> i32 {
        match self {
            TranslateError::Unsupported(_) => 2,
            TranslateError::Invariant(_) => 3,
        }
    }
}
