//! Compilation errors.
//!
//! ## Key Invariants
//!
//! 1. **Unit-fatal**: every variant aborts the compilation unit it occurs in. Nothing downstream
//!    substitutes defaults once one of these is raised.
//! 2. **Retry scope**: the constructor search may only swallow errors for which
//!    [`CompileError::is_resolution_failure`] holds. I/O, JSON and include-cycle errors always propagate.
//! 3. **Single wrap**: a node failure is wrapped in [`CompileError::Node`] exactly once, at the innermost
//!    node that failed.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unable to resolve type `{name}`")]
    UnresolvedType { name: String },

    #[error("`{member}` is declared in `{owner}` but is not public")]
    Access { member: String, owner: String },

    #[error("unknown property `{property}` for `{owner}`")]
    UnknownProperty { property: String, owner: String },

    #[error("property `{property}` of `{owner}` is read only: {reason}")]
    ReadOnlyProperty {
        property: String,
        owner: String,
        reason: String,
    },

    #[error("`{owner}` has no default property to receive its content")]
    NoDefaultProperty { owner: String },

    #[error("cannot create `{target}` from `{value}`")]
    UnparseableValue { value: String, target: String },

    #[error("unsupported binding expression: {0}")]
    UnsupportedExpression(String),

    #[error("no constructor of `{class}` could be built from the declared properties")]
    AmbiguousConstructor {
        class: String,
        #[source]
        last_failure: Option<Box<CompileError>>,
    },

    #[error("id `{id}` is already bound to `{existing}`")]
    DuplicateIdentifier { id: String, existing: String },

    #[error("no type known for id `{id}`")]
    UnknownIdentifier { id: String },

    #[error("no member `{member}` found on `{owner}`")]
    UnknownMember { member: String, owner: String },

    #[error("unknown event `{event}` for `{owner}`")]
    UnknownEvent { event: String, owner: String },

    #[error("cannot assign `{actual}` to `{expected}`")]
    TypeMismatch { expected: String, actual: String },

    #[error("multiple methods named `{name}` with {arity} parameters on `{owner}`")]
    AmbiguousMethod {
        owner: String,
        name: String,
        arity: usize,
    },

    #[error("name collision between imports `{first}` and `{second}`")]
    ImportCollision { first: String, second: String },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("include cycle through `{}`", path.display())]
    IncludeCycle { path: PathBuf },

    #[error("failed to compile node {markup}")]
    Node {
        markup: String,
        #[source]
        source: Box<CompileError>,
    },

    #[error("i/o error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json in `{}`", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CompileError {
    /// Innermost error, looking through node wrappers.
    pub fn root_cause(&self) -> &CompileError {
        match self {
            CompileError::Node { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether this failure came out of metadata or value resolution, i.e. the kind of failure a
    /// different constructor candidate could avoid.
    pub fn is_resolution_failure(&self) -> bool {
        !matches!(
            self.root_cause(),
            CompileError::IncludeCycle { .. } | CompileError::Io { .. } | CompileError::Json { .. }
        )
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CompileError::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unknown_member(member: impl Into<String>, owner: impl ToString) -> Self {
        CompileError::UnknownMember {
            member: member.into(),
            owner: owner.to_string(),
        }
    }

    pub(crate) fn unknown_property(property: impl Into<String>, owner: impl ToString) -> Self {
        CompileError::UnknownProperty {
            property: property.into(),
            owner: owner.to_string(),
        }
    }

    pub(crate) fn mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        CompileError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn unparseable(value: impl Into<String>, target: impl ToString) -> Self {
        CompileError::UnparseableValue {
            value: value.into(),
            target: target.to_string(),
        }
    }
}
