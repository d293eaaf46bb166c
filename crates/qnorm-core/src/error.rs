//! # Rewrite Errors
//!
//! Shape mismatches are never errors: a rule whose preconditions fail simply passes the node
//! through. The variants here are the fatal cases, where a capability query or an overload
//! lookup expected exactly one match and found zero or several. They propagate unchanged to
//! the pipeline caller.

use crate::expr::QueryOperator;
use crate::types::DataType;

/// Errors raised by capability queries, overload resolution and helper expansion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// A record declares more than one zero-argument constructor.
    #[error("construct_default({ty}): expected exactly one zero-argument constructor, found {found}")]
    AmbiguousDefaultConstructor { ty: DataType, found: usize },
    /// `construct_default` was called for a type that has no zero-argument constructor.
    #[error("construct_default({0}): type has no zero-argument constructor")]
    MissingDefaultConstructor(DataType),
    /// A wrapper family declares zero or several non-nullary constructors.
    #[error("construct_optional_wrapper({ty}): expected exactly one non-nullary constructor, found {found}")]
    AmbiguousWrapperConstructor { ty: DataType, found: usize },
    /// The wrapper's single non-nullary constructor cannot take the inner value alone.
    #[error("construct_optional_wrapper({ty}): constructor takes {arity} arguments, expected 1")]
    WrapperConstructorArity { ty: DataType, arity: usize },
    /// Wrapper construction was requested for a type that is not an optional-wrapper.
    #[error("construct_optional_wrapper({0}): not an optional-wrapper type")]
    NotOptionalWrapper(DataType),
    /// No overload of the operator takes the given number of arguments.
    #[error("no overload of {operator} takes {arity} arguments")]
    UnknownOverload { operator: QueryOperator, arity: usize },
    /// Helper expansion was given a call that is not a helper invocation.
    #[error("cannot expand {operator}: {reason}")]
    MalformedHelper {
        operator: QueryOperator,
        reason: String,
    },
}

pub type Result<T, E = RewriteError> = std::result::Result<T, E>;
