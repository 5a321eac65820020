//! Error types for signature construction, revision, and call binding.
//!
//! Build-time failures are `SignatureError`: nothing partially constructed is
//! ever exposed. Call-time failures are `CallError`: binding and validation
//! fail before the target routine runs, so its side effects never begin.

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::BoxError;
use crate::param::ParameterKind;

/// Errors raised while constructing or revising a [`Signature`], or while
/// pairing one with a target routine.
///
/// [`Signature`]: crate::signature::Signature
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Kind ordering violated: a parameter follows one of a later kind.
    #[error("parameter '{name}' of kind {kind} follows '{previous}' of kind {previous_kind}")]
    KindOrder {
        name: SmolStr,
        kind: ParameterKind,
        previous: SmolStr,
        previous_kind: ParameterKind,
    },

    /// Two parameters share a public name.
    #[error("duplicate parameter name '{0}'")]
    DuplicateName(SmolStr),

    /// Two parameters share an interface name.
    #[error("duplicate interface name '{0}'")]
    DuplicateInterfaceName(SmolStr),

    /// More than one var-positional parameter.
    #[error("received multiple var-positional parameters ('{0}')")]
    MultipleVarPositional(SmolStr),

    /// More than one var-keyword parameter.
    #[error("received multiple var-keyword parameters ('{0}')")]
    MultipleVarKeyword(SmolStr),

    /// A required positional parameter follows one carrying a default.
    #[error("non-default parameter '{0}' follows a default parameter")]
    NonDefaultAfterDefault(SmolStr),

    /// A context parameter appears anywhere but first.
    #[error("context parameter '{0}' must be the first parameter")]
    ContextNotFirst(SmolStr),

    /// A context parameter of the wrong kind.
    #[error("context parameter '{0}' must be positional-or-keyword")]
    ContextKind(SmolStr),

    /// A context parameter carrying a default or factory.
    #[error("context parameter '{0}' cannot have a default or factory")]
    ContextDefault(SmolStr),

    /// Both a default value and a factory supplied.
    #[error("parameter '{0}' declares both a default and a factory")]
    DefaultFactoryConflict(SmolStr),

    /// A bound parameter must be able to supply its own value.
    #[error("bound parameter '{0}' requires a default or factory")]
    BoundWithoutDefault(SmolStr),

    /// Variadic collectors carry no default or factory.
    #[error("variadic parameter '{0}' cannot have a default or factory")]
    VariadicDefault(SmolStr),

    /// Variadic collectors map 1:1, so they cannot be renamed.
    #[error("variadic parameter '{0}' cannot have a distinct interface name")]
    VariadicRename(SmolStr),

    /// A revision selector matched nothing.
    #[error("selector matched no parameter")]
    SelectorNotFound,

    /// An insert/translocate anchor matched nothing.
    #[error("anchor selector matched no parameter")]
    AnchorNotFound,

    /// An insert/translocate index lies outside the parameter list.
    #[error("index {index} out of bounds for {len} parameters")]
    IndexOutOfBounds { index: usize, len: usize },

    /// `modify` matched several parameters without `multiple` set.
    #[error("selector matched {0} parameters; pass multiple=true to modify all")]
    AmbiguousModify(usize),

    /// `delete` may only remove parameters the target can live without.
    #[error("cannot delete required parameter '{0}' (no default or factory)")]
    UndeletableParameter(SmolStr),

    /// A user `manage` function failed.
    #[error("manage revision failed: {0}")]
    Manage(String),

    /// A non-default target parameter that no public parameter maps to.
    #[error("missing mapping to non-default {kind} parameter '{name}'")]
    UnmappedTargetParameter { name: SmolStr, kind: ParameterKind },

    /// Public parameters with no home in the target interface.
    #[error("missing mapping from parameters ({0}) and target accepts no var-keyword")]
    UnmappedParameters(String),

    /// A public var-positional with no target collector to feed.
    #[error("var-positional parameter '{0}' has no var-positional counterpart in the target")]
    NoVarPositionalTarget(SmolStr),

    /// A public var-keyword with no target collector to feed.
    #[error("var-keyword parameter '{0}' has no var-keyword counterpart in the target")]
    NoVarKeywordTarget(SmolStr),
}

/// Argument-binding failures, raised before the target is ever invoked.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("too many positional arguments")]
    TooManyPositional,

    #[error("unexpected named argument: {0}")]
    UnexpectedNamed(SmolStr),

    #[error("missing required argument: {0}")]
    MissingRequired(SmolStr),

    #[error("multiple values for argument: {0}")]
    MultipleValues(SmolStr),
}

/// Any call-time failure: binding, a user callback, or the target itself.
///
/// Converter, validator, and target errors pass through transparently so the
/// caller observes the original error, not a wrapper.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Conversion(BoxError),

    #[error(transparent)]
    Validation(BoxError),

    #[error(transparent)]
    Target(BoxError),
}

impl CallError {
    pub fn is_binding(&self) -> bool {
        matches!(self, CallError::Binding(_))
    }
}
