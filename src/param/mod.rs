//! Parameter descriptors: one immutable slot of a call interface.
//!
//! A [`Parameter`] couples a public name with the interface name forwarded to
//! the target, a kind that fixes its place in the calling convention, an
//! optional default or factory, converter/validator pipelines, and opaque
//! metadata. Parameters are persistent values: every `with_*` method returns
//! a new parameter, leaving the original untouched.

mod update;

pub use update::ParamUpdate;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{Converter, Factory, Validator, Value};

/// Global creation counter; gives every parameter a stable ordering key used
/// by the `synthesize` revision when parameters arrive as named entries.
static CREATION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_creation_order() -> u64 {
    CREATION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The calling-convention role of a parameter.
///
/// The derived `Ord` is the canonical signature order: a valid signature's
/// kinds are non-decreasing in this sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterKind {
    /// Suppliable only by position.
    PositionalOnly,
    /// Suppliable by position or by name.
    PositionalOrKeyword,
    /// Collector for excess positional values.
    VarPositional,
    /// Suppliable only by name.
    KeywordOnly,
    /// Collector for excess named values.
    VarKeyword,
}

impl ParameterKind {
    /// True for the two collector kinds.
    pub fn is_variadic(self) -> bool {
        matches!(self, ParameterKind::VarPositional | ParameterKind::VarKeyword)
    }

    /// True for kinds that consume from the positional argument sequence.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword
        )
    }

    /// True for kinds addressable by public name in a call.
    pub fn is_named(self) -> bool {
        matches!(
            self,
            ParameterKind::PositionalOrKeyword | ParameterKind::KeywordOnly
        )
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterKind::PositionalOnly => "positional-only",
            ParameterKind::PositionalOrKeyword => "positional-or-keyword",
            ParameterKind::VarPositional => "var-positional",
            ParameterKind::KeywordOnly => "keyword-only",
            ParameterKind::VarKeyword => "var-keyword",
        };
        f.write_str(s)
    }
}

/// An immutable descriptor of one call-interface slot.
#[derive(Debug, Clone)]
pub struct Parameter {
    kind: ParameterKind,
    name: SmolStr,
    interface_name: SmolStr,
    default: Option<Value>,
    factory: Option<Factory>,
    annotation: Option<SmolStr>,
    converters: Vec<Converter>,
    validators: Vec<Validator>,
    bound: bool,
    context: bool,
    metadata: Arc<IndexMap<SmolStr, Value>>,
    creation_order: u64,
}

/// Positional-only parameter.
pub fn pos(name: impl Into<SmolStr>) -> Parameter {
    Parameter::new(ParameterKind::PositionalOnly, name)
}

/// Positional-or-keyword parameter.
pub fn arg(name: impl Into<SmolStr>) -> Parameter {
    Parameter::new(ParameterKind::PositionalOrKeyword, name)
}

/// Keyword-only parameter.
pub fn kwarg(name: impl Into<SmolStr>) -> Parameter {
    Parameter::new(ParameterKind::KeywordOnly, name)
}

/// Context parameter: first in the signature, its value is passed to every
/// converter and validator on other parameters.
pub fn ctx(name: impl Into<SmolStr>) -> Parameter {
    let mut param = Parameter::new(ParameterKind::PositionalOrKeyword, name);
    param.context = true;
    param
}

/// Var-positional collector.
pub fn vpo(name: impl Into<SmolStr>) -> Parameter {
    Parameter::new(ParameterKind::VarPositional, name)
}

/// Var-keyword collector.
pub fn vkw(name: impl Into<SmolStr>) -> Parameter {
    Parameter::new(ParameterKind::VarKeyword, name)
}

impl Parameter {
    pub fn new(kind: ParameterKind, name: impl Into<SmolStr>) -> Self {
        let name = name.into();
        Self {
            kind,
            interface_name: name.clone(),
            name,
            default: None,
            factory: None,
            annotation: None,
            converters: Vec::new(),
            validators: Vec::new(),
            bound: false,
            context: false,
            metadata: Arc::new(IndexMap::new()),
            creation_order: next_creation_order(),
        }
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn is_context(&self) -> bool {
        self.context
    }

    pub fn metadata(&self) -> &IndexMap<SmolStr, Value> {
        &self.metadata
    }

    /// True when a value can be produced without caller input.
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.factory.is_some()
    }

    pub(crate) fn creation_order(&self) -> u64 {
        self.creation_order
    }

    /// Produce the default value: the stored default, or a fresh factory
    /// product. `None` when the parameter has neither.
    pub(crate) fn produce_default(&self) -> Option<Value> {
        match (&self.default, &self.factory) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(factory)) => Some(factory.produce()),
            (None, None) => None,
        }
    }

    // ------------------------------------------------------------------
    // Persistent-record updates
    // ------------------------------------------------------------------

    /// Rename the interface-side identifier (the public name is unchanged).
    pub fn with_interface(mut self, interface_name: impl Into<SmolStr>) -> Self {
        self.interface_name = interface_name.into();
        self
    }

    /// Rename both the public name and, if it still tracked the old public
    /// name, the interface name.
    pub fn with_name(mut self, name: impl Into<SmolStr>) -> Self {
        let name = name.into();
        if self.interface_name == self.name {
            self.interface_name = name.clone();
        }
        self.name = name;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_factory(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.factory = Some(Factory::new(factory));
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<SmolStr>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Append a converter to the pipeline.
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converters.push(converter);
        self
    }

    /// Append a validator to the pipeline.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Hide the parameter from the public signature while still forwarding
    /// its default/factory value to the target on every call.
    pub fn bound(mut self) -> Self {
        self.bound = true;
        self
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        let mut map = (*self.metadata).clone();
        map.insert(key.into(), value.into());
        self.metadata = Arc::new(map);
        self
    }

    /// Apply a [`ParamUpdate`] patch, yielding a new parameter.
    pub fn updated(&self, update: &ParamUpdate) -> Self {
        update.apply_to(self)
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        // creation_order is an ordering key, not part of parameter identity
        self.kind == other.kind
            && self.name == other.name
            && self.interface_name == other.interface_name
            && self.default == other.default
            && self.factory == other.factory
            && self.annotation == other.annotation
            && self.converters == other.converters
            && self.validators == other.validators
            && self.bound == other.bound
            && self.context == other.context
            && *self.metadata == *other.metadata
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            ParameterKind::VarPositional => "*",
            ParameterKind::VarKeyword => "**",
            _ => "",
        };
        if self.name == self.interface_name {
            write!(f, "{prefix}{}", self.name)?;
        } else {
            write!(f, "{prefix}{}->{prefix}{}", self.name, self.interface_name)?;
        }
        if let Some(annotation) = &self.annotation {
            write!(f, ":{annotation}")?;
        }
        if let Some(default) = &self.default {
            write!(f, "={default:?}")?;
        } else if self.factory.is_some() {
            write!(f, "=<factory>")?;
        }
        Ok(())
    }
}
