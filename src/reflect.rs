//! Target-routine reflection: the descriptor surface the core binds against.
//!
//! Rust has no runtime signature introspection, so a target routine carries
//! its own interface descriptor: an ordered list of [`InterfaceParam`]s
//! queried once, at build time. [`Routine`] is the concrete pairing of such a
//! descriptor with a callable body.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{BoxError, Value};
use crate::param::ParameterKind;

/// One slot of a target routine's native interface.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceParam {
    pub name: SmolStr,
    pub kind: ParameterKind,
    pub default: Option<Value>,
    pub annotation: Option<SmolStr>,
}

impl InterfaceParam {
    pub fn new(kind: ParameterKind, name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            annotation: None,
        }
    }

    pub fn pos(name: impl Into<SmolStr>) -> Self {
        Self::new(ParameterKind::PositionalOnly, name)
    }

    pub fn arg(name: impl Into<SmolStr>) -> Self {
        Self::new(ParameterKind::PositionalOrKeyword, name)
    }

    pub fn kwarg(name: impl Into<SmolStr>) -> Self {
        Self::new(ParameterKind::KeywordOnly, name)
    }

    pub fn vpo(name: impl Into<SmolStr>) -> Self {
        Self::new(ParameterKind::VarPositional, name)
    }

    pub fn vkw(name: impl Into<SmolStr>) -> Self {
        Self::new(ParameterKind::VarKeyword, name)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<SmolStr>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }
}

/// Anything whose call interface can be queried at build time.
pub trait Reflectable {
    /// The ordered native interface, positional first, collectors in place.
    fn interface(&self) -> &[InterfaceParam];
}

/// The exact positional/named shape of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArguments {
    pub args: Vec<Value>,
    pub kwargs: IndexMap<SmolStr, Value>,
}

impl CallArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append a named argument.
    pub fn with_named(mut self, name: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn positional(args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            args: args.into_iter().collect(),
            kwargs: IndexMap::new(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn named(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

impl fmt::Display for CallArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces: Vec<String> = self.args.iter().map(|v| format!("{v:?}")).collect();
        pieces.extend(self.kwargs.iter().map(|(k, v)| format!("{k}={v:?}")));
        write!(f, "({})", pieces.join(", "))
    }
}

type RoutineBody = Arc<dyn Fn(CallArguments) -> Result<Value, BoxError> + Send + Sync>;

/// A target routine: a display name, a reflected interface, and a body.
///
/// The body receives arguments already translated into the routine's own
/// convention; its result, or its error, is handed back to the caller
/// untouched. A routine that performs asynchronous work returns its pending
/// computation as an opaque value; suspension is entirely its own concern.
#[derive(Clone)]
pub struct Routine {
    name: SmolStr,
    interface: Vec<InterfaceParam>,
    body: RoutineBody,
}

impl Routine {
    pub fn new(
        name: impl Into<SmolStr>,
        interface: Vec<InterfaceParam>,
        body: impl Fn(CallArguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            interface,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the routine directly, bypassing any adapter.
    pub fn invoke(&self, arguments: CallArguments) -> Result<Value, BoxError> {
        (self.body)(arguments)
    }
}

impl Reflectable for Routine {
    fn interface(&self) -> &[InterfaceParam] {
        &self.interface
    }
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routine")
            .field("name", &self.name)
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}
