//! Field-wise parameter patches, used by the `modify` revision.

use indexmap::IndexMap;
use smol_str::SmolStr;
use std::sync::Arc;

use crate::base::{Converter, Factory, Validator, Value};

use super::{Parameter, ParameterKind};

/// Tri-state patch field: leave untouched, clear, or set.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum UpdateField<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

/// A bundle of attribute replacements applied to matched parameters.
///
/// Unset fields keep the parameter's current value. Setting a default clears
/// any factory (and vice versa) so the patched parameter keeps the
/// default-xor-factory invariant on its own.
#[derive(Debug, Clone, Default)]
pub struct ParamUpdate {
    kind: Option<ParameterKind>,
    name: Option<SmolStr>,
    interface_name: Option<SmolStr>,
    default: UpdateField<Value>,
    factory: UpdateField<Factory>,
    annotation: UpdateField<SmolStr>,
    converters: Option<Vec<Converter>>,
    validators: Option<Vec<Validator>>,
    bound: Option<bool>,
    context: Option<bool>,
    metadata: Option<IndexMap<SmolStr, Value>>,
}

impl ParamUpdate {
    pub fn new() -> Self {
        // the builder method below shadows `Default::default`
        <Self as Default>::default()
    }

    pub fn kind(mut self, kind: ParameterKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn interface_name(mut self, interface_name: impl Into<SmolStr>) -> Self {
        self.interface_name = Some(interface_name.into());
        self
    }

    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = UpdateField::Set(default.into());
        self.factory = UpdateField::Clear;
        self
    }

    pub fn clear_default(mut self) -> Self {
        self.default = UpdateField::Clear;
        self
    }

    pub fn factory(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.factory = UpdateField::Set(Factory::new(factory));
        self.default = UpdateField::Clear;
        self
    }

    pub fn clear_factory(mut self) -> Self {
        self.factory = UpdateField::Clear;
        self
    }

    pub fn annotation(mut self, annotation: impl Into<SmolStr>) -> Self {
        self.annotation = UpdateField::Set(annotation.into());
        self
    }

    pub fn clear_annotation(mut self) -> Self {
        self.annotation = UpdateField::Clear;
        self
    }

    /// Replace the whole converter pipeline.
    pub fn converters(mut self, converters: Vec<Converter>) -> Self {
        self.converters = Some(converters);
        self
    }

    /// Replace the whole validator pipeline.
    pub fn validators(mut self, validators: Vec<Validator>) -> Self {
        self.validators = Some(validators);
        self
    }

    pub fn bound(mut self, bound: bool) -> Self {
        self.bound = Some(bound);
        self
    }

    pub fn context(mut self, context: bool) -> Self {
        self.context = Some(context);
        self
    }

    pub fn metadata(mut self, metadata: IndexMap<SmolStr, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn apply_to(&self, param: &Parameter) -> Parameter {
        let mut next = param.clone();
        if let Some(kind) = self.kind {
            next.kind = kind;
        }
        if let Some(name) = &self.name {
            // keep the interface name tracking the public name unless it was
            // deliberately split or patched explicitly
            if next.interface_name == next.name && self.interface_name.is_none() {
                next.interface_name = name.clone();
            }
            next.name = name.clone();
        }
        if let Some(interface_name) = &self.interface_name {
            next.interface_name = interface_name.clone();
        }
        match &self.default {
            UpdateField::Keep => {}
            UpdateField::Clear => next.default = None,
            UpdateField::Set(value) => next.default = Some(value.clone()),
        }
        match &self.factory {
            UpdateField::Keep => {}
            UpdateField::Clear => next.factory = None,
            UpdateField::Set(factory) => next.factory = Some(factory.clone()),
        }
        match &self.annotation {
            UpdateField::Keep => {}
            UpdateField::Clear => next.annotation = None,
            UpdateField::Set(annotation) => next.annotation = Some(annotation.clone()),
        }
        if let Some(converters) = &self.converters {
            next.converters = converters.clone();
        }
        if let Some(validators) = &self.validators {
            next.validators = validators.clone();
        }
        if let Some(bound) = self.bound {
            next.bound = bound;
        }
        if let Some(context) = self.context {
            next.context = context;
        }
        if let Some(metadata) = &self.metadata {
            next.metadata = Arc::new(metadata.clone());
        }
        next
    }
}
