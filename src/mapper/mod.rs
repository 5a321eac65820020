//! The binding engine: precomputed plans from a public signature to a
//! target routine's native interface.
//!
//! A [`Mapper`] is built once, at adapter construction, by proving that every
//! interface name the signature can produce has a home in the target's own
//! interface. At call time it runs the multi-phase binding algorithm:
//! positional consumption, named matching, bound injection, default fill,
//! conversion, validation, and interface translation. Binding is synchronous
//! and lock-free; a mapper may be shared across threads freely.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::base::Value;
use crate::config;
use crate::errors::{BindingError, CallError, SignatureError};
use crate::param::ParameterKind;
use crate::reflect::{CallArguments, Reflectable};
use crate::signature::Signature;

/// Where one target slot's value comes from.
#[derive(Debug, Clone)]
enum ValueSource {
    /// A public parameter, by signature index.
    Public(usize),
    /// The target's own declared default, materialized at call time.
    Default(Value),
}

/// The compiled recipe for one signature/target pairing.
#[derive(Debug, Clone)]
struct BindingPlan {
    /// Target positional slots, in target order. Every slot is fillable, so
    /// assembly never leaves positional gaps.
    positional: Vec<ValueSource>,
    /// Target keyword slots plus public parameters forwarded into the
    /// target's var-keyword collector, keyed by interface name.
    named: Vec<(SmolStr, ValueSource)>,
    /// Collected var-positional values are appended after the fixed slots.
    append_var_positional: bool,
    /// Collected var-keyword values are merged last.
    merge_var_keyword: bool,
    /// Public positional-capable parameters (non-bound), in order.
    positional_params: Vec<usize>,
    /// Public name-addressable parameters (non-bound).
    named_params: FxHashMap<SmolStr, usize>,
    /// Bound parameters, injected on every call regardless of caller input.
    bound_params: Vec<usize>,
}

/// A reusable pairing of one [`Signature`] with one target interface.
#[derive(Debug, Clone)]
pub struct Mapper {
    signature: Signature,
    parameter_map: IndexMap<SmolStr, SmolStr>,
    plan: BindingPlan,
}

impl Mapper {
    /// Compile a binding plan, failing if the signature and target cannot be
    /// reconciled. No partially-built mapper is ever returned.
    pub fn new(signature: Signature, target: &dyn Reflectable) -> Result<Self, SignatureError> {
        let interface = target.interface();

        let mut positional_params = Vec::new();
        let mut named_params = FxHashMap::default();
        let mut bound_params = Vec::new();
        for (i, param) in signature.iter().enumerate() {
            if param.is_bound() {
                bound_params.push(i);
                continue;
            }
            match param.kind() {
                ParameterKind::PositionalOnly => positional_params.push(i),
                ParameterKind::PositionalOrKeyword => {
                    positional_params.push(i);
                    named_params.insert(SmolStr::new(param.name()), i);
                }
                ParameterKind::KeywordOnly => {
                    named_params.insert(SmolStr::new(param.name()), i);
                }
                ParameterKind::VarPositional | ParameterKind::VarKeyword => {}
            }
        }

        // public parameters awaiting a home, keyed by interface name
        let mut unclaimed: FxHashMap<&str, usize> = signature
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.kind().is_variadic())
            .map(|(i, p)| (p.interface_name(), i))
            .collect();

        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut target_var_positional: Option<&SmolStr> = None;
        let mut target_var_keyword: Option<&SmolStr> = None;
        let mut parameter_map = IndexMap::new();

        for ip in interface {
            match ip.kind {
                ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword => {
                    match unclaimed.remove(ip.name.as_str()) {
                        Some(i) => {
                            parameter_map
                                .insert(SmolStr::new(signature[i].name()), ip.name.clone());
                            positional.push(ValueSource::Public(i));
                        }
                        None => match &ip.default {
                            // masked slot: the target supplies its own value
                            Some(default) => positional.push(ValueSource::Default(default.clone())),
                            None => {
                                return Err(SignatureError::UnmappedTargetParameter {
                                    name: ip.name.clone(),
                                    kind: ip.kind,
                                });
                            }
                        },
                    }
                }
                ParameterKind::KeywordOnly => match unclaimed.remove(ip.name.as_str()) {
                    Some(i) => {
                        parameter_map.insert(SmolStr::new(signature[i].name()), ip.name.clone());
                        named.push((ip.name.clone(), ValueSource::Public(i)));
                    }
                    None => match &ip.default {
                        Some(default) => {
                            named.push((ip.name.clone(), ValueSource::Default(default.clone())));
                        }
                        None => {
                            return Err(SignatureError::UnmappedTargetParameter {
                                name: ip.name.clone(),
                                kind: ip.kind,
                            });
                        }
                    },
                },
                ParameterKind::VarPositional => target_var_positional = Some(&ip.name),
                ParameterKind::VarKeyword => target_var_keyword = Some(&ip.name),
            }
        }

        if let Some(param) = signature.var_positional() {
            let Some(target_name) = target_var_positional else {
                return Err(SignatureError::NoVarPositionalTarget(SmolStr::new(
                    param.name(),
                )));
            };
            parameter_map.insert(SmolStr::new(param.name()), target_name.clone());
        }
        if let Some(param) = signature.var_keyword() {
            let Some(target_name) = target_var_keyword else {
                return Err(SignatureError::NoVarKeywordTarget(SmolStr::new(param.name())));
            };
            parameter_map.insert(SmolStr::new(param.name()), target_name.clone());
        }

        // remaining public parameters can only land in a target var-keyword
        if !unclaimed.is_empty() {
            let Some(target_name) = target_var_keyword else {
                let mut orphans: Vec<&str> = unclaimed.keys().copied().collect();
                orphans.sort_unstable();
                return Err(SignatureError::UnmappedParameters(orphans.join(", ")));
            };
            let mut orphans: Vec<usize> = unclaimed.into_values().collect();
            orphans.sort_unstable();
            for i in orphans {
                let param = &signature[i];
                parameter_map.insert(SmolStr::new(param.name()), target_name.clone());
                named.push((
                    SmolStr::new(param.interface_name()),
                    ValueSource::Public(i),
                ));
            }
        }

        debug!(
            signature = %signature,
            slots = positional.len() + named.len(),
            "compiled binding plan"
        );

        let append_var_positional = signature.var_positional_index().is_some();
        let merge_var_keyword = signature.var_keyword_index().is_some();
        Ok(Self {
            signature,
            parameter_map,
            plan: BindingPlan {
                positional,
                named,
                append_var_positional,
                merge_var_keyword,
                positional_params,
                named_params,
                bound_params,
            },
        })
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The compiled public-name to target-name mapping, for inspection.
    pub fn parameter_map(&self) -> &IndexMap<SmolStr, SmolStr> {
        &self.parameter_map
    }

    /// Execute the binding algorithm, translating a call against the public
    /// signature into the target's exact call shape. Fails before the target
    /// would see anything.
    pub fn map(&self, call: CallArguments) -> Result<CallArguments, CallError> {
        let sig = &self.signature;
        let mut resolved: Vec<Option<Value>> = vec![None; sig.len()];
        let mut collected_pos: Vec<Value> = Vec::new();
        let mut collected_kw: IndexMap<SmolStr, Value> = IndexMap::new();

        // phase 1: consume the positional sequence in order
        let mut supplied = call.args.into_iter();
        for &i in &self.plan.positional_params {
            match supplied.next() {
                Some(value) => resolved[i] = Some(value),
                None => break,
            }
        }
        for value in supplied {
            if sig.var_positional_index().is_none() {
                return Err(BindingError::TooManyPositional.into());
            }
            collected_pos.push(value);
        }

        // phase 2: match named values against public names
        for (name, value) in call.kwargs {
            match self.plan.named_params.get(&name) {
                Some(&i) => {
                    if resolved[i].is_some() {
                        return Err(BindingError::MultipleValues(name).into());
                    }
                    resolved[i] = Some(value);
                }
                None => {
                    if sig.var_keyword_index().is_none() {
                        return Err(BindingError::UnexpectedNamed(name).into());
                    }
                    collected_kw.insert(name, value);
                }
            }
        }

        // phase 3: bound parameters, unconditionally
        for &i in &self.plan.bound_params {
            resolved[i] = sig[i].produce_default();
        }

        // phase 4: defaults and factories for whatever is still unassigned
        for (i, param) in sig.iter().enumerate() {
            if param.kind().is_variadic() || resolved[i].is_some() {
                continue;
            }
            match param.produce_default() {
                Some(value) => resolved[i] = Some(value),
                None => {
                    return Err(BindingError::MissingRequired(SmolStr::new(param.name())).into());
                }
            }
        }

        // context value: post-default, pre-conversion
        let ctx = sig
            .context_index()
            .and_then(|i| resolved[i].clone())
            .unwrap_or(Value::None);

        // phase 5: converters, in declared order
        for (i, param) in sig.iter().enumerate() {
            if param.converters().is_empty() {
                continue;
            }
            let mut value = match param.kind() {
                ParameterKind::VarPositional => Value::List(std::mem::take(&mut collected_pos)),
                ParameterKind::VarKeyword => {
                    Value::Map(std::mem::take(&mut collected_kw))
                }
                _ => {
                    let Some(value) = resolved[i].take() else {
                        continue;
                    };
                    value
                }
            };
            for converter in param.converters() {
                value = converter
                    .apply(&ctx, param.name(), value)
                    .map_err(CallError::Conversion)?;
            }
            match param.kind() {
                ParameterKind::VarPositional => match value {
                    Value::List(items) => collected_pos = items,
                    _ => {
                        return Err(CallError::Conversion(
                            format!(
                                "converter for var-positional '{}' must return a sequence",
                                param.name()
                            )
                            .into(),
                        ));
                    }
                },
                ParameterKind::VarKeyword => match value {
                    Value::Map(entries) => collected_kw = entries,
                    _ => {
                        return Err(CallError::Conversion(
                            format!(
                                "converter for var-keyword '{}' must return a mapping",
                                param.name()
                            )
                            .into(),
                        ));
                    }
                },
                _ => resolved[i] = Some(value),
            }
        }

        // phase 6: validators, first failure aborts before dispatch
        if config::run_validators() {
            for (i, param) in sig.iter().enumerate() {
                if param.validators().is_empty() {
                    continue;
                }
                match param.kind() {
                    ParameterKind::VarPositional => {
                        let value = Value::List(collected_pos.clone());
                        for validator in param.validators() {
                            validator
                                .check(&ctx, param.name(), &value)
                                .map_err(CallError::Validation)?;
                        }
                    }
                    ParameterKind::VarKeyword => {
                        let value = Value::Map(collected_kw.clone());
                        for validator in param.validators() {
                            validator
                                .check(&ctx, param.name(), &value)
                                .map_err(CallError::Validation)?;
                        }
                    }
                    _ => {
                        if let Some(value) = &resolved[i] {
                            for validator in param.validators() {
                                validator
                                    .check(&ctx, param.name(), value)
                                    .map_err(CallError::Validation)?;
                            }
                        }
                    }
                }
            }
        }

        // phase 7: reassemble into the target's call shape
        let mut out = CallArguments::new();
        for source in &self.plan.positional {
            let value = match source {
                ValueSource::Public(i) => resolved[*i].take().unwrap_or_default(),
                ValueSource::Default(value) => value.clone(),
            };
            out.args.push(value);
        }
        if self.plan.append_var_positional {
            out.args.append(&mut collected_pos);
        }
        for (name, source) in &self.plan.named {
            let value = match source {
                ValueSource::Public(i) => resolved[*i].take().unwrap_or_default(),
                ValueSource::Default(value) => value.clone(),
            };
            out.kwargs.insert(name.clone(), value);
        }
        if self.plan.merge_var_keyword {
            for (name, value) in collected_kw {
                out.kwargs.insert(name, value);
            }
        }

        trace!(call = %out, "bound call arguments");
        Ok(out)
    }
}

impl fmt::Display for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .parameter_map
            .iter()
            .map(|(from, to)| {
                if from == to {
                    from.to_string()
                } else {
                    format!("{from} -> {to}")
                }
            })
            .collect();
        write!(f, "{} => [{}]", self.signature, pairs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{arg, kwarg, pos, vkw, vpo};
    use crate::reflect::{InterfaceParam, Routine};

    fn echo_target(interface: Vec<InterfaceParam>) -> Routine {
        Routine::new("echo", interface, |call| Ok(Value::List(call.args)))
    }

    fn sig(params: Vec<crate::param::Parameter>) -> Signature {
        Signature::new(params).unwrap()
    }

    #[test]
    fn test_plan_rejects_unmapped_required_target_param() {
        let target = echo_target(vec![InterfaceParam::arg("a"), InterfaceParam::arg("b")]);
        let err = Mapper::new(sig(vec![arg("a")]), &target).unwrap_err();
        assert!(matches!(
            err,
            SignatureError::UnmappedTargetParameter { name, .. } if name == "b"
        ));
    }

    #[test]
    fn test_plan_masks_defaulted_target_params() {
        let target = echo_target(vec![
            InterfaceParam::arg("a"),
            InterfaceParam::arg("b").with_default(9),
        ]);
        let mapper = Mapper::new(sig(vec![arg("a")]), &target).unwrap();
        let out = mapper.map(CallArguments::new().with(1)).unwrap();
        assert_eq!(out.args, vec![Value::Int(1), Value::Int(9)]);
    }

    #[test]
    fn test_plan_requires_target_collectors_for_public_ones() {
        let target = echo_target(vec![InterfaceParam::arg("a")]);
        let err = Mapper::new(sig(vec![arg("a"), vpo("rest")]), &target).unwrap_err();
        assert!(matches!(err, SignatureError::NoVarPositionalTarget(_)));

        let err = Mapper::new(sig(vec![arg("a"), vkw("extra")]), &target).unwrap_err();
        assert!(matches!(err, SignatureError::NoVarKeywordTarget(_)));
    }

    #[test]
    fn test_plan_forwards_orphans_into_target_var_keyword() {
        let target = echo_target(vec![InterfaceParam::vkw("kw")]);
        let mapper = Mapper::new(sig(vec![kwarg("x")]), &target).unwrap();
        assert_eq!(
            mapper.parameter_map().get("x").map(SmolStr::as_str),
            Some("kw")
        );
        let out = mapper
            .map(CallArguments::new().with_named("x", 1))
            .unwrap();
        assert_eq!(out.named("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_plan_rejects_orphans_without_target_var_keyword() {
        let target = echo_target(vec![]);
        let err = Mapper::new(sig(vec![kwarg("x"), kwarg("y")]), &target).unwrap_err();
        assert!(matches!(err, SignatureError::UnmappedParameters(names) if names == "x, y"));
    }

    #[test]
    fn test_too_many_positional() {
        let target = echo_target(vec![InterfaceParam::arg("a")]);
        let mapper = Mapper::new(sig(vec![arg("a")]), &target).unwrap();
        let err = mapper
            .map(CallArguments::new().with(1).with(2))
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::Binding(BindingError::TooManyPositional)
        ));
    }

    #[test]
    fn test_unexpected_named() {
        let target = echo_target(vec![InterfaceParam::arg("a")]);
        let mapper = Mapper::new(sig(vec![arg("a")]), &target).unwrap();
        let err = mapper
            .map(CallArguments::new().with(1).with_named("zzz", 2))
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::Binding(BindingError::UnexpectedNamed(name)) if name == "zzz"
        ));
    }

    #[test]
    fn test_multiple_values_for_one_name() {
        let target = echo_target(vec![InterfaceParam::arg("a")]);
        let mapper = Mapper::new(sig(vec![arg("a")]), &target).unwrap();
        let err = mapper
            .map(CallArguments::new().with(1).with_named("a", 2))
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::Binding(BindingError::MultipleValues(name)) if name == "a"
        ));
    }

    #[test]
    fn test_missing_required() {
        let target = echo_target(vec![InterfaceParam::arg("a"), InterfaceParam::arg("b")]);
        let mapper = Mapper::new(sig(vec![arg("a"), arg("b")]), &target).unwrap();
        let err = mapper.map(CallArguments::new().with(1)).unwrap_err();
        assert!(matches!(
            err,
            CallError::Binding(BindingError::MissingRequired(name)) if name == "b"
        ));
    }

    #[test]
    fn test_positional_only_not_addressable_by_name() {
        let target = echo_target(vec![InterfaceParam::pos("a")]);
        let mapper = Mapper::new(sig(vec![pos("a")]), &target).unwrap();
        let err = mapper
            .map(CallArguments::new().with_named("a", 1))
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::Binding(BindingError::UnexpectedNamed(name)) if name == "a"
        ));
    }
}
