//! Signatures: validated, ordered collections of parameters.
//!
//! A [`Signature`] is an immutable value object. Construction runs the full
//! validity check once, eagerly; every transformation (revisions, renaming
//! the return annotation) yields a new signature, so built signatures are
//! always valid and safe to share across threads.

use std::fmt;
use std::ops::{Index, Range};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::errors::SignatureError;
use crate::param::{Parameter, ParameterKind};
use crate::reflect::Reflectable;

/// An immutable, validated ordered sequence of parameters plus an optional
/// return annotation.
#[derive(Debug, Clone)]
pub struct Signature {
    params: Arc<[Parameter]>,
    by_name: Arc<FxHashMap<SmolStr, usize>>,
    context: Option<usize>,
    var_positional: Option<usize>,
    var_keyword: Option<usize>,
    return_annotation: Option<SmolStr>,
}

/// Check an ordered parameter sequence against the calling-convention rules:
/// non-decreasing kinds, unique names and interface names, at most one of
/// each collector kind, default contiguity across the positional run, and
/// the context-parameter placement rules. Keyword-only parameters are named,
/// so the default-contiguity rule does not apply to them.
pub fn validate(params: &[Parameter]) -> Result<(), SignatureError> {
    let mut names: FxHashSet<&str> = FxHashSet::default();
    let mut interface_names: FxHashSet<&str> = FxHashSet::default();
    let mut seen_positional_default = false;

    for (i, current) in params.iter().enumerate() {
        let name = SmolStr::new(current.name());

        if current.default().is_some() && current.factory().is_some() {
            return Err(SignatureError::DefaultFactoryConflict(name));
        }
        if current.kind().is_variadic() {
            if current.has_default() {
                return Err(SignatureError::VariadicDefault(name));
            }
            if current.interface_name() != current.name() {
                return Err(SignatureError::VariadicRename(name));
            }
        }
        if current.is_bound() && !current.has_default() {
            return Err(SignatureError::BoundWithoutDefault(name));
        }
        if current.is_context() {
            if i > 0 {
                return Err(SignatureError::ContextNotFirst(name));
            }
            if current.kind() != ParameterKind::PositionalOrKeyword {
                return Err(SignatureError::ContextKind(name));
            }
            if current.has_default() {
                return Err(SignatureError::ContextDefault(name));
            }
        }

        if !names.insert(current.name()) {
            return Err(SignatureError::DuplicateName(name));
        }
        if !interface_names.insert(current.interface_name()) {
            return Err(SignatureError::DuplicateInterfaceName(SmolStr::new(
                current.interface_name(),
            )));
        }

        if i > 0 {
            let previous = &params[i - 1];
            if current.kind() < previous.kind() {
                return Err(SignatureError::KindOrder {
                    name,
                    kind: current.kind(),
                    previous: SmolStr::new(previous.name()),
                    previous_kind: previous.kind(),
                });
            }
            if current.kind() == previous.kind() {
                match current.kind() {
                    ParameterKind::VarPositional => {
                        return Err(SignatureError::MultipleVarPositional(name));
                    }
                    ParameterKind::VarKeyword => {
                        return Err(SignatureError::MultipleVarKeyword(name));
                    }
                    _ => {}
                }
            }
        }

        if current.kind().is_positional() {
            if current.has_default() {
                seen_positional_default = true;
            } else if seen_positional_default {
                return Err(SignatureError::NonDefaultAfterDefault(name));
            }
        }
    }
    Ok(())
}

impl Signature {
    /// The empty signature, the identity starting point for revisions.
    pub fn empty() -> Self {
        Self {
            params: Arc::from(Vec::new()),
            by_name: Arc::new(FxHashMap::default()),
            context: None,
            var_positional: None,
            var_keyword: None,
            return_annotation: None,
        }
    }

    /// Build a signature, failing fast on any validity violation.
    pub fn new(params: Vec<Parameter>) -> Result<Self, SignatureError> {
        validate(&params)?;

        let mut by_name = FxHashMap::default();
        let mut context = None;
        let mut var_positional = None;
        let mut var_keyword = None;
        for (i, param) in params.iter().enumerate() {
            by_name.insert(SmolStr::new(param.name()), i);
            if param.is_context() {
                context = Some(i);
            }
            match param.kind() {
                ParameterKind::VarPositional => var_positional = Some(i),
                ParameterKind::VarKeyword => var_keyword = Some(i),
                _ => {}
            }
        }

        Ok(Self {
            params: Arc::from(params),
            by_name: Arc::new(by_name),
            context,
            var_positional,
            var_keyword,
            return_annotation: None,
        })
    }

    /// Adopt a target routine's reflected interface as a signature, with each
    /// parameter's interface name equal to its public name.
    pub fn reflect(target: &dyn Reflectable) -> Result<Self, SignatureError> {
        let params = target
            .interface()
            .iter()
            .map(|ip| {
                let mut param = Parameter::new(ip.kind, ip.name.clone());
                if let Some(default) = &ip.default {
                    param = param.with_default(default.clone());
                }
                if let Some(annotation) = &ip.annotation {
                    param = param.with_annotation(annotation.clone());
                }
                param
            })
            .collect();
        Self::new(params)
    }

    /// Replace the parameter list, keeping the return annotation. Re-validates.
    pub fn with_params(&self, params: Vec<Parameter>) -> Result<Self, SignatureError> {
        let mut next = Self::new(params)?;
        next.return_annotation = self.return_annotation.clone();
        Ok(next)
    }

    /// Set the return annotation, yielding a new signature.
    pub fn with_return_annotation(&self, annotation: impl Into<SmolStr>) -> Self {
        let mut next = self.clone();
        next.return_annotation = Some(annotation.into());
        next
    }

    pub fn return_annotation(&self) -> Option<&str> {
        self.return_annotation.as_deref()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Parameters visible to callers (bound parameters are hidden).
    pub fn public_params(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(|p| !p.is_bound())
    }

    /// Look a parameter up by public name.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.position(name).map(|i| &self.params[i])
    }

    /// Position of a parameter by public name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Sub-range by index, for revisions selecting spans without re-validating.
    pub fn slice(&self, range: Range<usize>) -> &[Parameter] {
        &self.params[range]
    }

    /// Inclusive sub-range by names; `None` if either endpoint is missing or
    /// the endpoints are reversed.
    pub fn slice_between(&self, from: &str, to: &str) -> Option<&[Parameter]> {
        let start = self.position(from)?;
        let end = self.position(to)?;
        (start <= end).then(|| &self.params[start..=end])
    }

    pub fn context(&self) -> Option<&Parameter> {
        self.context.map(|i| &self.params[i])
    }

    pub fn var_positional(&self) -> Option<&Parameter> {
        self.var_positional.map(|i| &self.params[i])
    }

    pub fn var_keyword(&self) -> Option<&Parameter> {
        self.var_keyword.map(|i| &self.params[i])
    }

    pub(crate) fn context_index(&self) -> Option<usize> {
        self.context
    }

    pub(crate) fn var_positional_index(&self) -> Option<usize> {
        self.var_positional
    }

    pub(crate) fn var_keyword_index(&self) -> Option<usize> {
        self.var_keyword
    }
}

impl Index<usize> for Signature {
    type Output = Parameter;

    fn index(&self, index: usize) -> &Parameter {
        &self.params[index]
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        *self.params == *other.params && self.return_annotation == other.return_annotation
    }
}

impl fmt::Display for Signature {
    /// Renders the conventional shape, with `/` closing a positional-only
    /// run and a bare `*` opening keyword-only parameters when no
    /// var-positional collector is present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_var_positional = self.var_positional.is_some();
        let mut pieces: Vec<String> = Vec::with_capacity(self.params.len() + 2);

        for (i, param) in self.params.iter().enumerate() {
            let previous = (i > 0).then(|| &self.params[i - 1]);
            if !has_var_positional
                && param.kind() == ParameterKind::KeywordOnly
                && previous.is_none_or(|p| p.kind() != ParameterKind::KeywordOnly)
            {
                pieces.push("*".to_string());
            }
            pieces.push(param.to_string());
            let next = self.params.get(i + 1);
            if param.kind() == ParameterKind::PositionalOnly
                && next.is_none_or(|p| p.kind() != ParameterKind::PositionalOnly)
            {
                pieces.push("/".to_string());
            }
        }

        write!(f, "({})", pieces.join(", "))?;
        if let Some(annotation) = &self.return_annotation {
            write!(f, " -> {annotation}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{arg, ctx, kwarg, pos, vkw, vpo};

    fn sig(params: Vec<Parameter>) -> Result<Signature, SignatureError> {
        Signature::new(params)
    }

    #[test]
    fn test_valid_full_ordering() {
        let s = sig(vec![
            pos("a"),
            arg("b"),
            vpo("rest"),
            kwarg("c"),
            vkw("extra"),
        ])
        .unwrap();
        assert_eq!(s.len(), 5);
        assert_eq!(s.var_positional().unwrap().name(), "rest");
        assert_eq!(s.var_keyword().unwrap().name(), "extra");
    }

    #[test]
    fn test_kind_order_violation() {
        let err = sig(vec![kwarg("a"), pos("b")]).unwrap_err();
        assert!(matches!(err, SignatureError::KindOrder { .. }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = sig(vec![arg("a"), arg("a")]).unwrap_err();
        assert!(matches!(err, SignatureError::DuplicateName(n) if n == "a"));
    }

    #[test]
    fn test_duplicate_interface_names_rejected() {
        let err = sig(vec![arg("a").with_interface("x"), arg("b").with_interface("x")])
            .unwrap_err();
        assert!(matches!(err, SignatureError::DuplicateInterfaceName(n) if n == "x"));
    }

    #[test]
    fn test_default_contiguity_spans_positional_kinds() {
        // a positional-only default followed by a bare positional-or-keyword
        // still violates contiguity
        let err = sig(vec![pos("a").with_default(1), arg("b")]).unwrap_err();
        assert!(matches!(err, SignatureError::NonDefaultAfterDefault(n) if n == "b"));
    }

    #[test]
    fn test_keyword_only_exempt_from_contiguity() {
        assert!(sig(vec![arg("a").with_default(1), kwarg("b")]).is_ok());
        assert!(sig(vec![kwarg("a").with_default(1), kwarg("b")]).is_ok());
    }

    #[test]
    fn test_context_must_be_first() {
        let err = sig(vec![arg("a"), ctx("this")]).unwrap_err();
        assert!(matches!(err, SignatureError::ContextNotFirst(n) if n == "this"));
        assert!(sig(vec![ctx("this"), arg("a")]).is_ok());
    }

    #[test]
    fn test_variadic_shape_rules() {
        let err = sig(vec![vpo("rest").with_default(1)]).unwrap_err();
        assert!(matches!(err, SignatureError::VariadicDefault(_)));

        let err = sig(vec![vkw("extra").with_interface("other")]).unwrap_err();
        assert!(matches!(err, SignatureError::VariadicRename(_)));

        let err = sig(vec![vpo("a"), vpo("b")]).unwrap_err();
        assert!(matches!(err, SignatureError::MultipleVarPositional(_)));
    }

    #[test]
    fn test_bound_requires_default() {
        let err = sig(vec![arg("token").bound()]).unwrap_err();
        assert!(matches!(err, SignatureError::BoundWithoutDefault(_)));
        assert!(sig(vec![arg("token").with_default("t").bound()]).is_ok());
    }

    #[test]
    fn test_indexing_and_slicing() {
        let s = sig(vec![arg("a"), arg("b").with_default(1), kwarg("c")]).unwrap();
        assert_eq!(s[1].name(), "b");
        assert_eq!(s.get("c").unwrap().kind(), ParameterKind::KeywordOnly);
        assert_eq!(s.position("a"), Some(0));
        assert_eq!(s.slice(1..3).len(), 2);
        let between = s.slice_between("a", "b").unwrap();
        assert_eq!(between.len(), 2);
        assert!(s.slice_between("b", "a").is_none());
        assert!(s.slice_between("a", "missing").is_none());
    }

    #[test]
    fn test_public_params_hide_bound() {
        let s = sig(vec![arg("a"), arg("token").with_default("t").bound()]).unwrap();
        let visible: Vec<_> = s.public_params().map(|p| p.name().to_string()).collect();
        assert_eq!(visible, vec!["a"]);
    }

    #[test]
    fn test_return_annotation_is_separate() {
        let s = sig(vec![arg("a")]).unwrap();
        let annotated = s.with_return_annotation("i64");
        assert_eq!(s.return_annotation(), None);
        assert_eq!(annotated.return_annotation(), Some("i64"));
        assert_ne!(s, annotated);
    }

    #[test]
    fn test_display() {
        let s = sig(vec![pos("a"), arg("b").with_default(2), kwarg("c")]).unwrap();
        assert_eq!(s.to_string(), "(a, /, b=2, *, c)");

        let v = sig(vec![arg("a"), vpo("rest"), kwarg("c")]).unwrap();
        assert_eq!(v.to_string(), "(a, *rest, c)");
    }
}
