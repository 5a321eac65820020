//! The revision algebra: pure, composable signature transformations.
//!
//! A [`Revision`] is an ordinary value created at build time, applied to a
//! [`Signature`] to produce a new one, and then discarded. Internally a
//! revision edits an unvalidated draft (parameter list plus return
//! annotation); validity is re-checked after each application, except inside
//! [`Revision::compose`], which validates only the final result and so
//! tolerates transiently invalid intermediate states.

mod selector;

pub use selector::Selector;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use crate::errors::SignatureError;
use crate::param::{ParamUpdate, Parameter};
use crate::signature::Signature;

type ManageFn = Arc<dyn Fn(&[Parameter]) -> Result<Vec<Parameter>, SignatureError> + Send + Sync>;
type CompareFn = Arc<dyn Fn(&Parameter, &Parameter) -> Ordering + Send + Sync>;

/// Where a positioning revision (`insert`, `translocate`) puts its subject.
///
/// The enum admits exactly one positioning strategy per revision.
#[derive(Debug, Clone)]
pub enum Anchor {
    /// An absolute index into the parameter list.
    Index(usize),
    /// Immediately before the first parameter the selector matches.
    Before(Selector),
    /// Immediately after the first parameter the selector matches.
    After(Selector),
}

impl Anchor {
    /// Resolve to an insertion index into `params`.
    fn resolve(&self, params: &[Parameter]) -> Result<usize, SignatureError> {
        match self {
            Anchor::Index(index) => {
                if *index > params.len() {
                    return Err(SignatureError::IndexOutOfBounds {
                        index: *index,
                        len: params.len(),
                    });
                }
                Ok(*index)
            }
            Anchor::Before(selector) => params
                .iter()
                .position(|p| selector.matches(p))
                .ok_or(SignatureError::AnchorNotFound),
            Anchor::After(selector) => params
                .iter()
                .position(|p| selector.matches(p))
                .map(|i| i + 1)
                .ok_or(SignatureError::AnchorNotFound),
        }
    }
}

/// Unvalidated signature scratchpad revisions operate on.
#[derive(Clone)]
struct Draft {
    params: Vec<Parameter>,
    return_annotation: Option<SmolStr>,
}

impl Draft {
    fn of(signature: &Signature) -> Self {
        Self {
            params: signature.params().to_vec(),
            return_annotation: signature.return_annotation().map(SmolStr::new),
        }
    }

    fn seal(self) -> Result<Signature, SignatureError> {
        let mut signature = Signature::new(self.params)?;
        if let Some(annotation) = self.return_annotation {
            signature = signature.with_return_annotation(annotation);
        }
        Ok(signature)
    }
}

/// How to filter parameters adopted by [`Revision::copy`].
#[derive(Debug, Clone)]
enum CopyFilter {
    All,
    Include(Selector),
    Exclude(Selector),
}

enum Inner {
    Synthesize(Vec<Parameter>),
    Copy { source: Signature, filter: CopyFilter },
    Manage(ManageFn),
    Returns(SmolStr),
    Sort(Option<CompareFn>),
    Compose(Vec<Revision>),
    Delete(Selector),
    Insert { params: Vec<Parameter>, anchor: Anchor },
    Modify { selector: Selector, multiple: bool, update: ParamUpdate },
    Replace { selector: Selector, param: Parameter },
    Translocate { selector: Selector, anchor: Anchor },
}

/// A pure transformation from one [`Signature`] to another.
pub struct Revision {
    inner: Inner,
}

impl Revision {
    /// Replace the parameter list with an explicit ordered list.
    pub fn synthesize(params: impl IntoIterator<Item = Parameter>) -> Self {
        Self {
            inner: Inner::Synthesize(params.into_iter().collect()),
        }
    }

    /// Replace the parameter list with named entries: each parameter is
    /// renamed to its entry name, and entries are ordered by the parameters'
    /// original creation order, which removes any ambiguity from unordered
    /// key-value construction.
    pub fn synthesize_named<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Parameter)>,
        S: Into<SmolStr>,
    {
        let mut named: Vec<(SmolStr, Parameter)> = entries
            .into_iter()
            .map(|(name, param)| (name.into(), param))
            .collect();
        named.sort_by_key(|(_, param)| param.creation_order());
        Self {
            inner: Inner::Synthesize(
                named
                    .into_iter()
                    .map(|(name, param)| param.with_name(name))
                    .collect(),
            ),
        }
    }

    /// Adopt all of another reflected signature's parameters.
    pub fn copy(source: Signature) -> Self {
        Self {
            inner: Inner::Copy {
                source,
                filter: CopyFilter::All,
            },
        }
    }

    /// Adopt only the parameters a selector matches.
    pub fn copy_include(source: Signature, selector: impl Into<Selector>) -> Self {
        Self {
            inner: Inner::Copy {
                source,
                filter: CopyFilter::Include(selector.into()),
            },
        }
    }

    /// Adopt all parameters except those a selector matches.
    pub fn copy_exclude(source: Signature, selector: impl Into<Selector>) -> Self {
        Self {
            inner: Inner::Copy {
                source,
                filter: CopyFilter::Exclude(selector.into()),
            },
        }
    }

    /// Apply an arbitrary user function to the parameter list.
    pub fn manage(
        f: impl Fn(&[Parameter]) -> Result<Vec<Parameter>, SignatureError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Inner::Manage(Arc::new(f)),
        }
    }

    /// Set the return annotation; parameters are untouched.
    pub fn returns(annotation: impl Into<SmolStr>) -> Self {
        Self {
            inner: Inner::Returns(annotation.into()),
        }
    }

    /// Stable sort by `(kind, has_default, name)`. Idempotent.
    pub fn sort() -> Self {
        Self {
            inner: Inner::Sort(None),
        }
    }

    /// Stable sort by a caller-supplied comparator.
    pub fn sort_by(
        cmp: impl Fn(&Parameter, &Parameter) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Inner::Sort(Some(Arc::new(cmp))),
        }
    }

    /// Apply revisions in order, validating only the final result.
    pub fn compose(revisions: impl IntoIterator<Item = Revision>) -> Self {
        Self {
            inner: Inner::Compose(revisions.into_iter().collect()),
        }
    }

    /// Remove every matched parameter. Each removed parameter must have a
    /// default or factory, or be variadic; a caller depending on it could
    /// otherwise never satisfy the target.
    pub fn delete(selector: impl Into<Selector>) -> Self {
        Self {
            inner: Inner::Delete(selector.into()),
        }
    }

    /// Insert one parameter at an anchored position.
    pub fn insert(param: Parameter, anchor: Anchor) -> Self {
        Self::insert_all([param], anchor)
    }

    /// Insert several parameters, preserving their order, at an anchor.
    pub fn insert_all(params: impl IntoIterator<Item = Parameter>, anchor: Anchor) -> Self {
        Self {
            inner: Inner::Insert {
                params: params.into_iter().collect(),
                anchor,
            },
        }
    }

    /// Patch the attributes of matched parameter(s). Errors when more than
    /// one parameter matches unless `multiple` is set.
    pub fn modify(selector: impl Into<Selector>, multiple: bool, update: ParamUpdate) -> Self {
        Self {
            inner: Inner::Modify {
                selector: selector.into(),
                multiple,
                update,
            },
        }
    }

    /// Substitute a whole parameter object at each matched position.
    pub fn replace(selector: impl Into<Selector>, param: Parameter) -> Self {
        Self {
            inner: Inner::Replace {
                selector: selector.into(),
                param,
            },
        }
    }

    /// Move matched parameter(s) to an anchored position, attributes
    /// unchanged.
    pub fn translocate(selector: impl Into<Selector>, anchor: Anchor) -> Self {
        Self {
            inner: Inner::Translocate {
                selector: selector.into(),
                anchor,
            },
        }
    }

    /// Apply this revision, producing a new validated signature.
    pub fn apply(&self, previous: &Signature) -> Result<Signature, SignatureError> {
        debug!(revision = self.kind_name(), params = previous.len(), "applying revision");
        self.apply_draft(Draft::of(previous))?.seal()
    }

    fn apply_draft(&self, mut draft: Draft) -> Result<Draft, SignatureError> {
        match &self.inner {
            Inner::Synthesize(params) => {
                draft.params = params.clone();
            }

            Inner::Copy { source, filter } => {
                draft.params = source
                    .params()
                    .iter()
                    .filter(|p| match filter {
                        CopyFilter::All => true,
                        CopyFilter::Include(selector) => selector.matches(p),
                        CopyFilter::Exclude(selector) => !selector.matches(p),
                    })
                    .cloned()
                    .collect();
            }

            Inner::Manage(f) => {
                draft.params = f(&draft.params)?;
            }

            Inner::Returns(annotation) => {
                draft.return_annotation = Some(annotation.clone());
            }

            Inner::Sort(cmp) => match cmp {
                Some(cmp) => draft.params.sort_by(|a, b| cmp(a, b)),
                None => draft.params.sort_by(|a, b| {
                    (a.kind(), a.has_default(), a.name())
                        .cmp(&(b.kind(), b.has_default(), b.name()))
                }),
            },

            Inner::Compose(revisions) => {
                for revision in revisions {
                    draft = revision.apply_draft(draft)?;
                }
            }

            Inner::Delete(selector) => {
                let matched: Vec<usize> = matched_indices(&draft.params, selector);
                if matched.is_empty() {
                    return Err(SignatureError::SelectorNotFound);
                }
                for &i in &matched {
                    let param = &draft.params[i];
                    if !param.has_default() && !param.kind().is_variadic() {
                        return Err(SignatureError::UndeletableParameter(SmolStr::new(
                            param.name(),
                        )));
                    }
                }
                let mut index = 0;
                draft.params.retain(|_| {
                    let keep = !matched.contains(&index);
                    index += 1;
                    keep
                });
            }

            Inner::Insert { params, anchor } => {
                let at = anchor.resolve(&draft.params)?;
                draft.params.splice(at..at, params.iter().cloned());
            }

            Inner::Modify {
                selector,
                multiple,
                update,
            } => {
                let matched = matched_indices(&draft.params, selector);
                if matched.is_empty() {
                    return Err(SignatureError::SelectorNotFound);
                }
                if matched.len() > 1 && !multiple {
                    return Err(SignatureError::AmbiguousModify(matched.len()));
                }
                for i in matched {
                    draft.params[i] = draft.params[i].updated(update);
                }
            }

            Inner::Replace { selector, param } => {
                let matched = matched_indices(&draft.params, selector);
                if matched.is_empty() {
                    return Err(SignatureError::SelectorNotFound);
                }
                for i in matched {
                    draft.params[i] = param.clone();
                }
            }

            Inner::Translocate { selector, anchor } => {
                let matched = matched_indices(&draft.params, selector);
                if matched.is_empty() {
                    return Err(SignatureError::SelectorNotFound);
                }
                let mut moved = Vec::with_capacity(matched.len());
                let mut remaining = Vec::with_capacity(draft.params.len() - matched.len());
                for (i, param) in draft.params.drain(..).enumerate() {
                    if matched.contains(&i) {
                        moved.push(param);
                    } else {
                        remaining.push(param);
                    }
                }
                let at = anchor.resolve(&remaining)?;
                remaining.splice(at..at, moved);
                draft.params = remaining;
            }
        }
        Ok(draft)
    }

    fn kind_name(&self) -> &'static str {
        match &self.inner {
            Inner::Synthesize(_) => "synthesize",
            Inner::Copy { .. } => "copy",
            Inner::Manage(_) => "manage",
            Inner::Returns(_) => "returns",
            Inner::Sort(_) => "sort",
            Inner::Compose(_) => "compose",
            Inner::Delete(_) => "delete",
            Inner::Insert { .. } => "insert",
            Inner::Modify { .. } => "modify",
            Inner::Replace { .. } => "replace",
            Inner::Translocate { .. } => "translocate",
        }
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision::{}", self.kind_name())
    }
}

fn matched_indices(params: &[Parameter], selector: &Selector) -> Vec<usize> {
    params
        .iter()
        .enumerate()
        .filter(|(_, p)| selector.matches(p))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{arg, kwarg, pos, vpo};

    fn base() -> Signature {
        Signature::new(vec![arg("a"), arg("b").with_default(2), kwarg("c")]).unwrap()
    }

    fn names(signature: &Signature) -> Vec<String> {
        signature.iter().map(|p| p.name().to_string()).collect()
    }

    #[test]
    fn test_synthesize_replaces_everything() {
        let next = Revision::synthesize([pos("x"), vpo("rest")])
            .apply(&base())
            .unwrap();
        assert_eq!(names(&next), vec!["x", "rest"]);
    }

    #[test]
    fn test_synthesize_named_orders_by_creation() {
        let second = arg("ignored");
        let first = arg("ignored_too");
        // `second` was created before `first`, so it leads regardless of the
        // entry order given here
        let next = Revision::synthesize_named([("beta", first), ("alpha", second)])
            .apply(&Signature::empty())
            .unwrap();
        assert_eq!(names(&next), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_returns_sets_annotation_only() {
        let next = Revision::returns("i64").apply(&base()).unwrap();
        assert_eq!(next.return_annotation(), Some("i64"));
        assert_eq!(names(&next), names(&base()));
    }

    #[test]
    fn test_sort_is_idempotent() {
        let scrambled = Signature::new(vec![
            arg("z"),
            arg("a").with_default(1),
            kwarg("m"),
        ])
        .unwrap();
        let once = Revision::sort().apply(&scrambled).unwrap();
        let twice = Revision::sort().apply(&once).unwrap();
        assert_eq!(names(&once), vec!["z", "a", "m"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_delete_requires_default_or_variadic() {
        let err = Revision::delete("a").apply(&base()).unwrap_err();
        assert!(matches!(err, SignatureError::UndeletableParameter(n) if n == "a"));

        let next = Revision::delete("b").apply(&base()).unwrap();
        assert_eq!(names(&next), vec!["a", "c"]);
    }

    #[test]
    fn test_delete_unmatched_fails() {
        let err = Revision::delete("zzz").apply(&base()).unwrap_err();
        assert!(matches!(err, SignatureError::SelectorNotFound));
    }

    #[test]
    fn test_insert_anchors() {
        let next = Revision::insert(pos("first"), Anchor::Index(0))
            .apply(&base())
            .unwrap();
        assert_eq!(names(&next), vec!["first", "a", "b", "c"]);

        let err = Revision::insert(arg("x"), Anchor::Index(9)).apply(&base()).unwrap_err();
        assert!(matches!(err, SignatureError::IndexOutOfBounds { index: 9, .. }));
    }

    #[test]
    fn test_insert_after() {
        let next = Revision::insert(arg("mid").with_default(0), Anchor::After(Selector::from("a")))
            .apply(&base())
            .unwrap();
        assert_eq!(names(&next), vec!["a", "mid", "b", "c"]);
    }

    #[test]
    fn test_insert_missing_anchor() {
        let err = Revision::insert(arg("x"), Anchor::Before(Selector::from("zzz")))
            .apply(&base())
            .unwrap_err();
        assert!(matches!(err, SignatureError::AnchorNotFound));
    }

    #[test]
    fn test_modify_single_match_guard() {
        let update = ParamUpdate::new().default(9);
        let err = Revision::modify(Selector::predicate(|_| true), false, update.clone())
            .apply(&base())
            .unwrap_err();
        assert!(matches!(err, SignatureError::AmbiguousModify(3)));

        let next = Revision::modify("c", false, update).apply(&base()).unwrap();
        assert_eq!(next.get("c").unwrap().default(), Some(&crate::Value::Int(9)));
    }

    #[test]
    fn test_replace_swaps_parameter_object() {
        let next = Revision::replace("b", arg("b2").with_default(5))
            .apply(&base())
            .unwrap();
        assert_eq!(names(&next), vec!["a", "b2", "c"]);
    }

    #[test]
    fn test_translocate_moves_without_changes() {
        let signature = Signature::new(vec![kwarg("x"), kwarg("y"), kwarg("z")]).unwrap();
        let next = Revision::translocate("z", Anchor::Index(0))
            .apply(&signature)
            .unwrap();
        assert_eq!(names(&next), vec!["z", "x", "y"]);

        let next = Revision::translocate("x", Anchor::After(Selector::from("y")))
            .apply(&signature)
            .unwrap();
        assert_eq!(names(&next), vec!["y", "x", "z"]);
    }

    #[test]
    fn test_compose_validates_only_the_end() {
        // deleting "b" then re-adding it produces a transiently... rather:
        // moving "c" before "a" is invalid alone (keyword-only before
        // positional) until a follow-up turns "c" into a positional kind
        let break_order = Revision::translocate("c", Anchor::Index(0));
        let repair = Revision::modify(
            "c",
            false,
            ParamUpdate::new().kind(crate::param::ParameterKind::PositionalOrKeyword),
        );

        let err = break_order.apply(&base()).unwrap_err();
        assert!(matches!(err, SignatureError::KindOrder { .. }));

        let composed = Revision::compose([break_order, repair]);
        let next = composed.apply(&base()).unwrap();
        assert_eq!(names(&next), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_manage_arbitrary_function() {
        let reverse = Revision::manage(|params| Ok(params.iter().rev().cloned().collect()));
        let signature = Signature::new(vec![kwarg("x"), kwarg("y")]).unwrap();
        let next = reverse.apply(&signature).unwrap();
        assert_eq!(names(&next), vec!["y", "x"]);
    }

    #[test]
    fn test_copy_filters() {
        let source = base();
        let all = Revision::copy(source.clone())
            .apply(&Signature::empty())
            .unwrap();
        assert_eq!(names(&all), vec!["a", "b", "c"]);

        let included = Revision::copy_include(source.clone(), ["a", "b"])
            .apply(&Signature::empty())
            .unwrap();
        assert_eq!(names(&included), vec!["a", "b"]);

        let excluded = Revision::copy_exclude(source, "a")
            .apply(&Signature::empty())
            .unwrap();
        assert_eq!(names(&excluded), vec!["b", "c"]);
    }
}
