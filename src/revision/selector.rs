//! Parameter selectors used by revisions to pick their targets.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::param::Parameter;

type PredicateFn = Arc<dyn Fn(&Parameter) -> bool + Send + Sync>;

/// Matches parameters by public name, name set, or arbitrary predicate.
#[derive(Clone)]
pub enum Selector {
    Name(SmolStr),
    Names(Vec<SmolStr>),
    Predicate(PredicateFn),
}

impl Selector {
    pub fn name(name: impl Into<SmolStr>) -> Self {
        Selector::Name(name.into())
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Selector::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn predicate(f: impl Fn(&Parameter) -> bool + Send + Sync + 'static) -> Self {
        Selector::Predicate(Arc::new(f))
    }

    pub fn matches(&self, param: &Parameter) -> bool {
        match self {
            Selector::Name(name) => param.name() == name,
            Selector::Names(names) => names.iter().any(|n| param.name() == n),
            Selector::Predicate(f) => f(param),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write!(f, "Selector::Name({name:?})"),
            Selector::Names(names) => write!(f, "Selector::Names({names:?})"),
            Selector::Predicate(_) => write!(f, "Selector::Predicate(..)"),
        }
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::name(name)
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::name(name)
    }
}

impl<const N: usize> From<[&str; N]> for Selector {
    fn from(names: [&str; N]) -> Self {
        Selector::names(names)
    }
}

impl From<&[&str]> for Selector {
    fn from(names: &[&str]) -> Self {
        Selector::names(names.iter().copied())
    }
}
