//! The outward-facing pairing of a public signature with a target routine.
//!
//! An [`Adapter`] owns the [`Routine`] it fronts and the [`Mapper`] that
//! translates calls into the routine's native shape. Construction reflects
//! the routine, applies any revisions, and compiles the binding plan; every
//! failure mode surfaces here, before the first call.

use std::fmt;

use tracing::debug;

use crate::base::Value;
use crate::errors::{CallError, SignatureError};
use crate::mapper::Mapper;
use crate::reflect::{CallArguments, Routine};
use crate::revision::Revision;
use crate::signature::Signature;

#[derive(Debug, Clone)]
pub struct Adapter {
    routine: Routine,
    mapper: Mapper,
}

impl Adapter {
    /// Front `routine` with an explicit public signature.
    pub fn new(routine: Routine, signature: Signature) -> Result<Self, SignatureError> {
        let mapper = Mapper::new(signature, &routine)?;
        debug!(routine = routine.name(), mapper = %mapper, "built adapter");
        Ok(Self { routine, mapper })
    }

    /// Reflect `routine`'s own interface, fold `revisions` over it in order,
    /// and front the routine with the result.
    pub fn build(routine: Routine, revisions: &[Revision]) -> Result<Self, SignatureError> {
        let mut signature = Signature::reflect(&routine)?;
        for revision in revisions {
            signature = revision.apply(&signature)?;
        }
        Self::new(routine, signature)
    }

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    /// The public signature callers see.
    pub fn signature(&self) -> &Signature {
        self.mapper.signature()
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// Swap in a revised public signature, keeping the same routine.
    pub fn with_signature(&self, signature: Signature) -> Result<Self, SignatureError> {
        Self::new(self.routine.clone(), signature)
    }

    /// Swap in a pre-built mapper, keeping the same routine. The mapper must
    /// have been compiled against a matching interface.
    pub fn with_mapper(&self, mapper: Mapper) -> Self {
        Self {
            routine: self.routine.clone(),
            mapper,
        }
    }

    /// Bind `call` against the public signature and dispatch to the routine.
    /// The routine's own error, if any, passes through untouched.
    pub fn call(&self, call: CallArguments) -> Result<Value, CallError> {
        let bound = self.mapper.map(call)?;
        self.routine.invoke(bound).map_err(CallError::Target)
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.routine.name(), self.signature())
    }
}
