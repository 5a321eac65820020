//! # veneer
//!
//! Core library for constructing public call signatures, revising them with a
//! composable revision algebra, and binding calls through them onto target
//! routines with their own native interfaces.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! adapter   → Routine + revised signature + compiled mapper
//!   ↓
//! mapper    → Binding plan compilation, multi-phase argument binding
//!   ↓
//! revision  → Signature transformations (synthesize, insert, modify, ...)
//!   ↓
//! signature → Validated, ordered parameter sequences
//!   ↓
//! param     → Parameter descriptors, kinds, persistent updates
//!   ↓
//! reflect   → Target interface descriptors, Routine, CallArguments
//!   ↓
//! base      → Primitives (Value, callback wrappers, BoxError)
//! ```

// ============================================================================
// MODULES (dependency order: base → reflect → param → signature → revision →
// mapper → adapter)
// ============================================================================

/// Foundation types: Value, Factory/Converter/Validator, BoxError
pub mod base;

/// Process-wide switches: the validator toggle
pub mod config;

/// Error taxonomy: build-time, bind-time, and call-time failures
pub mod errors;

/// Parameter descriptors: kinds, defaults, pipelines, persistent updates
pub mod param;

/// Reflection surface: InterfaceParam, Reflectable, Routine, CallArguments
pub mod reflect;

/// Signatures: validated, ordered parameter sequences
pub mod signature;

/// Revision algebra: composable signature transformations
pub mod revision;

/// Binding engine: plan compilation and argument binding
pub mod mapper;

/// Adapters: a routine fronted by a revised public signature
pub mod adapter;

// Re-export commonly needed items
pub use adapter::Adapter;
pub use base::{BoxError, Converter, Factory, Validator, Value};
pub use config::{run_validators, set_run_validators};
pub use errors::{BindingError, CallError, SignatureError};
pub use mapper::Mapper;
pub use param::{ParamUpdate, Parameter, ParameterKind, arg, ctx, kwarg, pos, vkw, vpo};
pub use reflect::{CallArguments, InterfaceParam, Reflectable, Routine};
pub use revision::{Anchor, Revision, Selector};
pub use signature::Signature;
