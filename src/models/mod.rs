//! # Models
//!
//! Identity and payload types shared by every stage: which method is being
//! called, how it returns, and the positional arguments it was called with.

pub mod arguments;
pub mod method;

pub use arguments::{Argument, Arguments};
pub use method::{CallShape, MethodDescriptor, MethodIdentity};
