//! # IPC Module
//!
//! The invocation surface: a function name plus a string argument list in,
//! a structured response out.
//!
//! ## Argument convention
//!
//! `args[0]` is the caller's username and `args[1]` the caller's role; the
//! operation's own arguments follow. The role is parsed and authorized before
//! the arity is checked or any argument is decoded.
//!
//! ## Modules
//!
//! - `dispatch`: `InvocationHandler` routing invocations to the service
//! - `payloads`: response and error types

pub mod dispatch;
pub mod payloads;

pub use dispatch::InvocationHandler;
pub use payloads::{InvocationError, InvocationResponse};
