//! The Ignition kernel: bootstrap orchestration for the micro-framework.
//!
//! A [`Kernel`] is constructed with an environment name and a debug flag.
//! Its first [`boot`](Kernel::boot) either loads a fresh cached artifact or
//! assembles, dumps, and publishes a new generation, then adopts the
//! resulting [`Container`] for the rest of the process lifetime.

#![warn(missing_docs)]

mod container;
mod deprecation;
mod error;
mod hooks;
mod http;
mod kernel;

pub use container::{Container, KernelInfo};
pub use deprecation::{DeprecationCollector, DeprecationEntry};
pub use error::BootError;
pub use hooks::KernelHooks;
pub use http::{Request, RequestHandler, Response, REQUEST_HANDLER_ID};
pub use kernel::Kernel;
