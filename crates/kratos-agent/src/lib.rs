//! kratos-agent: exposes the Kratos pipeline to people (CLI) and to other
//! agents (HTTP envelope transport).
//!
//! The transport is a thin adapter. It holds no conversation state; every
//! request envelope becomes one independent `Pipeline::ask` call.

pub mod server;

pub use server::{create_router, AppState};
