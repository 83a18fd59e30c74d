//! Renderer contract and type-string resolution.

pub(crate) mod command;
pub(crate) mod plugin;
pub(crate) mod renderer;
pub(crate) mod resolve;
