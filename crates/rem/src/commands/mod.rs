//! CLI command implementations.

pub(crate) mod grammar;
pub(crate) mod render;

pub(crate) use grammar::GrammarArgs;
pub(crate) use render::RenderArgs;
