//! Sharing pods down a component tree.

mod scope;

pub use scope::Scope;
