// Domain-driven module structure for the Squad stat source.

// Core infrastructure
pub mod conf;
pub mod parser;
pub mod registry;
pub mod table;

// Domain modules
pub mod checkpoint;
pub mod events;
pub mod runtime;
pub mod session;
pub mod sink;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;
