//! Runtime module — process lifecycle: boot, per-server workers, shutdown.

pub mod boot;
pub mod serve;
pub mod stop;
