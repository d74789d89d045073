pub mod core;
pub mod job;
pub mod mapping;
pub mod partition;
pub mod staging;
