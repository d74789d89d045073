pub mod client;
pub mod copier;
pub mod error;
pub mod fs;
pub mod local;
pub mod session;
