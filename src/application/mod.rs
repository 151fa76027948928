// Application layer - use cases and orchestration between consumers and storage

pub mod error;
pub mod screen;
pub mod service;

pub use error::*;
pub use screen::*;
pub use service::*;
