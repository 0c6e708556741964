pub mod error;
pub mod export;
pub mod pipeline;

pub use error::*;
pub use export::*;
pub use pipeline::*;
