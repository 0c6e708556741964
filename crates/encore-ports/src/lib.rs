pub mod settings;
pub mod storage;
pub mod types;

pub use settings::*;
pub use storage::*;
pub use types::*;
