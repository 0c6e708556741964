pub mod aggregate;
pub mod matcher;
pub mod metrics;
pub mod report;

pub use aggregate::*;
pub use matcher::*;
pub use metrics::*;
pub use report::*;
