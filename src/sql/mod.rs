//! SQL text for staging and merging, plus the values staged alongside it.

mod builder;
pub mod params;
pub mod types;
pub use builder::*;
pub use params::*;
pub use types::*;
