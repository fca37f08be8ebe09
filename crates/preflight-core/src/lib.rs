pub mod error;
pub mod model;
pub mod placeholder;
pub mod report;
pub mod rules;

pub use error::*;
pub use model::*;
pub use placeholder::*;
pub use report::*;
pub use rules::*;
