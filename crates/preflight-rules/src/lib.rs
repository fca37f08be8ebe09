pub mod document;
pub mod profile;

pub use document::*;
pub use profile::*;
