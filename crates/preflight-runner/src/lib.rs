pub mod config;
pub mod render;
pub mod runner;
pub mod util;

pub use config::*;
pub use render::*;
pub use runner::*;
pub use util::*;
