pub mod dotenv;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use dotenv::*;
pub use error::*;
pub use fs::*;
pub use memory::*;
pub use traits::*;
