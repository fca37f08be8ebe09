pub mod check;
pub mod validator;

pub use check::*;
pub use validator::*;
