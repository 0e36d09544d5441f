//! Interactive terminal front end

pub mod render;
pub mod session;

pub use session::run;
