pub mod admin;
pub mod transport;

pub use admin::*;
pub use transport::*;
