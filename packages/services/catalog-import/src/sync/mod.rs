pub mod dispatch;
pub mod engine;
pub mod reconcile;

pub use dispatch::*;
pub use engine::*;
pub use reconcile::*;
