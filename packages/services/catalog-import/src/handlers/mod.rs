pub mod csv;
pub mod sheet;
pub mod xlsx;

pub use self::csv::*;
pub use self::sheet::*;
pub use self::xlsx::*;
