// Market data model: bars and series
pub mod bar;

pub use bar::{Bar, Columns, Series};
