// Local file sources of bar data
pub mod csv_bars;

pub use csv_bars::{load_series, read_series};
