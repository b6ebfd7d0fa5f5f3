pub mod bar;
pub mod loader;
pub mod series;
pub mod source;

pub use bar::{Bar, MalformedBarError};
pub use loader::{load_csv, CsvBarSource};
pub use series::BarSeries;
pub use source::{BarSource, InMemoryBarSource};
