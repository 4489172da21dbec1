pub mod coordinates;
pub mod loader;
pub mod progress;
pub mod report;
pub mod source;

pub use coordinates::CoordinateIndex;
pub use loader::{
    LoadError, LoadOptions, LoadOutcome, LoadStats, Loader, PreparedRecord, prepare_record,
};
pub use progress::{LoadProgress, LogProgress, SilentProgress};
pub use report::{LoadReport, ReportEntry, ReportSummary};
pub use source::{Datasets, SourceError, read_csv_rows, read_json_rows, read_rows};
