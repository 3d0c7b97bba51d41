pub mod backup;
pub mod clock;
pub mod copy_engine;
pub mod error;
pub mod paths;
pub mod report;
pub mod validation;

pub use backup::{BackupEngine, CHANGELOG_FILE_NAME};
pub use clock::{Clock, FixedClock, LocalClock};
pub use copy_engine::{CopyEngine, CopyProgress};
pub use error::BackupError;
pub use paths::{backup_folder_name, check_target_name, destination_path, source_file_path, Kind};
pub use report::{RunReport, TargetOutcome, TargetStatus};
pub use validation::validate_run;
