pub mod archive_service;
pub mod artifact_store;
pub mod chrome_site;
pub mod receipt_service;
pub mod run_log;
pub mod site;

pub use archive_service::{archive_folder_with_zip, verify_artifacts, ArchiveReport};
pub use artifact_store::ArtifactStore;
pub use chrome_site::ChromeSite;
pub use receipt_service::{Receipt, ReceiptService, RobotScreenshot};
pub use run_log::RunLog;
pub use site::{OrderSite, SubmitOutcome};
