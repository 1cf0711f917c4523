pub mod site_collector;
pub mod site_models;
pub mod slug;

pub use site_collector::SiteCollector;
pub use site_models::{DocumentRecord, DriveEntry, DriveSource, ImageStore, SiteError};
