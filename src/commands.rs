pub mod ingest;
pub mod inventory;
pub mod show;
pub mod status;
