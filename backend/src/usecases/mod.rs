pub mod asset_ingestion;
pub mod upload_locks;
