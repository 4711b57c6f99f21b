pub mod asset_storage;
pub mod transcoder;
pub mod videos;
