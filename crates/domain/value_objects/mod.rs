pub mod asset_naming;
pub mod enums;
pub mod transcoding;
pub mod upload_validation;
pub mod videos;
