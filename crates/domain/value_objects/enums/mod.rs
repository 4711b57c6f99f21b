pub mod asset_classes;
