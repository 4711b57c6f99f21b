pub mod local_assets;
