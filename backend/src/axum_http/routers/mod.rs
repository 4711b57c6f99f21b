pub mod videos;
