pub mod ffmpeg;
pub mod mp4_layout;
