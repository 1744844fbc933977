//! HTTP request handlers organized by endpoint

pub mod stream;
pub mod video_info;

pub use stream::{stream_head, stream_video};
pub use video_info::video_info;
