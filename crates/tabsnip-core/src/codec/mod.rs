//! Image codec: cropping captured frames and data-URL packaging.

mod crop;
pub mod data_url;

pub use crop::crop_frame;
