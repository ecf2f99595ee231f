mod image_converter;
mod original_store;

pub use image_converter::*;
pub use original_store::*;
