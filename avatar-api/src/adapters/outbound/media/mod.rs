mod imagemagick;
#[cfg(test)]
mod mock;

pub use imagemagick::ImageMagickConverter;
#[cfg(test)]
pub use mock::{ConvertCall, MockImageConverter};
