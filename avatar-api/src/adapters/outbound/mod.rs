pub mod fs;
pub mod media;
