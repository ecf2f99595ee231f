mod avatar;
mod conversion;
pub mod preflight;

pub use avatar::AvatarServiceImpl;
pub use conversion::ConversionOrchestrator;
