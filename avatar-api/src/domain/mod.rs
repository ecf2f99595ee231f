pub mod authorization;
mod error;
pub mod models;
pub mod negotiation;
pub mod ports;
pub mod services;
pub mod source;

pub use error::*;
