/// Conversion features detected at startup. Never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub alt_format_available: bool,
}

impl Capabilities {
    pub fn new(alt_format_available: bool) -> Self {
        Self {
            alt_format_available,
        }
    }
}
