mod client;
mod error;
mod events;
mod properties;
mod tracks;

#[cfg(test)]
mod fake;

pub use client::*;
pub use error::*;
pub use events::*;
pub use properties::*;
pub use tracks::*;
