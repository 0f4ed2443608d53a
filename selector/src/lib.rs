mod host;
mod lang;
mod resolve;
mod track;
mod wait;

#[cfg(test)]
mod fake;

pub use host::*;
pub use lang::*;
pub use resolve::*;
pub use track::*;
pub use wait::*;
