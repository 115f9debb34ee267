//! Domain models for vetbook.

mod reservation;
mod status;
mod status_override;

pub use reservation::*;
pub use status::*;
pub use status_override::*;

#[cfg(test)]
pub(crate) use reservation::fixtures;
