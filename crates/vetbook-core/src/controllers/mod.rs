//! Screen controllers.
//!
//! Each controller owns the state one screen renders and the [`Lifetime`]
//! that screen cancels when it goes away.

mod detail;
mod lifetime;
mod list;

pub use detail::*;
pub use lifetime::*;
pub use list::*;
