//! Services behind the HTTP routes.

pub mod agencies;
pub mod sample;
pub mod titles;

#[cfg(test)]
pub(crate) mod testing;

pub use agencies::{AgencyDirectory, AgencySummary};
pub use titles::{TitleService, TitleWordCount};
