//! Domain models for the dental clinic core.

mod indices;
mod patient;
mod record;
mod tooth;

pub use indices::*;
pub use patient::*;
pub use record::*;
pub use tooth::*;
