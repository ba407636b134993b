pub mod config;
pub mod render;
pub mod search;
pub mod source;

pub(crate) mod registry;
pub(crate) mod selection;
pub(crate) mod window;

mod error;
mod host;
mod palette;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use host::{GroupHeading, HostElement, InlineItem};
pub use palette::CommandPalette;
pub use registry::{Candidate, Registry};
pub use selection::{SelectionChange, SelectionController, UpdateOrigin};
pub use window::ResultWindow;

pub use rz_command_types::*;
