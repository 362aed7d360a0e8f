//! Helper functions shared by the renderer and templates

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
