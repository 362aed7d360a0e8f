//! Comment section support

mod document;
mod utterances;

pub use document::{Document, Element, NodeId};
pub use utterances::{CommentSection, CommentWidget, WidgetGuard};
