//! Content module - post model, shaping, rich text and reading time

mod post;
pub mod reading_time;
mod richtext;
mod shaper;

pub use post::{ContentBlock, PageViewModel, Post, PrevNextReference};
pub use reading_time::{estimate, ReadingTime};
pub use richtext::{RichText, RichTextNode, Span};
pub use shaper::{shape_post, shape_reference};
