pub mod document;
pub mod selector;

pub use document::{SubtitleBlock, SubtitleDocument};
pub use selector::{select_ranges, SelectionOptions};
