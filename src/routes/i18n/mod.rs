mod handler;
mod model;

pub use handler::{detect_locale, get_messages, page_metadata, switch_locale};
