mod handler;
mod model;

pub use handler::{get_content, list_content, list_tags};
pub use model::ContentListParams;
