mod handler;
mod model;

pub use handler::submit;
pub use model::{ContactReceipt, ContactRequest, ValidContact, Violation, is_valid_email};
