//! 多语言支持：语言协商、翻译资源与页面元数据

pub mod locale;
pub mod messages;
pub mod store;

pub use locale::{LocaleSettings, normalize};
pub use messages::{Messages, interpolate};
pub use store::{I18nError, MessageStore, PageMetadata};
