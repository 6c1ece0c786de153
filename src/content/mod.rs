//! 内容层：扁平文件存储与查询

pub mod model;
pub mod query;
pub mod store;

pub use model::{ContentItem, ContentKind, ContentSummary};
pub use query::{ContentFilter, ContentQuery, Page, SortField, SortOrder};
pub use store::{Adjacent, ContentError, ContentStore, TagCount};
