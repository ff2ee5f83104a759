pub mod builder;
pub mod executor;
pub mod translator;
pub mod types;

pub use builder::QueryBuilder;
pub use executor::SearchExecutor;
pub use translator::translate_query;
pub use types::{FileRecord, FileType, SearchMode, SearchQuery};
