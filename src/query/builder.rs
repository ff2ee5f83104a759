//! Fluent construction and execution of searches

use super::executor::SearchExecutor;
use super::types::{FileRecord, SearchMode, SearchQuery};
use crate::backend::ConnectionHandle;
use std::path::PathBuf;

/// Accumulates a [`SearchQuery`] and runs it on the current connection
///
/// ```ignore
/// let files = ctx
///     .query_builder()
///     .search_for("report.docx")
///     .mode(SearchMode::FilesOnly)
///     .query();
/// ```
pub struct QueryBuilder<'a> {
    executor: &'a SearchExecutor,
    connection: &'a ConnectionHandle,
    keywords: Option<String>,
    mode: SearchMode,
    folders: Vec<PathBuf>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(executor: &'a SearchExecutor, connection: &'a ConnectionHandle) -> Self {
        Self {
            executor,
            connection,
            keywords: None,
            mode: SearchMode::All,
            folders: Vec::new(),
        }
    }

    pub fn search_for(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Restrict the search to these directory trees
    pub fn in_folders<I, P>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.folders = folders.into_iter().map(Into::into).collect();
        self
    }

    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn build(&self) -> SearchQuery {
        SearchQuery::new(
            self.keywords.clone().unwrap_or_default(),
            self.mode,
            Some(self.folders.clone()),
        )
    }

    /// Run the search
    ///
    /// A missing or blank keyword returns nothing without touching the engine.
    pub fn query(self) -> Vec<FileRecord> {
        let query = self.build();
        if query.is_blank() {
            return Vec::new();
        }

        let client = self.connection.client();
        self.executor.execute(client.as_deref(), &query)
    }
}
