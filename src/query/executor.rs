//! Query execution against a connected engine
//!
//! Every query allocates its own search state and result list and releases
//! both before returning, whatever the outcome.

use super::translator::translate_query;
use super::types::{FileRecord, FileType, SearchQuery};
use crate::engine::{EngineClient, EngineError, EngineResult, Property, ResultList, SearchState};
use tracing::{debug, error, info};

/// Default cap on the rows the engine materializes per query
pub const DEFAULT_VIEWPORT_COUNT: usize = 200;

/// Scratch buffer size for text properties, in UTF-16 units
const MAX_PATH: usize = 32767;

/// Properties requested for every query
const REQUESTED_PROPERTIES: [Property; 4] = [
    Property::FullPath,
    Property::FileName,
    Property::Size,
    Property::IsFolder,
];

/// Runs translated queries and marshals results into [`FileRecord`]s
#[derive(Debug, Clone)]
pub struct SearchExecutor {
    viewport_count: usize,
}

impl Default for SearchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_COUNT)
    }
}

impl SearchExecutor {
    pub fn new(viewport_count: usize) -> Self {
        Self { viewport_count }
    }

    pub fn viewport_count(&self) -> usize {
        self.viewport_count
    }

    /// Execute a query, logging failures and returning no results for them
    pub fn execute(&self, client: Option<&EngineClient>, query: &SearchQuery) -> Vec<FileRecord> {
        match self.try_execute(client, query) {
            Ok(records) => records,
            Err(e) => {
                error!(condition = e.condition(), "search for {:?} failed: {}", query.keywords(), e);
                Vec::new()
            }
        }
    }

    /// Execute a query, reporting why it produced nothing
    pub fn try_execute(
        &self,
        client: Option<&EngineClient>,
        query: &SearchQuery,
    ) -> EngineResult<Vec<FileRecord>> {
        let client = client.ok_or(EngineError::Unavailable)?;
        let session = client.session();
        if !session.is_ready() {
            return Err(EngineError::NotReady);
        }

        let text = translate_query(query);

        let state = SearchState::create(client.api())
            .ok_or(EngineError::CallFailure("create search state"))?;
        state.set_viewport_count(self.viewport_count);
        for property in REQUESTED_PROPERTIES {
            state.request(property);
        }
        state.set_text(&text);

        info!(text = %text, "executing search");
        let results =
            ResultList::search(&session, &state).ok_or(EngineError::CallFailure("search"))?;

        let count = results.len();
        let mut buffer = vec![0u16; MAX_PATH];
        let mut records = Vec::with_capacity(count);

        for index in 0..count {
            let record = read_record(&results, index, &mut buffer);
            if record.full_path.is_empty() {
                debug!(index, "skipping result without a path");
                continue;
            }
            records.push(record);
        }

        info!(count = records.len(), "search finished");
        Ok(records)
    }
}

/// Pull the requested properties of one result row
fn read_record(results: &ResultList<'_>, index: usize, buffer: &mut [u16]) -> FileRecord {
    let full_path = results.text(index, Property::FullPath, buffer);
    let name = results.text(index, Property::FileName, buffer);
    let size = results.size(index);
    let file_type = FileType::from_folder_flag(results.byte(index, Property::IsFolder));

    FileRecord {
        name,
        full_path,
        size,
        file_type,
    }
}
