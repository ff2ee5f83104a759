//! Query and result value types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which kinds of entries a query matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Files and folders
    #[default]
    All,
    FilesOnly,
    FoldersOnly,
}

impl SearchMode {
    /// Engine grammar prefix placed before the keyword
    pub fn query_prefix(self) -> &'static str {
        match self {
            SearchMode::All => "",
            SearchMode::FilesOnly => "file: ",
            SearchMode::FoldersOnly => "folder: ",
        }
    }
}

/// An immutable search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keywords: String,
    mode: SearchMode,
    scope: Option<Vec<PathBuf>>,
}

impl SearchQuery {
    pub fn new(keywords: impl Into<String>, mode: SearchMode, scope: Option<Vec<PathBuf>>) -> Self {
        Self {
            keywords: keywords.into(),
            mode,
            scope,
        }
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Directory trees the query is restricted to, if any
    pub fn scope(&self) -> Option<&[PathBuf]> {
        self.scope.as_deref()
    }

    /// True if the keyword is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.keywords.trim().is_empty()
    }
}

/// Kind of a matched entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Folder,
}

impl FileType {
    /// Derive the type from the engine's folder-flag byte
    pub fn from_folder_flag(flag: u8) -> Self {
        if flag != 0 {
            FileType::Folder
        } else {
            FileType::File
        }
    }
}

/// One search hit, independent of the engine that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub full_path: String,
    /// Size in bytes
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: FileType,
}

impl FileRecord {
    pub fn is_folder(&self) -> bool {
        self.file_type == FileType::Folder
    }
}
