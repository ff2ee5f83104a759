//! Boundary to the external file-search engine
//!
//! The engine is a separate process (Everything 1.5) reached through the
//! native IPC client shipped in its SDK. This module defines the minimal
//! surface the rest of the crate depends on:
//!
//! - [`EngineApi`] - the native call table (implemented by [`Everything3`])
//! - [`ClientPtr`], [`SearchStatePtr`], [`ResultListPtr`] - opaque handles
//! - [`EngineClient`], [`SearchState`], [`ResultList`] - owning guards that
//!   destroy their handle exactly once when dropped
//!
//! Handles are never inspected; they are only passed back to the engine.

mod everything3;
mod handles;

pub use everything3::Everything3;
pub use handles::{ClientSession, EngineClient, ResultList, SearchState};

use std::ffi::c_void;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur when talking to the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No client handle: the engine was never connected
    #[error("engine unavailable: no client connection")]
    Unavailable,
    /// Connected, but the engine has not finished loading its database
    #[error("engine not ready: database is not loaded yet")]
    NotReady,
    /// A native call returned null or reported failure mid-query
    #[error("engine call failed: {0}")]
    CallFailure(&'static str),
    /// The SDK library could not be loaded
    #[error("failed to load engine SDK {}: {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    /// The SDK library does not export a required function
    #[error("engine SDK does not export {0}")]
    MissingSymbol(&'static str),
}

impl EngineError {
    /// Short condition name used as a structured log field
    pub fn condition(&self) -> &'static str {
        match self {
            EngineError::Unavailable => "EngineUnavailable",
            EngineError::NotReady => "EngineNotReady",
            EngineError::CallFailure(_) => "EngineCallFailure",
            EngineError::LibraryLoad { .. } => "EngineLibraryLoad",
            EngineError::MissingSymbol(_) => "EngineMissingSymbol",
        }
    }
}

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroUsize);

        impl $name {
            /// Wrap a raw pointer returned by the engine; null yields `None`
            pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
                NonZeroUsize::new(ptr as usize).map(Self)
            }

            /// Build a handle from a plain identifier (for non-native engines)
            pub fn from_id(id: usize) -> Option<Self> {
                NonZeroUsize::new(id).map(Self)
            }

            pub fn as_ptr(self) -> *mut c_void {
                self.0.get() as *mut c_void
            }

            pub fn id(self) -> usize {
                self.0.get()
            }
        }
    };
}

opaque_handle!(
    /// Connection to a running engine instance
    ClientPtr
);
opaque_handle!(
    /// Per-query search configuration
    SearchStatePtr
);
opaque_handle!(
    /// Materialized result buffer for one query
    ResultListPtr
);

/// Result properties the engine can be asked to materialize
///
/// Values are the SDK's `EVERYTHING3_PROPERTY_ID_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Property {
    FileName = 0,
    Size = 2,
    FullPath = 240,
    IsFolder = 248,
}

impl Property {
    pub fn id(self) -> u32 {
        self as u32
    }
}

/// Native call table of the engine's IPC client
///
/// Every handle returned by a `create`/`connect`/`search` call must be
/// released with the matching `destroy_*` call. Callers should go through
/// the guard types instead of calling the destroy functions directly.
pub trait EngineApi: Send + Sync {
    /// Connect to a named engine instance
    fn connect(&self, instance_name: &str) -> Option<ClientPtr>;

    /// Whether the engine has finished loading its database
    fn is_db_loaded(&self, client: ClientPtr) -> bool;

    fn create_search_state(&self) -> Option<SearchStatePtr>;

    fn set_search_text(&self, state: SearchStatePtr, text: &str);

    /// Cap the number of rows the engine materializes
    fn set_viewport_count(&self, state: SearchStatePtr, count: usize);

    fn add_property_request(&self, state: SearchStatePtr, property: Property);

    fn search(&self, client: ClientPtr, state: SearchStatePtr) -> Option<ResultListPtr>;

    /// Number of rows in the result viewport
    fn result_count(&self, list: ResultListPtr) -> usize;

    /// Copy a text property into `buffer`, returning the number of UTF-16
    /// units written (excluding any terminator)
    fn property_text(
        &self,
        list: ResultListPtr,
        index: usize,
        property: Property,
        buffer: &mut [u16],
    ) -> usize;

    fn result_size(&self, list: ResultListPtr, index: usize) -> u64;

    fn property_byte(&self, list: ResultListPtr, index: usize, property: Property) -> u8;

    fn destroy_search_state(&self, state: SearchStatePtr);

    fn destroy_result_list(&self, list: ResultListPtr);

    fn destroy_client(&self, client: ClientPtr);
}
