//! Owning guards for engine handles
//!
//! Each guard destroys its handle in `Drop`, so release happens on every
//! exit path of a query, including early returns through `?`.

use super::{ClientPtr, EngineApi, Property, ResultListPtr, SearchStatePtr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A connected engine client
///
/// At most one exists per application run. The native client makes no
/// guarantee about concurrent use, so every call on it goes through a
/// [`ClientSession`], which holds the client exclusively.
pub struct EngineClient {
    api: Arc<dyn EngineApi>,
    ptr: ClientPtr,
    query_lock: Mutex<()>,
}

impl EngineClient {
    /// Try to connect to a named engine instance
    /// Returns None if the engine is not accepting connections yet
    pub fn connect(api: Arc<dyn EngineApi>, instance_name: &str) -> Option<Self> {
        let ptr = api.connect(instance_name)?;
        Some(Self {
            api,
            ptr,
            query_lock: Mutex::new(()),
        })
    }

    pub fn api(&self) -> &dyn EngineApi {
        self.api.as_ref()
    }

    pub fn ptr(&self) -> ClientPtr {
        self.ptr
    }

    /// Whether the engine reports its database as loaded
    ///
    /// Waits for any query in flight.
    pub fn is_ready(&self) -> bool {
        self.session().is_ready()
    }

    /// Take exclusive use of the client, blocking while another session is open
    pub fn session(&self) -> ClientSession<'_> {
        let exclusive = self
            .query_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        ClientSession {
            client: self,
            _exclusive: exclusive,
        }
    }
}

/// Exclusive use of an [`EngineClient`] for the duration of one query
pub struct ClientSession<'a> {
    client: &'a EngineClient,
    _exclusive: MutexGuard<'a, ()>,
}

impl<'a> ClientSession<'a> {
    pub fn client(&self) -> &'a EngineClient {
        self.client
    }

    pub fn is_ready(&self) -> bool {
        self.client.api.is_db_loaded(self.client.ptr)
    }
}

impl Drop for EngineClient {
    fn drop(&mut self) {
        debug!(client = self.ptr.id(), "destroying engine client");
        self.api.destroy_client(self.ptr);
    }
}

impl std::fmt::Debug for EngineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineClient").field("ptr", &self.ptr).finish()
    }
}

/// Search configuration for a single query
pub struct SearchState<'a> {
    api: &'a dyn EngineApi,
    ptr: SearchStatePtr,
}

impl<'a> SearchState<'a> {
    pub fn create(api: &'a dyn EngineApi) -> Option<Self> {
        let ptr = api.create_search_state()?;
        Some(Self { api, ptr })
    }

    pub fn ptr(&self) -> SearchStatePtr {
        self.ptr
    }

    pub fn set_text(&self, text: &str) {
        self.api.set_search_text(self.ptr, text);
    }

    pub fn set_viewport_count(&self, count: usize) {
        self.api.set_viewport_count(self.ptr, count);
    }

    pub fn request(&self, property: Property) {
        self.api.add_property_request(self.ptr, property);
    }
}

impl Drop for SearchState<'_> {
    fn drop(&mut self) {
        self.api.destroy_search_state(self.ptr);
    }
}

/// Results of one executed search
pub struct ResultList<'a> {
    api: &'a dyn EngineApi,
    ptr: ResultListPtr,
}

impl<'a> ResultList<'a> {
    /// Run the configured search within a session
    /// Returns None if the engine reports failure
    pub fn search(session: &ClientSession<'a>, state: &SearchState<'_>) -> Option<Self> {
        let client = session.client();
        let api = client.api();
        let ptr = api.search(client.ptr(), state.ptr())?;
        Some(Self { api, ptr })
    }

    pub fn len(&self) -> usize {
        self.api.result_count(self.ptr)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a text property, using `buffer` as scratch space
    pub fn text(&self, index: usize, property: Property, buffer: &mut [u16]) -> String {
        let written = self
            .api
            .property_text(self.ptr, index, property, buffer)
            .min(buffer.len());
        let end = buffer[..written]
            .iter()
            .position(|&unit| unit == 0)
            .unwrap_or(written);
        String::from_utf16_lossy(&buffer[..end])
    }

    pub fn size(&self, index: usize) -> u64 {
        self.api.result_size(self.ptr, index)
    }

    pub fn byte(&self, index: usize, property: Property) -> u8 {
        self.api.property_byte(self.ptr, index, property)
    }
}

impl Drop for ResultList<'_> {
    fn drop(&mut self) {
        self.api.destroy_result_list(self.ptr);
    }
}
