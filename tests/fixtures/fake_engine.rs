//! In-memory stand-in for the native engine
//!
//! Records every call so tests can check that handles are released exactly
//! once. Search text is interpreted just enough to filter by keyword and
//! mode.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use vortex_core::engine::{ClientPtr, EngineApi, Property, ResultListPtr, SearchStatePtr};

#[derive(Debug, Clone)]
pub struct FakeFile {
    pub name: String,
    pub full_path: String,
    pub size: u64,
    pub folder: bool,
}

impl FakeFile {
    pub fn file(full_path: &str, size: u64) -> Self {
        Self::new(full_path, size, false)
    }

    pub fn folder(full_path: &str) -> Self {
        Self::new(full_path, 0, true)
    }

    fn new(full_path: &str, size: u64, folder: bool) -> Self {
        let name = full_path
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or(full_path)
            .to_string();
        Self {
            name,
            full_path: full_path.to_string(),
            size,
            folder,
        }
    }
}

/// Call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calls {
    pub connect: usize,
    pub is_db_loaded: usize,
    pub create_search_state: usize,
    pub destroy_search_state: usize,
    pub search: usize,
    pub destroy_result_list: usize,
    pub destroy_client: usize,
    pub reads: usize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.connect
            + self.is_db_loaded
            + self.create_search_state
            + self.destroy_search_state
            + self.search
            + self.destroy_result_list
            + self.destroy_client
            + self.reads
    }
}

#[derive(Default)]
struct State {
    files: Vec<FakeFile>,
    /// Connection attempts that fail before one succeeds; None = never connects
    connect_failures: Option<usize>,
    ready: bool,
    fail_create_state: bool,
    fail_search: bool,
    search_delay: Duration,
    next_id: usize,
    calls: Calls,
    live_states: HashSet<usize>,
    live_lists: HashSet<usize>,
    live_clients: HashSet<usize>,
    state_text: HashMap<usize, String>,
    state_properties: HashMap<usize, Vec<Property>>,
    state_viewport: HashMap<usize, usize>,
    lists: HashMap<usize, Vec<FakeFile>>,
    texts: Vec<String>,
    properties: Vec<Property>,
    viewports: Vec<usize>,
    double_destroy: bool,
}

pub struct FakeEngine {
    state: Mutex<State>,
    in_search: AtomicBool,
    overlapping: AtomicUsize,
}

impl FakeEngine {
    /// A ready engine that connects on the first attempt
    pub fn new(files: Vec<FakeFile>) -> Self {
        Self {
            state: Mutex::new(State {
                files,
                connect_failures: Some(0),
                ready: true,
                next_id: 1,
                ..State::default()
            }),
            in_search: AtomicBool::new(false),
            overlapping: AtomicUsize::new(0),
        }
    }

    pub fn never_connects(self) -> Self {
        self.state.lock().unwrap().connect_failures = None;
        self
    }

    pub fn connects_after(self, failures: usize) -> Self {
        self.state.lock().unwrap().connect_failures = Some(failures);
        self
    }

    pub fn not_ready(self) -> Self {
        self.state.lock().unwrap().ready = false;
        self
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.lock().unwrap().ready = ready;
    }

    pub fn failing_create_state(self) -> Self {
        self.state.lock().unwrap().fail_create_state = true;
        self
    }

    pub fn failing_search(self) -> Self {
        self.state.lock().unwrap().fail_search = true;
        self
    }

    /// Hold every search in flight for `delay`
    pub fn slow_search(self, delay: Duration) -> Self {
        self.state.lock().unwrap().search_delay = delay;
        self
    }

    /// Engine calls that arrived while a search was in flight
    pub fn overlapping_calls(&self) -> usize {
        self.overlapping.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls.clone()
    }

    /// Handles created but not yet destroyed: (states, lists, clients)
    pub fn live_handles(&self) -> (usize, usize, usize) {
        let state = self.state.lock().unwrap();
        (
            state.live_states.len(),
            state.live_lists.len(),
            state.live_clients.len(),
        )
    }

    /// True if any handle was destroyed twice or was never created
    pub fn saw_bad_destroy(&self) -> bool {
        self.state.lock().unwrap().double_destroy
    }

    /// Search texts in the order they were executed
    pub fn texts(&self) -> Vec<String> {
        self.state.lock().unwrap().texts.clone()
    }

    /// Properties requested by the most recent search
    pub fn last_properties(&self) -> Vec<Property> {
        self.state.lock().unwrap().properties.clone()
    }

    pub fn last_viewport(&self) -> Option<usize> {
        self.state.lock().unwrap().viewports.last().copied()
    }

    /// Lock the state for an engine call, noting overlap with a search
    fn enter(&self) -> MutexGuard<'_, State> {
        if self.in_search.load(Ordering::SeqCst) {
            self.overlapping.fetch_add(1, Ordering::SeqCst);
        }
        self.state.lock().unwrap()
    }

    fn run_search(&self, search_state: SearchStatePtr) -> Option<ResultListPtr> {
        let mut state = self.state.lock().unwrap();
        state.calls.search += 1;

        let text = state
            .state_text
            .get(&search_state.id())
            .cloned()
            .unwrap_or_default();
        let properties = state
            .state_properties
            .get(&search_state.id())
            .cloned()
            .unwrap_or_default();
        let viewport = state
            .state_viewport
            .get(&search_state.id())
            .copied()
            .unwrap_or(usize::MAX);
        state.texts.push(text.clone());
        state.properties = properties;
        state.viewports.push(viewport);

        if state.fail_search {
            return None;
        }

        let keyword = keyword_of(&text).to_lowercase();
        let files_only = text.contains("file: ");
        let folders_only = text.contains("folder: ");

        let hits: Vec<FakeFile> = state
            .files
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&keyword))
            .filter(|f| !(files_only && f.folder))
            .filter(|f| !(folders_only && !f.folder))
            .take(viewport)
            .cloned()
            .collect();

        let id = Self::next_id(&mut state);
        state.live_lists.insert(id);
        state.lists.insert(id, hits);
        ResultListPtr::from_id(id)
    }

    fn next_id(state: &mut State) -> usize {
        let id = state.next_id;
        state.next_id += 1;
        id
    }
}

/// Pull the quoted keyword out of the translated text
fn keyword_of(text: &str) -> &str {
    match (text.find('"'), text.rfind('"')) {
        (Some(start), Some(end)) if end > start => &text[start + 1..end],
        _ => "",
    }
}

impl EngineApi for FakeEngine {
    fn connect(&self, _instance_name: &str) -> Option<ClientPtr> {
        let mut state = self.enter();
        state.calls.connect += 1;
        match state.connect_failures {
            Some(0) => {
                let id = Self::next_id(&mut state);
                state.live_clients.insert(id);
                ClientPtr::from_id(id)
            }
            Some(n) => {
                state.connect_failures = Some(n - 1);
                None
            }
            None => None,
        }
    }

    fn is_db_loaded(&self, _client: ClientPtr) -> bool {
        let mut state = self.enter();
        state.calls.is_db_loaded += 1;
        state.ready
    }

    fn create_search_state(&self) -> Option<SearchStatePtr> {
        let mut state = self.enter();
        state.calls.create_search_state += 1;
        if state.fail_create_state {
            return None;
        }
        let id = Self::next_id(&mut state);
        state.live_states.insert(id);
        SearchStatePtr::from_id(id)
    }

    fn set_search_text(&self, search_state: SearchStatePtr, text: &str) {
        let mut state = self.enter();
        state.state_text.insert(search_state.id(), text.to_string());
    }

    fn set_viewport_count(&self, search_state: SearchStatePtr, count: usize) {
        let mut state = self.enter();
        state.state_viewport.insert(search_state.id(), count);
    }

    fn add_property_request(&self, search_state: SearchStatePtr, property: Property) {
        let mut state = self.enter();
        state
            .state_properties
            .entry(search_state.id())
            .or_default()
            .push(property);
    }

    fn search(&self, _client: ClientPtr, search_state: SearchStatePtr) -> Option<ResultListPtr> {
        let delay = self.enter().search_delay;
        self.in_search.store(true, Ordering::SeqCst);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        let list = self.run_search(search_state);
        self.in_search.store(false, Ordering::SeqCst);
        list
    }

    fn result_count(&self, list: ResultListPtr) -> usize {
        let state = self.enter();
        state.lists.get(&list.id()).map_or(0, Vec::len)
    }

    fn property_text(
        &self,
        list: ResultListPtr,
        index: usize,
        property: Property,
        buffer: &mut [u16],
    ) -> usize {
        let mut state = self.enter();
        state.calls.reads += 1;
        let Some(file) = state.lists.get(&list.id()).and_then(|l| l.get(index)) else {
            return 0;
        };
        let value = match property {
            Property::FullPath => file.full_path.clone(),
            Property::FileName => file.name.clone(),
            _ => String::new(),
        };

        let mut written = 0;
        for (slot, unit) in buffer.iter_mut().zip(value.encode_utf16()) {
            *slot = unit;
            written += 1;
        }
        if written < buffer.len() {
            buffer[written] = 0;
        }
        written
    }

    fn result_size(&self, list: ResultListPtr, index: usize) -> u64 {
        let mut state = self.enter();
        state.calls.reads += 1;
        state
            .lists
            .get(&list.id())
            .and_then(|l| l.get(index))
            .map_or(0, |f| f.size)
    }

    fn property_byte(&self, list: ResultListPtr, index: usize, _property: Property) -> u8 {
        let mut state = self.enter();
        state.calls.reads += 1;
        state
            .lists
            .get(&list.id())
            .and_then(|l| l.get(index))
            .map_or(0, |f| u8::from(f.folder))
    }

    fn destroy_search_state(&self, search_state: SearchStatePtr) {
        let mut state = self.enter();
        state.calls.destroy_search_state += 1;
        if !state.live_states.remove(&search_state.id()) {
            state.double_destroy = true;
        }
    }

    fn destroy_result_list(&self, list: ResultListPtr) {
        let mut state = self.enter();
        state.calls.destroy_result_list += 1;
        if !state.live_lists.remove(&list.id()) {
            state.double_destroy = true;
        }
        state.lists.remove(&list.id());
    }

    fn destroy_client(&self, client: ClientPtr) {
        let mut state = self.enter();
        state.calls.destroy_client += 1;
        if !state.live_clients.remove(&client.id()) {
            state.double_destroy = true;
        }
    }
}
