//! Native binding to the Everything 3 SDK
//!
//! The SDK ships as a DLL (`Everything3_x64.dll`) that is loaded at runtime,
//! so the crate builds on machines without it and fails only when the
//! engine is actually used.

use super::{
    ClientPtr, EngineApi, EngineError, EngineResult, Property, ResultListPtr, SearchStatePtr,
};
use libloading::Library;
use std::ffi::c_void;
use std::path::Path;

type ConnectW = unsafe extern "system" fn(*const u16) -> *mut c_void;
type DestroyClient = unsafe extern "system" fn(*mut c_void) -> i32;
type IsDbLoaded = unsafe extern "system" fn(*mut c_void) -> i32;
type CreateSearchState = unsafe extern "system" fn() -> *mut c_void;
type DestroySearchState = unsafe extern "system" fn(*mut c_void) -> i32;
type SetSearchTextW = unsafe extern "system" fn(*mut c_void, *const u16) -> i32;
type SetSearchViewportCount = unsafe extern "system" fn(*mut c_void, usize) -> i32;
type AddSearchPropertyRequest = unsafe extern "system" fn(*mut c_void, u32) -> i32;
type Search = unsafe extern "system" fn(*mut c_void, *mut c_void) -> *mut c_void;
type GetResultListViewportCount = unsafe extern "system" fn(*mut c_void) -> usize;
type GetResultPropertyTextW =
    unsafe extern "system" fn(*mut c_void, usize, u32, *mut u16, usize) -> usize;
type GetResultSize = unsafe extern "system" fn(*mut c_void, usize) -> u64;
type GetResultPropertyByte = unsafe extern "system" fn(*mut c_void, usize, u32) -> u8;
type DestroyResultList = unsafe extern "system" fn(*mut c_void) -> i32;

/// The Everything 3 IPC client, resolved from the SDK library
pub struct Everything3 {
    connect: ConnectW,
    destroy_client: DestroyClient,
    is_db_loaded: IsDbLoaded,
    create_search_state: CreateSearchState,
    destroy_search_state: DestroySearchState,
    set_search_text: SetSearchTextW,
    set_viewport_count: SetSearchViewportCount,
    add_property_request: AddSearchPropertyRequest,
    search: Search,
    viewport_count: GetResultListViewportCount,
    property_text: GetResultPropertyTextW,
    result_size: GetResultSize,
    property_byte: GetResultPropertyByte,
    destroy_result_list: DestroyResultList,
    // Keeps the function pointers above valid
    _library: Library,
}

impl Everything3 {
    /// Load the SDK library and resolve every function the crate uses
    pub fn load(path: &Path) -> EngineResult<Self> {
        let library = unsafe { Library::new(path) }.map_err(|source| EngineError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;

        unsafe {
            Ok(Self {
                connect: symbol(&library, "Everything3_ConnectW")?,
                destroy_client: symbol(&library, "Everything3_DestroyClient")?,
                is_db_loaded: symbol(&library, "Everything3_IsDBLoaded")?,
                create_search_state: symbol(&library, "Everything3_CreateSearchState")?,
                destroy_search_state: symbol(&library, "Everything3_DestroySearchState")?,
                set_search_text: symbol(&library, "Everything3_SetSearchTextW")?,
                set_viewport_count: symbol(&library, "Everything3_SetSearchViewportCount")?,
                add_property_request: symbol(&library, "Everything3_AddSearchPropertyRequest")?,
                search: symbol(&library, "Everything3_Search")?,
                viewport_count: symbol(&library, "Everything3_GetResultListViewportCount")?,
                property_text: symbol(&library, "Everything3_GetResultPropertyTextW")?,
                result_size: symbol(&library, "Everything3_GetResultSize")?,
                property_byte: symbol(&library, "Everything3_GetResultPropertyBYTE")?,
                destroy_result_list: symbol(&library, "Everything3_DestroyResultList")?,
                _library: library,
            })
        }
    }
}

/// Resolve one exported function
///
/// Safety: `T` must match the exported function's signature.
unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> EngineResult<T> {
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|_| EngineError::MissingSymbol(name))
}

/// Encode a string as a NUL-terminated wide string
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

impl EngineApi for Everything3 {
    fn connect(&self, instance_name: &str) -> Option<ClientPtr> {
        let name = to_wide(instance_name);
        ClientPtr::from_raw(unsafe { (self.connect)(name.as_ptr()) })
    }

    fn is_db_loaded(&self, client: ClientPtr) -> bool {
        unsafe { (self.is_db_loaded)(client.as_ptr()) != 0 }
    }

    fn create_search_state(&self) -> Option<SearchStatePtr> {
        SearchStatePtr::from_raw(unsafe { (self.create_search_state)() })
    }

    fn set_search_text(&self, state: SearchStatePtr, text: &str) {
        let text = to_wide(text);
        unsafe {
            (self.set_search_text)(state.as_ptr(), text.as_ptr());
        }
    }

    fn set_viewport_count(&self, state: SearchStatePtr, count: usize) {
        unsafe {
            (self.set_viewport_count)(state.as_ptr(), count);
        }
    }

    fn add_property_request(&self, state: SearchStatePtr, property: Property) {
        unsafe {
            (self.add_property_request)(state.as_ptr(), property.id());
        }
    }

    fn search(&self, client: ClientPtr, state: SearchStatePtr) -> Option<ResultListPtr> {
        ResultListPtr::from_raw(unsafe { (self.search)(client.as_ptr(), state.as_ptr()) })
    }

    fn result_count(&self, list: ResultListPtr) -> usize {
        unsafe { (self.viewport_count)(list.as_ptr()) }
    }

    fn property_text(
        &self,
        list: ResultListPtr,
        index: usize,
        property: Property,
        buffer: &mut [u16],
    ) -> usize {
        if buffer.is_empty() {
            return 0;
        }
        unsafe {
            (self.property_text)(
                list.as_ptr(),
                index,
                property.id(),
                buffer.as_mut_ptr(),
                buffer.len(),
            )
        }
    }

    fn result_size(&self, list: ResultListPtr, index: usize) -> u64 {
        unsafe { (self.result_size)(list.as_ptr(), index) }
    }

    fn property_byte(&self, list: ResultListPtr, index: usize, property: Property) -> u8 {
        unsafe { (self.property_byte)(list.as_ptr(), index, property.id()) }
    }

    fn destroy_search_state(&self, state: SearchStatePtr) {
        unsafe {
            (self.destroy_search_state)(state.as_ptr());
        }
    }

    fn destroy_result_list(&self, list: ResultListPtr) {
        unsafe {
            (self.destroy_result_list)(list.as_ptr());
        }
    }

    fn destroy_client(&self, client: ClientPtr) {
        unsafe {
            (self.destroy_client)(client.as_ptr());
        }
    }
}
