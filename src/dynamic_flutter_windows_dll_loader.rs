use crate::bindings as b;
use anyhow::{Context, Result};
use libloading::{Library, Symbol};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::{collections::HashMap, ffi::c_char, path::{Path, PathBuf}, sync::Arc};

use crate::dart_project::executable_directory;

pub const FLUTTER_WINDOWS_DLL: &str = "flutter_windows.dll";

#[allow(non_snake_case)]
#[derive(Debug)]
pub struct FlutterDll {
    _lib: &'static Library,

    pub FlutterDesktopEngineCreate: Symbol<
        'static,
        unsafe extern "C" fn(*const b::FlutterDesktopEngineProperties) -> b::FlutterDesktopEngineRef,
    >,
    pub FlutterDesktopEngineGetPluginRegistrar: Symbol<
        'static,
        unsafe extern "C" fn(
            b::FlutterDesktopEngineRef,
            *const c_char,
        ) -> b::FlutterDesktopPluginRegistrarRef,
    >,
    pub FlutterDesktopEngineReloadSystemFonts:
        Symbol<'static, unsafe extern "C" fn(b::FlutterDesktopEngineRef)>,
    pub FlutterDesktopViewControllerCreate: Symbol<
        'static,
        unsafe extern "C" fn(
            i32,
            i32,
            b::FlutterDesktopEngineRef,
        ) -> b::FlutterDesktopViewControllerRef,
    >,
    pub FlutterDesktopViewControllerGetView: Symbol<
        'static,
        unsafe extern "C" fn(b::FlutterDesktopViewControllerRef) -> b::FlutterDesktopViewRef,
    >,
    pub FlutterDesktopViewControllerGetEngine: Symbol<
        'static,
        unsafe extern "C" fn(b::FlutterDesktopViewControllerRef) -> b::FlutterDesktopEngineRef,
    >,
    pub FlutterDesktopViewControllerForceRedraw:
        Symbol<'static, unsafe extern "C" fn(b::FlutterDesktopViewControllerRef)>,
    pub FlutterDesktopViewControllerHandleTopLevelWindowProc: Symbol<
        'static,
        unsafe extern "C" fn(
            b::FlutterDesktopViewControllerRef,
            b::HWND,
            b::UINT,
            b::WPARAM,
            b::LPARAM,
            *mut b::LRESULT,
        ) -> bool,
    >,
    pub FlutterDesktopViewControllerDestroy:
        Symbol<'static, unsafe extern "C" fn(b::FlutterDesktopViewControllerRef)>,
    pub FlutterDesktopViewGetHWND:
        Symbol<'static, unsafe extern "C" fn(b::FlutterDesktopViewRef) -> b::HWND>,
}

static DLL_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<FlutterDll>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[allow(non_snake_case)]
impl FlutterDll {
    /// Loads `flutter_windows.dll` from `dir`, or from the executable's
    /// directory when `dir` is `None`.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let dll_dir = match dir {
            Some(d) => d.to_path_buf(),
            None => executable_directory()?,
        };

        let dll_path = dll_dir.join(FLUTTER_WINDOWS_DLL);
        let lib = unsafe { Library::new(&dll_path) }
            .with_context(|| format!("Failed to load {}", dll_path.display()))?;

        // Handles and function pointers from the DLL live for the whole process.
        let lib_static: &'static Library = Box::leak(Box::new(lib));

        unsafe {
            let FlutterDesktopEngineCreate = lib_static
                .get(b"FlutterDesktopEngineCreate\0")
                .context("Missing symbol: FlutterDesktopEngineCreate")?;
            let FlutterDesktopEngineGetPluginRegistrar = lib_static
                .get(b"FlutterDesktopEngineGetPluginRegistrar\0")
                .context("Missing symbol: FlutterDesktopEngineGetPluginRegistrar")?;
            let FlutterDesktopEngineReloadSystemFonts = lib_static
                .get(b"FlutterDesktopEngineReloadSystemFonts\0")
                .context("Missing symbol: FlutterDesktopEngineReloadSystemFonts")?;
            let FlutterDesktopViewControllerCreate = lib_static
                .get(b"FlutterDesktopViewControllerCreate\0")
                .context("Missing symbol: FlutterDesktopViewControllerCreate")?;
            let FlutterDesktopViewControllerGetView = lib_static
                .get(b"FlutterDesktopViewControllerGetView\0")
                .context("Missing symbol: FlutterDesktopViewControllerGetView")?;
            let FlutterDesktopViewControllerGetEngine = lib_static
                .get(b"FlutterDesktopViewControllerGetEngine\0")
                .context("Missing symbol: FlutterDesktopViewControllerGetEngine")?;
            let FlutterDesktopViewControllerForceRedraw = lib_static
                .get(b"FlutterDesktopViewControllerForceRedraw\0")
                .context("Missing symbol: FlutterDesktopViewControllerForceRedraw")?;
            let FlutterDesktopViewControllerHandleTopLevelWindowProc = lib_static
                .get(b"FlutterDesktopViewControllerHandleTopLevelWindowProc\0")
                .context("Missing symbol: FlutterDesktopViewControllerHandleTopLevelWindowProc")?;
            let FlutterDesktopViewControllerDestroy = lib_static
                .get(b"FlutterDesktopViewControllerDestroy\0")
                .context("Missing symbol: FlutterDesktopViewControllerDestroy")?;
            let FlutterDesktopViewGetHWND = lib_static
                .get(b"FlutterDesktopViewGetHWND\0")
                .context("Missing symbol: FlutterDesktopViewGetHWND")?;

            Ok(FlutterDll {
                _lib: lib_static,
                FlutterDesktopEngineCreate,
                FlutterDesktopEngineGetPluginRegistrar,
                FlutterDesktopEngineReloadSystemFonts,
                FlutterDesktopViewControllerCreate,
                FlutterDesktopViewControllerGetView,
                FlutterDesktopViewControllerGetEngine,
                FlutterDesktopViewControllerForceRedraw,
                FlutterDesktopViewControllerHandleTopLevelWindowProc,
                FlutterDesktopViewControllerDestroy,
                FlutterDesktopViewGetHWND,
            })
        }
    }

    /// Returns the cached DLL for `dir`, loading it on first use.
    pub fn get_for(dir: Option<&Path>) -> Result<Arc<Self>> {
        let key = match dir {
            Some(d) => d.to_path_buf(),
            None => executable_directory()?,
        };

        let mut cache = DLL_CACHE.lock();
        if let Some(existing) = cache.get(&key) {
            return Ok(existing.clone());
        }

        let dll = Arc::new(FlutterDll::load(Some(&key))?);
        cache.insert(key, dll.clone());
        Ok(dll)
    }
}
