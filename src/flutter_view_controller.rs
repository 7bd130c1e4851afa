//! `flutter_windows.dll` implementation of the runtime traits.

use std::{ffi::CStr, ptr, sync::Arc};

use log::{debug, error, info};

use crate::{
    bindings::{
        self as b, FlutterDesktopEngineRef, FlutterDesktopPluginRegistrarRef,
        FlutterDesktopViewControllerRef, FlutterDesktopViewRef,
    },
    dart_project::DartProject,
    dynamic_flutter_windows_dll_loader::FlutterDll,
    host_types::{LParam, LResult, WParam, WindowHandle},
    runtime::{FlutterEngine, FlutterView, FlutterViewController, ViewControllerFactory},
};

/// Engine handle borrowed from a [`DesktopViewController`].
#[derive(Debug)]
pub struct DesktopEngine {
    raw: FlutterDesktopEngineRef,
    dll: Arc<FlutterDll>,
}

impl DesktopEngine {
    /// Registrar scoped to `plugin_name`.
    pub fn plugin_registrar(&self, plugin_name: &CStr) -> FlutterDesktopPluginRegistrarRef {
        unsafe { (self.dll.FlutterDesktopEngineGetPluginRegistrar)(self.raw, plugin_name.as_ptr()) }
    }
}

impl FlutterEngine for DesktopEngine {
    fn reload_system_fonts(&self) {
        unsafe { (self.dll.FlutterDesktopEngineReloadSystemFonts)(self.raw) }
    }
}

/// View handle borrowed from a [`DesktopViewController`].
#[derive(Debug)]
pub struct DesktopView {
    raw: FlutterDesktopViewRef,
    dll: Arc<FlutterDll>,
}

impl FlutterView for DesktopView {
    fn native_window(&self) -> WindowHandle {
        WindowHandle::from(unsafe { (self.dll.FlutterDesktopViewGetHWND)(self.raw) })
    }
}

/// Owns a `FlutterDesktopViewControllerRef` and destroys it on drop.
#[derive(Debug)]
pub struct DesktopViewController {
    raw: FlutterDesktopViewControllerRef,
    engine: Option<DesktopEngine>,
    view: Option<DesktopView>,
    dll: Arc<FlutterDll>,
}

impl DesktopViewController {
    fn invalid(dll: Arc<FlutterDll>) -> Self {
        Self { raw: ptr::null_mut(), engine: None, view: None, dll }
    }
}

impl FlutterViewController for DesktopViewController {
    type Engine = DesktopEngine;
    type View = DesktopView;

    fn engine(&self) -> Option<&DesktopEngine> {
        self.engine.as_ref()
    }

    fn view(&self) -> Option<&DesktopView> {
        self.view.as_ref()
    }

    fn handle_top_level_window_proc(
        &self,
        hwnd: WindowHandle,
        message: u32,
        wparam: WParam,
        lparam: LParam,
    ) -> Option<LResult> {
        if self.raw.is_null() {
            return None;
        }
        let mut result: b::LRESULT = 0;
        let handled = unsafe {
            (self.dll.FlutterDesktopViewControllerHandleTopLevelWindowProc)(
                self.raw,
                hwnd.0 as b::HWND,
                message,
                wparam,
                lparam,
                &mut result,
            )
        };
        handled.then_some(result)
    }

    fn force_redraw(&self) {
        if !self.raw.is_null() {
            unsafe { (self.dll.FlutterDesktopViewControllerForceRedraw)(self.raw) }
        }
    }
}

impl Drop for DesktopViewController {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            info!("[ViewController] Destroying view controller {:?}", self.raw);
            unsafe { (self.dll.FlutterDesktopViewControllerDestroy)(self.raw) };
        }
    }
}

/// Creates engines and view controllers from a loaded `flutter_windows.dll`.
#[derive(Debug, Clone)]
pub struct DesktopViewControllerFactory {
    dll: Arc<FlutterDll>,
}

impl DesktopViewControllerFactory {
    pub fn new(dll: Arc<FlutterDll>) -> Self {
        Self { dll }
    }

    fn create_engine(&self, project: &DartProject) -> FlutterDesktopEngineRef {
        let props = match project.engine_properties() {
            Ok(p) => p,
            Err(e) => {
                error!("[ViewController] Invalid engine properties: {:#}", e);
                return ptr::null_mut();
            }
        };
        let ffi = props.as_ffi();
        info!("[ViewController] Initializing Flutter engine");
        unsafe { (self.dll.FlutterDesktopEngineCreate)(&ffi) }
    }
}

impl ViewControllerFactory for DesktopViewControllerFactory {
    type Controller = DesktopViewController;

    fn create(&self, width: i32, height: i32, project: &DartProject) -> DesktopViewController {
        let engine = self.create_engine(project);
        if engine.is_null() {
            error!("[ViewController] Engine creation failed");
            return DesktopViewController::invalid(self.dll.clone());
        }

        // The controller takes ownership of the engine, even when it fails.
        let raw = unsafe { (self.dll.FlutterDesktopViewControllerCreate)(width, height, engine) };
        if raw.is_null() {
            error!("[ViewController] View controller creation failed");
            return DesktopViewController::invalid(self.dll.clone());
        }

        let engine = unsafe { (self.dll.FlutterDesktopViewControllerGetEngine)(raw) };
        let view = unsafe { (self.dll.FlutterDesktopViewControllerGetView)(raw) };
        debug!("[ViewController] controller={:?} engine={:?} view={:?}", raw, engine, view);

        DesktopViewController {
            raw,
            engine: (!engine.is_null()).then(|| DesktopEngine { raw: engine, dll: self.dll.clone() }),
            view: (!view.is_null()).then(|| DesktopView { raw: view, dll: self.dll.clone() }),
            dll: self.dll.clone(),
        }
    }
}
