//! Traits describing the embedded Flutter runtime as seen by the host window.
//!
//! `flutter_view_controller` implements them over `flutter_windows.dll`; the
//! adapter only ever talks to these traits.

use crate::{
    dart_project::DartProject,
    host_types::{LParam, LResult, WParam, WindowHandle},
};

/// Per-application execution context.
pub trait FlutterEngine {
    /// Re-reads the OS font configuration.
    fn reload_system_fonts(&self);
}

/// The view rendered into a native child window.
pub trait FlutterView {
    fn native_window(&self) -> WindowHandle;
}

/// Per-window runtime object. Owns the engine, the view and the child window;
/// dropping it shuts the runtime down.
pub trait FlutterViewController {
    type Engine: FlutterEngine;
    type View: FlutterView;

    /// `None` if the engine failed to start.
    fn engine(&self) -> Option<&Self::Engine>;

    /// `None` if the view could not be created.
    fn view(&self) -> Option<&Self::View>;

    /// Offers a top-level window message to the runtime. `Some` means the
    /// runtime consumed it and the value is the result to return to the OS.
    fn handle_top_level_window_proc(
        &self,
        hwnd: WindowHandle,
        message: u32,
        wparam: WParam,
        lparam: LParam,
    ) -> Option<LResult>;

    /// Schedules and paints a frame immediately.
    fn force_redraw(&self);
}

/// Builds view controllers for a project.
pub trait ViewControllerFactory {
    type Controller: FlutterViewController;

    /// Construction itself never fails; a broken controller reports a missing
    /// engine or view.
    fn create(&self, width: i32, height: i32, project: &DartProject) -> Self::Controller;
}

/// Process-wide procedure binding all compiled-in plugins to an engine.
pub type PluginRegistrant<E> = fn(&E);

/// Engine type produced by a factory's controllers.
pub type EngineOf<F> = <<F as ViewControllerFactory>::Controller as FlutterViewController>::Engine;
