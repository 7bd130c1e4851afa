//! Top-level host window that embeds a Flutter view.
//!
//! Message dispatch order is fixed: the runtime sees every message first, the
//! host reacts to the few notifications the runtime does not subscribe to, and
//! the base window handles whatever is left.

use std::cell::{Cell, RefCell};

use log::{debug, error, info, warn};

use crate::{
    base_window::{BaseWindow, WindowDelegate},
    dart_project::DartProject,
    host_types::{messages::WM_FONTCHANGE, LParam, LResult, WParam, WindowHandle},
    runtime::{
        EngineOf, FlutterEngine, FlutterView, FlutterViewController, PluginRegistrant,
        ViewControllerFactory,
    },
};

/// A window that does nothing but host a Flutter view.
pub struct FlutterWindow<'p, B, F>
where
    F: ViewControllerFactory,
{
    base: B,
    project: &'p DartProject,
    factory: F,
    register_plugins: PluginRegistrant<EngineOf<F>>,
    // Present only between a successful `on_create` and `on_destroy`.
    flutter_controller: RefCell<Option<F::Controller>>,
    // Set when `on_destroy` ran while the controller was still borrowed.
    release_pending: Cell<bool>,
}

impl<'p, B, F> FlutterWindow<'p, B, F>
where
    B: BaseWindow,
    F: ViewControllerFactory,
{
    /// Creates an adapter that will run `project`. No OS or runtime calls are
    /// made until the base framework invokes `on_create`.
    pub fn new(
        base: B,
        project: &'p DartProject,
        factory: F,
        register_plugins: PluginRegistrant<EngineOf<F>>,
    ) -> Self {
        Self {
            base,
            project,
            factory,
            register_plugins,
            flutter_controller: RefCell::new(None),
            release_pending: Cell::new(false),
        }
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn has_view_controller(&self) -> bool {
        !self.release_pending.get() && self.flutter_controller.borrow().is_some()
    }

    /// Takes the controller out of its slot and drops it outside the borrow,
    /// since the runtime's shutdown sends messages back into this window.
    fn release_view_controller(&self) -> bool {
        let released = match self.flutter_controller.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                self.release_pending.set(true);
                return false;
            }
        };
        self.release_pending.set(false);
        match released {
            Some(controller) => {
                drop(controller);
                info!("[FlutterWindow] View controller released");
                true
            }
            None => false,
        }
    }
}

impl<B, F> WindowDelegate for FlutterWindow<'_, B, F>
where
    B: BaseWindow,
    F: ViewControllerFactory,
{
    fn on_create(&self) -> bool {
        if !self.base.on_create() {
            return false;
        }

        let frame = self.base.client_area();
        let (width, height) = (frame.width(), frame.height());
        info!("[FlutterWindow] Creating view controller ({}×{})", width, height);

        // The controller is dropped by the early return below.
        let controller = self.factory.create(width, height, self.project);
        if controller.engine().is_none() || controller.view().is_none() {
            error!("[FlutterWindow] View controller has no engine or view");
            return false;
        }

        // Stored before plugins and parenting: messages those calls send back
        // into the window already reach the runtime.
        *self.flutter_controller.borrow_mut() = Some(controller);

        let slot = self.flutter_controller.borrow();
        let Some((controller, engine, view)) =
            slot.as_ref().and_then(|c| Some((c, c.engine()?, c.view()?)))
        else {
            return false;
        };

        (self.register_plugins)(engine);
        self.base.set_child_content(view.native_window());
        controller.force_redraw();

        info!("[FlutterWindow] Flutter view attached");
        true
    }

    fn on_destroy(&self) {
        // The runtime tears down its child window while the parent still exists.
        if !self.release_view_controller() && self.release_pending.get() {
            warn!("[FlutterWindow] Destroyed while the view controller is in use; release deferred");
        }

        self.base.on_destroy();
    }

    fn message_handler(
        &self,
        hwnd: WindowHandle,
        message: u32,
        wparam: WParam,
        lparam: LParam,
    ) -> LResult {
        if !self.release_pending.get() {
            let consumed = self
                .flutter_controller
                .borrow()
                .as_ref()
                .and_then(|c| c.handle_top_level_window_proc(hwnd, message, wparam, lparam));
            if self.release_pending.get() {
                self.release_view_controller();
            }
            if let Some(result) = consumed {
                return result;
            }
        }

        if message == WM_FONTCHANGE && !self.release_pending.get() {
            let slot = self.flutter_controller.borrow();
            if let Some(engine) = slot.as_ref().and_then(|c| c.engine()) {
                debug!("[FlutterWindow] WM_FONTCHANGE → reloading system fonts");
                engine.reload_system_fonts();
            }
        }

        self.base.message_handler(hwnd, message, wparam, lparam)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_types::{
        messages::{WM_ACTIVATE, WM_POINTERUPDATE},
        Rect,
    };
    use std::path::PathBuf;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        BaseCreate,
        GetClientArea,
        NewViewController(i32, i32),
        RegisterPlugins,
        SetChildContent(WindowHandle),
        ForceRedraw,
        PreHandler(u32),
        ReloadSystemFonts,
        BaseMessage(WindowHandle, u32, WParam, LParam),
        ReleaseViewController,
        BaseDestroy,
    }

    thread_local! {
        static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
        // Window the fakes call back into, the way Win32 re-enters the window procedure.
        static REENTER: Cell<Option<*const dyn WindowDelegate>> = const { Cell::new(None) };
    }

    fn reenter(f: impl FnOnce(&dyn WindowDelegate)) {
        if let Some(window) = REENTER.with(|r| r.get()) {
            // SAFETY: tests clear REENTER before the window goes out of scope.
            f(unsafe { &*window });
        }
    }

    fn record(call: Call) {
        CALLS.with(|c| c.borrow_mut().push(call));
    }

    fn take_calls() -> Vec<Call> {
        CALLS.with(|c| std::mem::take(&mut *c.borrow_mut()))
    }

    const VIEW_HWND: WindowHandle = WindowHandle(0xBEEF);
    const BASE_RESULT: LResult = 7;

    struct FakeBase {
        create_ok: bool,
        client: Rect,
        message_while_parenting: Option<u32>,
    }

    impl FakeBase {
        fn new(create_ok: bool) -> Self {
            Self {
                create_ok,
                client: Rect { left: 0, top: 0, right: 800, bottom: 600 },
                message_while_parenting: None,
            }
        }
    }

    impl BaseWindow for FakeBase {
        fn on_create(&self) -> bool {
            record(Call::BaseCreate);
            self.create_ok
        }

        fn on_destroy(&self) {
            record(Call::BaseDestroy);
        }

        fn message_handler(
            &self,
            hwnd: WindowHandle,
            message: u32,
            wparam: WParam,
            lparam: LParam,
        ) -> LResult {
            record(Call::BaseMessage(hwnd, message, wparam, lparam));
            BASE_RESULT
        }

        fn client_area(&self) -> Rect {
            record(Call::GetClientArea);
            self.client
        }

        fn set_child_content(&self, content: WindowHandle) {
            record(Call::SetChildContent(content));
            if let Some(message) = self.message_while_parenting {
                reenter(|w| {
                    w.message_handler(WindowHandle(1), message, 0, 0);
                });
            }
        }
    }

    struct FakeEngine;

    impl FlutterEngine for FakeEngine {
        fn reload_system_fonts(&self) {
            record(Call::ReloadSystemFonts);
        }
    }

    struct FakeView;

    impl FlutterView for FakeView {
        fn native_window(&self) -> WindowHandle {
            VIEW_HWND
        }
    }

    struct FakeController {
        engine: Option<FakeEngine>,
        view: Option<FakeView>,
        pre_handler_result: Option<LResult>,
        destroy_on: Option<u32>,
    }

    impl FlutterViewController for FakeController {
        type Engine = FakeEngine;
        type View = FakeView;

        fn engine(&self) -> Option<&FakeEngine> {
            self.engine.as_ref()
        }

        fn view(&self) -> Option<&FakeView> {
            self.view.as_ref()
        }

        fn handle_top_level_window_proc(
            &self,
            _hwnd: WindowHandle,
            message: u32,
            _wparam: WParam,
            _lparam: LParam,
        ) -> Option<LResult> {
            record(Call::PreHandler(message));
            if self.destroy_on == Some(message) {
                reenter(|w| w.on_destroy());
            }
            self.pre_handler_result
        }

        fn force_redraw(&self) {
            record(Call::ForceRedraw);
        }
    }

    impl Drop for FakeController {
        fn drop(&mut self) {
            record(Call::ReleaseViewController);
        }
    }

    struct FakeFactory {
        with_engine: bool,
        with_view: bool,
        pre_handler_result: Option<LResult>,
        destroy_on: Option<u32>,
    }

    impl FakeFactory {
        fn healthy() -> Self {
            Self { with_engine: true, with_view: true, pre_handler_result: None, destroy_on: None }
        }
    }

    impl ViewControllerFactory for FakeFactory {
        type Controller = FakeController;

        fn create(&self, width: i32, height: i32, _project: &DartProject) -> FakeController {
            record(Call::NewViewController(width, height));
            FakeController {
                engine: self.with_engine.then_some(FakeEngine),
                view: self.with_view.then_some(FakeView),
                pre_handler_result: self.pre_handler_result,
                destroy_on: self.destroy_on,
            }
        }
    }

    fn fake_register_plugins(_engine: &FakeEngine) {
        record(Call::RegisterPlugins);
    }

    fn project() -> DartProject {
        DartProject::from_paths(
            PathBuf::from("data/flutter_assets"),
            PathBuf::from("data/icudtl.dat"),
            None,
        )
    }

    fn window<'p>(
        project: &'p DartProject,
        create_ok: bool,
        factory: FakeFactory,
    ) -> FlutterWindow<'p, FakeBase, FakeFactory> {
        FlutterWindow::new(FakeBase::new(create_ok), project, factory, fake_register_plugins)
    }

    #[test]
    fn happy_create_runs_steps_in_order() {
        let project = project();
        let w = window(&project, true, FakeFactory::healthy());

        assert!(w.on_create());
        assert!(w.has_view_controller());
        assert_eq!(
            take_calls(),
            vec![
                Call::BaseCreate,
                Call::GetClientArea,
                Call::NewViewController(800, 600),
                Call::RegisterPlugins,
                Call::SetChildContent(VIEW_HWND),
                Call::ForceRedraw,
            ]
        );
    }

    #[test]
    fn view_controller_sized_from_offset_client_area() {
        let project = project();
        let base = FakeBase {
            client: Rect { left: 8, top: 31, right: 1288, bottom: 751 },
            ..FakeBase::new(true)
        };
        let w = FlutterWindow::new(base, &project, FakeFactory::healthy(), fake_register_plugins);

        assert!(w.on_create());
        assert!(take_calls().contains(&Call::NewViewController(1280, 720)));
    }

    #[test]
    fn base_create_failure_constructs_nothing() {
        let project = project();
        let w = window(&project, false, FakeFactory::healthy());

        assert!(!w.on_create());
        assert!(!w.has_view_controller());
        assert_eq!(take_calls(), vec![Call::BaseCreate]);
    }

    #[test]
    fn null_engine_fails_create_and_releases_controller() {
        let project = project();
        let factory = FakeFactory { with_engine: false, ..FakeFactory::healthy() };
        let w = window(&project, true, factory);

        assert!(!w.on_create());
        assert!(!w.has_view_controller());
        assert_eq!(
            take_calls(),
            vec![
                Call::BaseCreate,
                Call::GetClientArea,
                Call::NewViewController(800, 600),
                Call::ReleaseViewController,
            ]
        );
    }

    #[test]
    fn null_view_fails_create() {
        let project = project();
        let factory = FakeFactory { with_view: false, ..FakeFactory::healthy() };
        let w = window(&project, true, factory);

        assert!(!w.on_create());
        let calls = take_calls();
        assert!(!calls.contains(&Call::RegisterPlugins));
        assert!(!calls.iter().any(|c| matches!(c, Call::SetChildContent(_))));
        assert!(!calls.contains(&Call::ForceRedraw));
        assert_eq!(calls.last(), Some(&Call::ReleaseViewController));
    }

    #[test]
    fn destroy_releases_controller_before_base() {
        let project = project();
        let w = window(&project, true, FakeFactory::healthy());
        assert!(w.on_create());
        take_calls();

        w.on_destroy();
        assert!(!w.has_view_controller());
        assert_eq!(take_calls(), vec![Call::ReleaseViewController, Call::BaseDestroy]);
    }

    #[test]
    fn destroy_without_controller_only_reaches_base() {
        let project = project();
        let w = window(&project, false, FakeFactory::healthy());
        assert!(!w.on_create());
        take_calls();

        w.on_destroy();
        assert_eq!(take_calls(), vec![Call::BaseDestroy]);
    }

    #[test]
    fn consumed_message_returns_runtime_result() {
        let project = project();
        let factory = FakeFactory { pre_handler_result: Some(42), ..FakeFactory::healthy() };
        let w = window(&project, true, factory);
        assert!(w.on_create());
        take_calls();

        let result = w.message_handler(WindowHandle(1), WM_POINTERUPDATE, 3, 4);
        assert_eq!(result, 42);
        assert_eq!(take_calls(), vec![Call::PreHandler(WM_POINTERUPDATE)]);
    }

    #[test]
    fn unhandled_message_falls_through_to_base_once() {
        let project = project();
        let w = window(&project, true, FakeFactory::healthy());
        assert!(w.on_create());
        take_calls();

        let result = w.message_handler(WindowHandle(1), WM_ACTIVATE, 1, -5);
        assert_eq!(result, BASE_RESULT);
        assert_eq!(
            take_calls(),
            vec![
                Call::PreHandler(WM_ACTIVATE),
                Call::BaseMessage(WindowHandle(1), WM_ACTIVATE, 1, -5),
            ]
        );
    }

    #[test]
    fn font_change_reloads_fonts_then_reaches_base() {
        let project = project();
        let w = window(&project, true, FakeFactory::healthy());
        assert!(w.on_create());
        take_calls();

        let result = w.message_handler(WindowHandle(1), WM_FONTCHANGE, 0, 0);
        assert_eq!(result, BASE_RESULT);
        assert_eq!(
            take_calls(),
            vec![
                Call::PreHandler(WM_FONTCHANGE),
                Call::ReloadSystemFonts,
                Call::BaseMessage(WindowHandle(1), WM_FONTCHANGE, 0, 0),
            ]
        );
    }

    #[test]
    fn consumed_font_change_skips_reload() {
        let project = project();
        let factory = FakeFactory { pre_handler_result: Some(0), ..FakeFactory::healthy() };
        let w = window(&project, true, factory);
        assert!(w.on_create());
        take_calls();

        assert_eq!(w.message_handler(WindowHandle(1), WM_FONTCHANGE, 0, 0), 0);
        assert_eq!(take_calls(), vec![Call::PreHandler(WM_FONTCHANGE)]);
    }

    #[test]
    fn messages_before_create_go_straight_to_base() {
        let project = project();
        let w = window(&project, true, FakeFactory::healthy());

        let result = w.message_handler(WindowHandle(9), WM_FONTCHANGE, 0, 0);
        assert_eq!(result, BASE_RESULT);
        assert_eq!(take_calls(), vec![Call::BaseMessage(WindowHandle(9), WM_FONTCHANGE, 0, 0)]);
    }

    #[test]
    fn messages_after_destroy_go_straight_to_base() {
        let project = project();
        let w = window(&project, true, FakeFactory::healthy());
        assert!(w.on_create());
        w.on_destroy();
        take_calls();

        for message in [WM_FONTCHANGE, WM_ACTIVATE] {
            assert_eq!(w.message_handler(WindowHandle(1), message, 0, 0), BASE_RESULT);
        }
        assert_eq!(
            take_calls(),
            vec![
                Call::BaseMessage(WindowHandle(1), WM_FONTCHANGE, 0, 0),
                Call::BaseMessage(WindowHandle(1), WM_ACTIVATE, 0, 0),
            ]
        );
    }

    #[test]
    fn messages_sent_while_parenting_reach_the_runtime() {
        let project: &'static DartProject = Box::leak(Box::new(project()));
        let base = FakeBase { message_while_parenting: Some(WM_ACTIVATE), ..FakeBase::new(true) };
        let w = FlutterWindow::new(base, project, FakeFactory::healthy(), fake_register_plugins);
        REENTER.with(|r| r.set(Some(&w as &dyn WindowDelegate as *const dyn WindowDelegate)));

        assert!(w.on_create());
        REENTER.with(|r| r.set(None));
        assert_eq!(
            take_calls(),
            vec![
                Call::BaseCreate,
                Call::GetClientArea,
                Call::NewViewController(800, 600),
                Call::RegisterPlugins,
                Call::SetChildContent(VIEW_HWND),
                Call::PreHandler(WM_ACTIVATE),
                Call::BaseMessage(WindowHandle(1), WM_ACTIVATE, 0, 0),
                Call::ForceRedraw,
            ]
        );
    }

    #[test]
    fn destroy_inside_runtime_handler_releases_once_handler_returns() {
        let project: &'static DartProject = Box::leak(Box::new(project()));
        let factory = FakeFactory { destroy_on: Some(WM_ACTIVATE), ..FakeFactory::healthy() };
        let w = FlutterWindow::new(FakeBase::new(true), project, factory, fake_register_plugins);
        REENTER.with(|r| r.set(Some(&w as &dyn WindowDelegate as *const dyn WindowDelegate)));
        assert!(w.on_create());
        take_calls();

        assert_eq!(w.message_handler(WindowHandle(1), WM_ACTIVATE, 0, 0), BASE_RESULT);
        REENTER.with(|r| r.set(None));
        assert!(!w.has_view_controller());
        assert_eq!(
            take_calls(),
            vec![
                Call::PreHandler(WM_ACTIVATE),
                Call::BaseDestroy,
                Call::ReleaseViewController,
                Call::BaseMessage(WindowHandle(1), WM_ACTIVATE, 0, 0),
            ]
        );

        w.message_handler(WindowHandle(1), WM_FONTCHANGE, 0, 0);
        assert_eq!(take_calls(), vec![Call::BaseMessage(WindowHandle(1), WM_FONTCHANGE, 0, 0)]);
    }
}
