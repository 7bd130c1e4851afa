//! Win32 base window: class registration, DPI-aware creation, child-content
//! embedding, and the window procedure that routes messages into a
//! [`WindowDelegate`].
//!
//! ## Handled Messages
//!
//! - **WM_NCCREATE**: Store the delegate slot and enable non-client DPI scaling.
//! - **WM_SIZE**: Resize the child content to fill our client area.
//! - **WM_ACTIVATE**: Forward keyboard focus to the child content.
//! - **WM_DPICHANGED**: Reposition/resize to the suggested DPI-aware bounds.
//! - **WM_DESTROY**: Post `WM_QUIT`, then run the delegate's `on_destroy`.
//! - **WM_NCDESTROY**: Free the delegate slot.
//! - **All others**: `DefWindowProcW`.

use std::{cell::Cell, ffi::c_void};

use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{GetLastError, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM},
        Graphics::Gdi::{MonitorFromPoint, MONITOR_DEFAULTTONEAREST},
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            HiDpi::{EnableNonClientDpiScaling, GetDpiForMonitor, MDT_EFFECTIVE_DPI},
            Input::KeyboardAndMouse::SetFocus,
            WindowsAndMessaging::{
                CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect,
                GetMessageW, GetWindowLongPtrW, LoadCursorW, MoveWindow, PostQuitMessage,
                RegisterClassW, SetParent, SetWindowLongPtrW, SetWindowPos, ShowWindow,
                TranslateMessage, CREATESTRUCTW, CS_HREDRAW, CS_VREDRAW, GWLP_USERDATA, GWL_STYLE,
                IDC_ARROW, MSG, SWP_NOACTIVATE, SWP_NOZORDER, SW_SHOWNORMAL, WINDOW_EX_STYLE,
                WM_ACTIVATE, WM_DESTROY, WM_DPICHANGED, WM_NCCREATE, WM_NCDESTROY, WM_SIZE,
                WNDCLASSW, WS_CHILD, WS_CLIPCHILDREN, WS_OVERLAPPEDWINDOW, WS_POPUP, WS_VISIBLE,
            },
        },
    },
};

use crate::{
    base_window::{BaseWindow, WindowDelegate},
    constants,
    error::{HostError, Result},
    flutter_window::FlutterWindow,
    host_types::{LParam, LResult, Point, Rect, Size, WParam, WindowHandle},
    runtime::ViewControllerFactory,
};

const BASE_DPI: f64 = 96.0;

fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn to_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

/// The application's main window. Destroying it ends the message loop.
#[derive(Debug, Default)]
pub struct Win32Window {
    window_handle: Cell<HWND>,
    child_content: Cell<HWND>,
    attached: Cell<bool>,
}

impl Win32Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// `HWND::default()` before creation and after `WM_DESTROY`.
    pub fn handle(&self) -> HWND {
        self.window_handle.get()
    }

    pub fn show(&self) {
        let hwnd = self.window_handle.get();
        if !hwnd.is_invalid() {
            unsafe {
                let _ = ShowWindow(hwnd, SW_SHOWNORMAL);
            }
            info!("[Win32Window] Window shown");
        }
    }

    fn attach(&self, hwnd: HWND) {
        debug!("[Win32Window] Attached to {:?}", hwnd);
        self.window_handle.set(hwnd);
        self.attached.set(true);
    }

    fn resize_child_to_client(&self) {
        let child = self.child_content.get();
        if child.is_invalid() {
            return;
        }
        let frame = self.client_area();
        if let Err(e) = unsafe { MoveWindow(child, frame.left, frame.top, frame.width(), frame.height(), true) } {
            warn!("[Win32Window] MoveWindow failed: {:?}", e);
        }
    }
}

impl BaseWindow for Win32Window {
    fn on_create(&self) -> bool {
        !self.window_handle.get().is_invalid()
    }

    fn on_destroy(&self) {
        info!("[Win32Window] Destroyed");
    }

    fn message_handler(
        &self,
        hwnd: WindowHandle,
        message: u32,
        wparam: WParam,
        lparam: LParam,
    ) -> LResult {
        let hwnd = to_hwnd(hwnd);
        match message {
            WM_DESTROY => {
                info!("[Win32Window] WM_DESTROY");
                self.window_handle.set(HWND::default());
                self.child_content.set(HWND::default());
                unsafe { PostQuitMessage(0) };
                0
            }

            WM_DPICHANGED => {
                // lParam is a *const RECT of new bounds
                let suggested = lparam as *const RECT;
                if let Some(r) = unsafe { suggested.as_ref() } {
                    debug!("[Win32Window] WM_DPICHANGED → {:?}", r);
                    if let Err(e) = unsafe {
                        SetWindowPos(
                            hwnd,
                            None,
                            r.left,
                            r.top,
                            r.right - r.left,
                            r.bottom - r.top,
                            SWP_NOZORDER | SWP_NOACTIVATE,
                        )
                    } {
                        warn!("[Win32Window] SetWindowPos failed: {:?}", e);
                    }
                }
                0
            }

            WM_SIZE => {
                self.resize_child_to_client();
                0
            }

            WM_ACTIVATE => {
                let child = self.child_content.get();
                if !child.is_invalid() {
                    let _ = unsafe { SetFocus(Some(child)) };
                }
                0
            }

            other => {
                let result = unsafe { DefWindowProcW(hwnd, other, WPARAM(wparam), LPARAM(lparam)) };
                result.0
            }
        }
    }

    fn client_area(&self) -> Rect {
        let hwnd = self.window_handle.get();
        let mut rc = RECT::default();
        if hwnd.is_invalid() {
            return Rect::default();
        }
        if let Err(e) = unsafe { GetClientRect(hwnd, &mut rc) } {
            warn!("[Win32Window] GetClientRect failed: {:?}", e);
            return Rect::default();
        }
        Rect { left: rc.left, top: rc.top, right: rc.right, bottom: rc.bottom }
    }

    /// Embeds `content` as a real child: strips `WS_POPUP`, adds `WS_CHILD`,
    /// re-parents, fills the client area and takes focus.
    fn set_child_content(&self, content: WindowHandle) {
        let child = to_hwnd(content);
        let parent = self.window_handle.get();
        info!("[Win32Window] Embedding {:?} into {:?}", child, parent);
        self.child_content.set(child);

        unsafe {
            let old = GetWindowLongPtrW(child, GWL_STYLE);
            let new = (old & !(WS_POPUP.0 as isize)) | WS_CHILD.0 as isize | WS_VISIBLE.0 as isize;
            SetWindowLongPtrW(child, GWL_STYLE, new);
            debug!("[Win32Window] Child style {:#x} → {:#x}", old, new);

            if let Err(e) = SetParent(child, Some(parent)) {
                warn!("[Win32Window] SetParent failed: {:?}", e);
            }
        }

        self.resize_child_to_client();
        let _ = unsafe { SetFocus(Some(child)) };
    }
}

/// A delegate whose base window is a [`Win32Window`].
pub trait HostedWindow: WindowDelegate {
    fn win32(&self) -> &Win32Window;
}

impl<F: ViewControllerFactory> HostedWindow for FlutterWindow<'_, Win32Window, F> {
    fn win32(&self) -> &Win32Window {
        self.base()
    }
}

enum Dispatch {
    Attach(HWND),
    Message(HWND, u32, WPARAM, LPARAM),
    Destroy,
}

/// Type-erased pointer to the delegate, stored in `GWLP_USERDATA`. Only shared
/// references are ever formed from `target`, since dispatches nest.
struct DelegateSlot {
    target: *const c_void,
    dispatch: unsafe fn(*const c_void, Dispatch) -> LRESULT,
}

unsafe fn dispatch<W: HostedWindow>(target: *const c_void, event: Dispatch) -> LRESULT {
    let window = unsafe { &*(target as *const W) };
    match event {
        Dispatch::Attach(hwnd) => {
            window.win32().attach(hwnd);
            LRESULT(0)
        }
        Dispatch::Message(hwnd, msg, wparam, lparam) => {
            LRESULT(window.message_handler(to_handle(hwnd), msg, wparam.0, lparam.0))
        }
        Dispatch::Destroy => {
            window.on_destroy();
            LRESULT(0)
        }
    }
}

unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        if msg == WM_NCCREATE {
            if let Some(cs) = (lparam.0 as *const CREATESTRUCTW).as_ref() {
                let slot = cs.lpCreateParams as *mut DelegateSlot;
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, slot as isize);
                if let Some(slot) = slot.as_ref() {
                    (slot.dispatch)(slot.target, Dispatch::Attach(hwnd));
                }
            } else {
                warn!("[Win32Window] CREATESTRUCTW was null");
            }
            let _ = EnableNonClientDpiScaling(hwnd);
            return DefWindowProcW(hwnd, msg, wparam, lparam);
        }

        let slot_ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut DelegateSlot;
        let Some(slot) = slot_ptr.as_ref() else {
            return DefWindowProcW(hwnd, msg, wparam, lparam);
        };

        if msg == WM_NCDESTROY {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            drop(Box::from_raw(slot_ptr));
            return DefWindowProcW(hwnd, msg, wparam, lparam);
        }

        let result = (slot.dispatch)(slot.target, Dispatch::Message(hwnd, msg, wparam, lparam));
        if msg == WM_DESTROY {
            (slot.dispatch)(slot.target, Dispatch::Destroy);
        }
        result
    }
}

static WINDOW_CLASS: OnceCell<u16> = OnceCell::new();

/// Registers our window class (once).
fn register_window_class() -> Result<()> {
    WINDOW_CLASS.get_or_try_init(|| unsafe {
        let hinst = GetModuleHandleW(None)?;
        let wc = WNDCLASSW {
            hInstance: hinst.into(),
            lpszClassName: constants::WINDOW_CLASS_NAME,
            lpfnWndProc: Some(wnd_proc),
            style: CS_HREDRAW | CS_VREDRAW,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            ..Default::default()
        };
        let atom = RegisterClassW(&wc);
        if atom == 0 {
            return Err(HostError::Win32 { function: "RegisterClassW", code: GetLastError().0 });
        }
        info!("[Win32Window] Window class registered");
        Ok(atom)
    })?;
    Ok(())
}

/// DPI scale of the monitor nearest to `origin`.
fn scale_factor_at(origin: Point) -> f64 {
    let mut dpi_x = 0u32;
    let mut dpi_y = 0u32;
    unsafe {
        let monitor = MonitorFromPoint(POINT { x: origin.x, y: origin.y }, MONITOR_DEFAULTTONEAREST);
        match GetDpiForMonitor(monitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y) {
            Ok(()) if dpi_x > 0 => dpi_x as f64 / BASE_DPI,
            _ => 1.0,
        }
    }
}

fn scale(value: i64, factor: f64) -> i32 {
    (value as f64 * factor).round() as i32
}

/// Null-terminated UTF-16 string for Win32 APIs.
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

/// Creates the OS window for `window` and runs its `on_create` hook.
///
/// `origin` and `size` are logical pixels, scaled to the DPI of the monitor
/// the window opens on. The window is left hidden; call
/// [`Win32Window::show`]. `window` must outlive the OS window.
pub fn create<W: HostedWindow>(window: &W, title: &str, origin: Point, size: Size) -> Result<HWND> {
    register_window_class()?;

    let hinstance = unsafe { GetModuleHandleW(None) }?;
    let factor = scale_factor_at(origin);
    let title_w = to_wide(title);
    let slot = Box::into_raw(Box::new(DelegateSlot {
        target: window as *const W as *const c_void,
        dispatch: dispatch::<W>,
    }));

    info!("[Win32Window] Creating main window (scale {:.2})", factor);
    let created = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            constants::WINDOW_CLASS_NAME,
            PCWSTR(title_w.as_ptr()),
            WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN,
            scale(origin.x.into(), factor),
            scale(origin.y.into(), factor),
            scale(size.width.into(), factor),
            scale(size.height.into(), factor),
            None,
            None,
            Some(hinstance.into()),
            Some(slot as *const c_void),
        )
    };

    let hwnd = match created {
        Ok(hwnd) => hwnd,
        Err(e) => {
            error!("[Win32Window] CreateWindowExW failed: {:?}", e);
            // Once WM_NCCREATE ran, WM_NCDESTROY frees the slot.
            if !window.win32().attached.get() {
                drop(unsafe { Box::from_raw(slot) });
            }
            return Err(e.into());
        }
    };
    info!("[Win32Window] Main window created: {:?}", hwnd);

    if !window.on_create() {
        error!("[Win32Window] on_create failed, destroying window");
        if let Err(e) = unsafe { DestroyWindow(hwnd) } {
            warn!("[Win32Window] DestroyWindow failed: {:?}", e);
        }
        return Err(HostError::WindowRejected);
    }
    Ok(hwnd)
}

/// Runs the Win32 message loop until `WM_QUIT`; returns its exit code.
pub fn run_message_loop() -> i32 {
    info!("[Win32Window] Entering message loop");
    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    info!("[Win32Window] Exited message loop");
    msg.wParam.0 as i32
}
