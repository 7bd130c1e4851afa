//! Seam between the host-window adapter and the window framework it refines.
//!
//! All hooks and services take `&self`. Win32 delivers messages synchronously
//! and re-entrantly: `SetParent`, `MoveWindow` or `SetFocus` issued while a
//! hook runs send messages straight back into the window procedure, so the
//! shell only ever holds shared references and implementors keep their
//! mutable state in `Cell`/`RefCell`.

use crate::host_types::{LParam, LResult, Rect, WParam, WindowHandle};

/// Base window framework: default implementations of the three hooks plus the
/// geometry and parenting services a hosted view needs.
pub trait BaseWindow {
    /// Called once the OS window exists. Returning `false` aborts creation.
    fn on_create(&self) -> bool;

    /// Called while the OS window is being destroyed.
    fn on_destroy(&self);

    /// Default processing for a message no one else handled.
    fn message_handler(
        &self,
        hwnd: WindowHandle,
        message: u32,
        wparam: WParam,
        lparam: LParam,
    ) -> LResult;

    /// Current client rectangle in device pixels.
    fn client_area(&self) -> Rect;

    /// Parents `content` under this window and sizes it to the client area.
    fn set_child_content(&self, content: WindowHandle);
}

/// The hooks the OS shell drives on a hosted window.
///
/// `message_handler` and `on_destroy` may be entered while another hook is
/// still on the stack. Implementations must not panic on nesting: a panic
/// cannot unwind out of the window procedure.
pub trait WindowDelegate {
    fn on_create(&self) -> bool;

    fn on_destroy(&self);

    fn message_handler(
        &self,
        hwnd: WindowHandle,
        message: u32,
        wparam: WParam,
        lparam: LParam,
    ) -> LResult;
}
