//! Platform-neutral Win32 message vocabulary shared by the adapter and its
//! collaborators.
//!
//! The values mirror the Win32 ABI (`HWND`, `WPARAM`, `LPARAM`, `LRESULT`) so
//! the concrete window can pass them through without reinterpretation.

/// Word-sized first message parameter.
pub type WParam = usize;
/// Word-sized second message parameter.
pub type LParam = isize;
/// Pointer-sized message result code.
pub type LResult = isize;

/// Raw OS window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<crate::bindings::HWND> for WindowHandle {
    fn from(raw: crate::bindings::HWND) -> Self {
        WindowHandle(raw as isize)
    }
}

/// Window rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Window origin in logical (96 DPI) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Window size in logical (96 DPI) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Window message codes, numerically identical to `WindowsAndMessaging`.
pub mod messages {
    pub const WM_DESTROY: u32 = 0x0002;
    pub const WM_SIZE: u32 = 0x0005;
    pub const WM_ACTIVATE: u32 = 0x0006;
    pub const WM_FONTCHANGE: u32 = 0x001D;
    pub const WM_NCCREATE: u32 = 0x0081;
    pub const WM_NCDESTROY: u32 = 0x0082;
    pub const WM_POINTERUPDATE: u32 = 0x0245;
    pub const WM_DPICHANGED: u32 = 0x02E0;
}
