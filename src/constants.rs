use crate::host_types::{Point, Size};

/// The Win32 window class name used to register and create the main window.
#[cfg(target_os = "windows")]
pub const WINDOW_CLASS_NAME: windows::core::PCWSTR = windows::core::w!("FLUTTER_RUNNER_WIN32_WINDOW");

/// Configuration file looked up beside the executable.
pub const CONFIG_FILE_NAME: &str = "host_config.json";

/// Default size (in logical pixels) for the main application window.
pub const DEFAULT_WINDOW_SIZE: Size = Size { width: 1280, height: 720 };

/// Default top-left corner (in logical pixels) for the main application window.
pub const DEFAULT_WINDOW_ORIGIN: Point = Point { x: 10, y: 10 };

/// Title text for the main application window.
pub const DEFAULT_WINDOW_TITLE: &str = "Flutter Rust App";

/// Log filter used when neither the config nor `RUST_LOG` set one.
pub const DEFAULT_LOG_FILTER: &str = "info";
