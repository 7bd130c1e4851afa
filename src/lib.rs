#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

//! A Windows host application that embeds a Flutter view.
//!
//! - Initializes COM (STA) for Flutter plugins and Win32 operations
//! - Resolves the Dart project and loads `flutter_windows.dll`
//! - Creates a top-level Win32 window hosting a [`flutter_window::FlutterWindow`]
//! - Registers plugins found beside the executable
//! - Runs the standard message loop and cleans up on exit

pub mod base_window;
pub mod bindings;
pub mod config;
pub mod constants;
pub mod dart_project;
pub mod dynamic_flutter_windows_dll_loader;
pub mod error;
pub mod flutter_view_controller;
pub mod flutter_window;
pub mod host_types;
pub mod plugin_loader;
pub mod runtime;
#[cfg(target_os = "windows")]
pub mod win32_window;

use std::sync::Once;

use env_logger::{Builder, Env};
use log::LevelFilter;

// when we init logging on first flutter app start then close the app and reopen another one
// from the same rust process, we get init log error so we make it static and only init once
static LOGGER_INIT: Once = Once::new();

/// Initializes `env_logger` once per process. `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    LOGGER_INIT.call_once(|| {
        Builder::from_env(Env::default().default_filter_or(default_filter))
            .filter_module("goblin", LevelFilter::Off)
            .init();
    });
}

#[cfg(target_os = "windows")]
pub use bootstrap::{init_flutter_window, run_with_config};

#[cfg(target_os = "windows")]
mod bootstrap {
    use anyhow::{Context, Result};
    use log::{error, info};
    use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};

    use crate::{
        config::HostConfig,
        dart_project::{executable_directory, DartProject},
        dynamic_flutter_windows_dll_loader::FlutterDll,
        flutter_view_controller::DesktopViewControllerFactory,
        flutter_window::FlutterWindow,
        plugin_loader, win32_window,
        win32_window::Win32Window,
    };

    struct ComApartment;

    impl ComApartment {
        fn init() -> Result<Self> {
            unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
                .ok()
                .context("COM init failed (STA)")?;
            info!("COM initialized (STA)");
            Ok(ComApartment)
        }
    }

    impl Drop for ComApartment {
        fn drop(&mut self) {
            unsafe { CoUninitialize() };
        }
    }

    /// Program entry point: reads `host_config.json` beside the executable and
    /// runs the window until it is closed. Returns the process exit code.
    pub fn init_flutter_window() -> i32 {
        let config = executable_directory().and_then(|dir| HostConfig::load_or_default(&dir));
        let config = match config {
            Ok(c) => c,
            Err(e) => {
                crate::init_logging(crate::constants::DEFAULT_LOG_FILTER);
                error!("Invalid host configuration: {:#}", e);
                return 1;
            }
        };

        match run_with_config(&config) {
            Ok(code) => code,
            Err(e) => {
                error!("Flutter window failed: {:#}", e);
                1
            }
        }
    }

    /// Runs the Flutter window described by `config` until it is closed.
    pub fn run_with_config(config: &HostConfig) -> Result<i32> {
        crate::init_logging(&config.log_filter);
        let _com = ComApartment::init()?;

        let root = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => executable_directory()?,
        };
        let mut project = DartProject::new(&root)?;
        project.set_dart_entrypoint(config.dart_entrypoint.clone());
        project.set_dart_entrypoint_arguments(config.entrypoint_arguments(std::env::args().skip(1)));

        let dll = FlutterDll::get_for(config.dll_dir.as_deref())?;
        info!("Flutter DLL loaded");

        let window = FlutterWindow::new(
            Win32Window::new(),
            &project,
            DesktopViewControllerFactory::new(dll),
            plugin_loader::register_plugins,
        );
        win32_window::create(&window, &config.title, config.origin, config.size)
            .context("Failed to create main window")?;
        window.base().show();

        let code = win32_window::run_message_loop();
        info!("Application exiting ({})", code);
        Ok(code)
    }
}
