//! Location of the Flutter assets a window runs, plus the Dart entrypoint.
//!
//! Layout produced by `flutter build windows`:
//! 1. `<root>/data/flutter_assets`
//! 2. `<root>/data/icudtl.dat`
//! 3. `<root>/data/app.so` (release/profile only; debug runs from the kernel
//!    snapshot inside `flutter_assets`)

use std::{
    ffi::{c_char, CString},
    path::{Path, PathBuf},
    ptr,
};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    bindings::{
        FlutterDesktopEngineProperties, FlutterDesktopGpuPreference_NoPreference,
        FlutterDesktopUIThreadPolicy_Default,
    },
    error::HostError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartProject {
    assets_path: PathBuf,
    icu_data_path: PathBuf,
    aot_library_path: Option<PathBuf>,
    dart_entrypoint: Option<String>,
    dart_entrypoint_arguments: Vec<String>,
}

impl DartProject {
    /// Resolves the standard `data/` layout under `root`.
    pub fn new(root: &Path) -> crate::error::Result<Self> {
        let data_dir = root.join("data");
        info!("[DartProject] Data directory path: {:?}", data_dir);

        let assets_dir = data_dir.join("flutter_assets");
        let icu_file = data_dir.join("icudtl.dat");
        let aot_lib = data_dir.join("app.so");

        if !assets_dir.is_dir() {
            return Err(HostError::MissingAsset { kind: "flutter_assets", path: assets_dir });
        }
        if !icu_file.is_file() {
            return Err(HostError::MissingAsset { kind: "icudtl.dat", path: icu_file });
        }
        let aot_lib = aot_lib.is_file().then_some(aot_lib);

        debug!(
            "[DartProject] Validated paths: assets=`{}`, icu=`{}`, aot={:?}",
            assets_dir.display(),
            icu_file.display(),
            aot_lib,
        );

        Ok(Self::from_paths(assets_dir, icu_file, aot_lib))
    }

    /// Uses explicit paths without touching the filesystem.
    pub fn from_paths(
        assets_path: PathBuf,
        icu_data_path: PathBuf,
        aot_library_path: Option<PathBuf>,
    ) -> Self {
        Self {
            assets_path,
            icu_data_path,
            aot_library_path,
            dart_entrypoint: None,
            dart_entrypoint_arguments: Vec::new(),
        }
    }

    pub fn assets_path(&self) -> &Path {
        &self.assets_path
    }

    pub fn icu_data_path(&self) -> &Path {
        &self.icu_data_path
    }

    pub fn aot_library_path(&self) -> Option<&Path> {
        self.aot_library_path.as_deref()
    }

    /// `None` runs `main`.
    pub fn set_dart_entrypoint(&mut self, entrypoint: Option<String>) {
        self.dart_entrypoint = entrypoint;
    }

    pub fn dart_entrypoint(&self) -> Option<&str> {
        self.dart_entrypoint.as_deref()
    }

    /// Arguments passed to the Dart entrypoint's `List<String> args`.
    pub fn set_dart_entrypoint_arguments(&mut self, arguments: Vec<String>) {
        self.dart_entrypoint_arguments = arguments;
    }

    pub fn dart_entrypoint_arguments(&self) -> &[String] {
        &self.dart_entrypoint_arguments
    }

    /// Builds the buffers backing `FlutterDesktopEngineProperties`.
    pub fn engine_properties(&self) -> Result<EngineProperties> {
        let entrypoint = self
            .dart_entrypoint
            .as_deref()
            .map(CString::new)
            .transpose()
            .context("Dart entrypoint contains a NUL byte")?;
        let arguments = self
            .dart_entrypoint_arguments
            .iter()
            .map(|a| CString::new(a.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Dart entrypoint argument contains a NUL byte")?;
        let argv = arguments.iter().map(|a| a.as_ptr()).collect();

        Ok(EngineProperties {
            assets: to_wide(&self.assets_path),
            icu: to_wide(&self.icu_data_path),
            aot: self.aot_library_path.as_deref().map(to_wide),
            entrypoint,
            _arguments: arguments,
            argv,
        })
    }
}

/// Owned storage for the engine properties; the FFI view borrows from it.
#[derive(Debug)]
pub struct EngineProperties {
    assets: Vec<u16>,
    icu: Vec<u16>,
    aot: Option<Vec<u16>>,
    entrypoint: Option<CString>,
    _arguments: Vec<CString>,
    argv: Vec<*const c_char>,
}

impl EngineProperties {
    /// The returned struct points into `self` and must not outlive it.
    pub fn as_ffi(&self) -> FlutterDesktopEngineProperties {
        FlutterDesktopEngineProperties {
            assets_path: self.assets.as_ptr(),
            icu_data_path: self.icu.as_ptr(),
            aot_library_path: self.aot.as_ref().map_or(ptr::null(), |v| v.as_ptr()),
            dart_entrypoint: self.entrypoint.as_ref().map_or(ptr::null(), |e| e.as_ptr()),
            dart_entrypoint_argc: self.argv.len() as i32,
            dart_entrypoint_argv: if self.argv.is_empty() {
                ptr::null_mut()
            } else {
                self.argv.as_ptr() as *mut *const c_char
            },
            gpu_preference: FlutterDesktopGpuPreference_NoPreference,
            ui_thread_policy: FlutterDesktopUIThreadPolicy_Default,
        }
    }
}

/// Directory containing the running executable.
pub fn executable_directory() -> Result<PathBuf> {
    std::env::current_exe()
        .context("Failed to get current exe path")?
        .parent()
        .map(PathBuf::from)
        .context("Exe has no parent directory")
}

/// Null-terminated UTF-16 path for Win32 APIs.
#[cfg(target_os = "windows")]
fn to_wide(p: &Path) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    p.as_os_str().encode_wide().chain(std::iter::once(0)).collect()
}

#[cfg(not(target_os = "windows"))]
fn to_wide(p: &Path) -> Vec<u16> {
    p.to_string_lossy().encode_utf16().chain(std::iter::once(0)).collect()
}
