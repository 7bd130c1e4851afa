//! Plugin registrant for plugins shipped as DLLs beside the executable.
//!
//! Every DLL exporting `*RegisterWithRegistrar` (the C entry point generated
//! for Flutter Windows plugins) is loaded and bound to the engine.

use anyhow::{Context, Result};
use goblin::Object;
use libloading::{Library, Symbol};
use log::{debug, error, info, warn};
use std::{
    ffi::CString,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    bindings::FlutterDesktopPluginRegistrarRef,
    dart_project::executable_directory,
    dynamic_flutter_windows_dll_loader::FLUTTER_WINDOWS_DLL,
    flutter_view_controller::DesktopEngine,
};

const REG_SUFFIX: &str = "RegisterWithRegistrar";

/// Binds all plugins found beside the executable to `engine`.
pub fn register_plugins(engine: &DesktopEngine) {
    let result = executable_directory().and_then(|dir| load_and_register_plugins(&dir, engine));
    if let Err(e) = result {
        error!("[Plugins] Plugin registration failed: {:#}", e);
    }
}

/// Export names ending in `RegisterWithRegistrar` from a PE image.
fn registration_exports(data: &[u8]) -> Result<Vec<String>> {
    match Object::parse(data)? {
        Object::PE(pe) => Ok(pe
            .exports
            .iter()
            .filter_map(|e| e.name)
            .filter(|n| n.ends_with(REG_SUFFIX))
            .map(str::to_string)
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Scan the directory for all DLLs exporting `*RegisterWithRegistrar`.
fn discover_plugins(release_dir: &Path) -> Result<Vec<(PathBuf, Vec<String>)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(release_dir)
        .with_context(|| format!("reading directory {}", release_dir.display()))?
    {
        let dll = entry?.path();
        let is_dll = dll
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("dll"));
        let is_runtime = dll
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case(FLUTTER_WINDOWS_DLL));
        if !is_dll || is_runtime {
            continue;
        }

        let data = match fs::read(&dll) {
            Ok(data) => data,
            Err(e) => {
                warn!("[Plugins] Skipping {}: {}", dll.display(), e);
                continue;
            }
        };
        match registration_exports(&data) {
            Ok(syms) if !syms.is_empty() => out.push((dll, syms)),
            Ok(_) => {}
            Err(e) => warn!("[Plugins] Skipping {}: {}", dll.display(), e),
        }
    }
    out.sort();
    Ok(out)
}

/// Load one DLL and invoke each `xxxRegisterWithRegistrar` symbol.
fn load_and_register(
    dll: &Path,
    symbols: &[String],
    registrar: FlutterDesktopPluginRegistrarRef,
) -> Result<()> {
    let lib = unsafe { Library::new(dll).with_context(|| format!("loading {}", dll.display()))? };
    for sym in symbols {
        let cname = CString::new(sym.as_str())?;
        let func: Symbol<unsafe extern "C" fn(FlutterDesktopPluginRegistrarRef)> =
            unsafe { lib.get(cname.as_bytes_with_nul()).with_context(|| format!("symbol {}", sym))? };
        debug!("[Plugins] {} → {}", dll.display(), sym);
        unsafe { func(registrar) };
    }
    // keep the library alive for the life of the process
    std::mem::forget(lib);
    Ok(())
}

/// Runs `register` for each discovered plugin, named by its file stem. A
/// failing plugin is logged and skipped. Returns how many registered.
fn register_discovered<R>(plugins: Vec<(PathBuf, Vec<String>)>, mut register: R) -> usize
where
    R: FnMut(&str, &Path, &[String]) -> Result<()>,
{
    let mut registered = 0;
    for (dll_path, symbols) in plugins {
        let plugin_name = dll_path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        match register(plugin_name, &dll_path, &symbols) {
            Ok(()) => {
                info!("[Plugins] Registered {}", plugin_name);
                registered += 1;
            }
            Err(e) => warn!("[Plugins] Skipping {}: {:#}", dll_path.display(), e),
        }
    }
    registered
}

/// Discover every plugin DLL and register it against the engine.
pub fn load_and_register_plugins(release_dir: &Path, engine: &DesktopEngine) -> Result<()> {
    let plugins = discover_plugins(release_dir)
        .with_context(|| format!("discovering plugins in {}", release_dir.display()))?;
    let found = plugins.len();
    let registered = register_discovered(plugins, |name, dll, symbols| {
        let c_name = CString::new(name)?;
        load_and_register(dll, symbols, engine.plugin_registrar(&c_name))
    });
    debug!("[Plugins] {}/{} plugins registered", registered, found);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("flutter_runner_plugins_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn empty_directory_has_no_plugins() {
        let dir = scratch_dir("empty");
        assert!(discover_plugins(&dir).unwrap().is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn non_pe_and_non_dll_files_are_skipped() {
        let dir = scratch_dir("junk");
        fs::write(dir.join("broken.dll"), b"not a portable executable").unwrap();
        fs::write(dir.join("readme.txt"), b"UrlLauncherWindowsRegisterWithRegistrar").unwrap();
        fs::write(dir.join(FLUTTER_WINDOWS_DLL), b"runtime").unwrap();

        assert!(discover_plugins(&dir).unwrap().is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = std::env::temp_dir().join("flutter_runner_plugins_does_not_exist");
        assert!(discover_plugins(&dir).is_err());
    }

    #[test]
    fn plain_text_exports_nothing() {
        let exports = registration_exports(b"FooRegisterWithRegistrar padding bytes");
        assert!(exports.map(|syms| syms.is_empty()).unwrap_or(true));
    }

    #[test]
    fn failing_plugin_does_not_stop_later_ones() {
        let dir = scratch_dir("partial");
        let plugins = vec![
            (dir.join("broken_plugin.dll"), vec!["BrokenPluginRegisterWithRegistrar".to_string()]),
            (dir.join("url_launcher.dll"), vec!["UrlLauncherRegisterWithRegistrar".to_string()]),
        ];

        let mut seen = Vec::new();
        let registered = register_discovered(plugins, |name, dll, symbols| {
            if name == "broken_plugin" {
                // Not on disk, so the load itself fails.
                return load_and_register(dll, symbols, ptr::null_mut());
            }
            seen.push(name.to_string());
            Ok(())
        });

        assert_eq!(registered, 1);
        assert_eq!(seen, vec!["url_launcher".to_string()]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
