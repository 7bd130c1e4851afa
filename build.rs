// Bindings for flutter_windows.h are checked in under src/bindings. Enable the
// `regenerate-bindings` feature with the Flutter headers placed in
// `flutter_artifacts/include` to regenerate them.

#[cfg(feature = "regenerate-bindings")]
fn main() {
    use std::{env, path::PathBuf};

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let include_dir = manifest_dir.join("flutter_artifacts").join("include");
    let header_windows = include_dir.join("flutter_windows.h");

    println!("cargo:rerun-if-changed={}", header_windows.display());
    assert!(header_windows.is_file(), "flutter_windows.h not found");

    let bindings_windows = bindgen::Builder::default()
        .header(header_windows.to_str().unwrap())
        .clang_arg(format!("-I{}", include_dir.display()))
        .allowlist_type("FlutterDesktopEngineRef")
        .allowlist_type("FlutterDesktopPluginRegistrarRef")
        .allowlist_type("FlutterDesktopViewControllerRef")
        .allowlist_type("FlutterDesktopViewRef")
        .allowlist_type("FlutterDesktopEngineProperties")
        .allowlist_type("HWND")
        .allowlist_type("WPARAM")
        .allowlist_type("LPARAM")
        .allowlist_type("LRESULT")
        .allowlist_type("UINT")
        .allowlist_function("FlutterDesktopEngineCreate")
        .allowlist_function("FlutterDesktopEngineGetPluginRegistrar")
        .allowlist_function("FlutterDesktopEngineReloadSystemFonts")
        .allowlist_function("FlutterDesktopViewControllerCreate")
        .allowlist_function("FlutterDesktopViewControllerGetView")
        .allowlist_function("FlutterDesktopViewControllerGetEngine")
        .allowlist_function("FlutterDesktopViewControllerForceRedraw")
        .allowlist_function("FlutterDesktopViewControllerHandleTopLevelWindowProc")
        .allowlist_function("FlutterDesktopViewControllerDestroy")
        .allowlist_function("FlutterDesktopViewGetHWND")
        .generate()
        .expect("Unable to generate flutter_windows bindings");

    bindings_windows
        .write_to_file(manifest_dir.join("src").join("bindings").join("flutter_windows_bindings.rs"))
        .expect("Couldn't write flutter_windows bindings");
}

#[cfg(not(feature = "regenerate-bindings"))]
fn main() {}
