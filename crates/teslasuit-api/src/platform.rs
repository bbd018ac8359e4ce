//! Platform-specific library naming and opening.

use std::path::Path;

use libloading::Library;
use teslasuit_errors::ApiError;

/// File name of the vendor library on this platform.
pub fn default_library_name() -> &'static str {
    if cfg!(windows) {
        "teslasuit_api.dll"
    } else if cfg!(target_os = "macos") {
        "libteslasuit_api.dylib"
    } else {
        "libteslasuit_api.so"
    }
}

/// Make `dir` visible to the dynamic loader so the vendor library can find
/// the DLLs it depends on.
#[cfg(windows)]
pub fn add_library_search_dir(dir: &Path) {
    use windows::Win32::System::LibraryLoader::SetDllDirectoryW;
    use windows::core::{HSTRING, PCWSTR};

    let wide = HSTRING::from(dir.as_os_str());
    // SAFETY: `wide` is a NUL-terminated UTF-16 string that outlives the call.
    match unsafe { SetDllDirectoryW(PCWSTR(wide.as_ptr())) } {
        Ok(()) => tracing::debug!(dir = %dir.display(), "Added DLL search directory"),
        Err(err) => tracing::warn!(dir = %dir.display(), error = %err, "SetDllDirectoryW failed"),
    }
}

/// Make `dir` visible to the dynamic loader so the vendor library can find
/// the libraries it depends on.
///
/// Unix loaders resolve dependencies through `RPATH` and the library is
/// opened by absolute path, so there is nothing to change.
#[cfg(not(windows))]
pub fn add_library_search_dir(dir: &Path) {
    tracing::debug!(dir = %dir.display(), "Opening vendor library by absolute path");
}

/// Open the library at `path`.
///
/// # Errors
///
/// Returns [`ApiError::LibraryLoad`] when the dynamic loader rejects the file.
#[cfg(unix)]
pub fn open_library(path: &Path) -> Result<Library, ApiError> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    // SAFETY: loading runs the vendor library's initializers, which is the
    // point of the call; no other invariants are assumed.
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL) }
        .map(Library::from)
        .map_err(|err| ApiError::library_load(path, err.to_string()))
}

/// Open the library at `path`.
///
/// # Errors
///
/// Returns [`ApiError::LibraryLoad`] when the dynamic loader rejects the file.
#[cfg(not(unix))]
pub fn open_library(path: &Path) -> Result<Library, ApiError> {
    // SAFETY: loading runs the vendor library's initializers, which is the
    // point of the call; no other invariants are assumed.
    unsafe { Library::new(path) }.map_err(|err| ApiError::library_load(path, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_name_matches_platform() {
        let name = default_library_name();
        assert!(name.contains("teslasuit_api"));
        if cfg!(target_os = "linux") {
            assert_eq!(name, "libteslasuit_api.so");
        }
    }

    #[test]
    fn test_open_missing_library_fails_cleanly() {
        let path = Path::new("/nonexistent/teslasuit/libteslasuit_api.so");
        let result = open_library(path);
        assert!(matches!(result, Err(ApiError::LibraryLoad { .. })));
    }
}
