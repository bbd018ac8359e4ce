//! Load/unload lifecycle against a mock opener.

use std::path::PathBuf;
use std::sync::Arc;

use teslasuit_api::ffi::symbols;
use teslasuit_api::{Core, LibraryLoader, LoadOutcome, LoaderConfig, VendorApi};
use teslasuit_errors::{ApiError, StatusCode};
use teslasuit_test_helpers::prelude::*;

#[test]
fn test_load_twice_opens_once() -> TestResult {
    let (loader, opener) = mock_loader(MockVendorApi::shared());

    assert_eq!(loader.load()?, LoadOutcome::Loaded);
    assert_eq!(loader.load()?, LoadOutcome::AlreadyLoaded);
    assert_eq!(opener.open_count(), 1);
    assert_eq!(loader.load_cycles(), 1);
    Ok(())
}

#[test]
fn test_library_path_joins_install_dir() -> TestResult {
    let (loader, opener) = mock_loader(MockVendorApi::shared());
    loader.load()?;

    let expected = PathBuf::from(teslasuit_test_helpers::opener::MOCK_INSTALL_DIR)
        .join(teslasuit_api::platform::default_library_name());
    assert_eq!(opener.opened_paths(), vec![expected]);
    Ok(())
}

#[test]
fn test_unload_when_unloaded_is_noop() {
    let (loader, opener) = mock_loader(MockVendorApi::shared());

    assert!(!loader.unload());
    assert!(!loader.is_loaded());
    assert_eq!(opener.open_count(), 0);
}

#[test]
fn test_unload_then_load_reopens() -> TestResult {
    let (loader, opener) = mock_loader(MockVendorApi::shared());
    loader.load()?;
    assert!(loader.unload());
    assert!(!loader.unload());

    assert_eq!(loader.load()?, LoadOutcome::Loaded);
    assert_eq!(opener.open_count(), 2);
    assert_eq!(loader.load_cycles(), 2);
    Ok(())
}

#[test]
fn test_failed_open_leaves_loader_unloaded() {
    let (loader, opener) = mock_loader(MockVendorApi::shared());
    opener.set_failing(true);

    let err = must_err(loader.load());
    assert!(matches!(err, ApiError::LibraryLoad { .. }));
    assert!(!loader.is_loaded());
    assert!(loader.capabilities().is_none());

    opener.set_failing(false);
    assert_eq!(must(loader.load()), LoadOutcome::Loaded);
}

#[test]
fn test_missing_install_dir_is_a_load_failure() {
    let api = MockVendorApi::shared();
    let opener = MockLibraryOpener::new(api);
    let config = LoaderConfig {
        install_dir_env: "TESLASUIT_LOADER_TEST_UNSET_VARIABLE".into(),
        ..LoaderConfig::default()
    };
    let loader = LibraryLoader::with_opener(config, opener.clone());

    let err = must_err(loader.load());
    assert!(matches!(err, ApiError::NoLibraryDirectory { .. }));
    assert_eq!(opener.open_count(), 0);
}

#[test]
fn test_require_while_unloaded() {
    let (loader, _) = mock_loader(MockVendorApi::shared());
    assert!(matches!(loader.require(), Err(ApiError::NotLoaded)));
}

#[test]
fn test_capabilities_outlive_unload() -> TestResult {
    let api = MockVendorApi::shared();
    let (loader, _) = mock_loader(api.clone());
    loader.load()?;
    let held = loader.require()?;
    loader.unload();

    held.initialize()?;
    assert_eq!(api.calls(), vec![ApiCall::Initialize]);
    Ok(())
}

mod core_tests {
    use super::*;

    #[test]
    fn test_initialize_loads_and_initializes() -> TestResult {
        let api = MockVendorApi::shared();
        let (loader, _) = mock_loader(api.clone());
        let core = Core::new(loader.clone());

        core.initialize()?;
        assert!(core.is_initialized());
        assert!(loader.is_loaded());
        assert_eq!(api.calls(), vec![ApiCall::Initialize]);
        Ok(())
    }

    #[test]
    fn test_uninitialize_reverses_initialize() -> TestResult {
        let api = MockVendorApi::shared();
        let (loader, _) = mock_loader(api.clone());
        let core = Core::new(loader.clone());
        core.initialize()?;

        core.uninitialize();
        assert!(!core.is_initialized());
        assert!(!loader.is_loaded());
        assert_eq!(api.calls(), vec![ApiCall::Initialize, ApiCall::Uninitialize]);

        core.uninitialize();
        assert_eq!(api.calls().len(), 2);
        Ok(())
    }

    #[test]
    fn test_initialize_status_failure_is_reported() {
        let api = MockVendorApi::shared();
        api.fail_status(symbols::INITIALIZE, StatusCode::ServiceStartFailed);
        let (loader, _) = mock_loader(api);
        let core = Core::new(Arc::clone(&loader));

        let err = must_err(core.initialize());
        assert!(matches!(
            err,
            ApiError::Status {
                code: StatusCode::ServiceStartFailed,
                ..
            }
        ));
        assert!(!core.is_initialized());
        assert!(loader.is_loaded());
    }
}
