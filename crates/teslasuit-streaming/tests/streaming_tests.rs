//! Streaming adapters driven by mock vendor callbacks.

use std::sync::Arc;

use proptest::prelude::*;
use teslasuit_api::ffi::symbols;
use teslasuit_api::{
    BoneIndex, DeviceDescriptor, DeviceHandle, MocapBone, PpgFrame, PpgNode, Quat, SkeletonFrame,
    Vec3f, VendorApi,
};
use teslasuit_errors::{StatusCode, TeslasuitError, ValidationError};
use teslasuit_streaming::{BoneTransform, MocapStream, PpgSample, PpgStream, TRACKED_BONES};
use teslasuit_test_helpers::prelude::*;

fn device(api: &MockVendorApi, n: u8) -> Result<DeviceHandle, Box<dyn std::error::Error>> {
    Ok(api.open_device(&DeviceDescriptor::new([n; 16]))?)
}

fn bone(x: f32, y: f32, z: f32) -> MocapBone {
    MocapBone {
        position: Vec3f { x, y, z },
        rotation: Quat::default(),
    }
}

mod mocap_tests {
    use super::*;

    #[test]
    fn test_set_device_installs_sink_and_starts() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        api.clear_calls();
        let stream = MocapStream::new(api.clone());

        stream.set_device(dev)?;

        assert!(stream.is_running());
        assert!(api.has_skeleton_sink(dev));
        assert_eq!(
            api.calls(),
            vec![
                ApiCall::SetSkeletonSink { device: dev, installed: true },
                ApiCall::MocapStart(dev),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_frames_update_tracked_bones_in_host_space() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = MocapStream::new(api.clone());
        stream.set_device(dev)?;

        let frame: SkeletonFrame = [
            (BoneIndex::Hips, bone(1.0, 2.0, 3.0)),
            (BoneIndex::Head, bone(9.0, 9.0, 9.0)),
        ]
        .into_iter()
        .collect();
        assert!(api.emit_skeleton(dev, &frame));

        let hips = stream.bone(BoneIndex::Hips).ok_or("hips missing")?;
        assert_eq!(hips.translation, [1.0, 3.0, -2.0]);
        assert_eq!(stream.bone(BoneIndex::Head), None);
        assert_eq!(stream.snapshot().len(), TRACKED_BONES.len());
        assert_eq!(stream.frame_count(), 1);
        Ok(())
    }

    #[test]
    fn test_untouched_bones_stay_identity() {
        let stream = MocapStream::new(MockVendorApi::shared());
        assert!(stream.snapshot().values().all(|t| *t == BoneTransform::IDENTITY));
    }

    #[test]
    fn test_switching_device_stops_previous_stream() -> TestResult {
        let api = MockVendorApi::shared();
        let a = device(&api, 1)?;
        let b = device(&api, 2)?;
        let stream = MocapStream::new(api.clone());
        stream.set_device(a)?;

        stream.set_device(b)?;

        assert!(!api.has_skeleton_sink(a));
        assert!(api.calls().contains(&ApiCall::MocapStop(a)));
        assert_eq!(stream.device(), Some(b));

        // Late frames from the old device are ignored.
        let frame: SkeletonFrame = [(BoneIndex::Hips, bone(5.0, 5.0, 5.0))].into_iter().collect();
        assert!(!api.emit_skeleton(a, &frame));
        assert_eq!(stream.frame_count(), 0);
        Ok(())
    }

    #[test]
    fn test_stopped_stream_ignores_stale_sink() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = Arc::new(MocapStream::new(api.clone()));
        stream.set_device(dev)?;
        // Keep the sink installed even though the stream stops.
        api.remove_symbol(symbols::MOCAP_SET_SKELETON_CALLBACK);
        assert!(stream.stop().is_err());
        assert!(!stream.is_running());

        let frame: SkeletonFrame = [(BoneIndex::Hips, bone(5.0, 5.0, 5.0))].into_iter().collect();
        assert!(api.emit_skeleton(dev, &frame));
        assert_eq!(stream.frame_count(), 0);
        Ok(())
    }

    #[test]
    fn test_start_failure_leaves_stream_stopped() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        api.fail_status(symbols::MOCAP_START_STREAMING, StatusCode::NoDevice);
        let stream = MocapStream::new(api.clone());

        assert!(matches!(stream.set_device(dev), Err(TeslasuitError::Api(_))));
        assert!(!stream.is_running());
        Ok(())
    }

    #[test]
    fn test_start_and_calibrate_need_device() {
        let stream = MocapStream::new(MockVendorApi::shared());
        assert!(matches!(
            stream.start(),
            Err(TeslasuitError::Validation(ValidationError::Required(_)))
        ));
        assert!(stream.calibrate().is_err());
        assert!(stream.stop().is_ok());
    }

    #[test]
    fn test_drop_stops_streaming() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = MocapStream::new(api.clone());
        stream.set_device(dev)?;
        stream.calibrate()?;

        drop(stream);

        assert!(!api.has_skeleton_sink(dev));
        assert!(api.calls().contains(&ApiCall::MocapCalibrate(dev)));
        assert_eq!(api.calls().last(), Some(&ApiCall::MocapStop(dev)));
        Ok(())
    }

    #[test]
    fn test_concurrent_start_stop_leaves_consistent_state() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = MocapStream::new(api.clone());
        stream.set_device(dev)?;

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        assert!(stream.stop().is_ok());
                        assert!(stream.start().is_ok());
                    }
                });
            }
        });
        stream.stop()?;

        assert!(!stream.is_running());
        assert!(!api.has_skeleton_sink(dev));
        Ok(())
    }

    #[test]
    fn test_concurrent_device_switches_keep_one_sink() -> TestResult {
        let api = MockVendorApi::shared();
        let a = device(&api, 1)?;
        let b = device(&api, 2)?;
        let stream = MocapStream::new(api.clone());

        std::thread::scope(|scope| {
            for dev in [a, b] {
                let stream = &stream;
                scope.spawn(move || {
                    for _ in 0..100 {
                        assert!(stream.set_device(dev).is_ok());
                    }
                });
            }
        });

        let current = stream.device().ok_or("no device attached")?;
        let other = if current == a { b } else { a };
        assert!(stream.is_running());
        assert!(api.has_skeleton_sink(current));
        assert!(!api.has_skeleton_sink(other));
        Ok(())
    }

    #[test]
    fn test_from_unloaded_loader_fails() {
        let (loader, _opener) = mock_loader(MockVendorApi::shared());
        assert!(MocapStream::from_loader(&loader).is_err());
    }
}

mod ppg_tests {
    use super::*;

    fn frame(nodes: &[(u8, u32, u8)]) -> PpgFrame {
        PpgFrame {
            nodes: nodes
                .iter()
                .map(|&(index, heart_rate, oxygen_percent)| PpgNode {
                    index,
                    heart_rate,
                    oxygen_percent,
                })
                .collect(),
        }
    }

    #[test]
    fn test_first_node_is_kept() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = PpgStream::new(api.clone());
        stream.set_device(dev)?;
        assert_eq!(stream.snapshot(), None);

        api.emit_ppg(dev, &frame(&[(3, 72, 98), (4, 80, 95)]));

        assert_eq!(
            stream.snapshot(),
            Some(PpgSample {
                node: 3,
                heart_rate: 72,
                oxygen_percent: 98
            })
        );
        Ok(())
    }

    #[test]
    fn test_empty_frame_keeps_previous_reading() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = PpgStream::new(api.clone());
        stream.set_device(dev)?;

        api.emit_ppg(dev, &frame(&[(0, 60, 99)]));
        api.emit_ppg(dev, &frame(&[]));

        assert_eq!(stream.snapshot().map(|s| s.heart_rate), Some(60));
        Ok(())
    }

    #[test]
    fn test_uses_ppg_entry_points() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = PpgStream::new(api.clone());
        stream.set_device(dev)?;
        stream.calibrate()?;
        stream.stop()?;

        let calls = api.calls();
        assert!(calls.contains(&ApiCall::PpgStart(dev)));
        assert!(calls.contains(&ApiCall::PpgCalibrate(dev)));
        assert!(calls.contains(&ApiCall::PpgStop(dev)));
        assert!(!api.has_ppg_sink(dev));
        Ok(())
    }

    #[test]
    fn test_concurrent_start_stop_matches_sink() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = PpgStream::new(api.clone());
        stream.set_device(dev)?;

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..200 {
                    assert!(stream.stop().is_ok());
                }
            });
            scope.spawn(|| {
                for _ in 0..200 {
                    assert!(stream.start().is_ok());
                }
            });
        });

        assert_eq!(stream.is_running(), api.has_ppg_sink(dev));
        Ok(())
    }

    #[test]
    fn test_restart_after_stop_reinstalls_sink() -> TestResult {
        let api = MockVendorApi::shared();
        let dev = device(&api, 1)?;
        let stream = PpgStream::new(api.clone());
        stream.set_device(dev)?;
        stream.stop()?;

        stream.start()?;

        assert!(api.has_ppg_sink(dev));
        api.emit_ppg(dev, &frame(&[(1, 70, 97)]));
        assert!(stream.snapshot().is_some());
        Ok(())
    }
}

proptest! {
    #[test]
    fn prop_conversion_preserves_magnitude(x in -10.0_f32..10.0, y in -10.0_f32..10.0, z in -10.0_f32..10.0) {
        let t = BoneTransform::from_vendor(&bone(x, y, z));
        let before = x * x + y * y + z * z;
        let after: f32 = t.translation.iter().map(|v| v * v).sum();
        prop_assert!((before - after).abs() <= 1e-3);
        prop_assert_eq!(t.rotation, [0.0, 0.0, -0.0, 1.0]);
    }
}
