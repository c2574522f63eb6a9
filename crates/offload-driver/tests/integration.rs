//! Binding behaviour seen from several concurrent users.

use std::sync::Arc;
use std::thread;

use offload_config::DriverConfig;
use offload_core::{KeyVector, ModuleTag, keys};
use offload_driver::sim::{SimDriver, SimLoader};
use offload_driver::{DriverBinding, DriverCommand, DriverError, GraphDriver, Operation};

fn gkv() -> KeyVector {
    KeyVector::from(vec![
        (keys::key::STREAMRX, keys::value::PCM_LL_PLAYBACK),
        (keys::key::DEVICERX, keys::value::SPEAKER),
    ])
}

#[test]
fn sessions_share_one_driver_with_distinct_handles() {
    let sim = Arc::new(SimDriver::new());
    let binding = Arc::new(DriverBinding::new(SimLoader::new(Arc::clone(&sim))));
    binding.init(&DriverConfig::new("/cal.acdb")).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let binding = Arc::clone(&binding);
            thread::spawn(move || {
                let driver = binding.driver().unwrap();
                let handle = driver.open(&gkv(), &KeyVector::new()).unwrap();
                driver.ioctl(&handle, &DriverCommand::Start).unwrap();
                let raw = handle.raw();
                driver.close(&handle).unwrap();
                raw
            })
        })
        .collect();

    let mut raws: Vec<u64> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    raws.sort_unstable();
    raws.dedup();
    assert_eq!(raws.len(), 4);
    assert_eq!(sim.open_graphs(), 0);
}

#[test]
fn concurrent_init_loads_once() {
    let sim = Arc::new(SimDriver::new());
    let loader = SimLoader::new(Arc::clone(&sim));
    let binding = Arc::new(DriverBinding::new(loader.clone()));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let binding = Arc::clone(&binding);
            thread::spawn(move || binding.init(&DriverConfig::new("/cal.acdb")))
        })
        .collect();
    for w in workers {
        w.join().unwrap().unwrap();
    }
    assert_eq!(loader.load_count(), 1);
}

#[test]
fn driver_held_across_deinit_still_answers_but_binding_does_not() {
    let sim = Arc::new(SimDriver::new().with_module(ModuleTag::STREAM_PCM_DECODER, 0x7001, 0x4001));
    let binding = DriverBinding::new(SimLoader::new(Arc::clone(&sim)));
    binding.init(&DriverConfig::new("/cal.acdb")).unwrap();

    let driver = binding.driver().unwrap();
    binding.deinit();
    assert!(matches!(binding.driver(), Err(DriverError::NotLoaded)));

    let info = driver
        .get_tagged_module_info(&gkv(), ModuleTag::STREAM_PCM_DECODER)
        .unwrap();
    assert_eq!(info.first_instance(), Some(0x4001));
}

#[test]
fn config_file_feeds_driver_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("driver.toml");
    DriverConfig::new("/vendor/etc/a.acdb")
        .with_calibration_file("/vendor/etc/b.acdb")
        .with_ready_checks(3, 50)
        .save(&path)
        .unwrap();

    let sim = Arc::new(SimDriver::new());
    let binding = DriverBinding::new(SimLoader::new(Arc::clone(&sim)));
    binding.init(&DriverConfig::load(&path).unwrap()).unwrap();

    let data = sim.init_data().unwrap();
    assert_eq!(data.calibration_files.len(), 2);
    assert_eq!(data.max_ready_checks, 3);
}

#[test]
fn injected_status_reaches_caller() {
    let sim = Arc::new(SimDriver::new());
    let binding = DriverBinding::new(SimLoader::new(Arc::clone(&sim)));
    binding.init(&DriverConfig::new("/cal.acdb")).unwrap();
    let driver = binding.driver().unwrap();
    let handle = driver.open(&gkv(), &KeyVector::new()).unwrap();

    sim.fail(Operation::Ioctl, -110);
    let err = driver.ioctl(&handle, &DriverCommand::Prepare).unwrap_err();
    assert_eq!(err.to_string(), "gsl_ioctl failed with status -110");
}
