// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Config file discovery from nested working directories

use std::env;
use std::fs;
use std::sync::Mutex;

use neurodyn_config::{find_config_file, load_config, ConfigError, LogFormat, CONFIG_FILE_NAME};
use tempfile::tempdir;

static CWD_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn test_config_found_in_ancestor_directory() {
    let _lock = CWD_LOCK.lock().unwrap();
    let original = env::current_dir().unwrap();
    env::remove_var("NEURODYN_CONFIG_PATH");

    let root = tempdir().unwrap();
    let nested = root.path().join("models").join("cortex");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        root.path().join(CONFIG_FILE_NAME),
        "[simulation]\ndt = 0.05\nduration = 1.0\n\n[logging]\nformat = \"json\"\n",
    )
    .unwrap();

    env::set_current_dir(&nested).unwrap();
    let found = find_config_file();
    let config = load_config(None, None);
    env::set_current_dir(original).unwrap();

    let found = found.unwrap();
    assert_eq!(found.file_name().unwrap(), CONFIG_FILE_NAME);
    let config = config.unwrap();
    assert_eq!(config.simulation.dt, 0.05);
    assert_eq!(config.simulation.steps(), 20);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let _lock = CWD_LOCK.lock().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[simulation]\ndt = \"fast\"\n").unwrap();

    let result = load_config(Some(&path), None);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}
