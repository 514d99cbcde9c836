//! Configuration specs
//!
//! Verify a TOML file configures every pipeline stage.

use crate::prelude::*;

#[test]
fn config_file_drives_components() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.toml");
    std::fs::write(
        &path,
        r#"
[buffer]
capacity = 32
batch_size = 10

[backoff]
initial_delay = "100ms"
max_retries = 2
max_delay = "1s"
"#,
    )
    .unwrap();

    let config = CoreConfig::load(&path).unwrap();

    let buffer: BlockingBuffer<u8> = BlockingBuffer::from_config(&config.buffer).unwrap();
    assert_eq!(buffer.capacity(), 32);
    assert_eq!(buffer.batch_size(), 10);

    let delays: Vec<_> = config.backoff.sequence().collect();
    assert_eq!(
        delays,
        vec![Duration::from_millis(100), Duration::from_millis(110)]
    );

    // Omitted sections keep their defaults
    assert_eq!(config.state, StateConfig::default());
}

#[test]
fn invalid_config_is_rejected() {
    let result = CoreConfig::from_toml_str("[buffer]\ncapacity = 2\nbatch_size = 3\n");
    assert!(result.is_err());
}
