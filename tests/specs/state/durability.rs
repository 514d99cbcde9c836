//! Processor state specs
//!
//! Verify state survives restarts and enforces its lifecycle.

use crate::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Window {
    count: u64,
    sum: f64,
}

#[test]
fn aggregates_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let state: DurableState<Window> = DurableState::open(dir.path(), "windows").unwrap();
        state
            .put(b"cpu", &Window { count: 2, sum: 1.5 })
            .unwrap();
        state
            .put(b"mem", &Window { count: 1, sum: 0.25 })
            .unwrap();
        state.close().unwrap();
    }

    let state: DurableState<Window> = DurableState::open(dir.path(), "windows").unwrap();

    assert_eq!(state.size().unwrap(), 2);
    assert_eq!(
        state.get(b"cpu").unwrap(),
        Some(Window { count: 2, sum: 1.5 })
    );
}

#[test]
fn paging_through_state_by_position() {
    let dir = tempfile::tempdir().unwrap();
    let state: DurableState<u32> = DurableState::open(dir.path(), "pages").unwrap();
    state
        .put_all((0..10u32).map(|i| (format!("k{}", i).into_bytes(), i)))
        .unwrap();

    let mut pages = Vec::new();
    let mut start = 0;
    loop {
        let page = state.iterate_range(start, start + 4, |_, v| v).unwrap();
        if page.is_empty() {
            break;
        }
        start += page.len();
        pages.push(page);
    }

    assert_eq!(pages.len(), 3);
    assert_eq!(pages.concat(), (0..10).collect::<Vec<_>>());
}

#[test]
fn closed_state_rejects_use() {
    let dir = tempfile::tempdir().unwrap();
    let state: DurableState<u32> = DurableState::open(dir.path(), "closing").unwrap();
    state.close().unwrap();
    state.close().unwrap();

    assert!(matches!(state.put(b"k", &1), Err(StateError::Closed)));
    assert!(matches!(state.size(), Err(StateError::Closed)));
}

#[test]
fn one_owner_per_store() {
    let dir = tempfile::tempdir().unwrap();
    let owner: DurableState<u32> = DurableState::open(dir.path(), "owned").unwrap();

    assert!(matches!(
        DurableState::<u32>::open(dir.path(), "owned"),
        Err(StateError::Locked { .. })
    ));

    owner.close().unwrap();
    assert!(DurableState::<u32>::open(dir.path(), "owned").is_ok());
}
