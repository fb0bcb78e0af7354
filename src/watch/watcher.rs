//! Watcher thread: notify + debounce, send changed paths to the importer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecursiveMode, Watcher};

use crate::error::{BookwormError, Result};

/// Watch every root recursively and send debounced paths over `tx`.
///
/// Only creations and modifications are forwarded. Returns when `tx`'s receiver
/// is dropped or the notify channel closes.
pub fn run_watcher_thread(
    roots: &[PathBuf],
    debounce_ms: u64,
    tx: mpsc::Sender<PathBuf>,
) -> Result<()> {
    let debounce = Duration::from_millis(debounce_ms);

    let (event_tx, event_rx) = mpsc::channel::<Vec<PathBuf>>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(ev) if matches!(ev.kind, EventKind::Create(_) | EventKind::Modify(_)) => {
                let _ = event_tx.send(ev.paths);
            }
            Ok(_) => {}
            Err(e) => log::warn!("watch event error: {}", e),
        }
    })
    .map_err(|e| BookwormError::Watch(e.to_string()))?;

    for root in roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| BookwormError::Watch(format!("{}: {}", root.display(), e)))?;
        log::info!("Watching {}", root.display());
    }

    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();

    loop {
        match event_rx.recv_timeout(debounce) {
            Ok(paths) => {
                let now = Instant::now();
                for p in paths {
                    pending.insert(p, now);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                let ready: Vec<_> = pending
                    .iter()
                    .filter(|(_, t)| now.duration_since(**t) >= debounce)
                    .map(|(p, _)| p.clone())
                    .collect();
                for p in &ready {
                    pending.remove(p);
                }
                for p in ready {
                    if tx.send(p).is_err() {
                        return Ok(());
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}
