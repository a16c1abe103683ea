//! Deferred deallocation of deleted turntables
//!
//! Registry slots hold `basedrop::Shared` pointers. When a turntable is deleted
//! from the control thread while the audio callback still holds a reference to
//! it, the last reference may be dropped on the audio thread. With `Shared<T>`
//! that drop only enqueues the pointer; the filters, name and lock are freed
//! by the collector thread started here.

use basedrop::{Collector, Handle};
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

/// Interval between two collection passes
const COLLECT_INTERVAL: Duration = Duration::from_millis(100);

fn init_gc() -> Handle {
    let (tx, rx) = mpsc::channel();

    // Collector is !Sync: it is created on, and never leaves, its own thread
    thread::Builder::new()
        .name("dscratch-gc".to_string())
        .spawn(move || {
            let mut collector = Collector::new();
            if tx.send(collector.handle()).is_err() {
                return;
            }
            log::debug!("Turntable collector thread started");

            loop {
                collector.collect();
                thread::sleep(COLLECT_INTERVAL);
            }
        })
        .expect("Failed to spawn turntable collector thread");

    rx.recv().expect("Failed to receive collector handle")
}

/// Handle used to allocate `Shared<T>` values collected off the audio thread
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_gc).clone()
}
