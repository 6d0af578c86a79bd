//! Marshalling statistics for monitoring

use super::long::LongEmulator;
use super::transcode::StringTranscoder;
use std::cell::Cell;

/// Marshalling statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarshalStats {
    pub calls_decoded: u64,
    pub calls_failed: u64,
    pub args_decoded: u64,
    pub strings_fast_path: u64,
    pub strings_heap_path: u64,
    pub emulated_longs: u64,
    pub wrappers_created: u64,
}

/// Live counters owned by the converter
#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    calls_decoded: Cell<u64>,
    calls_failed: Cell<u64>,
    args_decoded: Cell<u64>,
    wrappers_created: Cell<u64>,
}

impl StatCounters {
    pub(crate) fn record_call(&self, args: usize) {
        bump(&self.calls_decoded, 1);
        bump(&self.args_decoded, args as u64);
    }

    pub(crate) fn record_failure(&self) {
        bump(&self.calls_failed, 1);
    }

    pub(crate) fn record_wrapper(&self) {
        bump(&self.wrappers_created, 1);
    }

    pub(crate) fn snapshot(
        &self,
        strings: &StringTranscoder,
        longs: &LongEmulator,
    ) -> MarshalStats {
        MarshalStats {
            calls_decoded: self.calls_decoded.get(),
            calls_failed: self.calls_failed.get(),
            args_decoded: self.args_decoded.get(),
            strings_fast_path: strings.fast_path_count(),
            strings_heap_path: strings.heap_path_count(),
            emulated_longs: longs.emulated_count(),
            wrappers_created: self.wrappers_created.get(),
        }
    }
}

#[inline]
pub(crate) fn bump(counter: &Cell<u64>, by: u64) {
    counter.set(counter.get().wrapping_add(by));
}
