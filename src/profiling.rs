
#[cfg(feature = "record_timings")]
use std::collections::BTreeMap;
#[cfg(feature = "record_timings")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "record_timings")]
use std::sync::Mutex;

///
/// Accumulated running time and call count of one step of the class field computation.
///
#[cfg(feature = "record_timings")]
pub struct StepTimer {
    nanos: AtomicU64,
    calls: AtomicU64
}

#[cfg(feature = "record_timings")]
impl StepTimer {

    pub const fn new() -> Self {
        Self { nanos: AtomicU64::new(0), calls: AtomicU64::new(0) }
    }

    pub fn record(&self, nanos: u64) {
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.nanos.store(0, Ordering::SeqCst);
        self.calls.store(0, Ordering::SeqCst);
    }
}

#[cfg(feature = "record_timings")]
pub static STEP_TIMERS: Mutex<BTreeMap<&'static str, &'static StepTimer>> = Mutex::new(BTreeMap::new());

#[cfg(feature = "record_timings")]
pub fn register_timer(name: &'static str, timer: &'static StepTimer) {
    STEP_TIMERS.lock().unwrap().insert(name, timer);
}

///
/// Logs the accumulated time of every step that was recorded with `record_time!`.
///
#[cfg(feature = "record_timings")]
pub fn print_all_timings() {
    let locked = STEP_TIMERS.lock().unwrap();
    for (name, timer) in locked.iter() {
        tracing::info!("{}: {} ms in {} calls", name, timer.nanos.load(Ordering::SeqCst) / 1000000, timer.calls.load(Ordering::SeqCst));
    }
}

#[cfg(not(feature = "record_timings"))]
pub fn print_all_timings() {}

#[cfg(feature = "record_timings")]
pub fn clear_all_timings() {
    STEP_TIMERS.lock().unwrap().values().for_each(|timer| timer.reset());
}

#[cfg(not(feature = "record_timings"))]
pub fn clear_all_timings() {}

macro_rules! record_time {
    ($name:literal, $fn:expr) => {
        {
            #[cfg(feature = "record_timings")] {
                use std::sync::atomic::{AtomicBool, Ordering};
                use std::time::Instant;
                use $crate::profiling::*;

                static TIMER: StepTimer = StepTimer::new();
                static REGISTERED: AtomicBool = AtomicBool::new(false);

                if !REGISTERED.swap(true, Ordering::SeqCst) {
                    register_timer($name, &TIMER);
                }

                #[inline(never)]
                fn prevent_inline<T, F: FnOnce() -> T>(f: F) -> T {
                    f()
                }

                let start = Instant::now();
                let result = prevent_inline($fn);
                TIMER.record(start.elapsed().as_nanos() as u64);
                result
            }
            #[cfg(not(feature = "record_timings"))] {
                ($fn)()
            }
        }
    };
}

#[test]
fn test_record_time() {
    clear_all_timings();
    let result = record_time!("test_record_time", || 1 + 1);
    assert_eq!(2, result);
    print_all_timings();
}
