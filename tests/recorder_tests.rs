use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use steptrace::profiler::{ChromeTracer, DeviceSync, MaxEventCount, Phase, TraceEvent};
use steptrace::MemoryWriter;

fn flushed(tracer: &ChromeTracer, writer: &MemoryWriter, name: &str) -> Vec<TraceEvent> {
    tracer.flush(name, writer).unwrap();
    serde_json::from_slice(&writer.get(name).expect("trace written")).unwrap()
}

#[derive(Default)]
struct CountingDevice {
    syncs: AtomicUsize,
}

impl DeviceSync for CountingDevice {
    fn is_available(&self) -> bool {
        true
    }

    fn synchronize(&self) {
        self.syncs.fetch_add(1, Ordering::SeqCst);
    }
}

struct AbsentDevice;

impl DeviceSync for AbsentDevice {
    fn is_available(&self) -> bool {
        false
    }

    fn synchronize(&self) {
        panic!("absent device must never be synchronized");
    }
}

#[test]
fn test_every_span_recorded_when_unbounded() {
    let tracer = ChromeTracer::default();

    for i in 0..25 {
        let _span = tracer.add_event(format!("step_{}", i));
    }

    let events = tracer.events();
    assert_eq!(events.len(), 25);
    assert_eq!(tracer.event_count(), 25);
    assert_eq!(tracer.pid(), std::process::id());
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.name, format!("step_{}", i));
        assert_eq!(event.ph, Phase::Complete);
        assert_eq!(event.cat, "");
        assert_eq!(event.pid, tracer.pid());
        assert!(event.dur >= 0.0);
        assert!(event.ts >= 0.0);
    }
}

#[test]
fn test_span_measures_wrapped_block() {
    let tracer = ChromeTracer::default();

    {
        let _span = tracer.add_event("sleep");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    let events = tracer.events();
    assert!(events[0].dur >= 5_000.0, "duration is in microseconds");
}

#[test]
fn test_nested_spans_complete_inner_first() {
    let tracer = ChromeTracer::default();

    {
        let _outer = tracer.add_event("outer");
        let inner = tracer.add_event("inner");
        drop(inner);
    }

    let events = tracer.events();
    assert_eq!(events[0].name, "inner");
    assert_eq!(events[1].name, "outer");
    // Outer span encloses the inner one.
    assert!(events[1].ts <= events[0].ts);
    assert!(events[1].end() >= events[0].end());
}

#[test]
fn test_cap_keeps_first_spans_only() {
    let tracer = ChromeTracer::new(MaxEventCount::Bounded(2), true);
    let writer = MemoryWriter::new();

    for name in ["a", "b", "c"] {
        let _span = tracer.add_event(name);
    }

    let events = flushed(&tracer, &writer, "trace.json");
    let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(tracer.event_count(), 2);

    // Once reached, the cap stays reached.
    for _ in 0..10 {
        let _span = tracer.add_event("late");
    }
    assert_eq!(tracer.events().len(), 2);
}

#[test]
fn test_largest_bounded_cap_is_kept_exactly() {
    let tracer = ChromeTracer::new(MaxEventCount::Bounded(u64::MAX), true);

    assert_eq!(tracer.max_event_count(), MaxEventCount::Bounded(u64::MAX));
    let state = tracer.state_dict().unwrap();
    assert_eq!(state.max_event_count, MaxEventCount::Bounded(u64::MAX));

    let restored = ChromeTracer::default();
    restored.load_state_dict(&state).unwrap();
    assert_eq!(restored.max_event_count(), MaxEventCount::Bounded(u64::MAX));
}

#[test]
fn test_zero_cap_records_nothing() {
    let tracer = ChromeTracer::new(MaxEventCount::Bounded(0), true);

    tracer.trace("ignored", || ());

    assert!(tracer.is_enabled());
    assert!(tracer.events().is_empty());
    assert_eq!(tracer.event_count(), 0);
}

#[test]
fn test_clear_then_flush_writes_empty_array() {
    let tracer = ChromeTracer::new(MaxEventCount::Bounded(3), true);
    let writer = MemoryWriter::new();
    for _ in 0..3 {
        tracer.trace("work", || ());
    }

    tracer.clear();

    tracer.flush("trace.json", &writer).unwrap();
    assert_eq!(writer.get("trace.json").unwrap(), b"[]");
    assert_eq!(tracer.event_count(), 0);
    assert_eq!(tracer.max_event_count(), MaxEventCount::Bounded(3));
    assert!(tracer.is_enabled());

    // The counter reset frees the cap again.
    tracer.trace("again", || ());
    assert_eq!(tracer.events().len(), 1);
}

#[test]
fn test_disabled_tracer_neither_records_nor_flushes() {
    let tracer = ChromeTracer::default();
    let writer = MemoryWriter::new();
    tracer.trace("before", || ());

    tracer.enable(false);
    tracer.trace("while_disabled", || ());
    tracer.flush("trace.json", &writer).unwrap();

    assert!(writer.is_empty(), "flush must be a no-op while disabled");
    assert_eq!(tracer.event_count(), 1);

    tracer.enable(true);
    tracer.trace("after", || ());

    let names: Vec<_> = flushed(&tracer, &writer, "trace.json")
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["before", "after"]);
}

#[test]
fn test_constructed_disabled() {
    let tracer = ChromeTracer::new(MaxEventCount::Unbounded, false);
    tracer.trace("nothing", || ());
    assert!(tracer.events().is_empty());
}

#[test]
fn test_span_recorded_when_block_panics() {
    let tracer = ChromeTracer::default();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _span = tracer.add_event("exploding_step");
        panic!("loss is NaN");
    }));

    let payload = result.expect_err("panic propagates");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"loss is NaN"));
    let events = tracer.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "exploding_step");
}

#[test]
fn test_trace_passes_errors_through() {
    let tracer = ChromeTracer::default();

    let result: Result<u32, String> = tracer.trace("fallible", || Err("bad batch".to_string()));

    assert_eq!(result, Err("bad batch".to_string()));
    assert_eq!(tracer.events().len(), 1);
}

#[test]
fn test_device_synchronized_once_per_recorded_span() {
    let device = Arc::new(CountingDevice::default());
    let tracer = ChromeTracer::with_device(MaxEventCount::Bounded(3), true, device.clone());

    for _ in 0..5 {
        tracer.trace("kernel", || ());
    }
    assert_eq!(device.syncs.load(Ordering::SeqCst), 3, "capped spans skip sync");

    tracer.enable(false);
    tracer.clear();
    tracer.trace("kernel", || ());
    assert_eq!(device.syncs.load(Ordering::SeqCst), 3, "disabled spans skip sync");
}

#[test]
fn test_unavailable_device_is_never_synchronized() {
    let tracer = ChromeTracer::with_device(MaxEventCount::Unbounded, true, Arc::new(AbsentDevice));

    tracer.trace("cpu_only", || ());

    assert_eq!(tracer.events().len(), 1);
}

#[test]
fn test_flushed_trace_is_pretty_ascii() {
    let tracer = ChromeTracer::default();
    let writer = MemoryWriter::new();
    tracer.trace("förward", || ());

    tracer.flush("trace.json", &writer).unwrap();

    let text = String::from_utf8(writer.get("trace.json").unwrap()).unwrap();
    assert!(text.is_ascii());
    assert!(text.contains("\"name\": \"f\\u00f6rward\""));
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    let event = &parsed[0];
    for key in ["name", "cat", "ph", "ts", "dur", "pid", "tid"] {
        assert!(event.get(key).is_some(), "missing key {}", key);
    }
    // Keys keep the trace-viewer field order.
    let positions: Vec<_> = ["name", "cat", "ph", "ts", "dur", "pid", "tid"]
        .iter()
        .map(|key| text.find(&format!("\"{}\":", key)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}
