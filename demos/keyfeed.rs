//! Hosted demo of the runtime: a key feeder posting events to a logger
//! process, plus a periodic heartbeat timer, driven by a simulated timer
//! ISR. Run with `cargo run --example keyfeed`.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use zerocopy::{AsBytes, FromBytes};

use evrun::{
    enter_isr, exit_isr, set_log_level, set_log_sink, EventQueue, LogLevel, LogSink, Process,
    ProcessId, Runtime, TimeoutHandler, TimerId,
};

const FEEDER_PID: ProcessId = ProcessId(1);
const LOGGER_PID: ProcessId = ProcessId(2);
const HEARTBEAT_TIMER: TimerId = TimerId(1);

/// Key event as it would arrive from a keyboard ISR
#[derive(Clone, Copy, AsBytes, FromBytes)]
#[repr(C)]
struct KeyEvent {
    code: u8,
    pressed: u8,
}

static LOGGER_QUEUE: EventQueue<KeyEvent, 8> = EventQueue::new();

/// Stands in for a keyboard ISR: posts one scripted key per invocation
struct KeyFeeder {
    next: AtomicUsize,
}

const SCRIPT: &[u8] = b"evrun";

impl Process for KeyFeeder {
    fn run(&self, rt: &Runtime) {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        if let Some(&code) = SCRIPT.get(n) {
            let event = KeyEvent { code, pressed: 1 };
            if rt.post_event(LOGGER_PID, &event).is_err() {
                println!("feeder: logger queue full, key '{}' lost", code as char);
            }
        }
    }
}

/// Drains its event queue and prints what it got
struct Logger;

impl Process for Logger {
    fn run(&self, rt: &Runtime) {
        while let Some(event) = rt.get_event::<KeyEvent>() {
            println!("logger: key '{}' down", event.code as char);
        }
    }
}

/// Periodic timer handler: re-arms itself every expiry
struct Heartbeat {
    interval: u32,
    beats: AtomicUsize,
}

impl TimeoutHandler for Heartbeat {
    fn on_timeout(&self, rt: &Runtime, timer: TimerId) {
        let n = self.beats.fetch_add(1, Ordering::Relaxed) + 1;
        println!("heartbeat #{n}");
        rt.refresh_timer(timer, self.interval)
            .expect("heartbeat re-arm failed");
    }
}

struct StdoutSink;

impl LogSink for StdoutSink {
    fn log_line(&self, line: fmt::Arguments) {
        println!("{line}");
    }
}

static STDOUT_SINK: StdoutSink = StdoutSink;
static FEEDER: KeyFeeder = KeyFeeder {
    next: AtomicUsize::new(0),
};
static LOGGER: Logger = Logger;
static HEARTBEAT: Heartbeat = Heartbeat {
    interval: 10,
    beats: AtomicUsize::new(0),
};

static RUNTIME: Runtime = Runtime::new();

fn main() {
    set_log_sink(&STDOUT_SINK);
    set_log_level(LogLevel::Debug);

    RUNTIME.init().expect("init");
    RUNTIME
        .add_process(&FEEDER, FEEDER_PID, None)
        .expect("add feeder");
    RUNTIME
        .add_process(&LOGGER, LOGGER_PID, Some(&LOGGER_QUEUE))
        .expect("add logger");

    // One key every 3rd visit, so the logger sees gaps
    RUNTIME.set_exec_delay(FEEDER_PID, 2).expect("set delay");

    RUNTIME
        .install_timeout_handler(&HEARTBEAT, HEARTBEAT_TIMER, 10)
        .expect("install heartbeat");

    // Stand-in for the main loop plus a 100 Hz timer interrupt: one tick
    // and one scheduler pass per iteration
    for _ in 0..60 {
        enter_isr();
        RUNTIME.timer_tick();
        exit_isr();

        RUNTIME.poll();
    }

    let metrics = RUNTIME.metrics().snapshot();
    println!(
        "done: {} passes, {} invocations, {} events, {} ticks, {} expiries, {} dispatches",
        metrics.scheduler_passes,
        metrics.process_invocations,
        metrics.events_posted,
        metrics.ticks,
        metrics.timers_expired,
        metrics.timer_dispatches
    );
}
