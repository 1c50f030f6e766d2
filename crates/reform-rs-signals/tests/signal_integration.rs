//! Dispatcher behaviour as a form host sees it: several views listening to
//! one event stream, views coming and going mid-stream, and sends from
//! multiple threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reform_rs_signals::Signal;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Edited(&'static str),
    Submitted,
}

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(signal: &Signal<Event>, view: &'static str, log: &Log) {
    let log = Arc::clone(log);
    signal.connect(
        view,
        Arc::new(move |event: &Event| {
            log.lock().unwrap().push(format!("{view}:{event:?}"));
        }),
    );
}

#[test]
fn test_views_see_events_in_connection_order() {
    let signal = Signal::new();
    let log = Log::default();
    recorder(&signal, "summary", &log);
    recorder(&signal, "sidebar", &log);

    signal.send(&Event::Edited("title"));
    signal.send(&Event::Submitted);

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "summary:Edited(\"title\")",
            "sidebar:Edited(\"title\")",
            "summary:Submitted",
            "sidebar:Submitted",
        ]
    );
}

#[test]
fn test_view_filters_on_payload() {
    let signal = Signal::new();
    let submits = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&submits);
    signal.connect(
        "banner",
        Arc::new(move |event: &Event| {
            if *event == Event::Submitted {
                s.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );

    for field in ["title", "price", "title"] {
        signal.send(&Event::Edited(field));
    }
    signal.send(&Event::Submitted);

    assert_eq!(submits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unmounted_view_stops_receiving() {
    let signal = Signal::new();
    let log = Log::default();
    recorder(&signal, "modal", &log);

    signal.send(&Event::Edited("a"));
    assert!(signal.disconnect("modal"));
    signal.send(&Event::Edited("b"));

    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(signal.receiver_count(), 0);
}

#[test]
fn test_view_mounted_during_send_starts_next_time() {
    let signal: Arc<Signal<Event>> = Arc::new(Signal::new());
    let log = Log::default();

    let host = Arc::clone(&signal);
    let host_log = Arc::clone(&log);
    signal.connect(
        "router",
        Arc::new(move |event: &Event| {
            if *event == Event::Submitted {
                recorder(&host, "confirmation", &host_log);
            }
        }),
    );

    assert_eq!(signal.send(&Event::Submitted), 1);
    assert!(log.lock().unwrap().is_empty());

    assert_eq!(signal.send(&Event::Edited("title")), 2);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["confirmation:Edited(\"title\")"]
    );
}

#[test]
fn test_sends_from_many_threads() {
    let signal: Arc<Signal<usize>> = Arc::new(Signal::new());
    let total = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&total);
    signal.connect(
        "sum",
        Arc::new(move |n: &usize| {
            t.fetch_add(*n, Ordering::SeqCst);
        }),
    );

    std::thread::scope(|scope| {
        for n in 1..=4 {
            let signal = &signal;
            scope.spawn(move || signal.send(&n));
        }
    });

    assert_eq!(total.load(Ordering::SeqCst), 10);
}
