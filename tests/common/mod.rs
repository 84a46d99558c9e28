#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tiny_http::{Request, Response, Server};

/// Spawn a local HTTP server handling each request on its own thread, so
/// concurrent calls from the client under test really overlap.
pub fn spawn_server<F>(handler: F) -> SocketAddr
where
    F: Fn(Request) + Send + Sync + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("bind test server");
    let addr = server.server_addr().to_ip().expect("test server address");
    let handler = Arc::new(handler);
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let handler = handler.clone();
            thread::spawn(move || (*handler)(request));
        }
    });
    addr
}

pub fn respond_json(request: Request, status: u16, body: &str) {
    let response = Response::from_string(body).with_status_code(status);
    let _ = request.respond(response);
}

/// Server answering every request with the same status and body.
pub fn spawn_fixed(status: u16, body: &'static str) -> SocketAddr {
    spawn_server(move |request| respond_json(request, status, body))
}

/// Probe target that fails `failures` times before turning healthy. Returns
/// the address and a counter of probes received.
pub fn spawn_flaky_probe(failures: usize) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = hits.clone();
    let addr = spawn_server(move |request| {
        let attempt = seen.fetch_add(1, Ordering::SeqCst);
        if attempt < failures {
            respond_json(request, 503, "{}");
        } else {
            respond_json(request, 200, "{}");
        }
    });
    (addr, hits)
}

pub struct InstrumentedServer {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

/// Evaluation server that tracks how many requests are being handled
/// simultaneously, holding each one open for `delay`.
pub fn spawn_instrumented(status: u16, body: &'static str, delay: Duration) -> InstrumentedServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let active = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let hits_inner = hits.clone();
    let max_inner = max_in_flight.clone();
    let addr = spawn_server(move |request| {
        hits_inner.fetch_add(1, Ordering::SeqCst);
        let now_active = active.fetch_add(1, Ordering::SeqCst) + 1;
        max_inner.fetch_max(now_active, Ordering::SeqCst);
        thread::sleep(delay);
        active.fetch_sub(1, Ordering::SeqCst);
        respond_json(request, status, body);
    });

    InstrumentedServer {
        addr,
        hits,
        max_in_flight,
    }
}

/// Evaluation server recording the handling interval of every request.
pub fn spawn_recording(delay: Duration) -> (SocketAddr, Arc<Mutex<Vec<(Instant, Instant)>>>) {
    let intervals = Arc::new(Mutex::new(Vec::new()));
    let recorded = intervals.clone();
    let addr = spawn_server(move |request| {
        let started = Instant::now();
        thread::sleep(delay);
        recorded
            .lock()
            .expect("intervals lock")
            .push((started, Instant::now()));
        respond_json(request, 200, r#"{"score": 1.0, "success": true}"#);
    });
    (addr, intervals)
}

/// A port nothing is listening on.
pub fn closed_port_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    addr
}
