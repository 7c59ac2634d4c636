//! Minimal HTTP/1.1 server serving numbered pages for integration tests.
//!
//! `GET /{id}.png` returns [`page_body`]`(id)` with 200, unless the id is
//! configured to fail (fixed status) or to be flaky (503 on the first hit).
//! Every request path is recorded, and the number of concurrently open
//! requests is tracked as a high-water mark.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct PageServerOptions {
    /// id → status returned on every request for that id.
    pub fail_ids: HashMap<u32, u16>,
    /// ids that return 503 on their first request only.
    pub flaky_ids: HashSet<u32>,
    /// Delay before responding to each request.
    pub delay: Duration,
}

#[derive(Clone)]
pub struct PageServer {
    /// Base URL ending in `/`, e.g. `http://127.0.0.1:12345/`.
    pub base_url: String,
    paths: Arc<Mutex<Vec<String>>>,
    high_water: Arc<AtomicUsize>,
}

impl PageServer {
    /// URL template for this server: `{base}{id}.png`.
    pub fn url_template(&self) -> String {
        format!("{}{{id}}.png", self.base_url)
    }

    pub fn request_count(&self) -> usize {
        self.paths.lock().unwrap().len()
    }

    pub fn requested(&self, id: u32) -> bool {
        let want = format!("/{id}.png");
        self.paths.lock().unwrap().iter().any(|p| *p == want)
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

/// Body served for `id`: large enough to clear a 1000-byte validity threshold.
pub fn page_body(id: u32) -> Vec<u8> {
    format!("page {id:04};").repeat(200).into_bytes()
}

pub fn start() -> PageServer {
    start_with_options(PageServerOptions::default())
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start_with_options(opts: PageServerOptions) -> PageServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let paths = Arc::new(Mutex::new(Vec::new()));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let high_water = Arc::new(AtomicUsize::new(0));
    let seen_flaky = Arc::new(Mutex::new(HashSet::new()));
    let opts = Arc::new(opts);

    {
        let paths = Arc::clone(&paths);
        let high_water = Arc::clone(&high_water);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let opts = Arc::clone(&opts);
                let paths = Arc::clone(&paths);
                let in_flight = Arc::clone(&in_flight);
                let high_water = Arc::clone(&high_water);
                let seen_flaky = Arc::clone(&seen_flaky);
                thread::spawn(move || {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    handle(stream, &opts, &paths, &seen_flaky);
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });
    }

    PageServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        paths,
        high_water,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    opts: &PageServerOptions,
    paths: &Mutex<Vec<String>>,
    seen_flaky: &Mutex<HashSet<u32>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("").to_string();
    paths.lock().unwrap().push(path.clone());

    if !opts.delay.is_zero() {
        thread::sleep(opts.delay);
    }

    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", b"");
        return;
    }
    let id = path
        .strip_prefix('/')
        .and_then(|p| p.strip_suffix(".png"))
        .and_then(|p| p.parse::<u32>().ok());
    let Some(id) = id else {
        respond(&mut stream, "404 Not Found", b"not found");
        return;
    };

    if let Some(status) = opts.fail_ids.get(&id) {
        let line = format!("{} Error", status);
        respond(&mut stream, &line, b"<html>error page</html>");
        return;
    }
    if opts.flaky_ids.contains(&id) && seen_flaky.lock().unwrap().insert(id) {
        respond(&mut stream, "503 Service Unavailable", b"try again");
        return;
    }
    respond(&mut stream, "200 OK", &page_body(id));
}

fn respond(stream: &mut std::net::TcpStream, status: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}
