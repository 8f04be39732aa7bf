// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use ethlamp::clock::WallClock;
use ethlamp::config::ServerConfig;
use ethlamp::http::{Directive, Outcome, Server};
use ethlamp::led::Led;
use ethlamp::net::{Connection, Listener};
use futures::executor::block_on;

#[derive(Clone, Default)]
struct Pin(Rc<Cell<bool>>);

impl embedded_hal::digital::ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

enum Request {
    Bytes(&'static [u8]),
    /// Connects and never sends anything.
    Silent,
    /// The connection is reset before anything arrives.
    Reset,
}

/// How the connection behaves once the server starts answering.
#[derive(Clone, Copy)]
enum Delivery {
    Accepted,
    /// The peer went away; the first write fails.
    Broken,
    /// The peer stopped reading; writes never complete.
    Stalled,
}

/// What the server did to one connection.
#[derive(Clone, Default)]
struct Transcript {
    written: Rc<RefCell<Vec<u8>>>,
    writes: Rc<Cell<usize>>,
    closed: Rc<Cell<bool>>,
}

impl Transcript {
    fn text(&self) -> String {
        String::from_utf8(self.written.borrow().clone()).unwrap()
    }
}

struct FakeConn {
    request: Request,
    delivery: Delivery,
    transcript: Transcript,
}

impl ErrorType for FakeConn {
    type Error = ErrorKind;
}

impl Read for FakeConn {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        match self.request {
            Request::Bytes(bytes) => {
                let len = bytes.len().min(buf.len());
                buf[..len].copy_from_slice(&bytes[..len]);
                Ok(len)
            }
            Request::Silent => core::future::pending().await,
            Request::Reset => Err(ErrorKind::ConnectionReset),
        }
    }
}

impl Write for FakeConn {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        match self.delivery {
            Delivery::Accepted => {}
            Delivery::Broken => return Err(ErrorKind::BrokenPipe),
            Delivery::Stalled => core::future::pending().await,
        }
        self.transcript.written.borrow_mut().extend_from_slice(buf);
        self.transcript.writes.set(self.transcript.writes.get() + 1);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

impl Connection for FakeConn {
    async fn close(self) {
        self.transcript.closed.set(true);
    }
}

enum Arrival {
    Client(Request, Delivery, Transcript),
    Error,
}

/// Hands out scripted arrivals; with none left, accept blocks forever.
#[derive(Default)]
struct FakeListener {
    arrivals: VecDeque<Arrival>,
}

impl FakeListener {
    fn client(&mut self, request: Request) -> Transcript {
        self.client_with(request, Delivery::Accepted)
    }

    fn client_with(&mut self, request: Request, delivery: Delivery) -> Transcript {
        let transcript = Transcript::default();
        self.arrivals.push_back(Arrival::Client(request, delivery, transcript.clone()));
        transcript
    }
}

impl Listener for FakeListener {
    type Conn<'a> = FakeConn;
    type Error = &'static str;

    async fn accept(&mut self) -> Result<FakeConn, &'static str> {
        match self.arrivals.pop_front() {
            Some(Arrival::Client(request, delivery, transcript)) => {
                Ok(FakeConn { request, delivery, transcript })
            }
            Some(Arrival::Error) => Err("out of sockets"),
            None => core::future::pending().await,
        }
    }
}

fn config() -> ServerConfig {
    ServerConfig {
        port: 80,
        accept_timeout: Duration::from_millis(50),
        read_timeout: Duration::from_millis(50),
        write_timeout: Duration::from_millis(200),
        socket_timeout: Duration::from_secs(5),
    }
}

fn server(listener: FakeListener) -> (Server<FakeListener, Pin>, Pin) {
    let pin = Pin::default();
    let led = Led::new(pin.clone());
    let clock = WallClock::anchored(1_578_321_600, Instant::now());
    (Server::new(listener, led, clock, config()), pin)
}

fn content_length(response: &str) -> (usize, &str) {
    let (head, body) = response.split_once("\n\n").unwrap();
    let length = head
        .lines()
        .find_map(|line| line.strip_prefix("Content-Length: "))
        .unwrap()
        .parse()
        .unwrap();
    (length, body)
}

#[test]
fn no_client_is_not_an_error() {
    let (mut server, pin) = server(FakeListener::default());
    let start = Instant::now();
    assert_eq!(block_on(server.serve_once()), Outcome::NoClient);
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(server.led().get());
    assert!(pin.0.get());
}

#[test]
fn off_directive_switches_the_led_off() {
    let mut listener = FakeListener::default();
    let transcript = listener.client(Request::Bytes(b"GET /?led=off HTTP/1.1\r\nHost: 192.168.1.7\r\n"));
    let (mut server, pin) = server(listener);

    assert_eq!(
        block_on(server.serve_once()),
        Outcome::Served { directive: Some(Directive::Off) }
    );
    assert!(!server.led().get());
    assert!(!pin.0.get());

    let response = transcript.text();
    assert!(response.starts_with("HTTP/1.1 200 OK\nConnection: close\nContent-Type: text/html\n"));
    assert!(response.contains("LED state: <strong>OFF</strong>"));
    assert!(response.contains("Time: 2020-01-06 14:40:0"));
    let (length, body) = content_length(&response);
    assert_eq!(length, body.len());
    assert_eq!(transcript.writes.get(), 5);
    assert!(transcript.closed.get());
}

#[test]
fn on_directive_switches_the_led_back_on() {
    let mut listener = FakeListener::default();
    let off = listener.client(Request::Bytes(b"GET /?led=off HTTP/1.1"));
    let on = listener.client(Request::Bytes(b"GET /?led=on HTTP"));
    let (mut server, pin) = server(listener);

    block_on(server.serve_once());
    assert!(off.text().contains("<strong>OFF</strong>"));

    assert_eq!(
        block_on(server.serve_once()),
        Outcome::Served { directive: Some(Directive::On) }
    );
    assert!(server.led().get());
    assert!(pin.0.get());
    assert!(on.text().contains("<strong>ON</strong>"));
}

#[test]
fn other_requests_leave_the_led_alone() {
    let mut listener = FakeListener::default();
    listener.client(Request::Bytes(b"GET /?led=off"));
    let plain = listener.client(Request::Bytes(b"GET /favicon.ico HTTP/1.1"));
    let (mut server, _pin) = server(listener);

    block_on(server.serve_once());
    assert_eq!(block_on(server.serve_once()), Outcome::Served { directive: None });
    assert!(!server.led().get());
    assert!(plain.text().contains("<strong>OFF</strong>"));
}

#[test]
fn only_the_prefix_is_searched() {
    let mut listener = FakeListener::default();
    // the directive starts past byte 20
    listener.client(Request::Bytes(b"GET /status.html?x=1/?led=off HTTP/1.1"));
    let (mut server, _pin) = server(listener);

    assert_eq!(block_on(server.serve_once()), Outcome::Served { directive: None });
    assert!(server.led().get());
}

#[test]
fn silent_client_still_gets_a_page() {
    let mut listener = FakeListener::default();
    let transcript = listener.client(Request::Silent);
    let (mut server, _pin) = server(listener);

    assert_eq!(block_on(server.serve_once()), Outcome::Served { directive: None });
    let response = transcript.text();
    assert!(response.contains("LED state: <strong>ON</strong>"));
    let (length, body) = content_length(&response);
    assert_eq!(length, body.len());
    assert!(transcript.closed.get());
}

#[test]
fn read_errors_drop_the_connection_without_a_response() {
    let mut listener = FakeListener::default();
    let transcript = listener.client(Request::Reset);
    let (mut server, _pin) = server(listener);

    assert_eq!(block_on(server.serve_once()), Outcome::Dropped);
    assert_eq!(transcript.writes.get(), 0);
    assert!(transcript.closed.get());
    assert!(server.led().get());
}

#[test]
fn write_errors_drop_the_connection() {
    let mut listener = FakeListener::default();
    let transcript = listener.client_with(Request::Bytes(b"GET /?led=off HTTP"), Delivery::Broken);
    let (mut server, pin) = server(listener);

    assert_eq!(block_on(server.serve_once()), Outcome::Dropped);
    assert_eq!(transcript.writes.get(), 0);
    assert!(transcript.closed.get());
    // the directive was applied before the response went out
    assert!(!server.led().get());
    assert!(!pin.0.get());
}

#[test]
fn stalled_writes_time_out_and_drop_the_connection() {
    let mut listener = FakeListener::default();
    let transcript = listener.client_with(Request::Bytes(b"GET /?led=off HTTP"), Delivery::Stalled);
    let next = listener.client(Request::Bytes(b"GET /?led=on HTTP"));
    let (mut server, pin) = server(listener);

    let start = Instant::now();
    assert_eq!(block_on(server.serve_once()), Outcome::Dropped);
    assert!(start.elapsed() >= config().write_timeout);
    assert!(transcript.closed.get());
    assert!(!server.led().get());
    assert!(!pin.0.get());

    // the loop carries on with the next client
    assert_eq!(
        block_on(server.serve_once()),
        Outcome::Served { directive: Some(Directive::On) }
    );
    assert!(next.closed.get());
    assert!(pin.0.get());
}

#[test]
fn accept_errors_return_to_idle() {
    let mut listener = FakeListener::default();
    listener.arrivals.push_back(Arrival::Error);
    let next = listener.client(Request::Bytes(b"GET /?led=off HTTP"));
    let (mut server, _pin) = server(listener);

    assert_eq!(block_on(server.serve_once()), Outcome::AcceptFailed);
    assert_eq!(
        block_on(server.serve_once()),
        Outcome::Served { directive: Some(Directive::Off) }
    );
    assert!(next.closed.get());
}

#[test]
fn page_says_when_time_is_unknown() {
    let mut listener = FakeListener::default();
    let transcript = listener.client(Request::Bytes(b"GET / HTTP/1.1"));
    let led = Led::new(Pin::default());
    let mut server = Server::new(listener, led, WallClock::unsynchronized(), config());

    block_on(server.serve_once());
    assert!(transcript.text().contains("Time: not synchronized"));
}
