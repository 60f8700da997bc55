#![allow(dead_code)]

use async_trait::async_trait;
use cnc_enrollment::domain::payment::{PaymentIntentRequest, PaymentReference};
use cnc_enrollment::domain::ports::{PaymentGateway, RegistrationRepository};
use cnc_enrollment::domain::registration::Registration;
use cnc_enrollment::error::{EnrollmentError, Result};
use cnc_enrollment::infrastructure::in_memory::InMemoryRegistrationRepository;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Payment gateway fake that records requests and can fail the first calls.
#[derive(Clone, Default)]
pub struct RecordingGateway {
    pub requests: Arc<Mutex<Vec<PaymentIntentRequest>>>,
    failures_left: Arc<AtomicUsize>,
}

impl RecordingGateway {
    pub fn failing(times: usize) -> Self {
        Self {
            requests: Arc::default(),
            failures_left: Arc::new(AtomicUsize::new(times)),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<PaymentReference> {
        let n = self.requests.lock().unwrap().len() + 1;
        self.requests.lock().unwrap().push(request);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
        {
            return Err(EnrollmentError::PaymentProvider(
                "card_error: network unreachable".to_string(),
            ));
        }
        Ok(PaymentReference {
            intent_id: Some(format!("pi_{n}")),
            client_secret: format!("pi_{n}_secret"),
        })
    }
}

/// In-memory table that can be made unavailable for the first appends.
#[derive(Clone, Default)]
pub struct FlakyRepository {
    inner: InMemoryRegistrationRepository,
    failures_left: Arc<AtomicUsize>,
    pub appends: Arc<AtomicUsize>,
}

impl FlakyRepository {
    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: Arc::new(AtomicUsize::new(times)),
            ..Default::default()
        }
    }

    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrationRepository for FlakyRepository {
    async fn append(&self, registration: Registration) -> Result<Registration> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
        {
            return Err(EnrollmentError::StorageUnavailable(
                "connection refused".to_string(),
            ));
        }
        self.inner.append(registration).await
    }

    async fn list(&self) -> Result<Vec<Registration>> {
        self.inner.list().await
    }
}

pub struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Plain-HTTP server answering one canned response per connection, in order.
pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn start(responses: Vec<CannedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();
        let mut responses: VecDeque<_> = responses.into();

        std::thread::spawn(move || {
            while let Some(response) = responses.pop_front() {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                let mut reader = BufReader::new(stream);
                let request = read_request(&mut reader);
                recorded.lock().unwrap().push(request);
                write_response(reader.get_mut(), &response);
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request<R: BufRead>(reader: &mut R) -> RecordedRequest {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).unwrap();

    RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8(body).unwrap(),
    }
}

fn write_response<W: Write>(stream: &mut W, response: &CannedResponse) {
    let mut head = format!(
        "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).unwrap();
    stream.write_all(response.body.as_bytes()).unwrap();
    stream.flush().unwrap();
}
