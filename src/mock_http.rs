// Scripted in-memory HTTP client for exercising the client without a network

use std::{collections::VecDeque, sync::Arc, thread, time::Duration};

use parking_lot::Mutex;

use crate::http::{HttpClient, HttpRequest, HttpResponse, TransportError};

type Reply = Result<HttpResponse, TransportError>;

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<(Reply, Duration)>,
    fallback: Option<Reply>,
    requests: Vec<HttpRequest>,
}

/// Answers requests from a queue of scripted replies, then from an optional
/// fallback reply. Every request is recorded. Clones share state, so a test
/// can hand one clone to the client and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    state: Arc<Mutex<MockState>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: &str) -> &Self {
        self.state
            .lock()
            .replies
            .push_back((Ok(HttpResponse::new(status, body)), Duration::ZERO));
        self
    }

    // Answers only after `delay` has passed.
    pub fn push_delayed_response(&self, status: u16, body: &str, delay: Duration) -> &Self {
        self.state
            .lock()
            .replies
            .push_back((Ok(HttpResponse::new(status, body)), delay));
        self
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.state
            .lock()
            .replies
            .push_back((Err(TransportError(message.to_string())), Duration::ZERO));
        self
    }

    // Used once the scripted queue is exhausted.
    pub fn respond_always(&self, status: u16, body: &str) -> &Self {
        self.state.lock().fallback = Some(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.url.split('?').next().unwrap_or_default().ends_with(path))
            .count()
    }
}

impl HttpClient for MockHttpClient {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let (reply, delay) = {
            let mut state = self.state.lock();
            state.requests.push(request.clone());

            match state.replies.pop_front() {
                Some(scripted) => scripted,
                None => {
                    let reply = state.fallback.clone().unwrap_or_else(|| {
                        Err(TransportError(format!(
                            "no scripted response for {}",
                            request.url
                        )))
                    });
                    (reply, Duration::ZERO)
                }
            }
        };

        if !delay.is_zero() {
            thread::sleep(delay);
        }
        reply
    }
}
