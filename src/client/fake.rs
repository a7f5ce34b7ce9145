use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::client::{BoxError, BoxFuture, HttpResponse, HttpTransport};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedBody {
    Query(Vec<(String, String)>),
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: RecordedBody,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        match &self.body {
            RecordedBody::Query(params) => params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            RecordedBody::Json(value) => value.get(key).and_then(serde_json::Value::as_str),
        }
    }
}

#[derive(Debug)]
struct FakeTransportState {
    requests: Vec<RecordedRequest>,
    responses: VecDeque<Result<HttpResponse, String>>,
}

/// Records every request and replays queued responses in order (200 with an empty body once
/// the queue runs dry).
#[derive(Debug, Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeTransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeTransportState {
                requests: Vec::new(),
                responses: VecDeque::new(),
            })),
        }
    }

    pub fn with_response(status: u16, body: impl Into<String>) -> Self {
        let transport = Self::new();
        transport.push_response(status, body);
        transport
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Ok(HttpResponse {
                status,
                body: body.into(),
            }));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(message.into()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    fn respond(&self, request: RecordedRequest) -> Result<HttpResponse, BoxError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        match state.responses.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(message.into()),
            None => Ok(HttpResponse {
                status: 200,
                body: String::new(),
            }),
        }
    }
}

impl HttpTransport for FakeTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
        query: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
        Box::pin(async move {
            self.respond(RecordedRequest {
                url: url.to_owned(),
                body: RecordedBody::Query(query),
            })
        })
    }

    fn post_json<'a>(
        &'a self,
        url: &'a str,
        body: serde_json::Value,
    ) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
        Box::pin(async move {
            self.respond(RecordedRequest {
                url: url.to_owned(),
                body: RecordedBody::Json(body),
            })
        })
    }
}
