#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use tunefinder_cli::retry::{DiagnosticSink, Sleeper};
use tunefinder_cli::transport::{RawResponse, Transport};
use tunefinder_cli::{Request, TransportError, TransportFailure};

/// Replies from a queue; once the queue is empty the fallback (if any) is
/// repeated forever.
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<RawResponse, TransportError>>>,
    fallback: Option<RawResponse>,
    pub hits: Cell<u32>,
    pub seen: RefCell<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<RawResponse, TransportError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            fallback: None,
            hits: Cell::new(0),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn always(status: u16, body: &str) -> Self {
        let mut t = Self::new(Vec::new());
        t.fallback = Some(reply(status, body));
        t
    }

    pub fn statuses(codes: &[u16]) -> Self {
        Self::new(codes.iter().map(|c| Ok(reply(*c, "{}"))).collect())
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        self.hits.set(self.hits.get() + 1);
        self.seen.borrow_mut().push(request.clone());
        if let Some(next) = self.replies.borrow_mut().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(r) => Ok(r.clone()),
            None => Err(TransportError::Other("script exhausted".into())),
        }
    }
}

pub fn reply(status: u16, body: &str) -> RawResponse {
    RawResponse {
        status,
        body: body.as_bytes().to_vec(),
    }
}

#[derive(Clone, Default)]
pub struct RecordingSleeper {
    pub sleeps: Rc<RefCell<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn total(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.sleeps.borrow_mut().push(delay);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Retrying { status: u16, attempt: u32 },
    GaveUp { status: u16, attempts: u32 },
    TransportFailure { url: String, attempt: u32 },
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Rc<RefCell<Vec<Event>>>,
}

impl DiagnosticSink for RecordingSink {
    fn retrying(&self, _url: &str, status: u16, attempt: u32, _delay: Duration) {
        self.events
            .borrow_mut()
            .push(Event::Retrying { status, attempt });
    }

    fn gave_up(&self, _url: &str, status: u16, attempts: u32) {
        self.events
            .borrow_mut()
            .push(Event::GaveUp { status, attempts });
    }

    fn transport_failure(&self, failure: &TransportFailure) {
        self.events.borrow_mut().push(Event::TransportFailure {
            url: failure.url.clone(),
            attempt: failure.attempt,
        });
    }
}
