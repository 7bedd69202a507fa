// Transport module: the single seam through which the executor talks to
// the network. The real implementation is a blocking reqwest client; tests
// plug in scripted transports instead.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::TransportError;
use crate::retry::{Method, Request};

/// Status code and raw body of one completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs exactly one exchange per call, without retrying.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport. The underlying client (and its connection pool)
/// is shared by every request sent through it.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn header_map(request: &Request) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in request.headers() {
            let key = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let val = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.insert(key, val);
        }
        Ok(headers)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let mut builder = match request.method() {
            Method::Get => self.client.get(request.url()),
            Method::Post => self.client.post(request.url()),
        };
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        // Explicit headers win over the defaults set by `.json()`.
        builder = builder.headers(Self::header_map(request)?);

        let res = builder.send()?;
        let status = res.status().as_u16();
        let body = res.bytes()?.to_vec();
        Ok(RawResponse { status, body })
    }
}
