use std::net::TcpListener;
use std::time::Duration;

use tunefinder_cli::transport::HttpTransport;
use tunefinder_cli::{Executor, Request, RetryPolicy, TransportError};

/// Address of a port that was free a moment ago and now has no listener.
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("must bind probe listener");
    let addr = listener.local_addr().expect("must have local addr");
    drop(listener);
    format!("http://{addr}/songs")
}

#[test]
fn refused_connection_is_a_transport_failure() {
    let transport = HttpTransport::new(Duration::from_secs(5)).expect("client builds");
    let exec = Executor::new(transport).with_policy(RetryPolicy {
        max_attempts: 3,
        backoff_unit: Duration::ZERO,
    });
    let url = closed_port_url();

    let failure = exec.execute(&Request::get(url.clone())).unwrap_err();

    assert_eq!(failure.url, url);
    assert_eq!(failure.attempt, 1);
    assert!(matches!(failure.source, TransportError::Http(_)));
}
