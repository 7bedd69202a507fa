mod common;

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::{reply, RecordingSink, RecordingSleeper, ScriptedTransport};
use tempfile::NamedTempFile;
use tunefinder_cli::api::{parse_trim_length, ApiClient};
use tunefinder_cli::{ApiError, Executor, Method, TransportError};

const BASE: &str = "http://backend.test/prod/";

fn client(transport: &ScriptedTransport) -> ApiClient<&ScriptedTransport> {
    let exec = Executor::new(transport)
        .with_sleeper(RecordingSleeper::default())
        .with_sink(RecordingSink::default());
    ApiClient::new(exec, BASE)
}

fn temp_audio(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn upload_posts_base64_and_returns_jobid() {
    let audio = b"ID3\x03\x00fake mp3 bytes";
    let file = temp_audio(audio);
    let transport = ScriptedTransport::new(vec![Ok(reply(
        200,
        r#"{"message": "Upload successful", "jobid": 42}"#,
    ))]);

    let jobid = client(&transport).upload(file.path()).unwrap();

    assert_eq!(jobid, "42");
    let seen = transport.seen.borrow();
    assert_eq!(seen[0].method(), Method::Post);
    assert_eq!(seen[0].url(), "http://backend.test/prod/upload");
    assert_eq!(
        seen[0].headers().get("Content-Type").map(String::as_str),
        Some("application/json")
    );
    let sent = seen[0].body().unwrap()["audio"].as_str().unwrap();
    assert_eq!(STANDARD.decode(sent).unwrap(), audio);
}

#[test]
fn upload_missing_file_makes_no_request() {
    let transport = ScriptedTransport::always(200, "{}");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.mp3");

    let err = client(&transport).upload(&path).unwrap_err();

    assert!(matches!(err, ApiError::MissingFile(_)));
    assert_eq!(transport.hits.get(), 0);
}

#[test]
fn upload_surfaces_backend_error_body() {
    let file = temp_audio(b"x");
    let transport = ScriptedTransport::new(vec![Ok(reply(
        400,
        r#"{"error": "Invalid Base64 encoding!"}"#,
    ))]);

    let err = client(&transport).upload(file.path()).unwrap_err();

    match err {
        ApiError::Application { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid Base64 encoding!");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn identify_sends_trim_length_and_decodes_match() {
    let transport = ScriptedTransport::new(vec![Ok(reply(
        200,
        r#"{"song": "Clocks", "artist": "Coldplay", "release_date": "2002-08-26",
            "album": "A Rush of Blood to the Head", "score": 0.92}"#,
    ))]);
    let trim = parse_trim_length("").unwrap();

    let id = client(&transport).identify(" 7 ", trim).unwrap();

    assert_eq!(id.song, "Clocks");
    assert_eq!(id.artist, "Coldplay");
    assert_eq!(id.score(), Some(0.92));
    assert!(!id.is_low_confidence());

    let seen = transport.seen.borrow();
    assert_eq!(seen[0].url(), "http://backend.test/prod/identify");
    let body = seen[0].body().unwrap();
    assert_eq!(body["jobid"], "7");
    assert_eq!(body["trim_length"], 10);
}

#[test]
fn identify_flags_low_confidence() {
    let transport = ScriptedTransport::new(vec![Ok(reply(
        200,
        r#"{"song": "Unknown", "artist": "Unknown Artist", "release_date": "Unknown",
            "album": "Unknown Album", "score": 0.4}"#,
    ))]);
    let trim = parse_trim_length("2").unwrap();
    assert!(trim.raised_to_minimum);

    let id = client(&transport).identify("7", trim).unwrap();

    assert!(id.is_low_confidence());
    assert_eq!(transport.seen.borrow()[0].body().unwrap()["trim_length"], 5);
}

#[test]
fn identify_no_match_is_an_application_error() {
    let transport = ScriptedTransport::new(vec![Ok(reply(
        200,
        r#"{"error": "Song identification failed"}"#,
    ))]);

    let err = client(&transport)
        .identify("7", parse_trim_length("10").unwrap())
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Application { status: 200, ref message } if message == "Song identification failed"
    ));
}

#[test]
fn identify_rejects_empty_jobid() {
    let transport = ScriptedTransport::always(200, "{}");
    let err = client(&transport)
        .identify("  ", parse_trim_length("").unwrap())
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert_eq!(transport.hits.get(), 0);
}

#[test]
fn songs_decodes_rows() {
    let transport = ScriptedTransport::new(vec![Ok(reply(
        200,
        r#"[["Clocks", 0.92, "Coldplay", "A Rush of Blood to the Head", "2002-08-26"],
            ["Yellow", "0.88", "Coldplay", "Parachutes", "2000-06-26"]]"#,
    ))]);

    let songs = client(&transport).songs().unwrap();

    assert_eq!(songs.len(), 2);
    assert_eq!(songs[0].title, "Clocks");
    assert_eq!(songs[0].score, "0.92");
    assert_eq!(songs[1].score, "0.88");
    assert_eq!(songs[1].album, "Parachutes");
    assert_eq!(transport.seen.borrow()[0].method(), Method::Get);
}

#[test]
fn songs_server_error_is_surfaced() {
    let transport = ScriptedTransport::new(vec![Ok(reply(
        500,
        r#"{"error": "database unreachable"}"#,
    ))]);

    let err = client(&transport).songs().unwrap_err();

    assert!(matches!(err, ApiError::Application { status: 500, .. }));
    assert_eq!(transport.hits.get(), 1);
}

#[test]
fn songs_after_exhausted_retries_reports_status() {
    let transport = ScriptedTransport::always(502, "Bad Gateway");

    let err = client(&transport).songs().unwrap_err();

    match err {
        ApiError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(transport.hits.get(), 3);
}

#[test]
fn songs_unreachable_backend_is_unavailable() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Other("dns".into()))]);

    let err = client(&transport).songs().unwrap_err();

    assert!(matches!(err, ApiError::Unavailable(_)));
}

#[test]
fn sentinel_statuses_are_application_errors_without_retry() {
    for status in [480, 481, 482] {
        let body = format!(r#"{{"error": "sentinel {status}"}}"#);
        let transport = ScriptedTransport::always(status, &body);

        let err = client(&transport).songs().unwrap_err();

        match err {
            ApiError::Application { status: got, message } => {
                assert_eq!(got, status);
                assert_eq!(message, format!("sentinel {status}"));
            }
            other => panic!("{status}: unexpected {other:?}"),
        }
        assert_eq!(transport.hits.get(), 1, "{status} must not be retried");
    }
}
