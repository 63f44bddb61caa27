//! Server Session Matcher Tests

use mocktcp::dump::DumpSink;
use mocktcp::network::{first_match, ServerSession, SessionEnd};
use mocktcp::{MockError, RequestItem};
use tempfile::TempDir;

use super::support::{BrokenStream, ScriptedStream};

fn run_session(items: &[RequestItem], stream: &mut ScriptedStream) -> SessionEnd {
    let dump = DumpSink::disabled();
    ServerSession::new(stream, 1, items, &dump, 2048).run()
}

// =============================================================================
// Matching
// =============================================================================

#[test]
fn test_ping_pong_with_trailing_data() {
    let items = vec![RequestItem::string("PING", "PONG")];
    let mut stream = ScriptedStream::new(["PING...extra"]);

    let end = run_session(&items, &mut stream);

    assert!(matches!(end, SessionEnd::PeerClosed));
    assert_eq!(stream.writes, vec![b"PONG".to_vec()]);
    // Session kept reading after answering
    assert_eq!(stream.reads, 2);
}

#[test]
fn test_items_are_not_consumed() {
    let items = vec![RequestItem::string("PING", "PONG")];
    let mut stream = ScriptedStream::new(["PING", "PING", "PING"]);

    run_session(&items, &mut stream);

    assert_eq!(stream.writes.len(), 3);
}

#[test]
fn test_first_declared_item_wins() {
    let items = vec![
        RequestItem::string("AB", "first"),
        RequestItem::string("A", "second"),
    ];
    let mut stream = ScriptedStream::new(["xxABxx", "xxAxx"]);

    run_session(&items, &mut stream);

    assert_eq!(stream.writes, vec![b"first".to_vec(), b"second".to_vec()]);
}

#[test]
fn test_no_match_sends_nothing_and_continues() {
    let items = vec![RequestItem::string("PING", "PONG")];
    let mut stream = ScriptedStream::new(["HELLO", "PING"]);

    let end = run_session(&items, &mut stream);

    assert!(matches!(end, SessionEnd::PeerClosed));
    assert_eq!(stream.writes, vec![b"PONG".to_vec()]);
    assert_eq!(stream.reads, 3);
}

#[test]
fn test_byte_items_answer_with_decoded_bytes() {
    let items = vec![RequestItem::bytes("0102", "A0B0")];
    let mut stream = ScriptedStream::new([[0x00u8, 0x01, 0x02, 0x03]]);

    run_session(&items, &mut stream);

    assert_eq!(stream.writes, vec![vec![0xa0, 0xb0]]);
}

#[test]
fn test_first_match_reports_index() {
    let items = vec![
        RequestItem::string("QUIT", "BYE"),
        RequestItem::string("PING", "PONG"),
    ];

    let (index, item) = first_match(&items, b"PING").unwrap().unwrap();
    assert_eq!(index, 1);
    assert_eq!(item.response_data, "PONG");

    assert!(first_match(&items, b"NOOP").unwrap().is_none());
}

// =============================================================================
// Termination
// =============================================================================

#[test]
fn test_bye_packet_ends_after_one_response() {
    let items = vec![RequestItem::string("QUIT", "BYE").bye()];
    let mut stream = ScriptedStream::new(["QUIT", "QUIT"]);

    let end = run_session(&items, &mut stream);

    assert!(matches!(end, SessionEnd::ByePacket));
    assert_eq!(stream.writes, vec![b"BYE".to_vec()]);
    assert_eq!(stream.reads, 1);
}

#[test]
fn test_bad_response_hex_is_fatal() {
    let items = vec![RequestItem {
        response_type: "byte".to_string(),
        response_data: "zz".to_string(),
        ..RequestItem::string("X", "")
    }];
    let mut stream = ScriptedStream::new(["X"]);

    let end = run_session(&items, &mut stream);

    assert!(matches!(end, SessionEnd::Fatal(MockError::InvalidHexPayload(_))));
    assert!(stream.writes.is_empty());
}

#[test]
fn test_invalid_earlier_item_is_fatal_even_if_later_item_matches() {
    let items = vec![
        RequestItem::bytes("0", "00"),
        RequestItem::string("PING", "PONG"),
    ];
    let mut stream = ScriptedStream::new(["PING"]);

    let end = run_session(&items, &mut stream);

    assert!(matches!(end, SessionEnd::Fatal(MockError::InvalidHexPayload(_))));
    assert!(stream.writes.is_empty());
}

#[test]
fn test_unknown_request_tag_is_fatal() {
    let mut item = RequestItem::string("PING", "PONG");
    item.request_type = "hex".to_string();
    let mut stream = ScriptedStream::new(["PING"]);

    let end = run_session(&[item], &mut stream);

    assert!(matches!(end, SessionEnd::Fatal(MockError::InvalidEncoding(_))));
}

#[test]
fn test_read_error_ends_session() {
    let items = vec![RequestItem::string("PING", "PONG")];
    let dump = DumpSink::disabled();

    let end = ServerSession::new(BrokenStream, 1, &items, &dump, 2048).run();

    assert!(matches!(end, SessionEnd::ReadFailed(_)));
}

#[test]
fn test_short_write_ends_session() {
    let items = vec![RequestItem::string("PING", "PONG PONG PONG")];
    let mut stream = ScriptedStream::new(["PING", "PING"]);
    stream.write_limit = Some(3);

    let end = run_session(&items, &mut stream);

    assert!(matches!(end, SessionEnd::WriteFailed(MockError::Network(_))));
    assert_eq!(stream.reads, 1);
}

// =============================================================================
// Dumps
// =============================================================================

#[test]
fn test_every_read_is_dumped_including_unmatched() {
    let temp = TempDir::new().unwrap();
    let dump = DumpSink::create(temp.path(), true).unwrap();
    let items = vec![RequestItem::string("PING", "PONG")];
    let mut stream = ScriptedStream::new(["noise;", "PING"]);

    ServerSession::new(&mut stream, 7, &items, &dump, 2048).run();

    let path = dump.file_for(7).unwrap();
    assert!(path.ends_with("7.dat"));
    assert_eq!(std::fs::read(path).unwrap(), b"noise;PING");
}
