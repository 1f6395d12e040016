use std::sync::Once;

use assistant_engine::{
    AssembledMessage, FramingMode, MessageUpdate, StreamDecoder, StreamError,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(assistant_logging::initialize_for_tests);
}

fn feed_chunks(chunks: &[&[u8]]) -> (Vec<MessageUpdate>, Option<StreamError>) {
    let mut decoder = StreamDecoder::new();
    let mut updates = Vec::new();
    for chunk in chunks {
        if let Err(err) = decoder.feed_into(chunk, &mut updates) {
            return (updates, Some(err));
        }
    }
    updates.extend(decoder.finish());
    (updates, None)
}

fn fragments(updates: &[MessageUpdate]) -> Vec<String> {
    updates
        .iter()
        .filter_map(|update| match update {
            MessageUpdate::Append(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn assembled(updates: &[MessageUpdate]) -> String {
    let mut message = AssembledMessage::new();
    for update in updates {
        message.apply(update);
    }
    message.content().to_string()
}

const MIXED_STREAM: &str = concat!(
    "data: {\"event\":\"message\",\"content\":\"您好，\",\"conversation_id\":\"conv-1\"}\n",
    "\n",
    "data:data:{\"event\":\"message\",\"content\":\"请描述症状\"}\n",
    "\n",
    "data: {&quot;event&quot;:&quot;message&quot;,&quot;answer&quot;:&quot; & rest &lt;ok&gt;&quot;}\n",
    "data: {not json}\n",
    "event: ping\n",
    "data: {\"event\":\"message\",\"content\":\"。\"}\n",
    "data: {\"event\":\"completed\"}\n",
    "data: {\"event\":\"message\",\"content\":\"after completion\"}\n",
);

#[test]
fn two_message_lines_yield_fragments_in_order() {
    init_logging();
    let input = b"data: {\"event\":\"message\",\"content\":\"A\"}\ndata: {\"event\":\"message\",\"content\":\"B\"}\n";
    let (updates, err) = feed_chunks(&[input]);
    assert!(err.is_none());
    assert_eq!(fragments(&updates), vec!["A", "B"]);
}

#[test]
fn doubled_data_prefix_is_tolerated() {
    init_logging();
    let (updates, _) = feed_chunks(&[b"data:data:{\"event\":\"message\",\"content\":\"X\"}\n"]);
    assert_eq!(fragments(&updates), vec!["X"]);
}

#[test]
fn html_entities_are_decoded_before_parsing() {
    init_logging();
    let input =
        b"data: {&quot;event&quot;:&quot;message&quot;,&quot;content&quot;:&quot;Y&quot;}\n";
    let (updates, _) = feed_chunks(&[input]);
    assert_eq!(fragments(&updates), vec!["Y"]);
}

#[test]
fn malformed_line_does_not_interrupt_stream() {
    init_logging();
    let input = concat!(
        "data: {\"event\":\"message\",\"content\":\"A\"}\n",
        "data: {\"event\":\"message\",\"content\":\n",
        "data: {\"event\":\"message\",\"content\":\"B\"}\n",
    );
    let (updates, err) = feed_chunks(&[input.as_bytes()]);
    assert!(err.is_none());
    assert_eq!(fragments(&updates), vec!["A", "B"]);
}

#[test]
fn error_event_halts_emission_and_surfaces_message() {
    init_logging();
    let input = concat!(
        "data: {\"event\":\"message\",\"content\":\"partial\"}\n",
        "data: {\"event\":\"error\",\"message\":\"model overloaded\"}\n",
        "data: {\"event\":\"message\",\"content\":\"ignored\"}\n",
    );
    let mut decoder = StreamDecoder::new();
    let mut updates = Vec::new();
    let err = decoder
        .feed_into(input.as_bytes(), &mut updates)
        .unwrap_err();

    assert_eq!(
        err,
        StreamError::Server {
            message: "model overloaded".to_string()
        }
    );
    assert_eq!(fragments(&updates), vec!["partial"]);
    assert!(decoder.is_finished());

    let later = decoder
        .feed(b"data: {\"event\":\"message\",\"content\":\"late\"}\n")
        .unwrap();
    assert!(later.is_empty());
}

#[test]
fn error_event_without_message_uses_default_text() {
    init_logging();
    let mut decoder = StreamDecoder::new();
    let err = decoder.feed(b"data: {\"event\":\"error\"}\n").unwrap_err();
    let StreamError::Server { message } = err;
    assert_eq!(message, "stream generation failed");
}

#[test]
fn completed_event_finishes_stream() {
    init_logging();
    let (updates, err) = feed_chunks(&[MIXED_STREAM.as_bytes()]);
    assert!(err.is_none());
    assert_eq!(updates.last(), Some(&MessageUpdate::Completed));
    assert!(!fragments(&updates).contains(&"after completion".to_string()));
}

#[test]
fn done_sentinel_counts_as_completion() {
    init_logging();
    let mut decoder = StreamDecoder::new();
    let updates = decoder
        .feed(b"data: {\"event\":\"message\",\"answer\":\"ok\"}\n\ndata: [DONE]\n\n")
        .unwrap();
    assert_eq!(
        updates,
        vec![
            MessageUpdate::Append("ok".to_string()),
            MessageUpdate::Completed
        ]
    );
    assert!(decoder.is_finished());
}

#[test]
fn mixed_stream_assembles_expected_message() {
    init_logging();
    let (updates, _) = feed_chunks(&[MIXED_STREAM.as_bytes()]);
    assert_eq!(
        fragments(&updates),
        vec!["您好，", "请描述症状", " & rest <ok>", "。"]
    );
    assert_eq!(
        updates.first(),
        Some(&MessageUpdate::ConversationId("conv-1".to_string()))
    );
}

#[test]
fn conversation_id_is_reported_once() {
    init_logging();
    let input = concat!(
        "data: {\"event\":\"message\",\"content\":\"a\",\"conversationId\":\"c1\"}\n",
        "data: {\"event\":\"message\",\"content\":\"b\",\"conversationId\":\"c2\"}\n",
    );
    let (updates, _) = feed_chunks(&[input.as_bytes()]);
    let ids: Vec<_> = updates
        .iter()
        .filter(|update| matches!(update, MessageUpdate::ConversationId(_)))
        .collect();
    assert_eq!(ids, vec![&MessageUpdate::ConversationId("c1".to_string())]);
}

#[test]
fn arbitrary_chunk_splits_yield_identical_fragments() {
    init_logging();
    let bytes = MIXED_STREAM.as_bytes();
    let (whole, _) = feed_chunks(&[bytes]);
    let expected_fragments = fragments(&whole);
    let expected_message = assembled(&whole);

    for split in 1..bytes.len() {
        let (updates, err) = feed_chunks(&[&bytes[..split], &bytes[split..]]);
        assert!(err.is_none(), "split at {split}");
        assert_eq!(fragments(&updates), expected_fragments, "split at {split}");
        assert_eq!(assembled(&updates), expected_message, "split at {split}");
    }

    let singles: Vec<&[u8]> = bytes.chunks(1).collect();
    let (updates, _) = feed_chunks(&singles);
    assert_eq!(fragments(&updates), expected_fragments);

    let sevens: Vec<&[u8]> = bytes.chunks(7).collect();
    let (updates, _) = feed_chunks(&sevens);
    assert_eq!(fragments(&updates), expected_fragments);
}

#[test]
fn plain_text_falls_back_to_wholesale_emission() {
    init_logging();
    let mut decoder = StreamDecoder::new();
    let first = decoder.feed(b"Hello").unwrap();
    let second = decoder.feed(b" world").unwrap();
    assert!(decoder.finish().is_empty());

    assert_eq!(first, vec![MessageUpdate::Replace("Hello".to_string())]);
    assert_eq!(
        second,
        vec![MessageUpdate::Replace("Hello world".to_string())]
    );
    assert_eq!(decoder.mode(), FramingMode::PlainTextFallback);
}

#[test]
fn truncated_plain_text_tail_is_flushed_as_replacement_char() {
    init_logging();
    let body = "héllo é".as_bytes();
    let mut decoder = StreamDecoder::new();
    let updates = decoder.feed(&body[..body.len() - 1]).unwrap();
    assert_eq!(updates, vec![MessageUpdate::Replace("héllo ".to_string())]);

    assert_eq!(
        decoder.finish(),
        vec![MessageUpdate::Replace("héllo \u{FFFD}".to_string())]
    );
    assert!(decoder.is_finished());
}

#[test]
fn late_framing_withdraws_plain_text() {
    init_logging();
    let mut decoder = StreamDecoder::new();
    let first = decoder.feed(b"da").unwrap();
    let second = decoder
        .feed(b"ta: {\"event\":\"message\",\"content\":\"Z\"}\n")
        .unwrap();

    assert_eq!(first, vec![MessageUpdate::Replace("da".to_string())]);
    assert_eq!(
        second,
        vec![
            MessageUpdate::Replace(String::new()),
            MessageUpdate::Append("Z".to_string())
        ]
    );
    assert_eq!(decoder.mode(), FramingMode::Sse);
    assert_eq!(assembled(&[first, second].concat()), "Z");
}

#[test]
fn trailing_unterminated_line_is_discarded() {
    init_logging();
    let mut decoder = StreamDecoder::new();
    let updates = decoder
        .feed(b"data: {\"event\":\"message\",\"content\":\"A\"}\ndata: {\"event\":\"message\",\"content\":\"B\"}")
        .unwrap();
    assert!(decoder.finish().is_empty());

    assert_eq!(fragments(&updates), vec!["A"]);
    assert!(decoder.is_finished());
    assert!(decoder.feed(b"\n").unwrap().is_empty());
}

#[test]
fn crlf_line_endings_are_accepted() {
    init_logging();
    let (updates, _) = feed_chunks(&[
        b"data: {\"event\":\"message\",\"content\":\"A\"}\r\n\r\ndata: {\"event\":\"message\",\"content\":\"B\"}\r\n",
    ]);
    assert_eq!(fragments(&updates), vec!["A", "B"]);
}
