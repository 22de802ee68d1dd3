//! JSON encoding of [`Message`] values, with and without the frame prefix.

use std::sync::Arc;

use crate::error::WireError;
use crate::frame::{decode_frame, encode_frame};
use crate::message::Message;

/// Serialises a message to its JSON payload.
///
/// # Errors
///
/// Returns [`WireError::Serialize`] if serialisation fails.
pub fn encode_payload(message: &Message) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(message).map_err(|err| WireError::Serialize(Arc::new(err)))
}

/// Parses a JSON payload into a message.
///
/// # Errors
///
/// Returns [`WireError::Deserialize`] when the payload is not JSON, lacks a
/// string `Method`, or misses a field its method requires.
pub fn decode_payload(payload: &[u8]) -> Result<Message, WireError> {
    serde_json::from_slice(payload).map_err(|err| WireError::Deserialize {
        source: Arc::new(err),
    })
}

/// Serialises a message into a complete frame.
///
/// # Errors
///
/// Returns any error from [`encode_payload`] or [`encode_frame`].
pub fn encode_message(message: &Message) -> Result<Vec<u8>, WireError> {
    encode_frame(&encode_payload(message)?)
}

/// Parses a complete frame into a message.
///
/// # Errors
///
/// Returns any error from [`decode_frame`] or [`decode_payload`].
pub fn decode_message(frame: &[u8]) -> Result<Message, WireError> {
    decode_payload(decode_frame(frame)?)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn payload_text(message: &Message) -> String {
        String::from_utf8(encode_payload(message).expect("encode")).expect("utf-8")
    }

    #[test]
    fn register_reply_wire_shape() {
        let reply = Message::register_reply("demo-ext", "1.0", "http://example.test");
        insta::assert_snapshot!(
            payload_text(&reply),
            @r#"{"Method":"register_extension","Name":"demo-ext","Version":"1.0","URL":"http://example.test"}"#
        );
    }

    #[test]
    fn completion_ack_wire_shape() {
        insta::assert_snapshot!(
            payload_text(&Message::CompletionAck),
            @r#"{"Method":"notification_completed"}"#
        );
    }

    #[test]
    fn log_message_wire_shape() {
        let log = Message::log("Extensions", "read on_save");
        insta::assert_snapshot!(
            payload_text(&log),
            @r#"{"Method":"log","Topic":"Extensions","Text":"read on_save"}"#
        );
    }

    #[rstest]
    #[case::prompt(Message::RegisterPrompt)]
    #[case::reply(Message::register_reply("n", "v", "u"))]
    #[case::notification(Message::notification("on_save"))]
    #[case::ack(Message::CompletionAck)]
    #[case::log(Message::log("Topic", "text with \"quotes\" and ünïcode"))]
    fn framed_messages_decode_to_the_original(#[case] message: Message) {
        let frame = encode_message(&message).expect("encode");
        assert_eq!(decode_message(&frame).expect("decode"), message);
    }

    #[test]
    fn notification_fields_survive_a_round_trip() {
        let payload = br#"{"Method":"on_selection_changed","Window":3,"Path":"/tmp/a.rs"}"#;
        let message = decode_payload(payload).expect("decode");
        let Message::Notification { method, fields } = &message else {
            panic!("expected a notification, got {message:?}");
        };
        assert_eq!(method, "on_selection_changed");
        assert_eq!(fields.get("Window"), Some(&json!(3)));

        let again = decode_payload(&encode_payload(&message).expect("encode")).expect("decode");
        assert_eq!(again, message);
    }

    #[test]
    fn prompt_decodes_from_host_bytes() {
        let message = decode_payload(br#"{"Method":"on_register"}"#).expect("decode");
        assert_eq!(message, Message::RegisterPrompt);
    }

    #[rstest]
    #[case::not_json(&b"not json"[..])]
    #[case::not_an_object(&br#"["on_save"]"#[..])]
    #[case::missing_method(&br#"{"Name":"x"}"#[..])]
    #[case::numeric_method(&br#"{"Method":7}"#[..])]
    #[case::reply_missing_url(&br#"{"Method":"register_extension","Name":"n","Version":"v"}"#[..])]
    #[case::log_text_wrong_type(&br#"{"Method":"log","Topic":"t","Text":false}"#[..])]
    fn schema_mismatch_is_a_decode_error(#[case] payload: &[u8]) {
        let error = decode_payload(payload).expect_err("payload must be rejected");
        assert!(
            matches!(error, WireError::Deserialize { .. }),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let error = decode_payload(&[b'"', 0xff, b'"']).expect_err("not utf-8");
        assert!(matches!(error, WireError::Deserialize { .. }));
    }

    #[test]
    fn decode_message_rejects_a_bad_frame_before_parsing() {
        let error = decode_message(&[0, 0, 0, 9, b'{', b'}']).expect_err("short frame");
        assert!(matches!(error, WireError::TruncatedFrame { .. }));
    }
}
