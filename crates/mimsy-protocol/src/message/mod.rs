//! Messages exchanged between the host editor and an extension.
//!
//! Every payload is a JSON object discriminated by its `Method` key. Four
//! methods have a fixed shape known to both sides; every other method is a
//! host notification whose extra keys belong to the notification and are
//! carried through untouched.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire method names with a fixed meaning.
pub mod method {
    /// Host to extension: first frame on every connection.
    pub const REGISTER_PROMPT: &str = "on_register";
    /// Extension to host: identity reply to the prompt.
    pub const REGISTER_REPLY: &str = "register_extension";
    /// Extension to host: a notification has been handled.
    pub const COMPLETION_ACK: &str = "notification_completed";
    /// Extension to host: a line for the host's log.
    pub const LOG: &str = "log";

    /// Every method with a fixed shape. None of them decodes as a
    /// notification.
    pub const FIXED: [&str; 4] = [REGISTER_PROMPT, REGISTER_REPLY, COMPLETION_ACK, LOG];
}

const METHOD_KEY: &str = "Method";
const NAME_KEY: &str = "Name";
const VERSION_KEY: &str = "Version";
const URL_KEY: &str = "URL";
const TOPIC_KEY: &str = "Topic";
const TEXT_KEY: &str = "Text";

/// A decoded protocol message.
///
/// # Example
///
/// ```
/// use mimsy_protocol::Message;
///
/// let message: Message = serde_json::from_str(r#"{"Method":"on_save"}"#).unwrap();
/// assert_eq!(message, Message::notification("on_save"));
/// assert_eq!(message.method(), "on_save");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// `on_register`: the host asks the extension to identify itself.
    RegisterPrompt,
    /// `register_extension`: the extension's identity.
    RegisterReply {
        /// Extension name.
        name: String,
        /// Extension version.
        version: String,
        /// Extension home page.
        url: String,
    },
    /// Any other method sent by the host.
    ///
    /// Constructing a notification whose method is one of the fixed names in
    /// [`method`] produces a message that decodes as that fixed variant.
    Notification {
        /// Notification name, for example `on_save`.
        method: String,
        /// Method-specific keys, excluding `Method`.
        fields: Map<String, Value>,
    },
    /// `notification_completed`: the extension finished a notification.
    CompletionAck,
    /// `log`: a line for the host's log.
    LogMessage {
        /// Log topic.
        topic: String,
        /// Log text.
        text: String,
    },
}

impl Message {
    /// Builds a notification without extra fields.
    #[must_use]
    pub fn notification(method: impl Into<String>) -> Self {
        Self::Notification {
            method: method.into(),
            fields: Map::new(),
        }
    }

    /// Builds a registration reply.
    #[must_use]
    pub fn register_reply(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::RegisterReply {
            name: name.into(),
            version: version.into(),
            url: url.into(),
        }
    }

    /// Builds a log message.
    #[must_use]
    pub fn log(topic: impl Into<String>, text: impl Into<String>) -> Self {
        Self::LogMessage {
            topic: topic.into(),
            text: text.into(),
        }
    }

    /// Returns the wire method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::RegisterPrompt => method::REGISTER_PROMPT,
            Self::RegisterReply { .. } => method::REGISTER_REPLY,
            Self::Notification { method, .. } => method.as_str(),
            Self::CompletionAck => method::COMPLETION_ACK,
            Self::LogMessage { .. } => method::LOG,
        }
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::RegisterPrompt | Self::CompletionAck => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(METHOD_KEY, self.method())?;
                map.end()
            }
            Self::RegisterReply { name, version, url } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry(METHOD_KEY, self.method())?;
                map.serialize_entry(NAME_KEY, name)?;
                map.serialize_entry(VERSION_KEY, version)?;
                map.serialize_entry(URL_KEY, url)?;
                map.end()
            }
            Self::LogMessage { topic, text } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry(METHOD_KEY, self.method())?;
                map.serialize_entry(TOPIC_KEY, topic)?;
                map.serialize_entry(TEXT_KEY, text)?;
                map.end()
            }
            Self::Notification { method, fields } => {
                let extra = fields.iter().filter(|(key, _)| key.as_str() != METHOD_KEY);
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry(METHOD_KEY, method)?;
                for (key, value) in extra {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let method_name = match fields.remove(METHOD_KEY) {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(de::Error::invalid_type(
                    unexpected(&other),
                    &"a string method name",
                ));
            }
            None => return Err(de::Error::missing_field(METHOD_KEY)),
        };

        match method_name.as_str() {
            method::REGISTER_PROMPT => Ok(Self::RegisterPrompt),
            method::COMPLETION_ACK => Ok(Self::CompletionAck),
            method::REGISTER_REPLY => Ok(Self::RegisterReply {
                name: take_string(&mut fields, NAME_KEY)?,
                version: take_string(&mut fields, VERSION_KEY)?,
                url: take_string(&mut fields, URL_KEY)?,
            }),
            method::LOG => Ok(Self::LogMessage {
                topic: take_string(&mut fields, TOPIC_KEY)?,
                text: take_string(&mut fields, TEXT_KEY)?,
            }),
            _ => Ok(Self::Notification {
                method: method_name,
                fields,
            }),
        }
    }
}

fn take_string<E: de::Error>(
    fields: &mut Map<String, Value>,
    key: &'static str,
) -> Result<String, E> {
    match fields.remove(key) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(E::invalid_type(unexpected(&other), &"a string")),
        None => Err(E::missing_field(key)),
    }
}

fn unexpected(value: &Value) -> de::Unexpected<'_> {
    match value {
        Value::Null => de::Unexpected::Unit,
        Value::Bool(flag) => de::Unexpected::Bool(*flag),
        Value::Number(_) => de::Unexpected::Other("a number"),
        Value::String(text) => de::Unexpected::Str(text),
        Value::Array(_) => de::Unexpected::Seq,
        Value::Object(_) => de::Unexpected::Map,
    }
}
