//! # Reference Utilities
//!
//! Helpers for reading and building local `$ref` pointers such as
//! `#/components/schemas/User` or `#/channels/_chat/messages/Hello`.
//! External documents are never resolved.

use percent_encoding::percent_decode_str;

/// Pointer prefix of component schemas.
pub const SCHEMAS_PREFIX: &str = "#/components/schemas/";
/// Pointer prefix of component messages.
pub const MESSAGES_PREFIX: &str = "#/components/messages/";
/// Pointer prefix of channels.
pub const CHANNELS_PREFIX: &str = "#/channels/";
/// Pointer prefix of servers.
pub const SERVERS_PREFIX: &str = "#/servers/";

/// Extracts the schema name from `#/components/schemas/{name}`.
///
/// Any other prefix resolves to nothing.
pub fn schema_ref_name(ref_str: &str) -> Option<String> {
    component_name(ref_str, SCHEMAS_PREFIX)
}

/// Extracts the message name from `#/components/messages/{name}`.
pub fn message_ref_name(ref_str: &str) -> Option<String> {
    component_name(ref_str, MESSAGES_PREFIX)
}

/// Extracts the channel name from `#/channels/{name}`.
pub fn channel_ref_name(ref_str: &str) -> Option<String> {
    component_name(ref_str, CHANNELS_PREFIX)
}

/// Extracts the server name from `#/servers/{name}`.
pub fn server_ref_name(ref_str: &str) -> Option<String> {
    component_name(ref_str, SERVERS_PREFIX)
}

/// Splits a channel-scoped message pointer `#/channels/{channel}/messages/{message}`.
pub fn channel_message_ref(ref_str: &str) -> Option<(String, String)> {
    let rest = ref_str.strip_prefix(CHANNELS_PREFIX)?;
    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        [channel, "messages", message] if !channel.is_empty() && !message.is_empty() => Some((
            decode_pointer_segment(channel),
            decode_pointer_segment(message),
        )),
        _ => None,
    }
}

/// Builds `#/components/schemas/{name}`.
pub fn schema_ref(name: &str) -> String {
    format!("{}{}", SCHEMAS_PREFIX, encode_pointer_segment(name))
}

/// Builds `#/components/messages/{name}`.
pub fn message_ref(name: &str) -> String {
    format!("{}{}", MESSAGES_PREFIX, encode_pointer_segment(name))
}

/// Builds `#/channels/{name}`.
pub fn channel_ref(name: &str) -> String {
    format!("{}{}", CHANNELS_PREFIX, encode_pointer_segment(name))
}

/// Builds `#/channels/{channel}/messages/{message}`.
pub fn channel_message_pointer(channel: &str, message: &str) -> String {
    format!(
        "{}/messages/{}",
        channel_ref(channel),
        encode_pointer_segment(message)
    )
}

/// Builds `#/servers/{name}`.
pub fn server_ref(name: &str) -> String {
    format!("{}{}", SERVERS_PREFIX, encode_pointer_segment(name))
}

fn component_name(ref_str: &str, prefix: &str) -> Option<String> {
    let tail = ref_str.strip_prefix(prefix)?;
    if tail.is_empty() || tail.contains('/') {
        return None;
    }
    Some(decode_pointer_segment(tail))
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
