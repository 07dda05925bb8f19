//! Transport (network type) selection.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{TransportError, TransportResult};

/// A transport protocol a service can forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Stream forwarding over TCP.
    Tcp,

    /// Datagram forwarding over UDP.
    Udp,
}

impl Transport {
    /// Get the lowercase protocol name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw `type` field as it appears in configuration.
///
/// Heterogeneous config parsing can hand us a plain string, a sequence,
/// or something else entirely; the shape is preserved here and rejected
/// with a named error by [`select_transports`] rather than silently
/// defaulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransportField {
    /// A single string such as `"tcp"`, `"both"`, or `"[tcp,udp]"`.
    Single(String),

    /// A sequence of (possibly non-string) elements.
    Sequence(Vec<serde_json::Value>),

    /// Any other shape (number, boolean, mapping, null).
    Other(serde_json::Value),
}

/// Normalize a raw transport field into a set of transports.
///
/// An absent field defaults to `[tcp]`. The returned set preserves the
/// configured order and is de-duplicated.
///
/// # Errors
///
/// Returns an error for transport strings outside `tcp`/`udp`/`both`,
/// for sequence elements that are not strings, and for field shapes
/// that are neither string nor sequence.
pub fn select_transports(field: Option<&TransportField>) -> TransportResult<Vec<Transport>> {
    match field {
        None => Ok(vec![Transport::Tcp]),
        Some(TransportField::Single(raw)) => select_from_str(raw),
        Some(TransportField::Sequence(items)) => select_from_sequence(items),
        Some(TransportField::Other(value)) => Err(TransportError::UnsupportedType {
            shape: value_shape(value).to_string(),
        }),
    }
}

fn select_from_str(raw: &str) -> TransportResult<Vec<Transport>> {
    let value = raw.trim().to_ascii_lowercase();

    if value.is_empty() {
        return Ok(vec![Transport::Tcp]);
    }

    match value.as_str() {
        "both" => Ok(vec![Transport::Tcp, Transport::Udp]),
        "tcp" => Ok(vec![Transport::Tcp]),
        "udp" => Ok(vec![Transport::Udp]),
        other => {
            // The "[tcp,udp]" string form survives some config parsers
            // as a single scalar; parse it element-wise.
            if let Some(inner) = other.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                let mut transports = Vec::new();
                for part in inner.split(',') {
                    transports.push(parse_single(part)?);
                }
                Ok(dedup(transports))
            } else {
                Err(TransportError::InvalidTransport {
                    value: other.to_string(),
                })
            }
        },
    }
}

fn select_from_sequence(items: &[serde_json::Value]) -> TransportResult<Vec<Transport>> {
    if items.is_empty() {
        return Ok(vec![Transport::Tcp]);
    }

    let mut transports = Vec::new();
    for item in items {
        match item.as_str() {
            Some(raw) => transports.push(parse_single(raw)?),
            None => {
                return Err(TransportError::NonStringElement {
                    shape: value_shape(item).to_string(),
                })
            },
        }
    }
    Ok(dedup(transports))
}

fn parse_single(raw: &str) -> TransportResult<Transport> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "tcp" => Ok(Transport::Tcp),
        "udp" => Ok(Transport::Udp),
        other => Err(TransportError::InvalidTransport {
            value: other.to_string(),
        }),
    }
}

fn dedup(transports: Vec<Transport>) -> Vec<Transport> {
    let mut seen = Vec::with_capacity(transports.len());
    for transport in transports {
        if !seen.contains(&transport) {
            seen.push(transport);
        }
    }
    seen
}

fn value_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(raw: &str) -> Option<TransportField> {
        Some(TransportField::Single(raw.to_string()))
    }

    fn sequence(items: &[&str]) -> Option<TransportField> {
        Some(TransportField::Sequence(
            items
                .iter()
                .map(|s| serde_json::Value::String((*s).to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_absent_defaults_to_tcp() {
        assert_eq!(select_transports(None).unwrap(), vec![Transport::Tcp]);
    }

    #[test]
    fn test_empty_string_defaults_to_tcp() {
        let field = single("");
        assert_eq!(
            select_transports(field.as_ref()).unwrap(),
            vec![Transport::Tcp]
        );
    }

    #[test]
    fn test_simple_strings() {
        assert_eq!(
            select_transports(single("tcp").as_ref()).unwrap(),
            vec![Transport::Tcp]
        );
        assert_eq!(
            select_transports(single("udp").as_ref()).unwrap(),
            vec![Transport::Udp]
        );
        assert_eq!(
            select_transports(single("both").as_ref()).unwrap(),
            vec![Transport::Tcp, Transport::Udp]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            select_transports(single("TCP").as_ref()).unwrap(),
            vec![Transport::Tcp]
        );
        assert_eq!(
            select_transports(single(" Both ").as_ref()).unwrap(),
            vec![Transport::Tcp, Transport::Udp]
        );
    }

    #[test]
    fn test_bracketed_string_form() {
        assert_eq!(
            select_transports(single("[tcp,udp]").as_ref()).unwrap(),
            vec![Transport::Tcp, Transport::Udp]
        );
        assert_eq!(
            select_transports(single("[udp, tcp]").as_ref()).unwrap(),
            vec![Transport::Udp, Transport::Tcp]
        );
    }

    #[test]
    fn test_invalid_string() {
        let result = select_transports(single("http").as_ref());
        assert!(matches!(
            result,
            Err(TransportError::InvalidTransport { value }) if value == "http"
        ));
    }

    #[test]
    fn test_invalid_bracketed_element() {
        let result = select_transports(single("[tcp,quic]").as_ref());
        assert!(matches!(
            result,
            Err(TransportError::InvalidTransport { value }) if value == "quic"
        ));
    }

    #[test]
    fn test_sequence() {
        assert_eq!(
            select_transports(sequence(&["udp", "tcp"]).as_ref()).unwrap(),
            vec![Transport::Udp, Transport::Tcp]
        );
        assert_eq!(
            select_transports(sequence(&[" TCP "]).as_ref()).unwrap(),
            vec![Transport::Tcp]
        );
    }

    #[test]
    fn test_empty_sequence_defaults_to_tcp() {
        assert_eq!(
            select_transports(sequence(&[]).as_ref()).unwrap(),
            vec![Transport::Tcp]
        );
    }

    #[test]
    fn test_sequence_with_invalid_element() {
        let result = select_transports(sequence(&["tcp", "quic"]).as_ref());
        assert!(matches!(
            result,
            Err(TransportError::InvalidTransport { value }) if value == "quic"
        ));
    }

    #[test]
    fn test_sequence_with_non_string_element() {
        let field = TransportField::Sequence(vec![
            serde_json::Value::String("tcp".to_string()),
            serde_json::Value::Number(42.into()),
        ]);
        let result = select_transports(Some(&field));
        assert!(matches!(
            result,
            Err(TransportError::NonStringElement { shape }) if shape == "number"
        ));
    }

    #[test]
    fn test_non_string_non_sequence_shape() {
        let field = TransportField::Other(serde_json::json!(42));
        let result = select_transports(Some(&field));
        assert!(matches!(
            result,
            Err(TransportError::UnsupportedType { shape }) if shape == "number"
        ));
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        assert_eq!(
            select_transports(single("[tcp,tcp]").as_ref()).unwrap(),
            vec![Transport::Tcp]
        );
    }

    #[test]
    fn test_deserialize_shapes_from_yaml() {
        #[derive(Debug, serde::Deserialize)]
        struct Holder {
            #[serde(rename = "type")]
            transport: TransportField,
        }

        let holder: Holder = serde_yaml::from_str("type: both").unwrap();
        assert!(matches!(holder.transport, TransportField::Single(ref s) if s == "both"));

        let holder: Holder = serde_yaml::from_str("type: [tcp, udp]").unwrap();
        assert!(matches!(holder.transport, TransportField::Sequence(ref v) if v.len() == 2));

        let holder: Holder = serde_yaml::from_str("type: 42").unwrap();
        assert!(matches!(holder.transport, TransportField::Other(_)));
    }
}
