use serde::{Serialize, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};

/// One send/receive round trip
///
/// Serialized with hex payloads and a unix millisecond timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    #[serde(serialize_with = "serialize_unix_millis")]
    pub timestamp: SystemTime,
    #[serde(serialize_with = "serialize_hex")]
    pub sent: Vec<u8>,
    #[serde(serialize_with = "serialize_hex")]
    pub received: Vec<u8>,
}

impl Exchange {
    pub fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.sent).into_owned()
    }

    pub fn received_text(&self) -> String {
        String::from_utf8_lossy(&self.received).into_owned()
    }
}

/// Outcome of a driver session against one peer
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub peer: String,
    pub connected: bool,
    pub exchanges: Vec<Exchange>,
    /// Description of the failure that ended the session early
    pub error: Option<String>,
}

impl SessionReport {
    pub fn new(peer: String) -> Self {
        Self {
            peer,
            connected: false,
            exchanges: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.connected && self.error.is_none()
    }

    pub fn bytes_sent(&self) -> usize {
        self.exchanges.iter().map(|e| e.sent.len()).sum()
    }

    pub fn bytes_received(&self) -> usize {
        self.exchanges.iter().map(|e| e.received.len()).sum()
    }
}

fn serialize_hex<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes.as_ref()))
}

fn serialize_unix_millis<S: Serializer>(
    timestamp: &SystemTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    // Clock set before the epoch reports zero.
    let millis = timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0);
    serializer.serialize_u64(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_report_totals() {
        let mut report = SessionReport::new("127.0.0.1:12345".to_string());
        assert!(!report.is_success());

        report.connected = true;
        report.exchanges.push(Exchange {
            timestamp: SystemTime::now(),
            sent: b"ping".to_vec(),
            received: b"Server Echo: ping".to_vec(),
        });

        assert!(report.is_success());
        assert_eq!(report.bytes_sent(), 4);
        assert_eq!(report.bytes_received(), 17);
        assert_eq!(report.exchanges[0].received_text(), "Server Echo: ping");
    }

    #[test]
    fn test_report_with_error_is_failure() {
        let mut report = SessionReport::new("127.0.0.1:1".to_string());
        report.connected = true;
        report.error = Some("Connection closed by peer".to_string());
        assert!(!report.is_success());
    }

    #[test]
    fn test_exchange_json_uses_hex_and_millis() {
        let exchange = Exchange {
            timestamp: UNIX_EPOCH + Duration::from_millis(1_700_000_000_123),
            sent: b"ping".to_vec(),
            received: vec![0x00, 0xff, 0x0a],
        };

        let value = serde_json::to_value(&exchange).unwrap();
        assert_eq!(value["sent"], "70696e67");
        assert_eq!(value["received"], "00ff0a");
        assert_eq!(value["timestamp"], 1_700_000_000_123u64);
    }
}
