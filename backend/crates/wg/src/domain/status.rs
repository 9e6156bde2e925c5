//! Live Status Parsing
//!
//! Line-oriented parse of the control surface's `show` dump, keyed by the
//! `peer:` marker that starts each peer block. Unrecognized lines are
//! ignored so additional status fields do not break the parser.

use std::collections::HashMap;

/// Live interface state for one peer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivePeerStatus {
    pub endpoint: Option<String>,
    pub allowed_ips: Option<String>,
    pub latest_handshake: Option<String>,
    pub transfer: Option<String>,
}

/// Parse `wg show` output into a map keyed by peer public key.
pub fn parse_status(text: &str) -> HashMap<String, LivePeerStatus> {
    let mut peers: HashMap<String, LivePeerStatus> = HashMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(key) = trimmed.strip_prefix("peer:") {
            let key = key.trim().to_string();
            peers.insert(key.clone(), LivePeerStatus::default());
            current = Some(key);
            continue;
        }

        // interface blocks end any current peer block
        if trimmed.starts_with("interface:") {
            current = None;
            continue;
        }

        let Some(key) = &current else { continue };
        let Some(status) = peers.get_mut(key) else {
            continue;
        };

        if let Some(v) = trimmed.strip_prefix("endpoint:") {
            status.endpoint = Some(v.trim().to_string());
        } else if let Some(v) = trimmed.strip_prefix("allowed ips:") {
            status.allowed_ips = Some(v.trim().to_string());
        } else if let Some(v) = trimmed.strip_prefix("latest handshake:") {
            status.latest_handshake = Some(v.trim().to_string());
        } else if let Some(v) = trimmed.strip_prefix("transfer:") {
            status.transfer = Some(v.trim().to_string());
        }
        // anything else: ignored
    }

    peers
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
interface: wg0
  public key: SERVERPUBKEY=
  private key: (hidden)
  listening port: 51820

peer: AbCdEfGh123=
  endpoint: 198.51.100.10:51820
  allowed ips: 10.88.0.2/32
  latest handshake: 1 minute, 14 seconds ago
  transfer: 1.21 MiB received, 8.04 MiB sent
  persistent keepalive: every 25 seconds

peer: ZyXwVuTs987=
  allowed ips: 10.88.0.3/32
";

    #[test]
    fn test_parse_two_peers() {
        let parsed = parse_status(SAMPLE);
        assert_eq!(parsed.len(), 2);

        let first = &parsed["AbCdEfGh123="];
        assert_eq!(first.endpoint.as_deref(), Some("198.51.100.10:51820"));
        assert_eq!(first.allowed_ips.as_deref(), Some("10.88.0.2/32"));
        assert_eq!(
            first.latest_handshake.as_deref(),
            Some("1 minute, 14 seconds ago")
        );
        assert_eq!(
            first.transfer.as_deref(),
            Some("1.21 MiB received, 8.04 MiB sent")
        );

        // Second peer has never connected: only its allowed ips are known
        let second = &parsed["ZyXwVuTs987="];
        assert!(second.endpoint.is_none());
        assert_eq!(second.allowed_ips.as_deref(), Some("10.88.0.3/32"));
    }

    #[test]
    fn test_interface_lines_do_not_leak_into_peers() {
        let parsed = parse_status(SAMPLE);
        assert!(!parsed.contains_key("SERVERPUBKEY="));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let text = "peer: K=\n  endpoint: 1.2.3.4:51820\n  some future field: whatever\n";
        let parsed = parse_status(text);
        assert_eq!(parsed["K="].endpoint.as_deref(), Some("1.2.3.4:51820"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_status("").is_empty());
    }
}
