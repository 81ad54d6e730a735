//! Identity resolution
//!
//! All bookkeeping is keyed on one resolved identity per check: by default the
//! caller's network address (proxy-aware when `proxy_count` is set), or a
//! caller-supplied key/value pair such as `("username", "alice")`.

use super::ThrottleError;

const IP_KEY: &str = "ip";

/// A resolved throttle identity.
///
/// Two identities are the same record in the store iff their storage keys are
/// equal; distinct identities never influence each other's attempt counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    key: String,
    value: String,
}

impl Identity {
    /// Resolve the default address-based identity from request context.
    ///
    /// When `proxy_count > 0` and a forwarded-address header is present, the
    /// hop believed genuine beyond the trusted proxy depth is selected (see
    /// [`client_address`]). With `proxy_count == 0` the header is ignored and
    /// the transport-level remote address is used as-is.
    pub fn from_request(
        forwarded_for: Option<&str>,
        remote_addr: &str,
        proxy_count: usize,
    ) -> Identity {
        Identity {
            key: IP_KEY.to_string(),
            value: client_address(forwarded_for, remote_addr, proxy_count),
        }
    }

    /// Build an identity from an explicit key/value pair.
    ///
    /// The value must be non-empty; a custom key without a value fails with
    /// [`ThrottleError::Identity`] before any store access can happen.
    pub fn custom(key: &str, value: &str) -> Result<Identity, ThrottleError> {
        if value.is_empty() {
            return Err(ThrottleError::Identity(format!(
                "a value is required for custom key {key:?}"
            )));
        }
        Ok(Identity {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// The key under which this identity's record lives in the store.
    pub fn storage_key(&self) -> String {
        format!("{}-{}", self.key, self.value)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.key, self.value)
    }
}

/// Pick the client address from a forwarded-address header and the transport
/// remote address.
///
/// The header is split on commas, trimmed, and blank hops dropped. If the hop
/// count strictly exceeds the trusted proxy depth, the hop at
/// `hops - proxy_count - 1` is the address the nearest untrusted party claims
/// to be. A shorter list falls back to the first hop; no usable header falls
/// back to the remote address.
pub fn client_address(
    forwarded_for: Option<&str>,
    remote_addr: &str,
    proxy_count: usize,
) -> String {
    if proxy_count > 0 {
        if let Some(header) = forwarded_for {
            let hops: Vec<&str> = header
                .split(',')
                .map(str::trim)
                .filter(|hop| !hop.is_empty())
                .collect();
            if hops.len() > proxy_count {
                return hops[hops.len() - proxy_count - 1].to_string();
            }
            if let Some(first) = hops.first() {
                return first.to_string();
            }
        }
    }
    remote_addr.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_beyond_trusted_depth_is_selected() {
        // 3 hops, 2 trusted proxies: index 3 - 2 - 1 = 0
        let addr = client_address(Some("A, B, C"), "10.0.0.1", 2);
        assert_eq!(addr, "A");

        let addr = client_address(
            Some("129.78.138.66, 129.78.64.103, 10.100.0.123"),
            "10.0.0.1",
            1,
        );
        assert_eq!(addr, "129.78.64.103");
    }

    #[test]
    fn depth_exceeding_hops_falls_back_to_first() {
        let addr = client_address(Some("A, B, C"), "10.0.0.1", 4);
        assert_eq!(addr, "A");
    }

    #[test]
    fn no_header_uses_remote_address() {
        let addr = client_address(None, "203.0.113.7", 0);
        assert_eq!(addr, "203.0.113.7");
    }

    #[test]
    fn zero_proxy_count_ignores_header() {
        let addr = client_address(Some("A, B, C"), "203.0.113.7", 0);
        assert_eq!(addr, "203.0.113.7");
    }

    #[test]
    fn blank_hops_are_dropped() {
        let addr = client_address(Some(" ,  , "), "203.0.113.7", 2);
        assert_eq!(addr, "203.0.113.7");

        let addr = client_address(Some(" A ,, B "), "203.0.113.7", 3);
        assert_eq!(addr, "A");
    }

    #[test]
    fn storage_key_joins_key_and_value() {
        let identity = Identity::from_request(None, "203.0.113.7", 0);
        assert_eq!(identity.storage_key(), "ip-203.0.113.7");

        let identity = Identity::custom("username", "alice").unwrap();
        assert_eq!(identity.storage_key(), "username-alice");
        assert_eq!(identity.key(), "username");
        assert_eq!(identity.value(), "alice");
    }

    #[test]
    fn custom_identity_requires_value() {
        let err = Identity::custom("username", "").unwrap_err();
        assert!(matches!(err, ThrottleError::Identity(_)));
    }
}
