//! Outbound address filtering.
//!
//! A fetch target must resolve only to publicly routable addresses. The
//! checked addresses are handed back so the HTTP client can be pinned to
//! them, closing the window between the check and the connect.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::error::FetchError;

/// Whether `ip` must never be contacted on behalf of a caller.
pub fn is_forbidden(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_forbidden_v4(v4),
        IpAddr::V6(v6) => is_forbidden_v6(v6),
    }
}

fn is_forbidden_v4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();

    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        // 0.0.0.0/8
        || octets[0] == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
}

fn is_forbidden_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_forbidden_v4(v4);
    }

    let first = ip.segments()[0];

    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

/// Resolve `host` and require every answer to be public.
///
/// IP literals are checked directly. Returns the addresses to pin the
/// connection to.
pub async fn resolve_public(host: &str, port: u16) -> Result<Vec<SocketAddr>, FetchError> {
    let bare = host.trim_start_matches('[').trim_end_matches(']');

    let addrs: Vec<SocketAddr> = match bare.parse::<IpAddr>() {
        Ok(ip) => vec![SocketAddr::new(ip, port)],
        Err(_) => tokio::net::lookup_host((bare, port))
            .await
            .map_err(|e| FetchError::Resolve {
                host: host.to_string(),
                reason: e.to_string(),
            })?
            .collect(),
    };

    if addrs.is_empty() {
        return Err(FetchError::Resolve {
            host: host.to_string(),
            reason: "no addresses".into(),
        });
    }

    if let Some(bad) = addrs.iter().find(|a| is_forbidden(a.ip())) {
        return Err(FetchError::SsrfBlocked {
            host: host.to_string(),
            addr: bad.ip(),
        });
    }

    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_forbidden_ipv4() {
        assert!(is_forbidden(v4(127, 0, 0, 1)));
        assert!(is_forbidden(v4(10, 0, 0, 1)));
        assert!(is_forbidden(v4(172, 16, 0, 1)));
        assert!(is_forbidden(v4(192, 168, 1, 1)));
        assert!(is_forbidden(v4(169, 254, 169, 254)));
        assert!(is_forbidden(v4(100, 64, 0, 1)));
        assert!(is_forbidden(v4(100, 127, 255, 255)));
        assert!(is_forbidden(v4(0, 1, 2, 3)));
        assert!(is_forbidden(v4(255, 255, 255, 255)));

        assert!(!is_forbidden(v4(8, 8, 8, 8)));
        assert!(!is_forbidden(v4(1, 1, 1, 1)));
        assert!(!is_forbidden(v4(100, 128, 0, 1)));
    }

    #[test]
    fn test_forbidden_ipv6() {
        assert!(is_forbidden(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(is_forbidden(IpAddr::V6(Ipv6Addr::UNSPECIFIED)));
        assert!(is_forbidden("fd00::1".parse().unwrap()));
        assert!(is_forbidden("fe80::1".parse().unwrap()));
        assert!(is_forbidden("::ffff:127.0.0.1".parse().unwrap()));
        assert!(is_forbidden("::ffff:192.168.0.10".parse().unwrap()));

        assert!(!is_forbidden("2606:4700:4700::1111".parse().unwrap()));
        assert!(!is_forbidden("::ffff:8.8.8.8".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_resolve_literals() {
        let addrs = resolve_public("8.8.8.8", 443).await.unwrap();
        assert_eq!(addrs, vec!["8.8.8.8:443".parse().unwrap()]);

        assert!(matches!(
            resolve_public("127.0.0.1", 80).await,
            Err(FetchError::SsrfBlocked { .. })
        ));
        assert!(matches!(
            resolve_public("[::1]", 80).await,
            Err(FetchError::SsrfBlocked { .. })
        ));
    }
}
