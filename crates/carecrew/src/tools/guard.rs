//! Keeps model-chosen URLs away from loopback, private and metadata hosts.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use url::{Host, Url};

const BLOCKED_HOSTS: [&str; 3] =
    ["localhost", "metadata.google.internal", "metadata.google"];
const BLOCKED_SUFFIXES: [&str; 4] = [".local", ".internal", ".localhost", ".lan"];

/// Checks the host as written, without resolving it.
pub(crate) fn check_host(url: &Url) -> Result<(), String> {
    match url.host() {
        None => Err("url has no host".to_owned()),
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip)),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            let blocked = BLOCKED_HOSTS.contains(&domain.as_str())
                || BLOCKED_SUFFIXES.iter().any(|suffix| domain.ends_with(suffix));
            if blocked {
                Err(format!("access to internal host `{domain}` is blocked"))
            } else {
                Ok(())
            }
        }
    }
}

/// Checks every address a host resolved to.
pub(crate) fn check_resolved(
    addrs: impl IntoIterator<Item = SocketAddr>,
) -> Result<(), String> {
    let mut any = false;
    for addr in addrs {
        any = true;
        check_ip(addr.ip())?;
    }
    if any {
        Ok(())
    } else {
        Err("host did not resolve to any address".to_owned())
    }
}

fn check_ip(ip: IpAddr) -> Result<(), String> {
    if is_private_ip(ip) {
        Err(format!("access to private address `{ip}` is blocked"))
    } else {
        Ok(())
    }
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ip) => is_private_ipv4(ip),
        IpAddr::V6(ip) => {
            if let Some(mapped) = ip.to_ipv4_mapped() {
                return is_private_ipv4(mapped);
            }
            let first = ip.segments()[0];
            ip.is_loopback()
                || ip.is_unspecified()
                || ip.is_multicast()
                // fc00::/7 unique local
                || first & 0xfe00 == 0xfc00
                // fe80::/10 link local
                || first & 0xffc0 == 0xfe80
        }
    }
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_unspecified()
        || ip.is_multicast()
        // 0.0.0.0/8 and 100.64.0.0/10 carrier-grade NAT
        || a == 0
        || (a == 100 && (64..128).contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_of(raw: &str) -> Result<(), String> {
        check_host(&Url::parse(raw).unwrap())
    }

    #[test]
    fn test_internal_hosts_are_blocked() {
        for raw in [
            "http://127.0.0.1/",
            "http://localhost/",
            "http://LOCALHOST.:8080/admin",
            "http://10.0.0.1/",
            "http://192.168.1.20/",
            "http://172.16.0.5/",
            "http://169.254.169.254/latest/meta-data/",
            "http://0.0.0.0/",
            "http://100.64.0.1/",
            "http://[::1]/",
            "http://[fd00::1]/",
            "http://[fe80::1]/",
            "http://[::ffff:127.0.0.1]/",
            "http://metadata.google.internal/",
            "http://printer.local/",
            "http://db.internal/",
        ] {
            assert!(host_of(raw).is_err(), "{raw} should be blocked");
        }
    }

    #[test]
    fn test_public_hosts_are_allowed() {
        for raw in [
            "https://www.cdc.gov/flu/symptoms/",
            "http://93.184.216.34/",
            "https://[2606:4700:4700::1111]/",
            "https://internal.example.org/",
        ] {
            assert!(host_of(raw).is_ok(), "{raw} should be allowed");
        }
    }

    #[test]
    fn test_resolved_addresses() {
        let public: SocketAddr = "93.184.216.34:443".parse().unwrap();
        let private: SocketAddr = "10.1.2.3:443".parse().unwrap();
        assert!(check_resolved([public]).is_ok());
        assert!(check_resolved([public, private]).is_err());
        assert!(check_resolved([]).is_err());
    }
}
