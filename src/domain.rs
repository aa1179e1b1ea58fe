use crate::error::{Error, Result};

/// Returns the subdomain and the parent zone of a fully qualified domain.
///
/// The parent always carries a trailing dot, the way Route 53 names its
/// hosted zones. A two label domain is its own zone with an empty subdomain:
///
/// - `www.example.com` -> (`www`, `example.com.`)
/// - `example.com` -> (``, `example.com.`)
pub fn split_domain(domain: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(Error::InvalidDomain(domain.to_string()));
    }
    if parts.len() == 2 {
        return Ok((String::new(), format!("{domain}.")));
    }
    let subdomain = parts[0].to_string();
    let parent = parts[1..].join(".");
    Ok((subdomain, format!("{parent}.")))
}

/// Fully qualified name of a record `name` inside `zone`.
/// An empty name is the zone apex, and a name ending in `.` is already absolute.
pub fn fqdn(name: &str, zone: &str) -> String {
    let zone = zone.trim_end_matches('.');
    if name.is_empty() {
        return format!("{zone}.");
    }
    if name.ends_with('.') {
        return name.to_string();
    }
    if name == zone || name.ends_with(&format!(".{zone}")) {
        return format!("{name}.");
    }
    format!("{name}.{zone}.")
}
