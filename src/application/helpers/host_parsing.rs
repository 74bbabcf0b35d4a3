use crate::app_error::{AppError, AppResult};
use crate::domain::entities::domain::DomainType;

const MAX_HOST_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Trim, lowercase and drop a trailing root dot, then validate the result.
pub fn normalize_host(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    let host = trimmed.strip_suffix('.').unwrap_or(trimmed).to_lowercase();

    if host.is_empty() {
        return Err(AppError::InvalidHost("Host must not be empty".into()));
    }
    if !is_valid_hostname(&host) {
        return Err(AppError::InvalidHost(host));
    }

    Ok(host)
}

/// Checks an already-lowercased hostname against the LDH rules.
/// Requires at least two labels (name + TLD).
pub fn is_valid_hostname(host: &str) -> bool {
    if host.is_empty() || host.len() > MAX_HOST_LEN {
        return false;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Whether a full DNS name (e.g. a challenge record name) stays within the
/// 253-character limit.
pub fn fits_dns_name_limit(name: &str) -> bool {
    name.len() <= MAX_HOST_LEN
}

/// Whether `host` is `zone` itself or any name below it.
pub fn is_within_zone(host: &str, zone: &str) -> bool {
    host == zone
        || host
            .strip_suffix(zone)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Extract the tenant label from a platform subdomain.
/// e.g., "acme.platform.app" under "platform.app" -> Some("acme")
/// Nested names ("a.b.platform.app") and the zone itself yield None.
pub fn platform_label<'a>(host: &'a str, platform_domain: &str) -> Option<&'a str> {
    let label = host.strip_suffix(platform_domain)?.strip_suffix('.')?;
    if label.is_empty() || label.contains('.') {
        return None;
    }
    Some(label)
}

/// Subdomains must be exactly one label under the platform zone; custom
/// domains must live outside it.
pub fn ensure_host_matches_type(
    host: &str,
    domain_type: DomainType,
    platform_domain: &str,
) -> AppResult<()> {
    match domain_type {
        DomainType::Subdomain => {
            if platform_label(host, platform_domain).is_none() {
                return Err(AppError::InvalidHost(format!(
                    "{host} is not a direct subdomain of {platform_domain}"
                )));
            }
        }
        DomainType::CustomDomain => {
            if is_within_zone(host, platform_domain) {
                return Err(AppError::InvalidHost(format!(
                    "{host} belongs to the platform zone; add it as a subdomain instead"
                )));
            }
        }
    }
    Ok(())
}
