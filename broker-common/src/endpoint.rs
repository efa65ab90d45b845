use url::Url;

use crate::errors::{BrokerErrorKind, Result};

/// Build the push endpoint URL for a channel or group id: `<base>
/// <notify-prefix><id>`, per the external interface contract. The id is
/// opaque and may contain any character except a path separator (checked
/// by the caller, which owns the registry's own validation of that rule).
pub fn make_endpoint(base_url: &str, notify_prefix: &str, id: &str) -> Result<String> {
    let root = Url::parse(base_url)?;
    let path = format!(
        "{}{}",
        notify_prefix.trim_start_matches('/'),
        id
    );
    let url = root.join(&path)?;
    Ok(url.to_string())
}

/// Recover the channel (or group) identifier previously embedded by
/// [`make_endpoint`] from a push endpoint URL, given the same
/// `notify_prefix` used to construct it.
pub fn parse_channel_from_endpoint(endpoint: &str, notify_prefix: &str) -> Result<String> {
    let url = Url::parse(endpoint)?;
    let path = url.path();
    let prefix = format!("/{}", notify_prefix.trim_start_matches('/'));
    path.strip_prefix(&prefix)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            BrokerErrorKind::InvalidClientMessage(format!(
                "push endpoint does not match notify prefix: {endpoint}"
            ))
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_channel_id() {
        let base = "http://localhost:8080/";
        let endpoint = make_endpoint(base, "/notify/", "c1").unwrap();
        assert_eq!(endpoint, "http://localhost:8080/notify/c1");
        let id = parse_channel_from_endpoint(&endpoint, "/notify/").unwrap();
        assert_eq!(id, "c1");
    }

    #[test]
    fn rejects_mismatched_prefix() {
        let err = parse_channel_from_endpoint("http://localhost:8080/other/c1", "/notify/");
        assert!(err.is_err());
    }
}
