//! Native `$sample` capability detection.

use semver::Version;

use crate::store::SampleStore;

/// Whether the server behind `store` is at least `minimum`.
///
/// Any failure to read or parse the version counts as unsupported, so the
/// caller falls back to the reservoir strategy that works everywhere.
pub async fn supports_native_sample<S: SampleStore>(store: &S, minimum: &Version) -> bool {
    let reported = match store.server_version().await {
        Ok(reported) => reported,
        Err(err) => {
            log::debug!("server version probe failed, assuming no $sample: {err}");
            return false;
        }
    };

    let Some(version) = parse_server_version(&reported) else {
        log::warn!("unrecognised server version {reported:?}, assuming no $sample");
        return false;
    };

    let supported = version >= *minimum;
    log::debug!("server version {version}, has native $sample? {supported}");
    supported
}

/// Parse a server version string, tolerating short or vendor-suffixed forms
/// such as `"3.2"` or `"6.0.5-ent"`.
pub fn parse_server_version(reported: &str) -> Option<Version> {
    let reported = reported.trim();
    if let Ok(version) = Version::parse(reported) {
        return Some(version);
    }

    let core = reported.split(['-', '+', ' ']).next()?;
    let mut parts = core.split('.').map(|part| part.parse::<u64>());
    let major = parts.next()?.ok()?;
    let minor = parts.next().unwrap_or(Ok(0)).ok()?;
    let patch = parts.next().unwrap_or(Ok(0)).ok()?;
    Some(Version::new(major, minor, patch))
}
