//! Feed path and target URL construction.
//!
//! The traffic controller URL may be configured with an http(s) or ws(s)
//! scheme; streaming always happens over ws(s) and the recent-log pull over
//! http(s), so each path translates the scheme it needs.

use url::Url;

use crate::error::ConsumerError;

/// Path of the single-application tail feed.
pub(crate) fn tail_path(app_guid: &str) -> String {
    format!("/apps/{app_guid}/stream")
}

/// Path of the multiplexed firehose feed.
pub(crate) fn firehose_path(subscription_id: &str) -> String {
    format!("/firehose/{subscription_id}")
}

/// Path of the recent-log pull for one application.
pub(crate) fn recent_logs_path(app_guid: &str) -> String {
    format!("/apps/{app_guid}/recentlogs")
}

/// Builds the websocket target for a feed path.
pub(crate) fn stream_url(base_url: &str, feed_path: &str) -> Result<Url, ConsumerError> {
    let target = parse_target(base_url, feed_path)?;
    translate_scheme(target, |scheme| match scheme {
        "ws" | "http" => Some("ws"),
        "wss" | "https" => Some("wss"),
        _ => None,
    })
}

/// Builds the HTTP target for the recent-log pull.
pub(crate) fn recent_logs_url(base_url: &str, app_guid: &str) -> Result<Url, ConsumerError> {
    let target = parse_target(base_url, &recent_logs_path(app_guid))?;
    translate_scheme(target, |scheme| match scheme {
        "ws" | "http" => Some("http"),
        "wss" | "https" => Some("https"),
        _ => None,
    })
}

fn parse_target(base_url: &str, path: &str) -> Result<Url, ConsumerError> {
    let target = format!("{}{path}", base_url.trim_end_matches('/'));
    Url::parse(&target)
        .map_err(|err| ConsumerError::connection_failed(format!("invalid target URL {target:?}: {err}")))
}

fn translate_scheme(
    url: Url,
    map: impl Fn(&str) -> Option<&'static str>,
) -> Result<Url, ConsumerError> {
    let scheme = map(url.scheme()).ok_or_else(|| {
        ConsumerError::connection_failed(format!("unsupported scheme {:?}", url.scheme()))
    })?;
    if url.scheme() == scheme {
        return Ok(url);
    }
    // Rebuild instead of Url::set_scheme, which refuses some translations.
    let rebuilt = format!("{scheme}{}", &url.as_str()[url.scheme().len()..]);
    Url::parse(&rebuilt).map_err(|err| ConsumerError::connection_failed(err))
}
