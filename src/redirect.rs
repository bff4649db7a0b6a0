//! Redirect target rewriting
//!
//! Auth actions that send the user away (magic links, verification emails,
//! provider sign-in) carry a `redirectTo` target. Relative targets are
//! anchored on the client URL configured for the frontend; absolute targets
//! are sent as-is.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::utils::logging::LoggingHelper;
use crate::utils::query::{merge_query_pairs, parse_query_pairs, serialize_query_pairs};

/// Options carrying an optional redirect target plus passthrough fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,

    /// Fields the caller attached to the options; never inspected here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RedirectOptions {
    /// Options with only a redirect target
    #[must_use]
    pub fn redirect_to(target: impl Into<String>) -> Self {
        Self {
            redirect_to: Some(target.into()),
            extra: Map::new(),
        }
    }

    /// Attach a passthrough field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Flatten into a single ordered map, `redirectTo` first
    #[must_use]
    pub fn to_query_map(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(self.extra.len() + 1);
        if let Some(target) = &self.redirect_to {
            map.insert("redirectTo".to_string(), Value::String(target.clone()));
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Rewrite the redirect target of `options` against `client_url`
///
/// - no options, or no/empty `redirect_to`: returned unchanged
/// - absolute `redirect_to`: kept verbatim, `client_url` ignored
/// - relative `redirect_to` without a usable `client_url`: removed
/// - relative `redirect_to` with a `client_url`: merged into an absolute URL
///
/// Passthrough fields are always preserved.
#[must_use]
pub fn rewrite_redirect_to(
    client_url: Option<&str>,
    options: Option<RedirectOptions>,
) -> Option<RedirectOptions> {
    let mut options = options?;

    let Some(target) = options.redirect_to.take().filter(|t| !t.is_empty()) else {
        return Some(options);
    };

    if is_absolute_url(&target) {
        debug!("Keeping absolute redirect target: {target}");
        options.redirect_to = Some(target);
        return Some(options);
    }

    let Some(base) = client_url.and_then(parse_client_url) else {
        LoggingHelper::log_redirect_dropped(&target);
        return Some(options);
    };

    let rewritten = merge_relative_target(&base, &target);
    LoggingHelper::log_redirect_rewritten(&target, &rewritten);
    options.redirect_to = Some(rewritten);
    Some(options)
}

/// A target is absolute when it parses as a URL on its own
fn is_absolute_url(target: &str) -> bool {
    Url::parse(target).is_ok()
}

/// Parse the configured client URL
///
/// Empty values, malformed values and URLs that cannot carry a path (such as
/// `mailto:`) count as absent.
fn parse_client_url(client_url: &str) -> Option<Url> {
    if client_url.is_empty() {
        return None;
    }
    let url = Url::parse(client_url)
        .map_err(|e| warn!("Ignoring malformed client URL '{client_url}': {e}"))
        .ok()?;
    if url.cannot_be_a_base() {
        warn!("Ignoring client URL '{client_url}': it cannot anchor relative paths");
        return None;
    }
    Some(url)
}

/// Components of a relative redirect target
struct RelativeTarget<'a> {
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> RelativeTarget<'a> {
    fn split(target: &'a str) -> Self {
        let (rest, fragment) = match target.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (target, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        Self {
            path,
            query,
            fragment,
        }
    }
}

fn merge_relative_target(base: &Url, target: &str) -> String {
    let target = RelativeTarget::split(target);
    let mut merged = base.clone();

    merged.set_path(&merge_path(base.path(), target.path));

    let pairs = merge_query_pairs(
        base.query().map(parse_query_pairs).unwrap_or_default(),
        target.query.map(parse_query_pairs).unwrap_or_default(),
    );
    if pairs.is_empty() {
        merged.set_query(None);
    } else {
        merged.set_query(Some(&serialize_query_pairs(&pairs)));
    }

    merged.set_fragment(target.fragment);
    merged.to_string()
}

/// Join the client path and the target path
///
/// A client path ending in `/` is a directory the target is placed under;
/// otherwise a rooted target replaces it. The boundary always has a single `/`.
fn merge_path(base_path: &str, target_path: &str) -> String {
    if target_path.is_empty() {
        return base_path.to_string();
    }

    let directory = base_path.strip_suffix('/');
    if target_path.starts_with('/') {
        match directory {
            Some(prefix) => format!("{prefix}{target_path}"),
            None => target_path.to_string(),
        }
    } else {
        format!("{}/{target_path}", directory.unwrap_or(base_path))
    }
}
