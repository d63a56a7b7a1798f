//! Proxy-to-implementation linkage.
//!
//! Decides, for each creation event, whether it upgrades an existing proxy,
//! replaces a plain contract, is the implementation behind one or more new
//! proxies later in the same batch, or stands alone.

use chronicle_types::key::base_name;
use chronicle_types::LatestEntry;
use indexmap::IndexMap;

use crate::classify::CreationEvent;

/// The only proxy standard Chronicle understands.
pub const TRANSPARENT_PROXY: &str = "TransparentUpgradeableProxy";

/// Whether a contract name denotes a supported proxy.
pub fn is_proxy_name(name: &str) -> bool {
    name == TRANSPARENT_PROXY
}

/// How a creation event relates to the current ledger and batch.
#[derive(Debug)]
pub enum Link<'e, 'a> {
    /// The event is itself a proxy; it is only consumed through lookahead.
    ProxyEvent,
    /// A proxy for this contract name exists in latest under `key`.
    Upgrade { key: String },
    /// A plain contract with this name exists in latest under `key`.
    Redeploy { key: String },
    /// Wrapped by these later proxy events: a first deployment, or the
    /// implementation behind a proxy that this same batch already recorded.
    NewProxies(Vec<&'e CreationEvent<'a>>),
    /// First deployment with no proxy.
    Standalone,
}

/// Classify `events[index]` against the working latest map.
pub fn link<'e, 'a>(
    events: &'e [CreationEvent<'a>],
    index: usize,
    latest: &IndexMap<String, LatestEntry>,
) -> Link<'e, 'a> {
    let event = &events[index];
    if is_proxy_name(event.name) {
        return Link::ProxyEvent;
    }

    if let Some((key, entry)) = existing_entry(latest, event.name) {
        let key = key.to_string();
        return match entry.record.proxy_details() {
            Some(details) if details.implementation == *event.address => {
                // Replaying the batch that deployed this proxy.
                let proxies: Vec<_> = proxies_for(events, index)
                    .into_iter()
                    .filter(|proxy| *proxy.address == entry.record.address)
                    .collect();
                if proxies.is_empty() {
                    Link::Upgrade { key }
                } else {
                    Link::NewProxies(proxies)
                }
            }
            Some(_) => Link::Upgrade { key },
            None => Link::Redeploy { key },
        };
    }

    let proxies = proxies_for(events, index);
    if proxies.is_empty() {
        Link::Standalone
    } else {
        Link::NewProxies(proxies)
    }
}

/// The latest entry a contract name resolves to.
///
/// The bare key wins. Without one, a single entry sharing the base name is
/// used; several tagged aliases and no bare key resolve to nothing.
pub fn existing_entry<'l>(
    latest: &'l IndexMap<String, LatestEntry>,
    name: &str,
) -> Option<(&'l str, &'l LatestEntry)> {
    if let Some((key, entry)) = latest.get_key_value(name) {
        return Some((key.as_str(), entry));
    }

    let mut candidates = latest
        .iter()
        .filter(|(key, _)| base_name(key) == name);
    let first = candidates.next()?;
    if candidates.next().is_some() {
        return None;
    }
    Some((first.0.as_str(), first.1))
}

/// Proxy events after `index` whose first constructor argument is the
/// address of `events[index]`.
///
/// This is a plain forward scan over the event list; it does not consult any
/// ledger state. Several proxies may wrap the same implementation.
pub fn proxies_for<'e, 'a>(events: &'e [CreationEvent<'a>], index: usize) -> Vec<&'e CreationEvent<'a>> {
    let implementation = events[index].address;
    events[index + 1..]
        .iter()
        .filter(|candidate| is_proxy_name(candidate.name))
        .filter(|candidate| {
            candidate
                .tx
                .argument(0)
                .is_some_and(|arg| implementation.matches(arg))
        })
        .collect()
}
