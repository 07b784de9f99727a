//! URL → extraction strategy classification.
//!
//! An ordered list of rules, first match wins. New site support is added by
//! appending a [`Rule`], never by branching on URLs inside a strategy.

use url::Url;

use crate::models::StrategyKind;

/// One classification rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub kind: StrategyKind,
    pub matches: fn(&Url) -> bool,
}

impl Rule {
    pub const fn new(name: &'static str, kind: StrategyKind, matches: fn(&Url) -> bool) -> Self {
        Self {
            name,
            kind,
            matches,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// `host` equals `domain` or is one of its subdomains.
fn host_within(url: &Url, domain: &str) -> bool {
    url.host_str().is_some_and(|host| {
        host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn is_feed_host(url: &Url) -> bool {
    host_within(url, "weworkremotely.com")
}

fn has_feed_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    path.ends_with(".rss") || path.ends_with(".atom")
}

fn is_greenhouse_board(url: &Url) -> bool {
    host_within(url, "greenhouse.io") && url.host_str() != Some("boards-api.greenhouse.io")
}

fn is_lever_api(url: &Url) -> bool {
    match url.host_str() {
        Some("api.lever.co") => true,
        Some("jobs.lever.co") => url
            .query_pairs()
            .any(|(k, v)| k == "mode" && v.eq_ignore_ascii_case("json")),
        _ => false,
    }
}

fn is_greenhouse_api(url: &Url) -> bool {
    url.host_str() == Some("boards-api.greenhouse.io")
}

/// Built-in rules, in evaluation order.
pub const DEFAULT_RULES: &[Rule] = &[
    Rule::new("feed-host", StrategyKind::Feed, is_feed_host),
    Rule::new("feed-extension", StrategyKind::Feed, has_feed_extension),
    Rule::new("greenhouse-board", StrategyKind::StaticLink, is_greenhouse_board),
    Rule::new("lever-api", StrategyKind::StructuredApi, is_lever_api),
    Rule::new("greenhouse-api", StrategyKind::StructuredApi, is_greenhouse_api),
];

/// Chooses a [`StrategyKind`] for a URL and optional caller hint.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    rules: Vec<Rule>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }
}

impl Dispatcher {
    /// A dispatcher with no rules: everything is generic unless hinted.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Pure and deterministic: same `(url, hint)` always yields the same kind.
    ///
    /// A recognized hint wins; then the first matching rule; otherwise
    /// [`StrategyKind::GenericRendered`]. Unparsable URLs fall through to the
    /// default.
    pub fn classify(&self, url: &str, hint: Option<&str>) -> StrategyKind {
        if let Some(kind) = hint.and_then(StrategyKind::from_hint) {
            return kind;
        }
        match Url::parse(url) {
            Ok(parsed) => self.classify_url(&parsed),
            Err(_) => StrategyKind::GenericRendered,
        }
    }

    pub fn classify_url(&self, url: &Url) -> StrategyKind {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(url))
            .map(|rule| rule.kind)
            .unwrap_or(StrategyKind::GenericRendered)
    }
}
