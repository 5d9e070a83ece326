//! Prerender eligibility decision.
//!
//! # Responsibilities
//! - Decide whether a request should be served a prerendered snapshot
//! - Detect crawler traffic from the user agent
//! - Derive the canonical cache key
//!
//! # Design Decisions
//! - Pure function of the snapshot and the compiled rules; no per-request state
//!   is kept on the classifier, so one instance serves every request concurrently
//! - Empty whitelist/blacklist means "no restriction", not "matches nothing"
//! - The cache key is computed for every request, eligible or not

use axum::http::Method;
use url::form_urlencoded;

use crate::classify::request::IncomingRequest;
use crate::config::PrerenderConfig;
use crate::rules::RuleList;

/// Query parameter of the AJAX crawling scheme.
pub const ESCAPED_FRAGMENT: &str = "_escaped_fragment_";

/// Why a request was or was not found eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Disabled,
    Authenticated,
    MissingUserAgent,
    NotGet,
    AllUsersWhitelist,
    RendererSelfRequest,
    NotRequested,
    NotWhitelisted,
    Blacklisted,
    Eligible,
}

impl Reason {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Disabled => "disabled",
            Reason::Authenticated => "authenticated",
            Reason::MissingUserAgent => "missing_user_agent",
            Reason::NotGet => "not_get",
            Reason::AllUsersWhitelist => "all_users_whitelist",
            Reason::RendererSelfRequest => "renderer_self_request",
            Reason::NotRequested => "not_requested",
            Reason::NotWhitelisted => "not_whitelisted",
            Reason::Blacklisted => "blacklisted",
            Reason::Eligible => "eligible",
        }
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub eligible: bool,
    pub is_crawler: bool,
    /// Canonical URL; the only key used for lookup, rendering and invalidation.
    pub cache_key: String,
    pub reason: Reason,
}

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct Classifier {
    enabled: bool,
    crawler_agents: Vec<String>,
    whitelist: RuleList,
    blacklist: RuleList,
    whitelist_for_all_users: RuleList,
    renderer_agent: String,
    retained_query_params: Vec<String>,
}

impl Classifier {
    pub fn from_config(config: &PrerenderConfig) -> Self {
        Self {
            enabled: config.enabled,
            crawler_agents: config
                .crawler_user_agents
                .iter()
                .map(|ua| ua.to_lowercase())
                .collect(),
            whitelist: RuleList::new(config.whitelist.iter().cloned()),
            blacklist: RuleList::new(config.blacklist.iter().cloned()),
            whitelist_for_all_users: RuleList::new(config.whitelist_for_all_users.iter().cloned()),
            renderer_agent: config.renderer_user_agent.to_lowercase(),
            retained_query_params: config.retained_query_params.clone(),
        }
    }

    /// Classify a request snapshot.
    pub fn classify(&self, request: &IncomingRequest) -> Classification {
        let user_agent = request.user_agent.as_deref().map(str::to_lowercase);
        let is_crawler = user_agent
            .as_deref()
            .is_some_and(|ua| self.is_crawler_agent(ua));
        let (eligible, reason) = self.decide(request, user_agent.as_deref(), is_crawler);

        Classification {
            eligible,
            is_crawler,
            cache_key: self.cache_key(request),
            reason,
        }
    }

    fn decide(
        &self,
        request: &IncomingRequest,
        user_agent: Option<&str>,
        is_crawler: bool,
    ) -> (bool, Reason) {
        if !self.enabled {
            return (false, Reason::Disabled);
        }
        if request.authenticated {
            return (false, Reason::Authenticated);
        }
        let Some(user_agent) = user_agent else {
            return (false, Reason::MissingUserAgent);
        };
        if request.method != Method::GET {
            return (false, Reason::NotGet);
        }

        let wants_prerender =
            request.has_query_param(ESCAPED_FRAGMENT) || is_crawler || request.buffer_bot;

        let uri = request.request_uri();

        if !self.whitelist_for_all_users.is_empty()
            && self.whitelist_for_all_users.is_listed(&[&uri])
            && (self.blacklist.is_empty() || !self.blacklist.is_listed(&[&uri]))
        {
            if !self.renderer_agent.is_empty() && user_agent.contains(&self.renderer_agent) {
                return (false, Reason::RendererSelfRequest);
            }
            return (true, Reason::AllUsersWhitelist);
        }

        if !wants_prerender {
            return (false, Reason::NotRequested);
        }

        if !self.whitelist.is_empty() && !self.whitelist.is_listed(&[&uri]) {
            return (false, Reason::NotWhitelisted);
        }

        if !self.blacklist.is_empty() {
            let mut needles = vec![uri.as_str()];
            if let Some(referer) = request.referer.as_deref() {
                needles.push(referer);
            }
            if self.blacklist.is_listed(&needles) {
                return (false, Reason::Blacklisted);
            }
        }

        (true, Reason::Eligible)
    }

    fn is_crawler_agent(&self, lowercased_ua: &str) -> bool {
        self.crawler_agents
            .iter()
            .any(|agent| lowercased_ua.contains(agent.as_str()))
    }

    /// `scheme://host/path` plus the retained query parameters, in configured order.
    pub fn cache_key(&self, request: &IncomingRequest) -> String {
        let mut key = format!(
            "{}://{}/{}",
            request.scheme,
            request.host,
            request.path.trim_start_matches('/')
        );

        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut retained = 0;
        for name in &self.retained_query_params {
            if let Some(value) = request.query_param(name) {
                query.append_pair(name, value);
                retained += 1;
            }
        }
        if retained > 0 {
            key.push('?');
            key.push_str(&query.finish());
        }

        key
    }
}
