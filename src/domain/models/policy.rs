//! Response-header policies.
//!
//! A [`Policy`] is one header-mutation rule: it either sets a header to a fixed
//! value or strips a header from the response. Header values are rendered once
//! when the policy is built, so applying a policy to a response is plain header
//! map manipulation with no allocation beyond the clones of the prepared values.
//!
//! A [`PolicySet`] is the ordered, immutable list registered at startup. No two
//! policies in the default set touch the same header name, which makes the final
//! header set independent of ordering and re-application.

use std::fmt;
use std::str::FromStr;

use axum::http::{
    header::{
        InvalidHeaderValue, CACHE_CONTROL, CONTENT_SECURITY_POLICY, EXPIRES, PRAGMA,
        STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_DNS_PREFETCH_CONTROL,
        X_FRAME_OPTIONS, X_XSS_PROTECTION,
    },
    HeaderMap, HeaderName, HeaderValue,
};
use thiserror::Error;

use crate::config::SecuritySettings;

pub const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");
pub const X_DOWNLOAD_OPTIONS: HeaderName = HeaderName::from_static("x-download-options");
pub const SURROGATE_CONTROL: HeaderName = HeaderName::from_static("surrogate-control");

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Invalid {policy} header value: {source}")]
    InvalidHeaderValue {
        policy: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },

    #[error("{policy} directive {directive} needs at least one source")]
    EmptyDirective {
        policy: &'static str,
        directive: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    Deny,
    SameOrigin,
}

impl FrameAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deny => "DENY",
            Self::SameOrigin => "SAMEORIGIN",
        }
    }
}

impl FromStr for FrameAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "sameorigin" | "same-origin" => Ok(Self::SameOrigin),
            other => Err(format!("unknown frame action '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HstsOptions {
    /// Seconds.
    pub max_age: u64,
    pub include_subdomains: bool,
    pub preload: bool,
    pub force: bool,
}

impl HstsOptions {
    fn render(&self) -> String {
        let mut value = format!("max-age={}", self.max_age);
        if self.include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.preload {
            value.push_str("; preload");
        }
        value
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspDirective {
    pub name: String,
    pub sources: Vec<String>,
}

impl CspDirective {
    pub fn new(name: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyKind {
    HidePoweredBy,
    Frameguard(FrameAction),
    XssFilter,
    NoSniff,
    IeNoOpen,
    Hsts(HstsOptions),
    DnsPrefetchControl { allow: bool },
    NoCache,
    ContentSecurityPolicy(Vec<CspDirective>),
}

impl PolicyKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HidePoweredBy => "hidePoweredBy",
            Self::Frameguard(_) => "frameguard",
            Self::XssFilter => "xssFilter",
            Self::NoSniff => "noSniff",
            Self::IeNoOpen => "ieNoOpen",
            Self::Hsts(_) => "hsts",
            Self::DnsPrefetchControl { .. } => "dnsPrefetchControl",
            Self::NoCache => "noCache",
            Self::ContentSecurityPolicy(_) => "contentSecurityPolicy",
        }
    }

    fn mutations(&self) -> Result<Vec<HeaderMutation>, PolicyError> {
        let mutations = match self {
            Self::HidePoweredBy => vec![HeaderMutation::Remove(X_POWERED_BY)],
            Self::Frameguard(action) => vec![HeaderMutation::Set(
                X_FRAME_OPTIONS,
                HeaderValue::from_static(action.as_str()),
            )],
            Self::XssFilter => vec![HeaderMutation::Set(
                X_XSS_PROTECTION,
                HeaderValue::from_static("1; mode=block"),
            )],
            Self::NoSniff => vec![HeaderMutation::Set(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            )],
            Self::IeNoOpen => vec![HeaderMutation::Set(
                X_DOWNLOAD_OPTIONS,
                HeaderValue::from_static("noopen"),
            )],
            Self::Hsts(options) => vec![HeaderMutation::Set(
                STRICT_TRANSPORT_SECURITY,
                self.header_value(&options.render())?,
            )],
            Self::DnsPrefetchControl { allow } => vec![HeaderMutation::Set(
                X_DNS_PREFETCH_CONTROL,
                HeaderValue::from_static(if *allow { "on" } else { "off" }),
            )],
            Self::NoCache => vec![
                HeaderMutation::Set(
                    CACHE_CONTROL,
                    HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
                ),
                HeaderMutation::Set(PRAGMA, HeaderValue::from_static("no-cache")),
                HeaderMutation::Set(EXPIRES, HeaderValue::from_static("0")),
                HeaderMutation::Set(SURROGATE_CONTROL, HeaderValue::from_static("no-store")),
            ],
            Self::ContentSecurityPolicy(directives) => {
                let mut rendered = Vec::with_capacity(directives.len());
                for directive in directives {
                    if directive.sources.is_empty() {
                        return Err(PolicyError::EmptyDirective {
                            policy: self.name(),
                            directive: directive.name.clone(),
                        });
                    }
                    rendered.push(format!(
                        "{} {}",
                        directive.name,
                        directive.sources.join(" ")
                    ));
                }
                if rendered.is_empty() {
                    return Err(PolicyError::EmptyDirective {
                        policy: self.name(),
                        directive: "default-src".to_string(),
                    });
                }
                vec![HeaderMutation::Set(
                    CONTENT_SECURITY_POLICY,
                    self.header_value(&rendered.join("; "))?,
                )]
            },
        };

        Ok(mutations)
    }

    fn header_value(&self, value: &str) -> Result<HeaderValue, PolicyError> {
        HeaderValue::from_str(value).map_err(|source| PolicyError::InvalidHeaderValue {
            policy: self.name(),
            source,
        })
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMutation {
    Set(HeaderName, HeaderValue),
    Remove(HeaderName),
}

impl HeaderMutation {
    pub fn header_name(&self) -> &HeaderName {
        match self {
            Self::Set(name, _) | Self::Remove(name) => name,
        }
    }

    fn apply(&self, headers: &mut HeaderMap) {
        match self {
            Self::Set(name, value) => {
                headers.insert(name.clone(), value.clone());
            },
            Self::Remove(name) => {
                headers.remove(name);
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Policy {
    kind: PolicyKind,
    mutations: Vec<HeaderMutation>,
}

impl Policy {
    pub fn new(kind: PolicyKind) -> Result<Self, PolicyError> {
        let mutations = kind.mutations()?;
        Ok(Self { kind, mutations })
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn kind(&self) -> &PolicyKind {
        &self.kind
    }

    pub fn mutations(&self) -> &[HeaderMutation] {
        &self.mutations
    }

    /// Strict-Transport-Security is only meaningful over TLS, so unless forced
    /// it is skipped on plain HTTP exchanges.
    pub fn applies_to(&self, secure: bool) -> bool {
        match &self.kind {
            PolicyKind::Hsts(options) => options.force || secure,
            _ => true,
        }
    }

    pub fn apply(&self, secure: bool, headers: &mut HeaderMap) {
        if !self.applies_to(secure) {
            return;
        }
        for mutation in &self.mutations {
            mutation.apply(headers);
        }
    }
}

/// The ordered policy list applied to every response.
#[derive(Debug, Clone)]
pub struct PolicySet {
    policies: Vec<Policy>,
}

impl PolicySet {
    pub fn new(kinds: impl IntoIterator<Item = PolicyKind>) -> Result<Self, PolicyError> {
        let policies = kinds
            .into_iter()
            .map(Policy::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { policies })
    }

    /// Builds the fixed nine-policy hardening sequence.
    pub fn from_settings(settings: &SecuritySettings) -> Result<Self, PolicyError> {
        Self::new([
            PolicyKind::HidePoweredBy,
            PolicyKind::Frameguard(settings.frame_action),
            PolicyKind::XssFilter,
            PolicyKind::NoSniff,
            PolicyKind::IeNoOpen,
            PolicyKind::Hsts(HstsOptions {
                max_age: settings.hsts_max_age,
                include_subdomains: settings.hsts_include_subdomains,
                preload: settings.hsts_preload,
                force: settings.hsts_force,
            }),
            PolicyKind::DnsPrefetchControl {
                allow: settings.dns_prefetch_allow,
            },
            PolicyKind::NoCache,
            PolicyKind::ContentSecurityPolicy(vec![
                CspDirective::new("default-src", settings.csp_default_src.clone()),
                CspDirective::new("script-src", settings.csp_script_src.clone()),
            ]),
        ])
    }

    pub fn apply(&self, secure: bool, headers: &mut HeaderMap) {
        for policy in &self.policies {
            policy.apply(secure, headers);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.policies.iter().map(Policy::name).collect()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn enforces_strict_transport(&self) -> bool {
        self.policies
            .iter()
            .any(|p| matches!(p.kind(), PolicyKind::Hsts(_)))
    }

    /// Header names removed by the policies that apply to this exchange.
    pub fn removed_headers(&self, secure: bool) -> Vec<&HeaderName> {
        self.policies
            .iter()
            .filter(|p| p.applies_to(secure))
            .flat_map(Policy::mutations)
            .filter_map(|m| match m {
                HeaderMutation::Remove(name) => Some(name),
                HeaderMutation::Set(..) => None,
            })
            .collect()
    }
}
