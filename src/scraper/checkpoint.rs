//! Bot-protection interstitial detection.
//!
//! Pages are matched against an ordered rule table; the first rule with any
//! pattern present in the lower-cased HTML or title wins. Vendor-specific
//! signatures come before generic phrases so a Cloudflare page that also says
//! "access denied" is still reported as Cloudflare.

use std::fmt;

use serde::Serialize;

/// Kind of interstitial a page was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckpointKind {
    VercelSecurity,
    Cloudflare,
    BotProtection,
    AccessDenied,
    RateLimited,
    None,
}

impl CheckpointKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckpointKind::VercelSecurity => "Vercel Security",
            CheckpointKind::Cloudflare => "Cloudflare Protection",
            CheckpointKind::BotProtection => "Bot Protection",
            CheckpointKind::AccessDenied => "Access Denied",
            CheckpointKind::RateLimited => "Rate Limited",
            CheckpointKind::None => "None",
        }
    }
}

impl fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointVerdict {
    pub is_checkpoint: bool,
    pub kind: CheckpointKind,
    pub message: String,
}

impl CheckpointVerdict {
    pub fn clear() -> Self {
        Self {
            is_checkpoint: false,
            kind: CheckpointKind::None,
            message: String::new(),
        }
    }
}

/// One row of the classification table. Patterns must be lower-case.
#[derive(Debug, Clone)]
pub struct CheckpointRule {
    pub patterns: Vec<String>,
    pub kind: CheckpointKind,
    pub message: String,
}

impl CheckpointRule {
    pub fn new(kind: CheckpointKind, patterns: &[&str], message: &str) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
            kind,
            message: message.to_string(),
        }
    }

    fn matches(&self, html: &str, title: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| html.contains(p.as_str()) || title.contains(p.as_str()))
    }
}

/// Heuristic classifier over an ordered rule table
#[derive(Debug, Clone)]
pub struct CheckpointClassifier {
    rules: Vec<CheckpointRule>,
}

impl CheckpointClassifier {
    pub fn new(rules: Vec<CheckpointRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CheckpointRule] {
        &self.rules
    }

    pub fn classify(&self, html: &str, title: &str) -> CheckpointVerdict {
        let html = html.to_lowercase();
        let title = title.to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.matches(&html, &title))
            .map(|rule| CheckpointVerdict {
                is_checkpoint: true,
                kind: rule.kind,
                message: rule.message.clone(),
            })
            .unwrap_or_else(CheckpointVerdict::clear)
    }

    /// The built-in table, most specific vendor first
    pub fn default_rules() -> Vec<CheckpointRule> {
        vec![
            CheckpointRule::new(
                CheckpointKind::VercelSecurity,
                &[
                    "vercel security checkpoint",
                    "failed to verify your browser",
                    "code 21",
                ],
                "This website uses Vercel's security protection that blocks automated access. \
                 Try visiting the site directly in your browser first.",
            ),
            CheckpointRule::new(
                CheckpointKind::Cloudflare,
                &[
                    "cloudflare",
                    "checking your browser",
                    "please wait while we check your browser",
                    "ray id:",
                    "cf-ray",
                ],
                "This website uses Cloudflare's bot protection. \
                 The site may be temporarily blocking automated requests.",
            ),
            CheckpointRule::new(
                CheckpointKind::BotProtection,
                &[
                    "security check",
                    "bot protection",
                    "automated requests",
                    "please verify you are human",
                ],
                "This website has bot protection enabled that prevents automated access.",
            ),
            CheckpointRule::new(
                CheckpointKind::AccessDenied,
                &["access denied", "forbidden", "403 forbidden"],
                "Access to this website is currently restricted or blocked.",
            ),
            CheckpointRule::new(
                CheckpointKind::RateLimited,
                &["rate limit", "too many requests", "429"],
                "This website is rate limiting requests. Please try again later.",
            ),
        ]
    }
}

impl Default for CheckpointClassifier {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}
