//! Policy selection: ordered pattern table mapping route paths to rate-limit
//! policy tokens.
//!
//! The table is an explicit ordered sequence, never a map: precedence is part
//! of the contract. Earlier, more specific rules shadow later catch-alls for
//! the same prefix (e.g. `/api/tickets/.*comments` before `/api/tickets/`).

use regex::Regex;

/// Policy token selected when no rule matches.
pub const DEFAULT_POLICY: &str = "RATE_LIMITS.DEFAULT";

/// A single (pattern, policy token) rule.
///
/// Patterns use search semantics: a rule matches if its regex matches
/// anywhere within the route path.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    pub pattern: Regex,
    pub policy: &'static str,
}

/// Ordered rule table with first-match-wins selection.
///
/// Immutable for the duration of a run; selection has no side effects and
/// cannot fail (no match is a normal outcome, answered with
/// [`DEFAULT_POLICY`]).
#[derive(Debug, Clone)]
pub struct PolicySelector {
    rules: Vec<PolicyRule>,
}

/// The standard rule table, in precedence order.
const STANDARD_RULES: &[(&str, &str)] = &[
    // Auth endpoints (critical)
    (r"/api/auth/register", "RATE_LIMITS.AUTH_REGISTER"),
    (r"/api/auth/login", "RATE_LIMITS.AUTH_LOGIN"),
    (r"/api/auth/.*password", "RATE_LIMITS.AUTH_FORGOT_PASSWORD"),
    (r"/api/auth/", "RATE_LIMITS.AUTH_LOGIN"),
    // AI endpoints (high cost)
    (r"/api/ai/", "RATE_LIMITS.AI_CLASSIFY"),
    // Email / integration endpoints
    (r"/api/integrations/email/send", "RATE_LIMITS.EMAIL_SEND"),
    (r"/api/email/send", "RATE_LIMITS.EMAIL_SEND"),
    (r"/api/integrations/whatsapp/send", "RATE_LIMITS.WHATSAPP_SEND"),
    (r"/api/integrations/.*webhook", "RATE_LIMITS.WEBHOOK"),
    // Ticket mutations
    (r"/api/tickets/.*create", "RATE_LIMITS.TICKET_MUTATION"),
    (r"/api/tickets/.*comments", "RATE_LIMITS.TICKET_COMMENT"),
    (r"/api/tickets/.*attachments", "RATE_LIMITS.TICKET_ATTACHMENT"),
    (r"/api/tickets/", "RATE_LIMITS.TICKET_MUTATION"),
    (r"/api/portal/tickets", "RATE_LIMITS.TICKET_MUTATION"),
    // Search / knowledge
    (r"/api/knowledge/.*search", "RATE_LIMITS.KNOWLEDGE_SEARCH"),
    (r"/api/search/", "RATE_LIMITS.SEARCH"),
    // Workflows
    (r"/api/workflows/execute", "RATE_LIMITS.WORKFLOW_EXECUTE"),
    (r"/api/workflows/", "RATE_LIMITS.WORKFLOW_MUTATION"),
    // Analytics
    (r"/api/analytics/", "RATE_LIMITS.ANALYTICS"),
    // Admin
    (r"/api/admin/.*users", "RATE_LIMITS.ADMIN_USER"),
    (r"/api/admin/", "RATE_LIMITS.ADMIN_MUTATION"),
];

impl PolicySelector {
    /// Build the standard selector.
    ///
    /// Patterns are compiled once here; they are literals vetted by the unit
    /// tests below, so compilation cannot fail at runtime.
    pub fn standard() -> Self {
        let rules = STANDARD_RULES
            .iter()
            .map(|&(pattern, policy)| PolicyRule {
                pattern: Regex::new(pattern).expect("built-in policy pattern is valid"),
                policy,
            })
            .collect();
        Self { rules }
    }

    /// Build a selector from an explicit rule list (order is significant).
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Return the policy token for the first rule matching `route_path`,
    /// or [`DEFAULT_POLICY`] if none matches.
    pub fn select(&self, route_path: &str) -> &'static str {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(route_path))
            .map(|rule| rule.policy)
            .unwrap_or(DEFAULT_POLICY)
    }
}
