//! Access gate.
//!
//! Decides, once per page render, whether the current visitor sees the
//! dashboard. The decision is a pure function of the session identity and the
//! configured allow-list. Nothing is cached between renders; a session that was
//! granted earlier is checked again on every request.
//!
//! The email claim is taken from the identity provider as-is. Matching is exact
//! and case-sensitive: `Joao@Example.com` does not match `joao@example.com`.

use crate::config::AccessSettings;
use crate::locale::Locale;

/// What the identity provider told us about the visitor for this render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    pub is_logged_in: bool,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl SessionIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(email: Option<String>, display_name: Option<String>) -> Self {
        Self {
            is_logged_in: true,
            email,
            display_name,
        }
    }
}

/// Ordered set of email addresses allowed past the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    emails: Vec<String>,
}

impl AllowList {
    /// Builds the list from configuration. Surrounding whitespace in configured
    /// entries is dropped and duplicates keep their first position. Claimed
    /// emails are never normalised.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for email in emails {
            let email = email.as_ref().trim();
            if !email.is_empty() && !list.iter().any(|e| e == email) {
                list.push(email.to_string());
            }
        }
        Self { emails: list }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.iter().any(|allowed| allowed == email)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Not logged in: start the provider's login flow.
    Unauthenticated,
    /// Logged in and allow-listed: render the dashboard greeting this name.
    Granted { display_name: String },
    /// Logged in but not allow-listed (or no email claim): show the denial
    /// message and a sign-out control.
    Denied { email: Option<String> },
}

impl GateDecision {
    pub fn outcome(&self) -> &'static str {
        match self {
            GateDecision::Unauthenticated => "unauthenticated",
            GateDecision::Granted { .. } => "granted",
            GateDecision::Denied { .. } => "denied",
        }
    }
}

pub fn decide(identity: &SessionIdentity, allow_list: &AllowList) -> GateDecision {
    if !identity.is_logged_in {
        return GateDecision::Unauthenticated;
    }

    match identity.email.as_deref() {
        Some(email) if allow_list.contains(email) => GateDecision::Granted {
            display_name: identity
                .display_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| email.to_string()),
        },
        email => GateDecision::Denied {
            email: email.map(str::to_owned),
        },
    }
}

/// Immutable access configuration shared by every request.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub allow_list: AllowList,
    pub login_provider: String,
    pub locale: Locale,
}

impl AccessPolicy {
    pub fn from_settings(settings: &AccessSettings) -> Self {
        Self {
            allow_list: AllowList::new(&settings.allowed_emails),
            login_provider: settings.login_provider.clone(),
            locale: settings.locale,
        }
    }

    pub fn decide(&self, identity: &SessionIdentity) -> GateDecision {
        decide(identity, &self.allow_list)
    }
}
