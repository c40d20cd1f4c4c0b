//! Per-product redemption policies.
//!
//! Each supported product plugs in three things: the context tag that
//! routes verification calls to the right backend integration, an identity
//! acceptance rule, and a detail formatter for the success notification.
//! Policies are stateless singletons selected by the `Product` enum key.

use cdk_types::Identity;
use serde::{Deserialize, Serialize};

/// Display language for detail lines, passed in explicitly by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

/// Outcome of a policy check against a verified identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The identity may redeem.
    Accept,
    /// The identity may not redeem; carries the reason key.
    Reject {
        /// Reason key surfaced through the notification sink.
        reason: String,
    },
}

impl PolicyDecision {
    fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: reason.into(),
        }
    }
}

/// Product-specific rules, pure and stateless.
pub trait ProductPolicy: Send + Sync {
    /// Opaque context tag routing verification calls to the right backend.
    fn context(&self) -> &'static str;

    /// Decides whether a verified identity is eligible to redeem.
    fn validate(&self, identity: &Identity) -> PolicyDecision;

    /// Formats identity detail lines for the success notification.
    ///
    /// Deterministic and never empty: the first line is always the subject
    /// identifier, even when no specialized fields apply.
    fn details(&self, identity: &Identity, language: Language) -> Vec<String> {
        let _ = language;
        vec![identity.subject.clone()]
    }

    /// Whether this product is a mock/demo integration. Only affects
    /// whether a successful redemption clears the inputs.
    fn is_mock(&self) -> bool {
        false
    }
}

/// The supported products. Selects the policy singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Discord,
    ChatGpt,
    /// Demo integration; redemptions keep inputs for repeated testing.
    Sandbox,
}

impl Product {
    /// Returns the policy singleton for this product.
    #[must_use]
    pub fn policy(&self) -> &'static dyn ProductPolicy {
        match self {
            Self::Discord => &DiscordPolicy,
            Self::ChatGpt => &ChatGptPolicy,
            Self::Sandbox => &SandboxPolicy,
        }
    }
}

fn label(language: Language, en: &str, zh: &str) -> String {
    match language {
        Language::En => en.to_string(),
        Language::Zh => zh.to_string(),
    }
}

/// Discord: rejects accounts that already carry Nitro.
struct DiscordPolicy;

impl ProductPolicy for DiscordPolicy {
    fn context(&self) -> &'static str {
        "discord"
    }

    fn validate(&self, identity: &Identity) -> PolicyDecision {
        // premium_type > 0 means an active Nitro subscription; re-redemption
        // is disallowed for those accounts.
        match identity.extra_i64("premium_type") {
            Some(t) if t > 0 => PolicyDecision::reject("tokenIsPremium"),
            _ => PolicyDecision::Accept,
        }
    }

    fn details(&self, identity: &Identity, language: Language) -> Vec<String> {
        let mut lines = vec![identity.subject.clone()];
        if let Some(username) = identity.extra_str("username") {
            lines.push(format!(
                "{}: {username}",
                label(language, "Username", "用户名")
            ));
        }
        if let Some(discriminator) = identity.extra_str("discriminator") {
            lines.push(format!("{}: {discriminator}", label(language, "Tag", "标签")));
        }
        lines
    }
}

/// ChatGPT: rejects accounts that already have a paid plan.
struct ChatGptPolicy;

impl ProductPolicy for ChatGptPolicy {
    fn context(&self) -> &'static str {
        "chatgpt"
    }

    fn validate(&self, identity: &Identity) -> PolicyDecision {
        match identity.extra_str("plan") {
            Some(plan) if plan != "free" => PolicyDecision::reject("accountHasPlan"),
            _ => PolicyDecision::Accept,
        }
    }

    fn details(&self, identity: &Identity, language: Language) -> Vec<String> {
        let mut lines = vec![identity.subject.clone()];
        if let Some(email) = identity.extra_str("email") {
            lines.push(format!("{}: {email}", label(language, "Email", "邮箱")));
        }
        if let Some(plan) = identity.extra_str("plan") {
            lines.push(format!("{}: {plan}", label(language, "Plan", "套餐")));
        }
        lines
    }
}

/// Sandbox: accepts everything; marked mock so inputs survive redemption.
struct SandboxPolicy;

impl ProductPolicy for SandboxPolicy {
    fn context(&self) -> &'static str {
        "sandbox"
    }

    fn validate(&self, _identity: &Identity) -> PolicyDecision {
        PolicyDecision::Accept
    }

    fn is_mock(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn identity(extra: serde_json::Value) -> Identity {
        Identity {
            subject: "subject-1".to_string(),
            verified: true,
            accepted: true,
            extra: serde_json::from_value::<HashMap<_, _>>(extra).unwrap(),
        }
    }

    #[test]
    fn discord_rejects_premium() {
        let policy = Product::Discord.policy();
        let decision = policy.validate(&identity(serde_json::json!({"premium_type": 1})));
        assert_eq!(
            decision,
            PolicyDecision::Reject {
                reason: "tokenIsPremium".to_string()
            }
        );
    }

    #[test]
    fn discord_accepts_non_premium() {
        let policy = Product::Discord.policy();
        assert_eq!(
            policy.validate(&identity(serde_json::json!({"premium_type": 0}))),
            PolicyDecision::Accept
        );
        assert_eq!(
            policy.validate(&identity(serde_json::json!({}))),
            PolicyDecision::Accept
        );
    }

    #[test]
    fn chatgpt_rejects_paid_plan() {
        let policy = Product::ChatGpt.policy();
        assert!(matches!(
            policy.validate(&identity(serde_json::json!({"plan": "plus"}))),
            PolicyDecision::Reject { .. }
        ));
        assert_eq!(
            policy.validate(&identity(serde_json::json!({"plan": "free"}))),
            PolicyDecision::Accept
        );
    }

    #[test]
    fn details_always_start_with_subject() {
        for product in [Product::Discord, Product::ChatGpt, Product::Sandbox] {
            let lines = product
                .policy()
                .details(&identity(serde_json::json!({})), Language::En);
            assert!(!lines.is_empty());
            assert_eq!(lines[0], "subject-1");
        }
    }

    #[test]
    fn discord_details_include_username() {
        let lines = Product::Discord.policy().details(
            &identity(serde_json::json!({"username": "gamer", "discriminator": "0042"})),
            Language::En,
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Username: gamer");
    }

    #[test]
    fn only_sandbox_is_mock() {
        assert!(!Product::Discord.policy().is_mock());
        assert!(!Product::ChatGpt.policy().is_mock());
        assert!(Product::Sandbox.policy().is_mock());
    }
}
