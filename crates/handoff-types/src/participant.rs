//! Participant identity types.
//!
//! A [`Participant`] addresses one conversation endpoint: a channel, a
//! conversation within it, the service URL used to reach it, and optionally the
//! account (user or bot) speaking in that conversation. Participants without an
//! account are aggregation endpoints: conversation-only destinations that stand
//! for the pool of human operators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether an account belongs to an end-user or to a bot instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    User,
    Bot,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::User => write!(f, "user"),
            AccountKind::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(AccountKind::User),
            "bot" => Ok(AccountKind::Bot),
            other => Err(format!("invalid account kind: '{other}'")),
        }
    }
}

/// The account speaking in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub kind: AccountKind,
    /// Channel-assigned account ID.
    pub id: String,
    /// Display name, when the channel provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One addressable conversation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub channel_id: String,
    pub conversation_id: String,
    pub service_url: String,
    /// `None` for aggregation endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<ChannelAccount>,
}

impl Participant {
    /// An end-user in the given conversation.
    pub fn user(
        channel_id: impl Into<String>,
        conversation_id: impl Into<String>,
        service_url: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::with_account(
            channel_id,
            conversation_id,
            service_url,
            AccountKind::User,
            user_id,
        )
    }

    /// A bot instance in the given conversation.
    pub fn bot(
        channel_id: impl Into<String>,
        conversation_id: impl Into<String>,
        service_url: impl Into<String>,
        bot_id: impl Into<String>,
    ) -> Self {
        Self::with_account(
            channel_id,
            conversation_id,
            service_url,
            AccountKind::Bot,
            bot_id,
        )
    }

    /// A conversation-only address with no account attached.
    pub fn endpoint(
        channel_id: impl Into<String>,
        conversation_id: impl Into<String>,
        service_url: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            conversation_id: conversation_id.into(),
            service_url: service_url.into(),
            account: None,
        }
    }

    fn with_account(
        channel_id: impl Into<String>,
        conversation_id: impl Into<String>,
        service_url: impl Into<String>,
        kind: AccountKind,
        id: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            conversation_id: conversation_id.into(),
            service_url: service_url.into(),
            account: Some(ChannelAccount {
                kind,
                id: id.into(),
                name: None,
            }),
        }
    }

    /// Set the account display name. No-op for aggregation endpoints.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(account) = self.account.as_mut() {
            account.name = Some(name.into());
        }
        self
    }

    pub fn account(&self) -> Option<&ChannelAccount> {
        self.account.as_ref()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.id.as_str())
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account.as_ref().and_then(|a| a.name.as_deref())
    }

    pub fn is_bot(&self) -> bool {
        matches!(&self.account, Some(a) if a.kind == AccountKind::Bot)
    }

    pub fn has_account(&self) -> bool {
        self.account.is_some()
    }

    /// See [`is_same_participant`].
    pub fn matches(&self, other: &Participant) -> bool {
        is_same_participant(self, other)
    }

    /// True if both address the same conversation on the same channel and service.
    ///
    /// This is how aggregation endpoints are recognized: they carry no account
    /// to compare, only a conversation address.
    pub fn shares_conversation(&self, other: &Participant) -> bool {
        self.conversation_id == other.conversation_id
            && self.service_url == other.service_url
            && self.channel_id == other.channel_id
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.account {
            Some(account) => write!(
                f,
                "{}:{}@{}/{}",
                account.kind, account.id, self.channel_id, self.conversation_id
            ),
            None => write!(f, "endpoint@{}/{}", self.channel_id, self.conversation_id),
        }
    }
}

/// The single identity rule used across routing.
///
/// Two participants are the same iff both carry an account of the same kind
/// and the account IDs are equal. Channel, conversation, and service URL are
/// deliberately ignored, so the same user ID on two different channels is
/// treated as one participant. Participants without an account never match,
/// not even themselves.
pub fn is_same_participant(a: &Participant, b: &Participant) -> bool {
    match (&a.account, &b.account) {
        (Some(x), Some(y)) => x.kind == y.kind && x.id == y.id,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_participant_ignores_channel_and_service() {
        let a = Participant::user("web", "c1", "https://a.example", "u1");
        let b = Participant::user("teams", "c9", "https://b.example", "u1");
        assert!(is_same_participant(&a, &b));
        assert!(is_same_participant(&b, &a));
    }

    #[test]
    fn test_same_participant_is_reflexive_for_accounts() {
        let user = Participant::user("web", "c1", "https://a.example", "u1");
        let bot = Participant::bot("web", "c1", "https://a.example", "b1");
        assert!(user.matches(&user));
        assert!(bot.matches(&bot));
    }

    #[test]
    fn test_same_participant_requires_same_kind() {
        let user = Participant::user("web", "c1", "https://a.example", "x");
        let bot = Participant::bot("web", "c1", "https://a.example", "x");
        assert!(!is_same_participant(&user, &bot));
        assert!(!is_same_participant(&bot, &user));
    }

    #[test]
    fn test_same_participant_different_ids() {
        let a = Participant::user("web", "c1", "https://a.example", "u1");
        let b = Participant::user("web", "c1", "https://a.example", "u2");
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_endpoints_never_match() {
        let e = Participant::endpoint("web", "ops", "https://a.example");
        assert!(!e.matches(&e));
        assert!(!e.matches(&Participant::user("web", "ops", "https://a.example", "u1")));
    }

    #[test]
    fn test_shares_conversation() {
        let e = Participant::endpoint("web", "ops", "https://a.example");
        let agent = Participant::user("web", "ops", "https://a.example", "agent7");
        let other = Participant::user("web", "ops", "https://b.example", "agent7");
        assert!(e.shares_conversation(&agent));
        assert!(!e.shares_conversation(&other));
    }

    #[test]
    fn test_named_sets_account_name() {
        let bot = Participant::bot("web", "c1", "https://a.example", "b1").named("Helper");
        assert_eq!(bot.account_name(), Some("Helper"));
        assert!(bot.is_bot());

        let endpoint = Participant::endpoint("web", "ops", "https://a.example").named("ignored");
        assert_eq!(endpoint.account_name(), None);
        assert!(!endpoint.has_account());
    }

    #[test]
    fn test_account_kind_from_str() {
        assert_eq!("user".parse::<AccountKind>().unwrap(), AccountKind::User);
        assert_eq!("bot".parse::<AccountKind>().unwrap(), AccountKind::Bot);
        assert!("operator".parse::<AccountKind>().is_err());
    }

    #[test]
    fn test_participant_serde_omits_missing_account() {
        let e = Participant::endpoint("web", "ops", "https://a.example");
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("account"));

        let u = Participant::user("web", "c1", "https://a.example", "u1");
        let json = serde_json::to_string(&u).unwrap();
        assert!(json.contains("\"kind\":\"user\""));
        let parsed: Participant = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, u);
    }

    #[test]
    fn test_display() {
        let u = Participant::user("web", "c1", "https://a.example", "u1");
        assert_eq!(u.to_string(), "user:u1@web/c1");
        let e = Participant::endpoint("web", "ops", "https://a.example");
        assert_eq!(e.to_string(), "endpoint@web/ops");
    }
}
