//! Criteria search over participant pools.
//!
//! Every supplied criterion must match (AND filter, case-sensitive exact
//! comparison). Blank strings count as "not supplied".

use handoff_types::error::RoutingError;
use handoff_types::participant::Participant;

/// Filter for [`find_by_criteria`]. At least one of the string criteria must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub channel_id: Option<String>,
    pub conversation_id: Option<String>,
    /// Matches the account ID regardless of whether it is a user or a bot.
    pub account_id: Option<String>,
    pub bots_only: bool,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn bots_only(mut self) -> Self {
        self.bots_only = true;
        self
    }

    /// True if no string criterion is set; `bots_only` alone is not a criterion.
    pub fn is_empty(&self) -> bool {
        supplied(&self.channel_id).is_none()
            && supplied(&self.conversation_id).is_none()
            && supplied(&self.account_id).is_none()
    }

    pub fn matches(&self, participant: &Participant) -> bool {
        if self.bots_only && !participant.is_bot() {
            return false;
        }

        if let Some(channel_id) = supplied(&self.channel_id) {
            if participant.channel_id != channel_id {
                return false;
            }
        }

        if let Some(conversation_id) = supplied(&self.conversation_id) {
            if participant.conversation_id != conversation_id {
                return false;
            }
        }

        if let Some(account_id) = supplied(&self.account_id) {
            if participant.account_id() != Some(account_id) {
                return false;
            }
        }

        true
    }
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Return every participant in `pool` matching `criteria`, in pool order.
pub fn find_by_criteria(
    pool: &[Participant],
    criteria: &SearchCriteria,
) -> Result<Vec<Participant>, RoutingError> {
    if criteria.is_empty() {
        return Err(RoutingError::InvalidArgument(
            "at least one search criterion must be defined".to_string(),
        ));
    }

    Ok(pool
        .iter()
        .filter(|p| criteria.matches(p))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<Participant> {
        vec![
            Participant::user("web", "c1", "https://relay.example", "u1"),
            Participant::bot("web", "c1", "https://relay.example", "b1"),
            Participant::user("teams", "c2", "https://relay.example", "u2"),
            Participant::endpoint("web", "ops", "https://relay.example"),
        ]
    }

    #[test]
    fn test_empty_criteria_rejected() {
        let err = find_by_criteria(&pool(), &SearchCriteria::new()).unwrap_err();
        assert!(matches!(err, RoutingError::InvalidArgument(_)));

        let bots_only = SearchCriteria::new().bots_only();
        assert!(find_by_criteria(&pool(), &bots_only).is_err());

        let blank = SearchCriteria::new().channel("  ");
        assert!(find_by_criteria(&pool(), &blank).is_err());
    }

    #[test]
    fn test_channel_and_conversation_are_anded() {
        let criteria = SearchCriteria::new().channel("web").conversation("c1");
        let found = find_by_criteria(&pool(), &criteria).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].account_id(), Some("u1"));
        assert_eq!(found[1].account_id(), Some("b1"));
    }

    #[test]
    fn test_bots_only_filters_users() {
        let criteria = SearchCriteria::new().channel("web").bots_only();
        let found = find_by_criteria(&pool(), &criteria).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].is_bot());
    }

    #[test]
    fn test_account_id_excludes_endpoints() {
        let criteria = SearchCriteria::new().account("u2");
        let found = find_by_criteria(&pool(), &criteria).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].channel_id, "teams");

        let none = SearchCriteria::new().channel("web").account("missing");
        assert!(find_by_criteria(&pool(), &none).unwrap().is_empty());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let criteria = SearchCriteria::new().channel("WEB");
        assert!(find_by_criteria(&pool(), &criteria).unwrap().is_empty());
    }
}
