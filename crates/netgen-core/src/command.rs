//! Command kinds, their wire aliases, and the state each needs to be
//! generated at all.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Feasibility;

/// Every command the target understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    LoadNetwork,
    AddPerson,
    AddRelation,
    ModifyRelation,
    AddTag,
    DelTag,
    AddToTag,
    DelFromTag,
    QueryValue,
    QueryCircle,
    QueryTripleSum,
    QueryTagAgeVar,
    QueryTagValueSum,
    QueryBestAcquaintance,
    QueryCoupleSum,
    QueryShortestPath,
    CreateAccount,
    DeleteAccount,
    ContributeArticle,
    DeleteArticle,
    FollowAccount,
    QueryBestContributor,
    QueryReceivedArticles,
    AddMessage,
    AddRedEnvelopeMessage,
    AddForwardMessage,
    AddEmojiMessage,
    SendMessage,
    QuerySocialValue,
    QueryReceivedMessages,
    StoreEmojiId,
    QueryPopularity,
    DeleteColdEmoji,
    QueryMoney,
}

/// Coarse grouping the selector scales weights by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Build,
    Mutate,
    Message,
    Query,
}

/// A piece of state a command needs before its generator can produce
/// anything useful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Persons,
    TwoPersons,
    Relations,
    OwnedTags,
    TagMembers,
    Accounts,
    Articles,
    PendingMessages,
    Emoji,
    ForwardableArticles,
}

impl Requirement {
    #[must_use]
    pub const fn is_met(self, f: &Feasibility) -> bool {
        match self {
            Self::Persons => f.persons >= 1,
            Self::TwoPersons => f.persons >= 2,
            Self::Relations => f.relations >= 1,
            Self::OwnedTags => f.owned_tags >= 1,
            Self::TagMembers => f.populated_tags >= 1,
            Self::Accounts => f.accounts >= 1,
            Self::Articles => f.account_articles >= 1,
            Self::PendingMessages => f.pending_messages >= 1,
            Self::Emoji => f.emoji >= 1,
            Self::ForwardableArticles => f.forwardable_articles >= 1,
        }
    }
}

impl CommandKind {
    pub const ALL: [Self; 34] = [
        Self::LoadNetwork,
        Self::AddPerson,
        Self::AddRelation,
        Self::ModifyRelation,
        Self::AddTag,
        Self::DelTag,
        Self::AddToTag,
        Self::DelFromTag,
        Self::QueryValue,
        Self::QueryCircle,
        Self::QueryTripleSum,
        Self::QueryTagAgeVar,
        Self::QueryTagValueSum,
        Self::QueryBestAcquaintance,
        Self::QueryCoupleSum,
        Self::QueryShortestPath,
        Self::CreateAccount,
        Self::DeleteAccount,
        Self::ContributeArticle,
        Self::DeleteArticle,
        Self::FollowAccount,
        Self::QueryBestContributor,
        Self::QueryReceivedArticles,
        Self::AddMessage,
        Self::AddRedEnvelopeMessage,
        Self::AddForwardMessage,
        Self::AddEmojiMessage,
        Self::SendMessage,
        Self::QuerySocialValue,
        Self::QueryReceivedMessages,
        Self::StoreEmojiId,
        Self::QueryPopularity,
        Self::DeleteColdEmoji,
        Self::QueryMoney,
    ];

    /// Kinds the main loop may pick. Bulk load only happens at bootstrap.
    pub fn incremental() -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(|k| *k != Self::LoadNetwork)
    }

    #[must_use]
    pub const fn alias(self) -> &'static str {
        match self {
            Self::LoadNetwork => "ln",
            Self::AddPerson => "ap",
            Self::AddRelation => "ar",
            Self::ModifyRelation => "mr",
            Self::AddTag => "at",
            Self::DelTag => "dt",
            Self::AddToTag => "att",
            Self::DelFromTag => "dft",
            Self::QueryValue => "qv",
            Self::QueryCircle => "qci",
            Self::QueryTripleSum => "qts",
            Self::QueryTagAgeVar => "qtav",
            Self::QueryTagValueSum => "qtvs",
            Self::QueryBestAcquaintance => "qba",
            Self::QueryCoupleSum => "qcs",
            Self::QueryShortestPath => "qsp",
            Self::CreateAccount => "coa",
            Self::DeleteAccount => "doa",
            Self::ContributeArticle => "ca",
            Self::DeleteArticle => "da",
            Self::FollowAccount => "foa",
            Self::QueryBestContributor => "qbc",
            Self::QueryReceivedArticles => "qra",
            Self::AddMessage => "am",
            Self::AddRedEnvelopeMessage => "arem",
            Self::AddForwardMessage => "afm",
            Self::AddEmojiMessage => "aem",
            Self::SendMessage => "sm",
            Self::QuerySocialValue => "qsv",
            Self::QueryReceivedMessages => "qrm",
            Self::StoreEmojiId => "sei",
            Self::QueryPopularity => "qp",
            Self::DeleteColdEmoji => "dce",
            Self::QueryMoney => "qm",
        }
    }

    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.alias() == alias)
    }

    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::LoadNetwork
            | Self::AddPerson
            | Self::AddRelation
            | Self::AddTag
            | Self::AddToTag
            | Self::CreateAccount
            | Self::FollowAccount
            | Self::StoreEmojiId => Category::Build,
            Self::ModifyRelation
            | Self::DelTag
            | Self::DelFromTag
            | Self::DeleteAccount
            | Self::ContributeArticle
            | Self::DeleteArticle
            | Self::DeleteColdEmoji => Category::Mutate,
            Self::AddMessage
            | Self::AddRedEnvelopeMessage
            | Self::AddForwardMessage
            | Self::AddEmojiMessage
            | Self::SendMessage => Category::Message,
            Self::QueryValue
            | Self::QueryCircle
            | Self::QueryTripleSum
            | Self::QueryTagAgeVar
            | Self::QueryTagValueSum
            | Self::QueryBestAcquaintance
            | Self::QueryCoupleSum
            | Self::QueryShortestPath
            | Self::QueryBestContributor
            | Self::QueryReceivedArticles
            | Self::QuerySocialValue
            | Self::QueryReceivedMessages
            | Self::QueryPopularity
            | Self::QueryMoney => Category::Query,
        }
    }

    /// Whether a normal outcome changes the model.
    #[must_use]
    pub const fn mutates(self) -> bool {
        !matches!(self.category(), Category::Query)
    }

    /// State that must exist before the selector considers this kind.
    #[must_use]
    pub const fn requirements(self) -> &'static [Requirement] {
        use Requirement as R;
        match self {
            Self::LoadNetwork | Self::AddPerson | Self::StoreEmojiId => &[],
            Self::AddRelation => &[R::TwoPersons],
            Self::ModifyRelation | Self::QueryValue | Self::QueryBestAcquaintance => {
                &[R::Relations]
            }
            Self::AddTag
            | Self::QueryCircle
            | Self::QueryTripleSum
            | Self::QueryCoupleSum
            | Self::QueryShortestPath
            | Self::QueryReceivedArticles
            | Self::CreateAccount
            | Self::QuerySocialValue
            | Self::QueryReceivedMessages
            | Self::QueryMoney
            | Self::AddMessage
            | Self::AddRedEnvelopeMessage => &[R::Persons],
            Self::DelTag | Self::QueryTagAgeVar | Self::QueryTagValueSum => &[R::OwnedTags],
            Self::AddToTag => &[R::Relations, R::OwnedTags],
            Self::DelFromTag => &[R::TagMembers],
            Self::DeleteAccount
            | Self::FollowAccount
            | Self::QueryBestContributor
            | Self::ContributeArticle => &[R::Accounts],
            Self::DeleteArticle => &[R::Articles],
            Self::SendMessage => &[R::PendingMessages],
            Self::AddForwardMessage => &[R::ForwardableArticles],
            Self::AddEmojiMessage | Self::QueryPopularity | Self::DeleteColdEmoji => &[R::Emoji],
        }
    }

    #[must_use]
    pub fn is_feasible(self, f: &Feasibility) -> bool {
        self.requirements().iter().all(|r| r.is_met(f))
    }

    /// Relative frequency before phase scaling.
    #[must_use]
    pub const fn base_weight(self) -> u32 {
        match self {
            Self::LoadNetwork => 0,
            Self::AddPerson | Self::AddRelation | Self::AddMessage => 10,
            Self::SendMessage => 12,
            Self::AddRedEnvelopeMessage | Self::AddForwardMessage | Self::AddEmojiMessage => 9,
            Self::ModifyRelation | Self::ContributeArticle => 8,
            Self::AddTag | Self::AddToTag | Self::QueryShortestPath | Self::CreateAccount => 7,
            Self::FollowAccount | Self::StoreEmojiId => 6,
            Self::QueryValue
            | Self::QueryCircle
            | Self::QueryTagAgeVar
            | Self::QueryTagValueSum
            | Self::QueryBestAcquaintance
            | Self::DeleteArticle
            | Self::QuerySocialValue
            | Self::QueryReceivedMessages
            | Self::QueryPopularity
            | Self::QueryMoney => 5,
            Self::DelTag
            | Self::DelFromTag
            | Self::DeleteAccount
            | Self::QueryBestContributor
            | Self::QueryReceivedArticles => 4,
            Self::QueryCoupleSum | Self::DeleteColdEmoji => 3,
            Self::QueryTripleSum => 2,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// Error returned when an alias names no command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command alias '{0}'")]
pub struct UnknownAlias(pub String);

impl FromStr for CommandKind {
    type Err = UnknownAlias;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_alias(s).ok_or_else(|| UnknownAlias(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_unique_and_round_trip() {
        let mut seen = std::collections::BTreeSet::new();
        for kind in CommandKind::ALL {
            assert!(seen.insert(kind.alias()), "duplicate alias {}", kind.alias());
            assert_eq!(kind.alias().parse::<CommandKind>(), Ok(kind));
        }
        assert!("zz".parse::<CommandKind>().is_err());
    }

    #[test]
    fn load_network_is_not_incremental() {
        assert_eq!(CommandKind::incremental().count(), 33);
        assert!(CommandKind::incremental().all(|k| k.base_weight() > 0));
    }

    #[test]
    fn empty_network_only_allows_unconditional_kinds() {
        let f = Feasibility::default();
        let feasible: Vec<_> = CommandKind::incremental()
            .filter(|k| k.is_feasible(&f))
            .collect();
        assert_eq!(
            feasible,
            vec![CommandKind::AddPerson, CommandKind::StoreEmojiId]
        );
    }

    #[test]
    fn queries_do_not_mutate() {
        assert!(!CommandKind::QueryMoney.mutates());
        assert!(CommandKind::SendMessage.mutates());
    }
}
