//! The versioned table of catalogued failures and the outcome type every
//! generator, updater, and the classifier speak.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::command::CommandKind;

/// Catalog revision the generator targets.
pub const CATALOG_VERSION: &str = "v11";

/// The first failing check an instruction trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    PersonMissing,
    FirstPersonMissing,
    SecondPersonMissing,
    DuplicatePerson,
    SelfReference,
    DuplicateRelation,
    RelationNotFound,
    DuplicateTag,
    TagMissing,
    AlreadyInTag,
    NotInTag,
    NoAcquaintance,
    DuplicateAccount,
    AccountMissing,
    DeleteAccountDenied,
    DuplicateArticle,
    ContributeDenied,
    ArticleNotInAccount,
    DeleteArticleDenied,
    AlreadyFollower,
    PathNotFound,
    DuplicateMessage,
    EmojiMissing,
    ArticleNotInNetwork,
    ArticleNotReceived,
    MessageMissing,
    DuplicateEmoji,
}

impl FailureKind {
    /// Name of the exception the target raises for this failure.
    #[must_use]
    pub const fn exception(self) -> &'static str {
        match self {
            Self::PersonMissing
            | Self::FirstPersonMissing
            | Self::SecondPersonMissing
            | Self::NotInTag => "PersonIdNotFoundException",
            Self::DuplicatePerson | Self::SelfReference | Self::AlreadyInTag | Self::AlreadyFollower => {
                "EqualPersonIdException"
            }
            Self::DuplicateRelation => "EqualRelationException",
            Self::RelationNotFound => "RelationNotFoundException",
            Self::DuplicateTag => "EqualTagIdException",
            Self::TagMissing => "TagIdNotFoundException",
            Self::NoAcquaintance => "AcquaintanceNotFoundException",
            Self::DuplicateAccount => "EqualOfficialAccountIdException",
            Self::AccountMissing => "OfficialAccountIdNotFoundException",
            Self::DeleteAccountDenied => "DeleteOfficialAccountPermissionDeniedException",
            Self::DuplicateArticle => "EqualArticleIdException",
            Self::ContributeDenied => "ContributePermissionDeniedException",
            Self::ArticleNotInAccount | Self::ArticleNotInNetwork | Self::ArticleNotReceived => {
                "ArticleIdNotFoundException"
            }
            Self::DeleteArticleDenied => "DeleteArticlePermissionDeniedException",
            Self::PathNotFound => "PathNotFoundException",
            Self::DuplicateMessage => "EqualMessageIdException",
            Self::EmojiMissing => "EmojiIdNotFoundException",
            Self::MessageMissing => "MessageIdNotFoundException",
            Self::DuplicateEmoji => "EqualEmojiIdException",
        }
    }

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::PersonMissing => "person-missing",
            Self::FirstPersonMissing => "first-person-missing",
            Self::SecondPersonMissing => "second-person-missing",
            Self::DuplicatePerson => "duplicate-person",
            Self::SelfReference => "self-reference",
            Self::DuplicateRelation => "duplicate-relation",
            Self::RelationNotFound => "relation-not-found",
            Self::DuplicateTag => "duplicate-tag",
            Self::TagMissing => "tag-missing",
            Self::AlreadyInTag => "already-in-tag",
            Self::NotInTag => "not-in-tag",
            Self::NoAcquaintance => "no-acquaintance",
            Self::DuplicateAccount => "duplicate-account",
            Self::AccountMissing => "account-missing",
            Self::DeleteAccountDenied => "delete-account-denied",
            Self::DuplicateArticle => "duplicate-article",
            Self::ContributeDenied => "contribute-denied",
            Self::ArticleNotInAccount => "article-not-in-account",
            Self::DeleteArticleDenied => "delete-article-denied",
            Self::AlreadyFollower => "already-follower",
            Self::PathNotFound => "path-not-found",
            Self::DuplicateMessage => "duplicate-message",
            Self::EmojiMissing => "emoji-missing",
            Self::ArticleNotInNetwork => "article-not-in-network",
            Self::ArticleNotReceived => "article-not-received",
            Self::MessageMissing => "message-missing",
            Self::DuplicateEmoji => "duplicate-emoji",
        }
    }
}

/// One catalogued failure of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FailureKey {
    pub command: CommandKind,
    pub kind: FailureKind,
}

impl FailureKey {
    #[must_use]
    pub const fn new(command: CommandKind, kind: FailureKind) -> Self {
        Self { command, kind }
    }

    #[must_use]
    pub const fn exception(self) -> &'static str {
        self.kind.exception()
    }

    /// Position in [`CATALOG`], `None` for pairs the catalog does not list.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        CATALOG.iter().position(|k| *k == self)
    }

    #[must_use]
    pub fn is_catalogued(self) -> bool {
        self.index().is_some()
    }
}

impl fmt::Display for FailureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.command.alias(), self.kind.slug())
    }
}

impl Serialize for FailureKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What an instruction does when the target executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Normal,
    Failure(FailureKey),
}

impl Outcome {
    #[must_use]
    pub const fn failure(command: CommandKind, kind: FailureKind) -> Self {
        Self::Failure(FailureKey::new(command, kind))
    }

    #[must_use]
    pub const fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Failure(key) => write!(f, "{key} ({})", key.exception()),
        }
    }
}

macro_rules! catalog {
    ($($cmd:ident => [$($kind:ident),+ $(,)?]),+ $(,)?) => {
        &[$($(FailureKey::new(CommandKind::$cmd, FailureKind::$kind),)+)+]
    };
}

/// Every catalogued failure, grouped by command in wire order.
pub const CATALOG: &[FailureKey] = catalog! {
    AddPerson => [DuplicatePerson],
    AddRelation => [FirstPersonMissing, SecondPersonMissing, DuplicateRelation],
    ModifyRelation => [FirstPersonMissing, SecondPersonMissing, SelfReference, RelationNotFound],
    AddTag => [PersonMissing, DuplicateTag],
    DelTag => [PersonMissing, TagMissing],
    AddToTag => [
        FirstPersonMissing,
        SecondPersonMissing,
        SelfReference,
        RelationNotFound,
        TagMissing,
        AlreadyInTag,
    ],
    DelFromTag => [FirstPersonMissing, SecondPersonMissing, TagMissing, NotInTag],
    QueryValue => [FirstPersonMissing, SecondPersonMissing, RelationNotFound],
    QueryCircle => [FirstPersonMissing, SecondPersonMissing],
    QueryTagAgeVar => [PersonMissing, TagMissing],
    QueryTagValueSum => [PersonMissing, TagMissing],
    QueryBestAcquaintance => [PersonMissing, NoAcquaintance],
    CreateAccount => [PersonMissing, DuplicateAccount],
    DeleteAccount => [PersonMissing, AccountMissing, DeleteAccountDenied],
    ContributeArticle => [PersonMissing, AccountMissing, DuplicateArticle, ContributeDenied],
    DeleteArticle => [PersonMissing, AccountMissing, ArticleNotInAccount, DeleteArticleDenied],
    FollowAccount => [PersonMissing, AccountMissing, AlreadyFollower],
    QueryShortestPath => [FirstPersonMissing, SecondPersonMissing, PathNotFound],
    QueryBestContributor => [AccountMissing],
    QueryReceivedArticles => [PersonMissing],
    AddMessage => [DuplicateMessage, SelfReference],
    AddRedEnvelopeMessage => [DuplicateMessage, SelfReference],
    AddForwardMessage => [DuplicateMessage, ArticleNotInNetwork, ArticleNotReceived, SelfReference],
    AddEmojiMessage => [DuplicateMessage, EmojiMissing, SelfReference],
    SendMessage => [MessageMissing, RelationNotFound, TagMissing],
    QuerySocialValue => [PersonMissing],
    QueryReceivedMessages => [PersonMissing],
    StoreEmojiId => [DuplicateEmoji],
    QueryPopularity => [EmojiMissing],
    QueryMoney => [PersonMissing],
};

/// Catalogued failures of one command, in catalog order.
pub fn failures_of(command: CommandKind) -> impl Iterator<Item = FailureKey> {
    CATALOG.iter().copied().filter(move |k| k.command == command)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn catalog_has_seventy_three_distinct_keys() {
        let unique: BTreeSet<_> = CATALOG.iter().collect();
        assert_eq!(CATALOG.len(), 73);
        assert_eq!(unique.len(), CATALOG.len());
    }

    #[test]
    fn commands_without_failures() {
        for kind in [
            CommandKind::LoadNetwork,
            CommandKind::QueryTripleSum,
            CommandKind::QueryCoupleSum,
            CommandKind::DeleteColdEmoji,
        ] {
            assert_eq!(failures_of(kind).count(), 0, "{kind}");
        }
    }

    #[test]
    fn several_keys_share_one_exception() {
        let names: Vec<_> = failures_of(CommandKind::AddToTag)
            .map(FailureKey::exception)
            .collect();
        assert_eq!(
            names.iter().filter(|n| **n == "EqualPersonIdException").count(),
            2
        );
    }

    #[test]
    fn key_renders_alias_and_slug() {
        let key = FailureKey::new(CommandKind::QueryValue, FailureKind::RelationNotFound);
        assert_eq!(key.to_string(), "qv:relation-not-found");
        assert_eq!(
            Outcome::Failure(key).to_string(),
            "qv:relation-not-found (RelationNotFoundException)"
        );
        assert!(key.is_catalogued());
        assert!(!FailureKey::new(CommandKind::QueryValue, FailureKind::DuplicateEmoji).is_catalogued());
    }
}
