use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

pub type PersonId = i32;
pub type TagId = i32;
pub type AccountId = i32;
pub type ArticleId = i32;
pub type MessageId = i32;
pub type EmojiId = i32;

/// Most recent received messages a person keeps.
pub const MESSAGE_HISTORY: usize = 5;

/// Members a single tag accepts before further adds become no-ops.
pub const TAG_CAPACITY: usize = 999;

/// Inclusive id range commands draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPool {
    pub lo: i32,
    pub hi: i32,
}

impl IdPool {
    #[must_use]
    pub const fn new(lo: i32, hi: i32) -> Self {
        Self { lo, hi }
    }

    #[must_use]
    pub const fn contains(self, id: i32) -> bool {
        id >= self.lo && id <= self.hi
    }

    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn len(self) -> usize {
        (self.hi - self.lo + 1) as usize
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.hi < self.lo
    }

    pub fn iter(self) -> impl Iterator<Item = i32> {
        self.lo..=self.hi
    }
}

pub const PERSON_POOL: IdPool = IdPool::new(-150, 150);
pub const TAG_POOL: IdPool = IdPool::new(-150, 150);
pub const ACCOUNT_POOL: IdPool = IdPool::new(-150, 150);
pub const ARTICLE_POOL: IdPool = IdPool::new(-150, 150);
pub const MESSAGE_POOL: IdPool = IdPool::new(-2000, 2000);
pub const EMOJI_POOL: IdPool = IdPool::new(-1000, 1000);

/// A person as the target system sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub age: i32,
    /// Acquaintance id to relation value. Mirrors the relation index.
    pub acquaintances: BTreeMap<PersonId, i32>,
    /// Tag ids this person owns.
    pub tags: BTreeSet<TagId>,
    pub social_value: i64,
    pub money: i64,
    /// Newest first.
    pub received_articles: VecDeque<ArticleId>,
    /// Newest first, at most [`MESSAGE_HISTORY`] entries.
    pub received_messages: VecDeque<MessageId>,
}

impl Person {
    #[must_use]
    pub fn new(id: PersonId, name: impl Into<String>, age: i32) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            acquaintances: BTreeMap::new(),
            tags: BTreeSet::new(),
            social_value: 0,
            money: 0,
            received_articles: VecDeque::new(),
            received_messages: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn has_received_article(&self, article: ArticleId) -> bool {
        self.received_articles.contains(&article)
    }
}

/// Membership table of one tag, keyed by its owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub owner: PersonId,
    pub id: TagId,
    /// Member id to member age.
    pub members: BTreeMap<PersonId, i32>,
}

impl Tag {
    #[must_use]
    pub const fn new(owner: PersonId, id: TagId) -> Self {
        Self {
            owner,
            id,
            members: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= TAG_CAPACITY
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub owner: PersonId,
    pub name: String,
    /// Follower id to number of articles that follower contributed.
    pub followers: BTreeMap<PersonId, u32>,
    pub articles: BTreeSet<ArticleId>,
}

impl Account {
    #[must_use]
    pub fn new(id: AccountId, owner: PersonId, name: impl Into<String>) -> Self {
        let mut followers = BTreeMap::new();
        followers.insert(owner, 0);
        Self {
            id,
            owner,
            name: name.into(),
            followers,
            articles: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Article {
    pub id: ArticleId,
    pub contributor: PersonId,
    /// `None` once the owning account has been deleted.
    pub account: Option<AccountId>,
}

/// What a message carries. Each variant maps to its own add command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    Ordinary { social_value: i32 },
    Emoji { emoji: EmojiId },
    RedEnvelope { money: i32 },
    Forward { article: ArticleId },
}

impl MessageBody {
    /// Social value credited on delivery, computed in `i64` so any `i32`
    /// argument fits.
    #[must_use]
    pub fn social_value(self) -> i64 {
        match self {
            Self::Ordinary { social_value } => i64::from(social_value),
            Self::Emoji { emoji } => i64::from(emoji),
            Self::RedEnvelope { money } => i64::from(money) * 5,
            Self::Forward { article } => i64::from(article).abs() % 200,
        }
    }

    /// The fifth token of the add instruction.
    #[must_use]
    pub const fn argument(self) -> i32 {
        match self {
            Self::Ordinary { social_value } => social_value,
            Self::Emoji { emoji } => emoji,
            Self::RedEnvelope { money } => money,
            Self::Forward { article } => article,
        }
    }
}

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Audience {
    Person(PersonId),
    Tag(TagId),
}

impl Audience {
    /// Wire type flag: 0 point-to-point, 1 tag broadcast.
    #[must_use]
    pub const fn type_flag(self) -> u8 {
        match self {
            Self::Person(_) => 0,
            Self::Tag(_) => 1,
        }
    }

    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Person(id) | Self::Tag(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub body: MessageBody,
    pub sender: PersonId,
    pub audience: Audience,
}

impl Message {
    #[must_use]
    pub fn social_value(&self) -> i64 {
        self.body.social_value()
    }
}
