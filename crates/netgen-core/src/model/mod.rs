//! Mirror of the target system's visible state.
//!
//! The [`Network`] holds nothing but data plus the bookkeeping needed to keep
//! it self-consistent (symmetric relations, tag cascades, the triple count).
//! Deciding *which* mutation an instruction implies lives in
//! [`crate::update`]; deciding what an instruction would produce lives in
//! [`crate::classify`].

mod entities;
mod mutate;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub use entities::{
    ACCOUNT_POOL, ARTICLE_POOL, Account, AccountId, Article, ArticleId, Audience, EMOJI_POOL,
    EmojiId, IdPool, MESSAGE_HISTORY, MESSAGE_POOL, Message, MessageBody, MessageId, PERSON_POOL,
    Person, PersonId, TAG_CAPACITY, TAG_POOL, Tag, TagId,
};

/// Canonical key of an undirected relation.
#[must_use]
pub const fn relation_key(a: PersonId, b: PersonId) -> (PersonId, PersonId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// The whole mirrored state of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    persons: BTreeMap<PersonId, Person>,
    relations: BTreeMap<(PersonId, PersonId), i32>,
    tags: BTreeMap<(PersonId, TagId), Tag>,
    accounts: BTreeMap<AccountId, Account>,
    articles: BTreeMap<ArticleId, Article>,
    messages: BTreeMap<MessageId, Message>,
    used_message_ids: BTreeSet<MessageId>,
    emoji: BTreeMap<EmojiId, u64>,
    triple_count: u64,
}

/// Which kinds of state currently exist. Drives selector pruning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Feasibility {
    pub persons: usize,
    pub relations: usize,
    pub owned_tags: usize,
    pub populated_tags: usize,
    pub accounts: usize,
    pub account_articles: usize,
    pub pending_messages: usize,
    pub emoji: usize,
    pub forwardable_articles: usize,
}

impl Network {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Persons ──────────────────────────────────────────────────────────────

    #[must_use]
    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    #[must_use]
    pub fn contains_person(&self, id: PersonId) -> bool {
        self.persons.contains_key(&id)
    }

    #[must_use]
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.get(&id)
    }

    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    #[must_use]
    pub fn person_ids(&self) -> Vec<PersonId> {
        self.persons.keys().copied().collect()
    }

    /// Persons with at least one acquaintance.
    #[must_use]
    pub fn connected_person_ids(&self) -> Vec<PersonId> {
        self.persons
            .values()
            .filter(|p| !p.acquaintances.is_empty())
            .map(|p| p.id)
            .collect()
    }

    /// Persons without any acquaintance.
    #[must_use]
    pub fn isolated_person_ids(&self) -> Vec<PersonId> {
        self.persons
            .values()
            .filter(|p| p.acquaintances.is_empty())
            .map(|p| p.id)
            .collect()
    }

    // ── Relations ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn relation(&self, a: PersonId, b: PersonId) -> Option<i32> {
        self.relations.get(&relation_key(a, b)).copied()
    }

    /// Linked in the target's sense: a person is always linked to itself.
    #[must_use]
    pub fn is_linked(&self, a: PersonId, b: PersonId) -> bool {
        (a == b && self.contains_person(a)) || self.relation(a, b).is_some()
    }

    pub fn relations(&self) -> impl Iterator<Item = ((PersonId, PersonId), i32)> + '_ {
        self.relations.iter().map(|(k, v)| (*k, *v))
    }

    #[must_use]
    pub fn triple_count(&self) -> u64 {
        self.triple_count
    }

    /// Number of acquaintances `a` and `b` share.
    #[must_use]
    pub fn common_acquaintances(&self, a: PersonId, b: PersonId) -> usize {
        let (Some(pa), Some(pb)) = (self.persons.get(&a), self.persons.get(&b)) else {
            return 0;
        };
        let (small, large) = if pa.acquaintances.len() <= pb.acquaintances.len() {
            (pa, pb)
        } else {
            (pb, pa)
        };
        small
            .acquaintances
            .keys()
            .filter(|id| **id != a && **id != b && large.acquaintances.contains_key(id))
            .count()
    }

    /// Fully connected triples, counted from scratch.
    #[must_use]
    pub fn count_triples(&self) -> u64 {
        let mut total = 0_u64;
        for &(a, b) in self.relations.keys() {
            let Some(pa) = self.persons.get(&a) else {
                continue;
            };
            for &c in pa.acquaintances.keys() {
                if c > b && self.relations.contains_key(&relation_key(b, c)) {
                    total += 1;
                }
            }
        }
        total
    }

    /// Every person reachable from `start` through relations, `start` included.
    #[must_use]
    pub fn reachable_from(&self, start: PersonId) -> BTreeSet<PersonId> {
        let mut seen = BTreeSet::new();
        if !self.contains_person(start) {
            return seen;
        }
        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(id) = queue.pop_front() {
            if let Some(person) = self.persons.get(&id) {
                for &next in person.acquaintances.keys() {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    #[must_use]
    pub fn is_reachable(&self, from: PersonId, to: PersonId) -> bool {
        if from == to {
            return self.contains_person(from);
        }
        self.reachable_from(from).contains(&to)
    }

    // ── Tags ─────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn owns_tag(&self, owner: PersonId, tag: TagId) -> bool {
        self.persons
            .get(&owner)
            .is_some_and(|p| p.tags.contains(&tag))
    }

    #[must_use]
    pub fn tag(&self, owner: PersonId, tag: TagId) -> Option<&Tag> {
        self.tags.get(&(owner, tag))
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    #[must_use]
    pub fn tag_has_member(&self, owner: PersonId, tag: TagId, member: PersonId) -> bool {
        self.tag(owner, tag)
            .is_some_and(|t| t.members.contains_key(&member))
    }

    // ── Accounts and articles ────────────────────────────────────────────────

    #[must_use]
    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    #[must_use]
    pub fn contains_account(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    #[must_use]
    pub fn article(&self, id: ArticleId) -> Option<&Article> {
        self.articles.get(&id)
    }

    #[must_use]
    pub fn contains_article(&self, id: ArticleId) -> bool {
        self.articles.contains_key(&id)
    }

    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }

    // ── Messages and emoji ───────────────────────────────────────────────────

    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(&id)
    }

    #[must_use]
    pub fn contains_message(&self, id: MessageId) -> bool {
        self.messages.contains_key(&id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Whether the id was ever taken by a pending message, consumed or not.
    #[must_use]
    pub fn message_id_used(&self, id: MessageId) -> bool {
        self.used_message_ids.contains(&id)
    }

    /// Pending messages whose send would currently succeed.
    #[must_use]
    pub fn sendable_message_ids(&self) -> Vec<MessageId> {
        self.messages
            .values()
            .filter(|m| self.send_would_succeed(m))
            .map(|m| m.id)
            .collect()
    }

    pub(crate) fn send_would_succeed(&self, message: &Message) -> bool {
        match message.audience {
            Audience::Person(receiver) => self.relation(message.sender, receiver).is_some(),
            Audience::Tag(tag) => self.owns_tag(message.sender, tag),
        }
    }

    #[must_use]
    pub fn emoji_heat(&self, id: EmojiId) -> Option<u64> {
        self.emoji.get(&id).copied()
    }

    #[must_use]
    pub fn contains_emoji(&self, id: EmojiId) -> bool {
        self.emoji.contains_key(&id)
    }

    #[must_use]
    pub fn emoji_ids(&self) -> Vec<EmojiId> {
        self.emoji.keys().copied().collect()
    }

    // ── Snapshot ─────────────────────────────────────────────────────────────

    /// Counts of each kind of state the selector cares about.
    #[must_use]
    pub fn feasibility(&self) -> Feasibility {
        let forwardable_articles = self
            .persons
            .values()
            .map(|p| {
                p.received_articles
                    .iter()
                    .filter(|a| self.articles.contains_key(a))
                    .count()
            })
            .sum();
        Feasibility {
            persons: self.persons.len(),
            relations: self.relations.len(),
            owned_tags: self.tags.len(),
            populated_tags: self.tags.values().filter(|t| !t.members.is_empty()).count(),
            accounts: self.accounts.len(),
            account_articles: self.accounts.values().map(|a| a.articles.len()).sum(),
            pending_messages: self.messages.len(),
            emoji: self.emoji.len(),
            forwardable_articles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Network {
        let mut net = Network::new();
        for id in 1..=4 {
            net.insert_person(Person::new(id, format!("p{id}"), 20 + id));
        }
        net.link(1, 2, 5);
        net.link(2, 3, 5);
        net.link(1, 3, 5);
        net
    }

    #[test]
    fn linked_is_symmetric_and_reflexive() {
        let net = triangle();
        assert!(net.is_linked(1, 2));
        assert!(net.is_linked(2, 1));
        assert!(net.is_linked(4, 4));
        assert!(!net.is_linked(1, 4));
        assert!(!net.is_linked(99, 99));
    }

    #[test]
    fn triple_count_tracks_links() {
        let net = triangle();
        assert_eq!(net.triple_count(), 1);
        assert_eq!(net.count_triples(), 1);
    }

    #[test]
    fn reachability_follows_relations() {
        let net = triangle();
        assert!(net.is_reachable(1, 3));
        assert!(!net.is_reachable(1, 4));
        assert!(net.is_reachable(4, 4));
        assert_eq!(net.reachable_from(2).len(), 3);
    }

    #[test]
    fn isolated_and_connected_partition_persons() {
        let net = triangle();
        assert_eq!(net.connected_person_ids(), vec![1, 2, 3]);
        assert_eq!(net.isolated_person_ids(), vec![4]);
    }

    #[test]
    fn feasibility_of_empty_network_is_zero() {
        assert_eq!(Network::new().feasibility(), Feasibility::default());
    }
}
