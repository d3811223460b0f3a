//! Structural invariants of a [`Network`].
//!
//! The updaters maintain these by construction; the oracle exists to catch a
//! broken updater early, either per step (`check_invariants`) or after a
//! replay.

use serde::Serialize;

use crate::model::{Audience, MESSAGE_HISTORY, MessageBody, Network, TAG_CAPACITY};

// ── Core result types ────────────────────────────────────────────────────────

/// Outcome of one or more invariant checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    #[must_use]
    fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    #[must_use]
    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        if violations.is_empty() {
            Self::pass()
        } else {
            Self {
                passed: false,
                violations,
            }
        }
    }

    /// Merge another result into this one (failures accumulate).
    #[must_use]
    fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }
}

// ── Invariant violation diagnostics ─────────────────────────────────────────

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "invariant", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// A relation endpoint is not a known person.
    DanglingRelation { a: i32, b: i32 },

    /// The relation table and a person's acquaintance map disagree.
    ///
    /// `relation` is the table's value, `acquaintance` the value seen from
    /// `person`'s side.
    AsymmetricRelation {
        person: i32,
        other: i32,
        relation: Option<i32>,
        acquaintance: Option<i32>,
    },

    /// Relations only exist while their value is positive.
    NonPositiveRelation { a: i32, b: i32, value: i32 },

    /// A person's tag list does not match the tags they own.
    TagIndex { person: i32, tag: i32 },

    /// A tag member is unknown, is the owner, or is not an acquaintance of
    /// the owner.
    TagMember { owner: i32, tag: i32, member: i32 },

    /// A tag holds more members than the target allows.
    TagOverflow { owner: i32, tag: i32, members: usize },

    /// An account's owner or follower is not a known person.
    DanglingFollower { account: i32, person: i32 },

    /// An account lists an article that does not point back at it.
    ArticleLink { account: i32, article: i32 },

    /// A pending message refers to a missing person or emoji, or its id was
    /// never marked as used.
    PendingMessage { message: i32 },

    /// More than the retained number of received messages.
    MessageHistory { person: i32, len: usize },

    /// The incrementally maintained triple count drifted from a recount.
    TripleCount { tracked: u64, recounted: u64 },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingRelation { a, b } => write!(f, "relation {a}-{b} has a missing endpoint"),
            Self::AsymmetricRelation {
                person,
                other,
                relation,
                acquaintance,
            } => write!(
                f,
                "relation {person}-{other} is {relation:?} but {person} sees {acquaintance:?}"
            ),
            Self::NonPositiveRelation { a, b, value } => {
                write!(f, "relation {a}-{b} has non-positive value {value}")
            }
            Self::TagIndex { person, tag } => {
                write!(f, "tag {tag} of person {person} is out of sync with the tag table")
            }
            Self::TagMember { owner, tag, member } => {
                write!(f, "tag {owner}/{tag} holds invalid member {member}")
            }
            Self::TagOverflow { owner, tag, members } => {
                write!(f, "tag {owner}/{tag} holds {members} members")
            }
            Self::DanglingFollower { account, person } => {
                write!(f, "account {account} references missing person {person}")
            }
            Self::ArticleLink { account, article } => {
                write!(f, "account {account} lists article {article} which does not belong to it")
            }
            Self::PendingMessage { message } => write!(f, "pending message {message} is inconsistent"),
            Self::MessageHistory { person, len } => {
                write!(f, "person {person} retains {len} received messages")
            }
            Self::TripleCount { tracked, recounted } => {
                write!(f, "triple count is {tracked}, recount gives {recounted}")
            }
        }
    }
}

// ── Oracle ───────────────────────────────────────────────────────────────────

/// Run every check.
#[must_use]
pub fn check_all(net: &Network) -> OracleResult {
    check_relations(net)
        .merge(check_tags(net))
        .merge(check_accounts(net))
        .merge(check_messages(net))
        .merge(check_triples(net))
}

/// Relations are symmetric, positive, and between known persons.
#[must_use]
pub fn check_relations(net: &Network) -> OracleResult {
    let mut violations = Vec::new();
    for ((a, b), value) in net.relations() {
        if value <= 0 {
            violations.push(InvariantViolation::NonPositiveRelation { a, b, value });
        }
        for (person, other) in [(a, b), (b, a)] {
            match net.person(person) {
                None => violations.push(InvariantViolation::DanglingRelation { a, b }),
                Some(p) => {
                    let seen = p.acquaintances.get(&other).copied();
                    if seen != Some(value) {
                        violations.push(InvariantViolation::AsymmetricRelation {
                            person,
                            other,
                            relation: Some(value),
                            acquaintance: seen,
                        });
                    }
                }
            }
        }
    }
    for person in net.persons() {
        for (&other, &value) in &person.acquaintances {
            if net.relation(person.id, other).is_none() {
                violations.push(InvariantViolation::AsymmetricRelation {
                    person: person.id,
                    other,
                    relation: None,
                    acquaintance: Some(value),
                });
            }
        }
    }
    OracleResult::from_violations(violations)
}

/// Tags are indexed on their owner and only hold acquaintances of the owner.
#[must_use]
pub fn check_tags(net: &Network) -> OracleResult {
    let mut violations = Vec::new();
    for tag in net.tags() {
        let indexed = net.person(tag.owner).is_some_and(|p| p.tags.contains(&tag.id));
        if !indexed {
            violations.push(InvariantViolation::TagIndex {
                person: tag.owner,
                tag: tag.id,
            });
        }
        if tag.members.len() > TAG_CAPACITY {
            violations.push(InvariantViolation::TagOverflow {
                owner: tag.owner,
                tag: tag.id,
                members: tag.members.len(),
            });
        }
        for &member in tag.members.keys() {
            let valid = member != tag.owner
                && net.contains_person(member)
                && net.relation(tag.owner, member).is_some();
            if !valid {
                violations.push(InvariantViolation::TagMember {
                    owner: tag.owner,
                    tag: tag.id,
                    member,
                });
            }
        }
    }
    for person in net.persons() {
        for &tag in &person.tags {
            if !net.owns_tag(person.id, tag) {
                violations.push(InvariantViolation::TagIndex {
                    person: person.id,
                    tag,
                });
            }
        }
    }
    OracleResult::from_violations(violations)
}

/// Accounts reference known persons; account articles point back at their
/// account.
#[must_use]
pub fn check_accounts(net: &Network) -> OracleResult {
    let mut violations = Vec::new();
    for account in net.accounts() {
        let people = std::iter::once(account.owner).chain(account.followers.keys().copied());
        for person in people {
            if !net.contains_person(person) {
                violations.push(InvariantViolation::DanglingFollower {
                    account: account.id,
                    person,
                });
            }
        }
        for &article in &account.articles {
            let linked = net
                .article(article)
                .is_some_and(|a| a.account == Some(account.id));
            if !linked {
                violations.push(InvariantViolation::ArticleLink {
                    account: account.id,
                    article,
                });
            }
        }
    }
    for article in net.articles() {
        if let Some(account) = article.account {
            let listed = net
                .account(account)
                .is_some_and(|a| a.articles.contains(&article.id));
            if !listed {
                violations.push(InvariantViolation::ArticleLink {
                    account,
                    article: article.id,
                });
            }
        }
    }
    OracleResult::from_violations(violations)
}

/// Pending messages are well-formed; histories are bounded.
#[must_use]
pub fn check_messages(net: &Network) -> OracleResult {
    let mut violations = Vec::new();
    for message in net.messages() {
        let receiver_ok = match message.audience {
            Audience::Person(receiver) => net.contains_person(receiver),
            Audience::Tag(_) => true,
        };
        let body_ok = match message.body {
            MessageBody::Emoji { emoji } => net.contains_emoji(emoji),
            _ => true,
        };
        if !(receiver_ok
            && body_ok
            && net.contains_person(message.sender)
            && net.message_id_used(message.id))
        {
            violations.push(InvariantViolation::PendingMessage {
                message: message.id,
            });
        }
    }
    for person in net.persons() {
        if person.received_messages.len() > MESSAGE_HISTORY {
            violations.push(InvariantViolation::MessageHistory {
                person: person.id,
                len: person.received_messages.len(),
            });
        }
    }
    OracleResult::from_violations(violations)
}

#[must_use]
pub fn check_triples(net: &Network) -> OracleResult {
    let tracked = net.triple_count();
    let recounted = net.count_triples();
    if tracked == recounted {
        OracleResult::pass()
    } else {
        OracleResult::from_violations(vec![InvariantViolation::TripleCount { tracked, recounted }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, Message, Person};

    fn populated() -> Network {
        let mut net = Network::new();
        for id in 1..=4 {
            net.insert_person(Person::new(id, format!("p{id}"), 20 + id));
        }
        net.link(1, 2, 5);
        net.link(2, 3, 7);
        net.link(1, 3, 1);
        net.add_tag(1, 10);
        net.add_tag_member(1, 10, 2);
        net.create_account(Account::new(3, 1, "acct".to_owned()));
        net.follow(3, 4);
        net.contribute_article(1, 3, 99);
        net.store_emoji(6);
        net.insert_message(Message {
            id: 12,
            body: MessageBody::Emoji { emoji: 6 },
            sender: 1,
            audience: Audience::Tag(10),
        });
        net
    }

    #[test]
    fn consistent_network_passes() {
        let result = check_all(&populated());
        assert!(result.passed, "{:?}", result.violations);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn empty_network_passes() {
        assert!(check_all(&Network::new()).passed);
    }

    #[test]
    fn unlink_cascade_keeps_invariants() {
        let mut net = populated();
        net.unlink(1, 2);
        let result = check_all(&net);
        assert!(result.passed, "{:?}", result.violations);
        assert!(!net.tag_has_member(1, 10, 2));
    }

    #[test]
    fn pruning_emoji_keeps_messages_consistent() {
        let mut net = populated();
        net.prune_emoji(1);
        assert!(check_all(&net).passed);
        assert!(!net.contains_message(12));
    }

    #[test]
    fn non_positive_value_is_reported() {
        let mut net = populated();
        net.set_relation_value(1, 2, 0);
        let result = check_all(&net);
        assert!(!result.passed);
        assert!(result.violations.iter().any(|v| matches!(
            v,
            InvariantViolation::NonPositiveRelation { a: 1, b: 2, value: 0 }
        )));
    }

    #[test]
    fn violation_display_names_the_parties() {
        let v = InvariantViolation::TagMember {
            owner: 1,
            tag: 2,
            member: 3,
        };
        assert_eq!(v.to_string(), "tag 1/2 holds invalid member 3");
    }
}
