//! Draws of existing and non-existent ids against the current network.
//!
//! Every "missing" draw first tries a handful of random picks from the pool
//! and only enumerates the pool when those all collide, so sparse pools stay
//! cheap and dense ones still terminate.

use crate::model::{
    ACCOUNT_POOL, ARTICLE_POOL, AccountId, ArticleId, Audience, EMOJI_POOL, EmojiId, IdPool,
    MESSAGE_POOL, MessageId, Network, PERSON_POOL, PersonId, TAG_POOL, TagId,
};
use crate::rng::DeterministicRng;

const RANDOM_PROBES: usize = 32;

pub struct Sampler<'a> {
    pub net: &'a Network,
    pub rng: &'a mut DeterministicRng,
}

impl<'a> Sampler<'a> {
    pub fn new(net: &'a Network, rng: &'a mut DeterministicRng) -> Self {
        Self { net, rng }
    }

    // ── Scalars ──────────────────────────────────────────────────────────────

    pub fn name(&mut self) -> String {
        let len = self.rng.range_usize(1, 10);
        self.rng.alphanumeric(len)
    }

    pub fn age(&mut self) -> i32 {
        self.rng.range_inclusive(1, 200)
    }

    pub fn relation_value(&mut self) -> i32 {
        self.rng.range_inclusive(1, 200)
    }

    pub fn value_delta(&mut self) -> i32 {
        self.rng.range_inclusive(-200, 200)
    }

    pub fn any_in(&mut self, pool: IdPool) -> i32 {
        self.rng.range_inclusive(pool.lo, pool.hi)
    }

    /// An id from `pool` for which `taken` is false.
    pub fn missing_in(&mut self, pool: IdPool, taken: impl Fn(i32) -> bool) -> Option<i32> {
        for _ in 0..RANDOM_PROBES {
            let id = self.any_in(pool);
            if !taken(id) {
                return Some(id);
            }
        }
        let free: Vec<i32> = pool.iter().filter(|id| !taken(*id)).collect();
        self.rng.pick(&free)
    }

    // ── Persons and relations ────────────────────────────────────────────────

    pub fn person(&mut self) -> Option<PersonId> {
        let net = self.net;
        self.rng.pick_iter(net.persons().map(|p| p.id))
    }

    pub fn person_other_than(&mut self, id: PersonId) -> Option<PersonId> {
        let net = self.net;
        self.rng
            .pick_iter(net.persons().map(|p| p.id).filter(|p| *p != id))
    }

    pub fn missing_person(&mut self) -> Option<PersonId> {
        let net = self.net;
        self.missing_in(PERSON_POOL, |id| net.contains_person(id))
    }

    /// A pool id that is missing half the time and existing otherwise.
    pub fn any_person(&mut self) -> PersonId {
        if self.rng.coin() {
            if let Some(id) = self.person() {
                return id;
            }
        }
        self.any_in(PERSON_POOL)
    }

    pub fn connected_person(&mut self) -> Option<PersonId> {
        let ids = self.net.connected_person_ids();
        self.rng.pick(&ids)
    }

    pub fn isolated_person(&mut self) -> Option<PersonId> {
        let ids = self.net.isolated_person_ids();
        self.rng.pick(&ids)
    }

    pub fn acquaintance_of(&mut self, id: PersonId) -> Option<PersonId> {
        let net = self.net;
        let person = net.person(id)?;
        self.rng.pick_iter(person.acquaintances.keys().copied())
    }

    /// An existing relation in random orientation.
    pub fn relation(&mut self) -> Option<(PersonId, PersonId)> {
        let net = self.net;
        let (a, b) = self.rng.pick_iter(net.relations().map(|(k, _)| k))?;
        Some(if self.rng.coin() { (a, b) } else { (b, a) })
    }

    /// Two distinct existing persons without a relation.
    pub fn unrelated_pair(&mut self) -> Option<(PersonId, PersonId)> {
        let net = self.net;
        let ids = net.person_ids();
        if ids.len() < 2 {
            return None;
        }
        for _ in 0..RANDOM_PROBES {
            let (Some(a), Some(b)) = (self.rng.pick(&ids), self.rng.pick(&ids)) else {
                return None;
            };
            if a != b && net.relation(a, b).is_none() {
                return Some((a, b));
            }
        }
        let open: Vec<PersonId> = net
            .persons()
            .filter(|p| p.acquaintances.len() + 1 < ids.len())
            .map(|p| p.id)
            .collect();
        let a = self.rng.pick(&open)?;
        let b = self
            .rng
            .pick_iter(ids.iter().copied().filter(|b| *b != a && net.relation(a, *b).is_none()))?;
        Some((a, b))
    }

    // ── Tags ─────────────────────────────────────────────────────────────────

    pub fn owned_tag(&mut self) -> Option<(PersonId, TagId)> {
        let net = self.net;
        self.rng.pick_iter(net.tags().map(|t| (t.owner, t.id)))
    }

    pub fn populated_tag(&mut self) -> Option<(PersonId, TagId)> {
        let net = self.net;
        self.rng.pick_iter(
            net.tags()
                .filter(|t| !t.members.is_empty())
                .map(|t| (t.owner, t.id)),
        )
    }

    /// An owned tag that a pending broadcast from its owner still targets.
    pub fn broadcast_tag(&mut self) -> Option<(PersonId, TagId)> {
        let net = self.net;
        self.rng.pick_iter(net.messages().filter_map(|m| match m.audience {
            Audience::Tag(tag) if net.owns_tag(m.sender, tag) => Some((m.sender, tag)),
            Audience::Tag(_) | Audience::Person(_) => None,
        }))
    }

    pub fn tag_member(&mut self, owner: PersonId, tag: TagId) -> Option<PersonId> {
        let net = self.net;
        let table = net.tag(owner, tag)?;
        self.rng.pick_iter(table.members.keys().copied())
    }

    pub fn tag_of(&mut self, owner: PersonId) -> Option<TagId> {
        let net = self.net;
        let person = net.person(owner)?;
        self.rng.pick_iter(person.tags.iter().copied())
    }

    pub fn tag_not_owned_by(&mut self, owner: PersonId) -> Option<TagId> {
        let net = self.net;
        self.missing_in(TAG_POOL, |tag| net.owns_tag(owner, tag))
    }

    pub fn any_tag(&mut self) -> TagId {
        self.any_in(TAG_POOL)
    }

    // ── Accounts and articles ────────────────────────────────────────────────

    pub fn account(&mut self) -> Option<AccountId> {
        let net = self.net;
        self.rng.pick_iter(net.accounts().map(|a| a.id))
    }

    pub fn account_with_articles(&mut self) -> Option<AccountId> {
        let net = self.net;
        self.rng.pick_iter(
            net.accounts()
                .filter(|a| !a.articles.is_empty())
                .map(|a| a.id),
        )
    }

    pub fn missing_account(&mut self) -> Option<AccountId> {
        let net = self.net;
        self.missing_in(ACCOUNT_POOL, |id| net.contains_account(id))
    }

    pub fn any_account(&mut self) -> AccountId {
        self.any_in(ACCOUNT_POOL)
    }

    pub fn follower_of(&mut self, account: AccountId) -> Option<PersonId> {
        let net = self.net;
        let acc = net.account(account)?;
        self.rng.pick_iter(acc.followers.keys().copied())
    }

    pub fn non_follower_of(&mut self, account: AccountId) -> Option<PersonId> {
        let net = self.net;
        let acc = net.account(account)?;
        self.rng.pick_iter(
            net.persons()
                .map(|p| p.id)
                .filter(|p| !acc.followers.contains_key(p)),
        )
    }

    pub fn article_of(&mut self, account: AccountId) -> Option<ArticleId> {
        let net = self.net;
        let acc = net.account(account)?;
        self.rng.pick_iter(acc.articles.iter().copied())
    }

    pub fn existing_article(&mut self) -> Option<ArticleId> {
        let net = self.net;
        self.rng.pick_iter(net.articles().map(|a| a.id))
    }

    /// An article id the network does not currently hold.
    pub fn fresh_article(&mut self) -> Option<ArticleId> {
        let net = self.net;
        self.missing_in(ARTICLE_POOL, |id| net.contains_article(id))
    }

    pub fn any_article(&mut self) -> ArticleId {
        self.any_in(ARTICLE_POOL)
    }

    // ── Messages and emoji ───────────────────────────────────────────────────

    /// A message id never used by this run.
    pub fn fresh_message_id(&mut self) -> Option<MessageId> {
        let net = self.net;
        self.missing_in(MESSAGE_POOL, |id| net.message_id_used(id))
    }

    pub fn pending_message_id(&mut self) -> Option<MessageId> {
        let net = self.net;
        self.rng.pick_iter(net.messages().map(|m| m.id))
    }

    pub fn non_pending_message_id(&mut self) -> Option<MessageId> {
        let net = self.net;
        self.missing_in(MESSAGE_POOL, |id| net.contains_message(id))
    }

    pub fn emoji(&mut self) -> Option<EmojiId> {
        let ids = self.net.emoji_ids();
        self.rng.pick(&ids)
    }

    pub fn missing_emoji(&mut self) -> Option<EmojiId> {
        let net = self.net;
        self.missing_in(EMOJI_POOL, |id| net.contains_emoji(id))
    }

    /// A valid audience for `sender`: another person, or one of its tags.
    /// Point-to-point receivers lean towards acquaintances.
    pub fn audience_for(&mut self, sender: PersonId) -> Option<Audience> {
        let has_tags = self.net.person(sender).is_some_and(|p| !p.tags.is_empty());
        let has_others = self.net.person_count() >= 2;
        let broadcast = match (has_tags, has_others) {
            (false, false) => return None,
            (true, false) => true,
            (false, true) => false,
            (true, true) => self.rng.hit_rate_percent(35),
        };
        if broadcast {
            return self.tag_of(sender).map(Audience::Tag);
        }
        let receiver = if self.rng.hit_rate_percent(70) {
            match self.acquaintance_of(sender) {
                Some(id) => Some(id),
                None => self.person_other_than(sender),
            }
        } else {
            self.person_other_than(sender)
        };
        receiver.map(Audience::Person)
    }
}
