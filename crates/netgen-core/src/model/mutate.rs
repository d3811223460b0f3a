//! Bookkeeping mutations. Each keeps the network's cross-indexes consistent;
//! none of them checks whether the target would accept the change.

use super::{
    Account, AccountId, ArticleId, Article, MESSAGE_HISTORY, Message, MessageBody, MessageId,
    Network, Person, PersonId, Tag, TagId, relation_key,
};

impl Network {
    /// Drop everything. Used before a bulk load repopulates the model.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns `false` if the id is already taken.
    pub fn insert_person(&mut self, person: Person) -> bool {
        if self.persons.contains_key(&person.id) {
            return false;
        }
        self.persons.insert(person.id, person);
        true
    }

    /// Add an undirected relation. Returns `false` for self links, unknown
    /// persons, or pairs that are already related.
    pub fn link(&mut self, a: PersonId, b: PersonId, value: i32) -> bool {
        if a == b
            || !self.persons.contains_key(&a)
            || !self.persons.contains_key(&b)
            || self.relations.contains_key(&relation_key(a, b))
        {
            return false;
        }
        self.triple_count += self.common_acquaintances(a, b) as u64;
        self.relations.insert(relation_key(a, b), value);
        if let Some(p) = self.persons.get_mut(&a) {
            p.acquaintances.insert(b, value);
        }
        if let Some(p) = self.persons.get_mut(&b) {
            p.acquaintances.insert(a, value);
        }
        true
    }

    /// Overwrite the value of an existing relation.
    pub fn set_relation_value(&mut self, a: PersonId, b: PersonId, value: i32) -> bool {
        let Some(slot) = self.relations.get_mut(&relation_key(a, b)) else {
            return false;
        };
        *slot = value;
        if let Some(p) = self.persons.get_mut(&a) {
            p.acquaintances.insert(b, value);
        }
        if let Some(p) = self.persons.get_mut(&b) {
            p.acquaintances.insert(a, value);
        }
        true
    }

    /// Remove a relation, then drop each side from every tag the other owns.
    pub fn unlink(&mut self, a: PersonId, b: PersonId) -> Option<i32> {
        let common = self.common_acquaintances(a, b) as u64;
        let value = self.relations.remove(&relation_key(a, b))?;
        self.triple_count = self.triple_count.saturating_sub(common);
        if let Some(p) = self.persons.get_mut(&a) {
            p.acquaintances.remove(&b);
        }
        if let Some(p) = self.persons.get_mut(&b) {
            p.acquaintances.remove(&a);
        }
        for ((owner, _), tag) in self.tags.range_mut((a, TagId::MIN)..=(a, TagId::MAX)) {
            debug_assert_eq!(*owner, a);
            tag.members.remove(&b);
        }
        for (_, tag) in self.tags.range_mut((b, TagId::MIN)..=(b, TagId::MAX)) {
            tag.members.remove(&a);
        }
        Some(value)
    }

    pub fn add_tag(&mut self, owner: PersonId, tag: TagId) -> bool {
        let Some(person) = self.persons.get_mut(&owner) else {
            return false;
        };
        if !person.tags.insert(tag) {
            return false;
        }
        self.tags.insert((owner, tag), Tag::new(owner, tag));
        true
    }

    pub fn remove_tag(&mut self, owner: PersonId, tag: TagId) -> bool {
        let Some(person) = self.persons.get_mut(&owner) else {
            return false;
        };
        person.tags.remove(&tag);
        self.tags.remove(&(owner, tag)).is_some()
    }

    /// Add a member, recording its age. No-op when the tag is full.
    pub fn add_tag_member(&mut self, owner: PersonId, tag: TagId, member: PersonId) -> bool {
        let Some(age) = self.persons.get(&member).map(|p| p.age) else {
            return false;
        };
        let Some(table) = self.tags.get_mut(&(owner, tag)) else {
            return false;
        };
        if table.is_full() {
            return false;
        }
        table.members.insert(member, age);
        true
    }

    pub fn remove_tag_member(&mut self, owner: PersonId, tag: TagId, member: PersonId) -> bool {
        self.tags
            .get_mut(&(owner, tag))
            .is_some_and(|t| t.members.remove(&member).is_some())
    }

    pub fn create_account(&mut self, account: Account) -> bool {
        if self.accounts.contains_key(&account.id) {
            return false;
        }
        self.accounts.insert(account.id, account);
        true
    }

    /// Remove an account. Its articles stay in the network, detached.
    pub fn remove_account(&mut self, id: AccountId) -> Option<Account> {
        let account = self.accounts.remove(&id)?;
        for article in &account.articles {
            if let Some(a) = self.articles.get_mut(article) {
                a.account = None;
            }
        }
        Some(account)
    }

    pub fn follow(&mut self, account: AccountId, person: PersonId) -> bool {
        self.accounts
            .get_mut(&account)
            .is_some_and(|a| a.followers.insert(person, 0).is_none())
    }

    /// Publish an article: every follower receives it, newest first.
    pub fn contribute_article(
        &mut self,
        contributor: PersonId,
        account: AccountId,
        article: ArticleId,
    ) -> bool {
        if self.articles.contains_key(&article) {
            return false;
        }
        let Some(acc) = self.accounts.get_mut(&account) else {
            return false;
        };
        acc.articles.insert(article);
        *acc.followers.entry(contributor).or_insert(0) += 1;
        let followers: Vec<PersonId> = acc.followers.keys().copied().collect();
        self.articles.insert(
            article,
            Article {
                id: article,
                contributor,
                account: Some(account),
            },
        );
        for follower in followers {
            if let Some(p) = self.persons.get_mut(&follower) {
                p.received_articles.push_front(article);
            }
        }
        true
    }

    /// Retract an article from the network and from every follower's list.
    pub fn delete_article(&mut self, account: AccountId, article: ArticleId) -> bool {
        let Some(acc) = self.accounts.get_mut(&account) else {
            return false;
        };
        if !acc.articles.remove(&article) {
            return false;
        }
        let removed = self.articles.remove(&article);
        if let Some(contribution) =
            removed.and_then(|a| acc.followers.get_mut(&a.contributor))
        {
            *contribution = contribution.saturating_sub(1);
        }
        let followers: Vec<PersonId> = acc.followers.keys().copied().collect();
        for follower in followers {
            if let Some(p) = self.persons.get_mut(&follower) {
                p.received_articles.retain(|a| *a != article);
            }
        }
        true
    }

    pub fn insert_message(&mut self, message: Message) -> bool {
        if self.messages.contains_key(&message.id) {
            return false;
        }
        self.used_message_ids.insert(message.id);
        self.messages.insert(message.id, message);
        true
    }

    pub fn take_message(&mut self, id: MessageId) -> Option<Message> {
        self.messages.remove(&id)
    }

    pub fn add_social_value(&mut self, person: PersonId, delta: i64) {
        if let Some(p) = self.persons.get_mut(&person) {
            p.social_value = p.social_value.saturating_add(delta);
        }
    }

    pub fn add_money(&mut self, person: PersonId, delta: i64) {
        if let Some(p) = self.persons.get_mut(&person) {
            p.money = p.money.saturating_add(delta);
        }
    }

    /// Hand a message to one receiver: social value, money, history window,
    /// and the forwarded article if any.
    pub fn deliver(&mut self, receiver: PersonId, message: &Message, money: i64) {
        let Some(p) = self.persons.get_mut(&receiver) else {
            return;
        };
        p.social_value = p.social_value.saturating_add(message.social_value());
        p.money = p.money.saturating_add(money);
        if let MessageBody::Forward { article } = message.body {
            p.received_articles.push_front(article);
        }
        p.received_messages.push_front(message.id);
        p.received_messages.truncate(MESSAGE_HISTORY);
    }

    pub fn store_emoji(&mut self, id: i32) -> bool {
        if self.emoji.contains_key(&id) {
            return false;
        }
        self.emoji.insert(id, 0);
        true
    }

    pub fn heat_emoji(&mut self, id: i32) {
        if let Some(heat) = self.emoji.get_mut(&id) {
            *heat += 1;
        }
    }

    /// Forget emoji colder than `limit`, along with pending messages that
    /// carry them. Returns how many emoji were removed.
    pub fn prune_emoji(&mut self, limit: i32) -> usize {
        let before = self.emoji.len();
        self.emoji
            .retain(|_, heat| i64::try_from(*heat).unwrap_or(i64::MAX) >= i64::from(limit));
        let emoji = &self.emoji;
        self.messages.retain(|_, m| match m.body {
            MessageBody::Emoji { emoji: id } => emoji.contains_key(&id),
            _ => true,
        });
        before - self.emoji.len()
    }
}
