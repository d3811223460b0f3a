//! Independent outcome oracle.
//!
//! Given the network and an instruction, evaluate the target's checks in the
//! order the target evaluates them and report the first one that fails. The
//! generators predict outcomes on their own; this module exists so those
//! predictions can be checked and so arbitrary files can be replayed.

use crate::catalog::{FailureKind as F, Outcome};
use crate::command::CommandKind;
use crate::instruction::Instruction;
use crate::model::{Audience, Message, MessageBody, Network};

/// An instruction whose failure the catalog does not model, such as a
/// message naming a sender that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{command} falls outside the catalog: {reason}")]
pub struct Unmodeled {
    pub command: CommandKind,
    pub reason: &'static str,
}

/// Decide what `instruction` does against `net`.
///
/// # Errors
///
/// Returns [`Unmodeled`] for add-message instructions whose sender, receiver,
/// or tag the target would reject before its catalogued checks run.
pub fn classify(net: &Network, instruction: &Instruction) -> Result<Outcome, Unmodeled> {
    let command = instruction.kind();
    let fail = |kind| Ok(Outcome::failure(command, kind));
    let person = |id| net.contains_person(id);

    match instruction {
        Instruction::LoadNetwork(_)
        | Instruction::QueryTripleSum
        | Instruction::QueryCoupleSum
        | Instruction::DeleteColdEmoji { .. } => Ok(Outcome::Normal),

        Instruction::AddPerson { id, .. } => {
            if person(*id) {
                return fail(F::DuplicatePerson);
            }
            Ok(Outcome::Normal)
        }
        Instruction::AddRelation { id1, id2, .. } => {
            if let Some(kind) = missing_pair(net, *id1, *id2) {
                return fail(kind);
            }
            if net.is_linked(*id1, *id2) {
                return fail(F::DuplicateRelation);
            }
            Ok(Outcome::Normal)
        }
        Instruction::ModifyRelation { id1, id2, .. } => {
            if let Some(kind) = missing_pair(net, *id1, *id2) {
                return fail(kind);
            }
            if id1 == id2 {
                return fail(F::SelfReference);
            }
            if !net.is_linked(*id1, *id2) {
                return fail(F::RelationNotFound);
            }
            Ok(Outcome::Normal)
        }
        Instruction::AddTag { person: id, tag } => {
            if !person(*id) {
                return fail(F::PersonMissing);
            }
            if net.owns_tag(*id, *tag) {
                return fail(F::DuplicateTag);
            }
            Ok(Outcome::Normal)
        }
        Instruction::DelTag { person: owner, tag }
        | Instruction::QueryTagAgeVar { owner, tag }
        | Instruction::QueryTagValueSum { owner, tag } => {
            if !person(*owner) {
                return fail(F::PersonMissing);
            }
            if !net.owns_tag(*owner, *tag) {
                return fail(F::TagMissing);
            }
            Ok(Outcome::Normal)
        }
        Instruction::AddToTag { member, owner, tag } => {
            if let Some(kind) = missing_pair(net, *member, *owner) {
                return fail(kind);
            }
            if member == owner {
                return fail(F::SelfReference);
            }
            if !net.is_linked(*member, *owner) {
                return fail(F::RelationNotFound);
            }
            if !net.owns_tag(*owner, *tag) {
                return fail(F::TagMissing);
            }
            if net.tag_has_member(*owner, *tag, *member) {
                return fail(F::AlreadyInTag);
            }
            Ok(Outcome::Normal)
        }
        Instruction::DelFromTag { member, owner, tag } => {
            if let Some(kind) = missing_pair(net, *member, *owner) {
                return fail(kind);
            }
            if !net.owns_tag(*owner, *tag) {
                return fail(F::TagMissing);
            }
            if !net.tag_has_member(*owner, *tag, *member) {
                return fail(F::NotInTag);
            }
            Ok(Outcome::Normal)
        }
        Instruction::QueryValue { id1, id2 } => {
            if let Some(kind) = missing_pair(net, *id1, *id2) {
                return fail(kind);
            }
            if !net.is_linked(*id1, *id2) {
                return fail(F::RelationNotFound);
            }
            Ok(Outcome::Normal)
        }
        Instruction::QueryCircle { id1, id2 } => match missing_pair(net, *id1, *id2) {
            Some(kind) => fail(kind),
            None => Ok(Outcome::Normal),
        },
        Instruction::QueryShortestPath { id1, id2 } => {
            if let Some(kind) = missing_pair(net, *id1, *id2) {
                return fail(kind);
            }
            if !net.is_reachable(*id1, *id2) {
                return fail(F::PathNotFound);
            }
            Ok(Outcome::Normal)
        }
        Instruction::QueryBestAcquaintance { person: id } => {
            if !person(*id) {
                return fail(F::PersonMissing);
            }
            if net.person(*id).is_some_and(|p| p.acquaintances.is_empty()) {
                return fail(F::NoAcquaintance);
            }
            Ok(Outcome::Normal)
        }
        Instruction::QueryReceivedArticles { person: id }
        | Instruction::QuerySocialValue { person: id }
        | Instruction::QueryReceivedMessages { person: id }
        | Instruction::QueryMoney { person: id } => {
            if !person(*id) {
                return fail(F::PersonMissing);
            }
            Ok(Outcome::Normal)
        }
        Instruction::CreateAccount {
            person: id,
            account,
            ..
        } => {
            if !person(*id) {
                return fail(F::PersonMissing);
            }
            if net.contains_account(*account) {
                return fail(F::DuplicateAccount);
            }
            Ok(Outcome::Normal)
        }
        Instruction::DeleteAccount {
            person: id,
            account,
        } => {
            if !person(*id) {
                return fail(F::PersonMissing);
            }
            let Some(acc) = net.account(*account) else {
                return fail(F::AccountMissing);
            };
            if acc.owner != *id {
                return fail(F::DeleteAccountDenied);
            }
            Ok(Outcome::Normal)
        }
        Instruction::ContributeArticle {
            person: id,
            account,
            article,
        } => {
            if !person(*id) {
                return fail(F::PersonMissing);
            }
            let Some(acc) = net.account(*account) else {
                return fail(F::AccountMissing);
            };
            if net.contains_article(*article) {
                return fail(F::DuplicateArticle);
            }
            if !acc.followers.contains_key(id) {
                return fail(F::ContributeDenied);
            }
            Ok(Outcome::Normal)
        }
        Instruction::DeleteArticle {
            person: id,
            account,
            article,
        } => {
            if !person(*id) {
                return fail(F::PersonMissing);
            }
            let Some(acc) = net.account(*account) else {
                return fail(F::AccountMissing);
            };
            if !acc.articles.contains(article) {
                return fail(F::ArticleNotInAccount);
            }
            if acc.owner != *id {
                return fail(F::DeleteArticleDenied);
            }
            Ok(Outcome::Normal)
        }
        Instruction::FollowAccount {
            person: id,
            account,
        } => {
            if !person(*id) {
                return fail(F::PersonMissing);
            }
            let Some(acc) = net.account(*account) else {
                return fail(F::AccountMissing);
            };
            if acc.followers.contains_key(id) {
                return fail(F::AlreadyFollower);
            }
            Ok(Outcome::Normal)
        }
        Instruction::QueryBestContributor { account } => {
            if !net.contains_account(*account) {
                return fail(F::AccountMissing);
            }
            Ok(Outcome::Normal)
        }
        Instruction::AddMessage(message) => classify_add_message(net, command, message),
        Instruction::SendMessage { id } => {
            let Some(message) = net.message(*id) else {
                return fail(F::MessageMissing);
            };
            match message.audience {
                Audience::Person(receiver) if net.relation(message.sender, receiver).is_none() => {
                    fail(F::RelationNotFound)
                }
                Audience::Tag(tag) if !net.owns_tag(message.sender, tag) => fail(F::TagMissing),
                _ => Ok(Outcome::Normal),
            }
        }
        Instruction::StoreEmojiId { emoji } => {
            if net.contains_emoji(*emoji) {
                return fail(F::DuplicateEmoji);
            }
            Ok(Outcome::Normal)
        }
        Instruction::QueryPopularity { emoji } => {
            if !net.contains_emoji(*emoji) {
                return fail(F::EmojiMissing);
            }
            Ok(Outcome::Normal)
        }
    }
}

/// First-then-second existence check shared by two-person commands.
fn missing_pair(net: &Network, id1: i32, id2: i32) -> Option<F> {
    if !net.contains_person(id1) {
        Some(F::FirstPersonMissing)
    } else if !net.contains_person(id2) {
        Some(F::SecondPersonMissing)
    } else {
        None
    }
}

fn classify_add_message(
    net: &Network,
    command: CommandKind,
    message: &Message,
) -> Result<Outcome, Unmodeled> {
    let unmodeled = |reason| Err(Unmodeled { command, reason });
    if !net.contains_person(message.sender) {
        return unmodeled("sender does not exist");
    }
    match message.audience {
        Audience::Person(receiver) if !net.contains_person(receiver) => {
            return unmodeled("receiver does not exist");
        }
        Audience::Tag(tag) if !net.owns_tag(message.sender, tag) => {
            return unmodeled("sender does not own the tag");
        }
        _ => {}
    }

    let fail = |kind| Ok(Outcome::failure(command, kind));
    if net.contains_message(message.id) {
        return fail(F::DuplicateMessage);
    }
    match message.body {
        MessageBody::Emoji { emoji } if !net.contains_emoji(emoji) => {
            return fail(F::EmojiMissing);
        }
        MessageBody::Forward { article } => {
            if !net.contains_article(article) {
                return fail(F::ArticleNotInNetwork);
            }
            if net
                .person(message.sender)
                .is_some_and(|p| !p.has_received_article(article))
            {
                return fail(F::ArticleNotReceived);
            }
        }
        _ => {}
    }
    if message.audience == Audience::Person(message.sender) {
        return fail(F::SelfReference);
    }
    Ok(Outcome::Normal)
}
