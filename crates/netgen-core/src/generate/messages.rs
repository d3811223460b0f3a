use crate::catalog::FailureKind as F;
use crate::command::CommandKind;
use crate::instruction::Instruction;
use crate::model::{Audience, EMOJI_POOL, Message, MessageBody, PersonId};

use super::Request;
use super::sample::Sampler;

/// A sender and a body that passes every content check for `command`.
fn valid_content(s: &mut Sampler<'_>, command: CommandKind) -> Option<(PersonId, MessageBody)> {
    let body = match command {
        CommandKind::AddForwardMessage => {
            let net = s.net;
            let (sender, article) = s.rng.pick_iter(net.persons().flat_map(|p| {
                p.received_articles
                    .iter()
                    .filter(move |a| net.contains_article(**a))
                    .map(move |a| (p.id, *a))
            }))?;
            return Some((sender, MessageBody::Forward { article }));
        }
        CommandKind::AddEmojiMessage => MessageBody::Emoji { emoji: s.emoji()? },
        CommandKind::AddRedEnvelopeMessage => MessageBody::RedEnvelope {
            money: s.rng.range_inclusive(1, 200),
        },
        _ => MessageBody::Ordinary {
            social_value: s.rng.range_inclusive(-1000, 1000),
        },
    };
    Some((s.person()?, body))
}

/// Any body of the right shape, valid or not.
fn any_body(s: &mut Sampler<'_>, command: CommandKind) -> MessageBody {
    match command {
        CommandKind::AddForwardMessage => MessageBody::Forward {
            article: s.any_article(),
        },
        CommandKind::AddEmojiMessage => MessageBody::Emoji {
            emoji: s.any_in(EMOJI_POOL),
        },
        CommandKind::AddRedEnvelopeMessage => MessageBody::RedEnvelope {
            money: s.rng.range_inclusive(1, 200),
        },
        _ => MessageBody::Ordinary {
            social_value: s.rng.range_inclusive(-1000, 1000),
        },
    }
}

pub fn add_message(
    s: &mut Sampler<'_>,
    command: CommandKind,
    request: Request,
) -> Option<Instruction> {
    let (id, sender, body, audience) = match request {
        Request::Normal => {
            let id = s.fresh_message_id()?;
            let (sender, body) = valid_content(s, command)?;
            (id, sender, body, s.audience_for(sender)?)
        }
        Request::Failure(F::DuplicateMessage) => {
            let id = s.pending_message_id()?;
            let (sender, body) = match valid_content(s, command) {
                Some(content) => content,
                None => (s.person()?, any_body(s, command)),
            };
            (id, sender, body, s.audience_for(sender)?)
        }
        Request::Failure(F::EmojiMissing) => {
            let id = s.fresh_message_id()?;
            let sender = s.person()?;
            let body = MessageBody::Emoji {
                emoji: s.missing_emoji()?,
            };
            (id, sender, body, s.audience_for(sender)?)
        }
        Request::Failure(F::ArticleNotInNetwork) => {
            let id = s.fresh_message_id()?;
            let sender = s.person()?;
            let body = MessageBody::Forward {
                article: s.fresh_article()?,
            };
            (id, sender, body, s.audience_for(sender)?)
        }
        Request::Failure(F::ArticleNotReceived) => {
            let id = s.fresh_message_id()?;
            let sender = s.person()?;
            let net = s.net;
            let received = &net.person(sender)?.received_articles;
            let article = s.rng.pick_iter(
                net.articles()
                    .map(|a| a.id)
                    .filter(|a| !received.contains(a)),
            )?;
            let body = MessageBody::Forward { article };
            (id, sender, body, s.audience_for(sender)?)
        }
        Request::Failure(F::SelfReference) => {
            let id = s.fresh_message_id()?;
            let (sender, body) = valid_content(s, command)?;
            (id, sender, body, Audience::Person(sender))
        }
        Request::Failure(_) => return None,
    };
    Some(Instruction::AddMessage(Message {
        id,
        body,
        sender,
        audience,
    }))
}

pub fn send_message(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let net = s.net;
    let id = match request {
        Request::Normal => {
            let ids = net.sendable_message_ids();
            s.rng.pick(&ids)?
        }
        Request::Failure(F::MessageMissing) => s.non_pending_message_id()?,
        Request::Failure(F::RelationNotFound) => s.rng.pick_iter(
            net.messages()
                .filter(|m| match m.audience {
                    Audience::Person(receiver) => net.relation(m.sender, receiver).is_none(),
                    Audience::Tag(_) => false,
                })
                .map(|m| m.id),
        )?,
        Request::Failure(F::TagMissing) => s.rng.pick_iter(
            net.messages()
                .filter(|m| match m.audience {
                    Audience::Tag(tag) => !net.owns_tag(m.sender, tag),
                    Audience::Person(_) => false,
                })
                .map(|m| m.id),
        )?,
        Request::Failure(_) => return None,
    };
    Some(Instruction::SendMessage { id })
}

/// One step towards a pending broadcast whose sender no longer owns the tag.
/// Deletes a tag that a broadcast still targets; failing that, posts a
/// broadcast to an owned tag; failing that, creates a tag.
pub fn orphan_broadcast_step(s: &mut Sampler<'_>) -> Option<Instruction> {
    if let Some((person, tag)) = s.broadcast_tag() {
        return Some(Instruction::DelTag { person, tag });
    }
    let Some((sender, tag)) = s.owned_tag() else {
        return super::tags::add_tag(s, Request::Normal);
    };
    let id = s.fresh_message_id()?;
    let body = MessageBody::Ordinary {
        social_value: s.rng.range_inclusive(-1000, 1000),
    };
    Some(Instruction::AddMessage(Message {
        id,
        body,
        sender,
        audience: Audience::Tag(tag),
    }))
}

pub fn store_emoji(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let emoji = match request {
        Request::Normal => s.missing_emoji()?,
        Request::Failure(F::DuplicateEmoji) => s.emoji()?,
        Request::Failure(_) => return None,
    };
    Some(Instruction::StoreEmojiId { emoji })
}

pub fn query_popularity(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let emoji = match request {
        Request::Normal => s.emoji()?,
        Request::Failure(F::EmojiMissing) => s.missing_emoji()?,
        Request::Failure(_) => return None,
    };
    Some(Instruction::QueryPopularity { emoji })
}

/// Limits mostly hug the current heat range so pruning stays selective.
pub fn delete_cold_emoji(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    if request != Request::Normal {
        return None;
    }
    let net = s.net;
    let hottest = net
        .emoji_ids()
        .into_iter()
        .filter_map(|id| net.emoji_heat(id))
        .max()
        .unwrap_or(0);
    let ceiling = i32::try_from(hottest).unwrap_or(i32::MAX).saturating_add(1).min(2000);
    let limit = if s.rng.hit_rate_percent(75) {
        s.rng.range_inclusive(-2, ceiling)
    } else {
        s.rng.range_inclusive(-2000, 2000)
    };
    Some(Instruction::DeleteColdEmoji { limit })
}
