use crate::catalog::FailureKind as F;
use crate::command::CommandKind;
use crate::instruction::Instruction;
use crate::model::{PersonId, TagId};

use super::Request;
use super::sample::Sampler;

pub fn add_tag(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (person, tag) = match request {
        Request::Normal => {
            let person = s.person()?;
            (person, s.tag_not_owned_by(person)?)
        }
        Request::Failure(F::PersonMissing) => (s.missing_person()?, s.any_tag()),
        Request::Failure(F::DuplicateTag) => s.owned_tag()?,
        Request::Failure(_) => return None,
    };
    Some(Instruction::AddTag { person, tag })
}

/// Half of the normal deletions go to tags with pending broadcasts, which
/// leaves those messages unsendable.
pub fn del_tag(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let pending = if request == Request::Normal && s.rng.coin() {
        s.broadcast_tag()
    } else {
        None
    };
    let (person, tag) = match pending {
        Some(pair) => pair,
        None => owner_and_tag(s, request)?,
    };
    Some(Instruction::DelTag { person, tag })
}

pub fn query_tag(s: &mut Sampler<'_>, command: CommandKind, request: Request) -> Option<Instruction> {
    let (owner, tag) = owner_and_tag(s, request)?;
    Some(match command {
        CommandKind::QueryTagAgeVar => Instruction::QueryTagAgeVar { owner, tag },
        _ => Instruction::QueryTagValueSum { owner, tag },
    })
}

/// Shared shape of every `person tag` command that needs the tag to exist.
fn owner_and_tag(s: &mut Sampler<'_>, request: Request) -> Option<(PersonId, TagId)> {
    match request {
        Request::Normal => s.owned_tag(),
        Request::Failure(F::PersonMissing) => Some((s.missing_person()?, s.any_tag())),
        Request::Failure(F::TagMissing) => {
            let person = s.person()?;
            Some((person, s.tag_not_owned_by(person)?))
        }
        Request::Failure(_) => None,
    }
}

/// An owned tag plus an acquaintance of its owner that is not yet a member.
fn open_tag_slot(s: &mut Sampler<'_>) -> Option<(PersonId, PersonId, TagId)> {
    let net = s.net;
    let candidates: Vec<(PersonId, TagId)> = net
        .tags()
        .filter(|t| !t.is_full())
        .filter(|t| {
            net.person(t.owner).is_some_and(|p| {
                p.acquaintances
                    .keys()
                    .any(|a| !t.members.contains_key(a))
            })
        })
        .map(|t| (t.owner, t.id))
        .collect();
    let (owner, tag) = s.rng.pick(&candidates)?;
    let table = net.tag(owner, tag)?;
    let member = s.rng.pick_iter(
        net.person(owner)?
            .acquaintances
            .keys()
            .copied()
            .filter(|a| !table.members.contains_key(a)),
    )?;
    Some((member, owner, tag))
}

pub fn add_to_tag(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (member, owner, tag) = match request {
        Request::Normal => open_tag_slot(s)?,
        Request::Failure(F::FirstPersonMissing) => {
            (s.missing_person()?, s.any_person(), s.any_tag())
        }
        Request::Failure(F::SecondPersonMissing) => {
            (s.person()?, s.missing_person()?, s.any_tag())
        }
        Request::Failure(F::SelfReference) => {
            let id = s.person()?;
            let tag = s.tag_of(id).unwrap_or_else(|| s.any_tag());
            (id, id, tag)
        }
        Request::Failure(F::RelationNotFound) => {
            let (member, owner) = s.unrelated_pair()?;
            let tag = s.tag_of(owner).unwrap_or_else(|| s.any_tag());
            (member, owner, tag)
        }
        Request::Failure(F::TagMissing) => {
            let (member, owner) = s.relation()?;
            (member, owner, s.tag_not_owned_by(owner)?)
        }
        Request::Failure(F::AlreadyInTag) => {
            let (owner, tag) = s.populated_tag()?;
            (s.tag_member(owner, tag)?, owner, tag)
        }
        Request::Failure(_) => return None,
    };
    Some(Instruction::AddToTag { member, owner, tag })
}

pub fn del_from_tag(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (member, owner, tag) = match request {
        Request::Normal => {
            let (owner, tag) = s.populated_tag()?;
            (s.tag_member(owner, tag)?, owner, tag)
        }
        Request::Failure(F::FirstPersonMissing) => {
            (s.missing_person()?, s.any_person(), s.any_tag())
        }
        Request::Failure(F::SecondPersonMissing) => {
            (s.person()?, s.missing_person()?, s.any_tag())
        }
        Request::Failure(F::TagMissing) => {
            let member = s.person()?;
            let owner = s.person()?;
            (member, owner, s.tag_not_owned_by(owner)?)
        }
        Request::Failure(F::NotInTag) => {
            let (owner, tag) = s.owned_tag()?;
            let net = s.net;
            let member = s.rng.pick_iter(
                net.persons()
                    .map(|p| p.id)
                    .filter(|p| !net.tag_has_member(owner, tag, *p)),
            )?;
            (member, owner, tag)
        }
        Request::Failure(_) => return None,
    };
    Some(Instruction::DelFromTag { member, owner, tag })
}
