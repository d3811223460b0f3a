use crate::catalog::FailureKind as F;
use crate::command::CommandKind;
use crate::instruction::Instruction;
use crate::model::PersonId;

use super::Request;
use super::sample::Sampler;

pub fn nullary(request: Request, instruction: Instruction) -> Option<Instruction> {
    matches!(request, Request::Normal).then_some(instruction)
}

/// The first-missing / second-missing shapes every two-person query shares.
fn missing_pair(s: &mut Sampler<'_>, kind: F) -> Option<(PersonId, PersonId)> {
    match kind {
        F::FirstPersonMissing => Some((s.missing_person()?, s.any_person())),
        F::SecondPersonMissing => Some((s.person()?, s.missing_person()?)),
        _ => None,
    }
}

pub fn query_value(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (id1, id2) = match request {
        Request::Normal => {
            if s.rng.hit_rate_percent(10) {
                let id = s.person()?;
                (id, id)
            } else {
                s.relation()?
            }
        }
        Request::Failure(F::RelationNotFound) => s.unrelated_pair()?,
        Request::Failure(kind) => missing_pair(s, kind)?,
    };
    Some(Instruction::QueryValue { id1, id2 })
}

pub fn query_circle(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (id1, id2) = match request {
        Request::Normal => {
            let id1 = s.person()?;
            (id1, s.person()?)
        }
        Request::Failure(kind) => missing_pair(s, kind)?,
    };
    Some(Instruction::QueryCircle { id1, id2 })
}

pub fn query_best_acquaintance(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let person = match request {
        Request::Normal => s.connected_person()?,
        Request::Failure(F::PersonMissing) => s.missing_person()?,
        Request::Failure(F::NoAcquaintance) => s.isolated_person()?,
        Request::Failure(_) => return None,
    };
    Some(Instruction::QueryBestAcquaintance { person })
}

pub fn query_shortest_path(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (id1, id2) = match request {
        Request::Normal => {
            let id1 = s.person()?;
            let reachable = s.net.reachable_from(id1);
            (id1, s.rng.pick_iter(reachable.into_iter())?)
        }
        Request::Failure(F::PathNotFound) => unreachable_pair(s)?,
        Request::Failure(kind) => missing_pair(s, kind)?,
    };
    Some(Instruction::QueryShortestPath { id1, id2 })
}

/// Two persons in different components; `None` when the graph is connected.
fn unreachable_pair(s: &mut Sampler<'_>) -> Option<(PersonId, PersonId)> {
    let net = s.net;
    let start = s.person()?;
    let reachable = net.reachable_from(start);
    let stranger = s.rng.pick_iter(
        net.persons()
            .map(|p| p.id)
            .filter(|id| !reachable.contains(id)),
    )?;
    Some((start, stranger))
}

pub fn query_person(
    s: &mut Sampler<'_>,
    command: CommandKind,
    request: Request,
) -> Option<Instruction> {
    let person = match request {
        Request::Normal => s.person()?,
        Request::Failure(F::PersonMissing) => s.missing_person()?,
        Request::Failure(_) => return None,
    };
    Some(match command {
        CommandKind::QueryReceivedArticles => Instruction::QueryReceivedArticles { person },
        CommandKind::QuerySocialValue => Instruction::QuerySocialValue { person },
        CommandKind::QueryReceivedMessages => Instruction::QueryReceivedMessages { person },
        _ => Instruction::QueryMoney { person },
    })
}
