use crate::catalog::FailureKind as F;
use crate::instruction::Instruction;

use super::Request;
use super::sample::Sampler;

pub fn add_person(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let id = match request {
        Request::Normal => s.missing_person()?,
        Request::Failure(F::DuplicatePerson) => s.person()?,
        Request::Failure(_) => return None,
    };
    Some(Instruction::AddPerson {
        id,
        name: s.name(),
        age: s.age(),
    })
}

pub fn add_relation(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (id1, id2) = match request {
        Request::Normal => s.unrelated_pair()?,
        Request::Failure(F::FirstPersonMissing) => (s.missing_person()?, s.any_person()),
        Request::Failure(F::SecondPersonMissing) => (s.person()?, s.missing_person()?),
        Request::Failure(F::DuplicateRelation) => {
            // A person counts as related to itself.
            if s.rng.hit_rate_percent(25) {
                let id = s.person()?;
                (id, id)
            } else {
                match s.relation() {
                    Some(pair) => pair,
                    None => {
                        let id = s.person()?;
                        (id, id)
                    }
                }
            }
        }
        Request::Failure(_) => return None,
    };
    Some(Instruction::AddRelation {
        id1,
        id2,
        value: s.relation_value(),
    })
}

pub fn modify_relation(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (id1, id2) = match request {
        Request::Normal => s.relation()?,
        Request::Failure(F::FirstPersonMissing) => (s.missing_person()?, s.any_person()),
        Request::Failure(F::SecondPersonMissing) => (s.person()?, s.missing_person()?),
        Request::Failure(F::SelfReference) => {
            let id = s.person()?;
            (id, id)
        }
        Request::Failure(F::RelationNotFound) => s.unrelated_pair()?,
        Request::Failure(_) => return None,
    };
    Some(Instruction::ModifyRelation {
        id1,
        id2,
        delta: s.value_delta(),
    })
}
