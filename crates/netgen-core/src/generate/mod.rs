//! One generator per command kind.
//!
//! A generator looks at the network, tries to build an instruction that
//! produces the requested outcome, and reports the outcome it predicts. When
//! the state cannot support the request it returns `None`; that is an
//! expected miss, not an error. Generators never mutate the network; the one
//! exception is the bulk load, which lives in [`bulk_load`] and rebuilds the
//! network itself.

pub mod bulk_load;
mod accounts;
mod messages;
mod people;
mod queries;
mod sample;
mod tags;

use crate::catalog::{FailureKey, FailureKind, Outcome};
use crate::command::CommandKind;
use crate::instruction::Instruction;
use crate::model::Network;
use crate::rng::DeterministicRng;

use sample::Sampler;

/// The outcome a caller asks a generator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Normal,
    Failure(FailureKind),
}

impl Request {
    /// The outcome this request stands for on `command`.
    #[must_use]
    pub const fn outcome(self, command: CommandKind) -> Outcome {
        match self {
            Self::Normal => Outcome::Normal,
            Self::Failure(kind) => Outcome::failure(command, kind),
        }
    }
}

impl From<FailureKey> for Request {
    fn from(key: FailureKey) -> Self {
        Self::Failure(key.kind)
    }
}

/// An instruction together with the outcome its generator predicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub instruction: Instruction,
    pub outcome: Outcome,
}

impl Generated {
    pub(crate) const fn new(instruction: Instruction, outcome: Outcome) -> Self {
        Self {
            instruction,
            outcome,
        }
    }
}

/// Build one instruction of `command` aimed at `request`.
///
/// Returns `None` when the network cannot support the request right now, when
/// the request names a failure the catalog does not list for `command`, and
/// always for [`CommandKind::LoadNetwork`], which goes through
/// [`bulk_load::generate`].
pub fn generate(
    command: CommandKind,
    request: Request,
    net: &Network,
    rng: &mut DeterministicRng,
) -> Option<Generated> {
    if let Request::Failure(kind) = request {
        if !FailureKey::new(command, kind).is_catalogued() {
            return None;
        }
    }
    let mut s = Sampler::new(net, rng);
    let instruction = dispatch(command, request, &mut s)?;
    debug_assert_eq!(instruction.kind(), command);
    Some(Generated::new(instruction, request.outcome(command)))
}

/// A normal instruction that moves the network towards a state where `key`
/// can be produced, for failure keys that no ordinary draw sets up.
///
/// Returns `None` for keys without a known setup, or when the network cannot
/// take the next step.
pub fn setup_step(
    key: FailureKey,
    net: &Network,
    rng: &mut DeterministicRng,
) -> Option<Generated> {
    if key != FailureKey::new(CommandKind::SendMessage, FailureKind::TagMissing) {
        return None;
    }
    let instruction = messages::orphan_broadcast_step(&mut Sampler::new(net, rng))?;
    Some(Generated::new(instruction, Outcome::Normal))
}

fn dispatch(command: CommandKind, request: Request, s: &mut Sampler<'_>) -> Option<Instruction> {
    use CommandKind as K;
    match command {
        K::LoadNetwork => None,
        K::AddPerson => people::add_person(s, request),
        K::AddRelation => people::add_relation(s, request),
        K::ModifyRelation => people::modify_relation(s, request),
        K::AddTag => tags::add_tag(s, request),
        K::DelTag => tags::del_tag(s, request),
        K::AddToTag => tags::add_to_tag(s, request),
        K::DelFromTag => tags::del_from_tag(s, request),
        K::QueryTagAgeVar | K::QueryTagValueSum => tags::query_tag(s, command, request),
        K::QueryValue => queries::query_value(s, request),
        K::QueryCircle => queries::query_circle(s, request),
        K::QueryTripleSum => queries::nullary(request, Instruction::QueryTripleSum),
        K::QueryCoupleSum => queries::nullary(request, Instruction::QueryCoupleSum),
        K::QueryBestAcquaintance => queries::query_best_acquaintance(s, request),
        K::QueryShortestPath => queries::query_shortest_path(s, request),
        K::QueryReceivedArticles
        | K::QuerySocialValue
        | K::QueryReceivedMessages
        | K::QueryMoney => queries::query_person(s, command, request),
        K::CreateAccount => accounts::create_account(s, request),
        K::DeleteAccount => accounts::delete_account(s, request),
        K::ContributeArticle => accounts::contribute_article(s, request),
        K::DeleteArticle => accounts::delete_article(s, request),
        K::FollowAccount => accounts::follow_account(s, request),
        K::QueryBestContributor => accounts::query_best_contributor(s, request),
        K::AddMessage
        | K::AddRedEnvelopeMessage
        | K::AddForwardMessage
        | K::AddEmojiMessage => messages::add_message(s, command, request),
        K::SendMessage => messages::send_message(s, request),
        K::StoreEmojiId => messages::store_emoji(s, request),
        K::QueryPopularity => messages::query_popularity(s, request),
        K::DeleteColdEmoji => messages::delete_cold_emoji(s, request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::model::Person;

    fn small_network() -> Network {
        let mut net = Network::new();
        for id in 1..=5 {
            net.insert_person(Person::new(id, format!("n{id}"), 18 + id));
        }
        net.link(1, 2, 10);
        net.link(2, 3, 20);
        net.add_tag(1, 4);
        net.add_tag_member(1, 4, 2);
        net
    }

    #[test]
    fn uncatalogued_request_is_a_miss() {
        let net = small_network();
        let mut rng = DeterministicRng::new(1);
        let got = generate(
            CommandKind::QueryMoney,
            Request::Failure(FailureKind::DuplicateEmoji),
            &net,
            &mut rng,
        );
        assert!(got.is_none());
    }

    #[test]
    fn load_network_never_comes_from_dispatch() {
        let net = small_network();
        let mut rng = DeterministicRng::new(1);
        assert!(generate(CommandKind::LoadNetwork, Request::Normal, &net, &mut rng).is_none());
    }

    #[test]
    fn predictions_match_classifier_on_fixed_state() {
        let net = small_network();
        let mut rng = DeterministicRng::new(99);
        for command in CommandKind::incremental() {
            let requests = std::iter::once(Request::Normal)
                .chain(crate::catalog::failures_of(command).map(Request::from));
            for request in requests {
                for _ in 0..8 {
                    if let Some(g) = generate(command, request, &net, &mut rng) {
                        assert_eq!(g.outcome, request.outcome(command));
                        assert_eq!(
                            classify(&net, &g.instruction),
                            Ok(g.outcome),
                            "{} predicted {}",
                            g.instruction,
                            g.outcome
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn setup_steps_are_normal_and_exist_only_for_hard_keys() {
        let net = small_network();
        let mut rng = DeterministicRng::new(12);
        let key = FailureKey::new(CommandKind::SendMessage, FailureKind::TagMissing);
        let step = setup_step(key, &net, &mut rng).expect("owned tag allows a broadcast");
        assert_eq!(step.outcome, Outcome::Normal);
        assert_eq!(classify(&net, &step.instruction), Ok(Outcome::Normal));

        let easy = FailureKey::new(CommandKind::QueryMoney, FailureKind::PersonMissing);
        assert!(setup_step(easy, &net, &mut rng).is_none());
    }

    #[test]
    fn empty_network_misses_anything_needing_persons() {
        let net = Network::new();
        let mut rng = DeterministicRng::new(4);
        assert!(generate(CommandKind::QueryMoney, Request::Normal, &net, &mut rng).is_none());
        let ap = generate(CommandKind::AddPerson, Request::Normal, &net, &mut rng);
        assert!(matches!(
            ap.map(|g| g.instruction),
            Some(Instruction::AddPerson { .. })
        ));
        let miss = generate(
            CommandKind::QueryMoney,
            Request::Failure(FailureKind::PersonMissing),
            &net,
            &mut rng,
        );
        assert!(miss.is_some());
    }
}
