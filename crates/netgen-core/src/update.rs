//! State updaters: the effect of a successful instruction on the network.
//!
//! [`apply`] must only be called for instructions whose outcome is
//! [`Outcome::Normal`](crate::catalog::Outcome::Normal). Failing instructions
//! leave the target untouched, so they never reach this module.

use crate::generate::bulk_load;
use crate::instruction::Instruction;
use crate::model::{Account, Audience, Message, MessageBody, Network, Person};

/// Mirror the effect of a normal-outcome instruction. Queries are no-ops.
pub fn apply(net: &mut Network, instruction: &Instruction) {
    match instruction {
        Instruction::LoadNetwork(block) => bulk_load::install(net, block),
        Instruction::AddPerson { id, name, age } => {
            net.insert_person(Person::new(*id, name.clone(), *age));
        }
        Instruction::AddRelation { id1, id2, value } => {
            net.link(*id1, *id2, *value);
        }
        Instruction::ModifyRelation { id1, id2, delta } => modify_relation(net, *id1, *id2, *delta),
        Instruction::AddTag { person, tag } => {
            net.add_tag(*person, *tag);
        }
        Instruction::DelTag { person, tag } => {
            net.remove_tag(*person, *tag);
        }
        Instruction::AddToTag { member, owner, tag } => {
            net.add_tag_member(*owner, *tag, *member);
        }
        Instruction::DelFromTag { member, owner, tag } => {
            net.remove_tag_member(*owner, *tag, *member);
        }
        Instruction::CreateAccount {
            person,
            account,
            name,
        } => {
            net.create_account(Account::new(*account, *person, name.clone()));
        }
        Instruction::DeleteAccount { account, .. } => {
            net.remove_account(*account);
        }
        Instruction::ContributeArticle {
            person,
            account,
            article,
        } => {
            net.contribute_article(*person, *account, *article);
        }
        Instruction::DeleteArticle {
            account, article, ..
        } => {
            net.delete_article(*account, *article);
        }
        Instruction::FollowAccount { person, account } => {
            net.follow(*account, *person);
        }
        Instruction::AddMessage(message) => {
            net.insert_message(*message);
        }
        Instruction::SendMessage { id } => send_message(net, *id),
        Instruction::StoreEmojiId { emoji } => {
            net.store_emoji(*emoji);
        }
        Instruction::DeleteColdEmoji { limit } => {
            net.prune_emoji(*limit);
        }
        Instruction::QueryValue { .. }
        | Instruction::QueryCircle { .. }
        | Instruction::QueryTripleSum
        | Instruction::QueryTagAgeVar { .. }
        | Instruction::QueryTagValueSum { .. }
        | Instruction::QueryBestAcquaintance { .. }
        | Instruction::QueryCoupleSum
        | Instruction::QueryShortestPath { .. }
        | Instruction::QueryBestContributor { .. }
        | Instruction::QueryReceivedArticles { .. }
        | Instruction::QuerySocialValue { .. }
        | Instruction::QueryReceivedMessages { .. }
        | Instruction::QueryPopularity { .. }
        | Instruction::QueryMoney { .. } => {}
    }
}

/// A value that drops to zero or below removes the relation, which in turn
/// drops each side from the other's tags.
fn modify_relation(net: &mut Network, id1: i32, id2: i32, delta: i32) {
    let Some(current) = net.relation(id1, id2) else {
        return;
    };
    let next = current.saturating_add(delta);
    if next > 0 {
        net.set_relation_value(id1, id2, next);
    } else {
        net.unlink(id1, id2);
    }
}

fn send_message(net: &mut Network, id: i32) {
    let Some(message) = net.take_message(id) else {
        return;
    };
    net.add_social_value(message.sender, message.social_value());
    match message.audience {
        Audience::Person(receiver) => {
            let money = red_envelope_money(&message);
            net.add_money(message.sender, -money);
            net.deliver(receiver, &message, money);
        }
        Audience::Tag(tag) => {
            let members: Vec<i32> = net
                .tag(message.sender, tag)
                .map(|t| t.members.keys().copied().collect())
                .unwrap_or_default();
            let share = match members.len() {
                0 => 0,
                n => red_envelope_money(&message) / i64::try_from(n).unwrap_or(i64::MAX),
            };
            let paid = share * i64::try_from(members.len()).unwrap_or(0);
            net.add_money(message.sender, -paid);
            for member in members {
                net.deliver(member, &message, share);
            }
        }
    }
    if let MessageBody::Emoji { emoji } = message.body {
        net.heat_emoji(emoji);
    }
}

fn red_envelope_money(message: &Message) -> i64 {
    match message.body {
        MessageBody::RedEnvelope { money } => i64::from(money),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::LoadBlock;

    fn base() -> Network {
        let mut net = Network::new();
        apply(
            &mut net,
            &Instruction::LoadNetwork(LoadBlock {
                ids: vec![1, 2, 3],
                names: vec!["a".into(), "b".into(), "c".into()],
                ages: vec![10, 20, 30],
                values: vec![vec![5], vec![5, 0]],
            }),
        );
        net
    }

    #[test]
    fn modify_to_zero_removes_relation_and_tag_membership() {
        let mut net = base();
        apply(&mut net, &Instruction::AddTag { person: 1, tag: 9 });
        apply(
            &mut net,
            &Instruction::AddToTag {
                member: 2,
                owner: 1,
                tag: 9,
            },
        );
        assert!(net.tag_has_member(1, 9, 2));

        apply(
            &mut net,
            &Instruction::ModifyRelation {
                id1: 2,
                id2: 1,
                delta: -5,
            },
        );
        assert!(net.relation(1, 2).is_none());
        assert!(!net.tag_has_member(1, 9, 2));
        assert!(net.person(1).is_some_and(|p| !p.acquaintances.contains_key(&2)));
    }

    #[test]
    fn modify_positive_keeps_relation() {
        let mut net = base();
        apply(
            &mut net,
            &Instruction::ModifyRelation {
                id1: 1,
                id2: 3,
                delta: 7,
            },
        );
        assert_eq!(net.relation(3, 1), Some(12));
    }

    #[test]
    fn point_to_point_red_envelope_moves_money() {
        let mut net = base();
        apply(
            &mut net,
            &Instruction::AddMessage(Message {
                id: 4,
                body: MessageBody::RedEnvelope { money: 10 },
                sender: 1,
                audience: Audience::Person(2),
            }),
        );
        apply(&mut net, &Instruction::SendMessage { id: 4 });
        let sender = net.person(1).expect("sender");
        let receiver = net.person(2).expect("receiver");
        assert_eq!(sender.money, -10);
        assert_eq!(receiver.money, 10);
        assert_eq!(sender.social_value, 50);
        assert_eq!(receiver.social_value, 50);
        assert_eq!(receiver.received_messages.front(), Some(&4));
        assert!(!net.contains_message(4));
    }

    #[test]
    fn social_value_of_a_large_envelope_is_exact() {
        let mut net = base();
        apply(
            &mut net,
            &Instruction::AddMessage(Message {
                id: 5,
                body: MessageBody::RedEnvelope { money: 1_000_000_000 },
                sender: 1,
                audience: Audience::Person(2),
            }),
        );
        apply(&mut net, &Instruction::SendMessage { id: 5 });
        let receiver = net.person(2).expect("receiver");
        assert_eq!(receiver.social_value, 5_000_000_000);
        assert_eq!(receiver.money, 1_000_000_000);
    }

    #[test]
    fn broadcast_red_envelope_splits_evenly() {
        let mut net = base();
        apply(&mut net, &Instruction::AddTag { person: 1, tag: 1 });
        for member in [2, 3] {
            apply(
                &mut net,
                &Instruction::AddToTag {
                    member,
                    owner: 1,
                    tag: 1,
                },
            );
        }
        apply(
            &mut net,
            &Instruction::AddMessage(Message {
                id: 8,
                body: MessageBody::RedEnvelope { money: 11 },
                sender: 1,
                audience: Audience::Tag(1),
            }),
        );
        apply(&mut net, &Instruction::SendMessage { id: 8 });
        assert_eq!(net.person(1).map(|p| p.money), Some(-10));
        assert_eq!(net.person(2).map(|p| p.money), Some(5));
        assert_eq!(net.person(3).map(|p| p.money), Some(5));
    }

    #[test]
    fn forward_delivers_article_and_emoji_heats() {
        let mut net = base();
        apply(&mut net, &Instruction::StoreEmojiId { emoji: 3 });
        apply(
            &mut net,
            &Instruction::AddMessage(Message {
                id: 1,
                body: MessageBody::Emoji { emoji: 3 },
                sender: 1,
                audience: Audience::Person(3),
            }),
        );
        apply(&mut net, &Instruction::SendMessage { id: 1 });
        assert_eq!(net.emoji_heat(3), Some(1));

        apply(
            &mut net,
            &Instruction::CreateAccount {
                person: 1,
                account: 1,
                name: "x".into(),
            },
        );
        apply(
            &mut net,
            &Instruction::ContributeArticle {
                person: 1,
                account: 1,
                article: 42,
            },
        );
        apply(
            &mut net,
            &Instruction::AddMessage(Message {
                id: 2,
                body: MessageBody::Forward { article: 42 },
                sender: 1,
                audience: Audience::Person(2),
            }),
        );
        apply(&mut net, &Instruction::SendMessage { id: 2 });
        assert!(net.person(2).is_some_and(|p| p.has_received_article(42)));
    }

    #[test]
    fn queries_leave_state_untouched() {
        let mut net = base();
        let before = net.clone();
        apply(&mut net, &Instruction::QueryTripleSum);
        apply(&mut net, &Instruction::QueryMoney { person: 1 });
        assert_eq!(net, before);
    }
}
