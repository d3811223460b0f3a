use crate::catalog::FailureKind as F;
use crate::instruction::Instruction;
use crate::model::{ARTICLE_POOL, AccountId, PersonId};

use super::Request;
use super::sample::Sampler;

/// Person-missing and account-missing shapes shared by the account commands.
fn missing_target(s: &mut Sampler<'_>, kind: F) -> Option<(PersonId, AccountId)> {
    match kind {
        F::PersonMissing => Some((s.missing_person()?, s.any_account())),
        F::AccountMissing => Some((s.person()?, s.missing_account()?)),
        _ => None,
    }
}

pub fn create_account(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (person, account) = match request {
        Request::Normal => (s.person()?, s.missing_account()?),
        Request::Failure(F::DuplicateAccount) => (s.person()?, s.account()?),
        Request::Failure(F::PersonMissing) => (s.missing_person()?, s.any_account()),
        Request::Failure(_) => return None,
    };
    Some(Instruction::CreateAccount {
        person,
        account,
        name: s.name(),
    })
}

pub fn delete_account(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (person, account) = match request {
        Request::Normal => {
            let account = s.account()?;
            (s.net.account(account)?.owner, account)
        }
        Request::Failure(F::DeleteAccountDenied) => {
            let account = s.account()?;
            let owner = s.net.account(account)?.owner;
            (s.person_other_than(owner)?, account)
        }
        Request::Failure(kind) => missing_target(s, kind)?,
    };
    Some(Instruction::DeleteAccount { person, account })
}

pub fn contribute_article(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (person, account, article) = match request {
        Request::Normal => {
            let account = s.account()?;
            (s.follower_of(account)?, account, s.fresh_article()?)
        }
        Request::Failure(F::DuplicateArticle) => {
            let account = s.account()?;
            let person = if s.rng.coin() {
                s.follower_of(account)?
            } else {
                s.person()?
            };
            (person, account, s.existing_article()?)
        }
        Request::Failure(F::ContributeDenied) => {
            let account = s.account()?;
            (s.non_follower_of(account)?, account, s.fresh_article()?)
        }
        Request::Failure(kind) => {
            let (person, account) = missing_target(s, kind)?;
            (person, account, s.any_article())
        }
    };
    Some(Instruction::ContributeArticle {
        person,
        account,
        article,
    })
}

pub fn delete_article(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (person, account, article) = match request {
        Request::Normal => {
            let account = s.account_with_articles()?;
            let owner = s.net.account(account)?.owner;
            (owner, account, s.article_of(account)?)
        }
        Request::Failure(F::ArticleNotInAccount) => {
            let account = s.account()?;
            let net = s.net;
            let acc = net.account(account)?;
            let article = s.missing_in(ARTICLE_POOL, |a| acc.articles.contains(&a))?;
            (s.person()?, account, article)
        }
        Request::Failure(F::DeleteArticleDenied) => {
            let account = s.account_with_articles()?;
            let owner = s.net.account(account)?.owner;
            (s.person_other_than(owner)?, account, s.article_of(account)?)
        }
        Request::Failure(kind) => {
            let (person, account) = missing_target(s, kind)?;
            (person, account, s.any_article())
        }
    };
    Some(Instruction::DeleteArticle {
        person,
        account,
        article,
    })
}

pub fn follow_account(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let (person, account) = match request {
        Request::Normal => {
            let account = s.account()?;
            (s.non_follower_of(account)?, account)
        }
        Request::Failure(F::AlreadyFollower) => {
            let account = s.account()?;
            (s.follower_of(account)?, account)
        }
        Request::Failure(kind) => missing_target(s, kind)?,
    };
    Some(Instruction::FollowAccount { person, account })
}

pub fn query_best_contributor(s: &mut Sampler<'_>, request: Request) -> Option<Instruction> {
    let account = match request {
        Request::Normal => s.account()?,
        Request::Failure(F::AccountMissing) => s.missing_account()?,
        Request::Failure(_) => return None,
    };
    Some(Instruction::QueryBestContributor { account })
}
