//! Typed instructions and the line-oriented text protocol.
//!
//! Every instruction renders to one line except the bulk load, which renders
//! as a header line, an id row, a name row, an age row, and `N-1`
//! lower-triangular relation rows of lengths `1..N-1`. Row `i` holds the
//! values between person `i+1` and persons `0..=i`; `0` means unrelated.

use std::fmt;

use crate::command::CommandKind;
use crate::model::{
    AccountId, ArticleId, Audience, EmojiId, Message, MessageBody, MessageId, PersonId, TagId,
};

/// Payload of a bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBlock {
    pub ids: Vec<PersonId>,
    pub names: Vec<String>,
    pub ages: Vec<i32>,
    /// `values[i][j]` relates `ids[i + 1]` and `ids[j]`.
    pub values: Vec<Vec<i32>>,
}

impl LoadBlock {
    /// Two unrelated persons, used when no proper load can be built.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            ids: vec![1, 2],
            names: vec!["p1".to_string(), "p2".to_string()],
            ages: vec![20, 30],
            values: vec![vec![0]],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Lines the block occupies once rendered.
    #[must_use]
    pub fn line_count(&self) -> usize {
        4 + self.len().saturating_sub(1)
    }

    /// Related pairs with positive values, in row order.
    pub fn relations(&self) -> impl Iterator<Item = (PersonId, PersonId, i32)> + '_ {
        self.values.iter().enumerate().flat_map(move |(i, row)| {
            row.iter().enumerate().filter_map(move |(j, &value)| {
                (value > 0).then(|| (self.ids[i + 1], self.ids[j], value))
            })
        })
    }
}

/// One command of the protocol, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    LoadNetwork(LoadBlock),
    AddPerson { id: PersonId, name: String, age: i32 },
    AddRelation { id1: PersonId, id2: PersonId, value: i32 },
    ModifyRelation { id1: PersonId, id2: PersonId, delta: i32 },
    AddTag { person: PersonId, tag: TagId },
    DelTag { person: PersonId, tag: TagId },
    AddToTag { member: PersonId, owner: PersonId, tag: TagId },
    DelFromTag { member: PersonId, owner: PersonId, tag: TagId },
    QueryValue { id1: PersonId, id2: PersonId },
    QueryCircle { id1: PersonId, id2: PersonId },
    QueryTripleSum,
    QueryTagAgeVar { owner: PersonId, tag: TagId },
    QueryTagValueSum { owner: PersonId, tag: TagId },
    QueryBestAcquaintance { person: PersonId },
    QueryCoupleSum,
    QueryShortestPath { id1: PersonId, id2: PersonId },
    CreateAccount { person: PersonId, account: AccountId, name: String },
    DeleteAccount { person: PersonId, account: AccountId },
    ContributeArticle { person: PersonId, account: AccountId, article: ArticleId },
    DeleteArticle { person: PersonId, account: AccountId, article: ArticleId },
    FollowAccount { person: PersonId, account: AccountId },
    QueryBestContributor { account: AccountId },
    QueryReceivedArticles { person: PersonId },
    /// All four add-message commands; the body picks the alias.
    AddMessage(Message),
    SendMessage { id: MessageId },
    QuerySocialValue { person: PersonId },
    QueryReceivedMessages { person: PersonId },
    StoreEmojiId { emoji: EmojiId },
    QueryPopularity { emoji: EmojiId },
    DeleteColdEmoji { limit: i32 },
    QueryMoney { person: PersonId },
}

impl Instruction {
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::LoadNetwork(_) => CommandKind::LoadNetwork,
            Self::AddPerson { .. } => CommandKind::AddPerson,
            Self::AddRelation { .. } => CommandKind::AddRelation,
            Self::ModifyRelation { .. } => CommandKind::ModifyRelation,
            Self::AddTag { .. } => CommandKind::AddTag,
            Self::DelTag { .. } => CommandKind::DelTag,
            Self::AddToTag { .. } => CommandKind::AddToTag,
            Self::DelFromTag { .. } => CommandKind::DelFromTag,
            Self::QueryValue { .. } => CommandKind::QueryValue,
            Self::QueryCircle { .. } => CommandKind::QueryCircle,
            Self::QueryTripleSum => CommandKind::QueryTripleSum,
            Self::QueryTagAgeVar { .. } => CommandKind::QueryTagAgeVar,
            Self::QueryTagValueSum { .. } => CommandKind::QueryTagValueSum,
            Self::QueryBestAcquaintance { .. } => CommandKind::QueryBestAcquaintance,
            Self::QueryCoupleSum => CommandKind::QueryCoupleSum,
            Self::QueryShortestPath { .. } => CommandKind::QueryShortestPath,
            Self::CreateAccount { .. } => CommandKind::CreateAccount,
            Self::DeleteAccount { .. } => CommandKind::DeleteAccount,
            Self::ContributeArticle { .. } => CommandKind::ContributeArticle,
            Self::DeleteArticle { .. } => CommandKind::DeleteArticle,
            Self::FollowAccount { .. } => CommandKind::FollowAccount,
            Self::QueryBestContributor { .. } => CommandKind::QueryBestContributor,
            Self::QueryReceivedArticles { .. } => CommandKind::QueryReceivedArticles,
            Self::AddMessage(message) => match message.body {
                MessageBody::Ordinary { .. } => CommandKind::AddMessage,
                MessageBody::Emoji { .. } => CommandKind::AddEmojiMessage,
                MessageBody::RedEnvelope { .. } => CommandKind::AddRedEnvelopeMessage,
                MessageBody::Forward { .. } => CommandKind::AddForwardMessage,
            },
            Self::SendMessage { .. } => CommandKind::SendMessage,
            Self::QuerySocialValue { .. } => CommandKind::QuerySocialValue,
            Self::QueryReceivedMessages { .. } => CommandKind::QueryReceivedMessages,
            Self::StoreEmojiId { .. } => CommandKind::StoreEmojiId,
            Self::QueryPopularity { .. } => CommandKind::QueryPopularity,
            Self::DeleteColdEmoji { .. } => CommandKind::DeleteColdEmoji,
            Self::QueryMoney { .. } => CommandKind::QueryMoney,
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        match self {
            Self::LoadNetwork(block) => block.line_count(),
            _ => 1,
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for LoadBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ln {}", self.len())?;
        join(f, &self.ids)?;
        f.write_str("\n")?;
        join(f, &self.names)?;
        f.write_str("\n")?;
        join(f, &self.ages)?;
        for row in &self.values {
            f.write_str("\n")?;
            join(f, row)?;
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alias = self.kind().alias();
        match self {
            Self::LoadNetwork(block) => write!(f, "{block}"),
            Self::AddPerson { id, name, age } => write!(f, "{alias} {id} {name} {age}"),
            Self::AddRelation { id1, id2, value: third }
            | Self::ModifyRelation { id1, id2, delta: third } => {
                write!(f, "{alias} {id1} {id2} {third}")
            }
            Self::AddTag { person, tag } | Self::DelTag { person, tag } => {
                write!(f, "{alias} {person} {tag}")
            }
            Self::AddToTag { member, owner, tag } | Self::DelFromTag { member, owner, tag } => {
                write!(f, "{alias} {member} {owner} {tag}")
            }
            Self::QueryValue { id1, id2 }
            | Self::QueryCircle { id1, id2 }
            | Self::QueryShortestPath { id1, id2 } => write!(f, "{alias} {id1} {id2}"),
            Self::QueryTagAgeVar { owner, tag } | Self::QueryTagValueSum { owner, tag } => {
                write!(f, "{alias} {owner} {tag}")
            }
            Self::QueryTripleSum | Self::QueryCoupleSum => f.write_str(alias),
            Self::CreateAccount {
                person,
                account,
                name,
            } => write!(f, "{alias} {person} {account} {name}"),
            Self::DeleteAccount { person, account } | Self::FollowAccount { person, account } => {
                write!(f, "{alias} {person} {account}")
            }
            Self::ContributeArticle {
                person,
                account,
                article,
            }
            | Self::DeleteArticle {
                person,
                account,
                article,
            } => write!(f, "{alias} {person} {account} {article}"),
            Self::QueryBestContributor { account: id }
            | Self::QueryBestAcquaintance { person: id }
            | Self::QueryReceivedArticles { person: id }
            | Self::QuerySocialValue { person: id }
            | Self::QueryReceivedMessages { person: id }
            | Self::QueryMoney { person: id }
            | Self::SendMessage { id }
            | Self::StoreEmojiId { emoji: id }
            | Self::QueryPopularity { emoji: id }
            | Self::DeleteColdEmoji { limit: id } => write!(f, "{alias} {id}"),
            Self::AddMessage(m) => write!(
                f,
                "{alias} {} {} {} {} {}",
                m.id,
                m.body.argument(),
                m.audience.type_flag(),
                m.sender,
                m.audience.id()
            ),
        }
    }
}

/// Render a sequence the way the output file stores it.
#[must_use]
pub fn render(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Why a line could not be read back as an instruction. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: unknown command '{alias}'")]
    UnknownCommand { line: usize, alias: String },

    #[error("line {line}: '{alias}' takes {expected} arguments, found {found}")]
    Arity {
        line: usize,
        alias: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: '{token}' is not an integer")]
    InvalidInteger { line: usize, token: String },

    #[error("line {line}: message type must be 0 or 1, found {found}")]
    MessageType { line: usize, found: i32 },

    #[error("line {line}: bulk load of {expected} persons ended early")]
    TruncatedLoad { line: usize, expected: usize },

    #[error("line {line}: expected {expected} values, found {found}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },
}

struct Line<'a> {
    number: usize,
    alias: &'static str,
    args: Vec<&'a str>,
}

impl Line<'_> {
    fn expect(&self, expected: usize) -> Result<(), ParseError> {
        if self.args.len() == expected {
            Ok(())
        } else {
            Err(ParseError::Arity {
                line: self.number,
                alias: self.alias,
                expected,
                found: self.args.len(),
            })
        }
    }

    fn int(&self, index: usize) -> Result<i32, ParseError> {
        parse_int(self.number, self.args[index])
    }

    fn text(&self, index: usize) -> String {
        self.args[index].to_string()
    }

    fn ints<const N: usize>(&self) -> Result<[i32; N], ParseError> {
        self.expect(N)?;
        let mut out = [0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.int(i)?;
        }
        Ok(out)
    }

    fn message(&self, kind: CommandKind) -> Result<Message, ParseError> {
        let [id, argument, flag, sender, target] = self.ints::<5>()?;
        let audience = match flag {
            0 => Audience::Person(target),
            1 => Audience::Tag(target),
            found => {
                return Err(ParseError::MessageType {
                    line: self.number,
                    found,
                });
            }
        };
        let body = match kind {
            CommandKind::AddEmojiMessage => MessageBody::Emoji { emoji: argument },
            CommandKind::AddRedEnvelopeMessage => MessageBody::RedEnvelope { money: argument },
            CommandKind::AddForwardMessage => MessageBody::Forward { article: argument },
            _ => MessageBody::Ordinary {
                social_value: argument,
            },
        };
        Ok(Message {
            id,
            body,
            sender,
            audience,
        })
    }
}

fn parse_int(line: usize, token: &str) -> Result<i32, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidInteger {
        line,
        token: token.to_string(),
    })
}

/// Parse a whole instruction file. Blank lines are skipped.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered.
pub fn parse(text: &str) -> Result<Vec<Instruction>, ParseError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());
    let mut out = Vec::new();
    while let Some((number, raw)) = lines.next() {
        let mut tokens = raw.split_whitespace();
        let head = tokens.next().unwrap_or_default();
        let kind = CommandKind::from_alias(head).ok_or_else(|| ParseError::UnknownCommand {
            line: number,
            alias: head.to_string(),
        })?;
        let line = Line {
            number,
            alias: kind.alias(),
            args: tokens.collect(),
        };
        let instruction = if kind == CommandKind::LoadNetwork {
            line.expect(1)?;
            let n = parse_count(number, line.args[0])?;
            Instruction::LoadNetwork(parse_load(n, number, &mut lines)?)
        } else {
            parse_single(kind, &line)?
        };
        out.push(instruction);
    }
    Ok(out)
}

fn parse_count(line: usize, token: &str) -> Result<usize, ParseError> {
    token
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ParseError::InvalidInteger {
            line,
            token: token.to_string(),
        })
}

fn parse_load<'a>(
    n: usize,
    header: usize,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> Result<LoadBlock, ParseError> {
    let mut next_row = |expected: usize| -> Result<(usize, Vec<&'a str>), ParseError> {
        let (number, raw) = lines.next().ok_or(ParseError::TruncatedLoad {
            line: header,
            expected: n,
        })?;
        let row: Vec<&str> = raw.split_whitespace().collect();
        if row.len() == expected {
            Ok((number, row))
        } else {
            Err(ParseError::RowLength {
                line: number,
                expected,
                found: row.len(),
            })
        }
    };
    let ints = |number: usize, row: Vec<&str>| -> Result<Vec<i32>, ParseError> {
        row.into_iter().map(|t| parse_int(number, t)).collect()
    };

    let (number, row) = next_row(n)?;
    let ids = ints(number, row)?;
    let (_, row) = next_row(n)?;
    let names = row.into_iter().map(str::to_string).collect();
    let (number, row) = next_row(n)?;
    let ages = ints(number, row)?;
    let mut values = Vec::with_capacity(n.saturating_sub(1));
    for len in 1..n {
        let (number, row) = next_row(len)?;
        values.push(ints(number, row)?);
    }
    Ok(LoadBlock {
        ids,
        names,
        ages,
        values,
    })
}

fn parse_single(kind: CommandKind, line: &Line<'_>) -> Result<Instruction, ParseError> {
    use CommandKind as K;
    Ok(match kind {
        K::AddPerson => {
            line.expect(3)?;
            Instruction::AddPerson {
                id: line.int(0)?,
                name: line.text(1),
                age: line.int(2)?,
            }
        }
        K::AddRelation => {
            let [id1, id2, value] = line.ints()?;
            Instruction::AddRelation { id1, id2, value }
        }
        K::ModifyRelation => {
            let [id1, id2, delta] = line.ints()?;
            Instruction::ModifyRelation { id1, id2, delta }
        }
        K::AddTag => {
            let [person, tag] = line.ints()?;
            Instruction::AddTag { person, tag }
        }
        K::DelTag => {
            let [person, tag] = line.ints()?;
            Instruction::DelTag { person, tag }
        }
        K::AddToTag => {
            let [member, owner, tag] = line.ints()?;
            Instruction::AddToTag { member, owner, tag }
        }
        K::DelFromTag => {
            let [member, owner, tag] = line.ints()?;
            Instruction::DelFromTag { member, owner, tag }
        }
        K::QueryValue => {
            let [id1, id2] = line.ints()?;
            Instruction::QueryValue { id1, id2 }
        }
        K::QueryCircle => {
            let [id1, id2] = line.ints()?;
            Instruction::QueryCircle { id1, id2 }
        }
        K::QueryShortestPath => {
            let [id1, id2] = line.ints()?;
            Instruction::QueryShortestPath { id1, id2 }
        }
        K::QueryTripleSum => {
            line.ints::<0>()?;
            Instruction::QueryTripleSum
        }
        K::QueryCoupleSum => {
            line.ints::<0>()?;
            Instruction::QueryCoupleSum
        }
        K::QueryTagAgeVar => {
            let [owner, tag] = line.ints()?;
            Instruction::QueryTagAgeVar { owner, tag }
        }
        K::QueryTagValueSum => {
            let [owner, tag] = line.ints()?;
            Instruction::QueryTagValueSum { owner, tag }
        }
        K::QueryBestAcquaintance => {
            let [person] = line.ints()?;
            Instruction::QueryBestAcquaintance { person }
        }
        K::CreateAccount => {
            line.expect(3)?;
            Instruction::CreateAccount {
                person: line.int(0)?,
                account: line.int(1)?,
                name: line.text(2),
            }
        }
        K::DeleteAccount => {
            let [person, account] = line.ints()?;
            Instruction::DeleteAccount { person, account }
        }
        K::FollowAccount => {
            let [person, account] = line.ints()?;
            Instruction::FollowAccount { person, account }
        }
        K::ContributeArticle => {
            let [person, account, article] = line.ints()?;
            Instruction::ContributeArticle {
                person,
                account,
                article,
            }
        }
        K::DeleteArticle => {
            let [person, account, article] = line.ints()?;
            Instruction::DeleteArticle {
                person,
                account,
                article,
            }
        }
        K::QueryBestContributor => {
            let [account] = line.ints()?;
            Instruction::QueryBestContributor { account }
        }
        K::QueryReceivedArticles => {
            let [person] = line.ints()?;
            Instruction::QueryReceivedArticles { person }
        }
        K::AddMessage | K::AddRedEnvelopeMessage | K::AddForwardMessage | K::AddEmojiMessage => {
            Instruction::AddMessage(line.message(kind)?)
        }
        K::SendMessage => {
            let [id] = line.ints()?;
            Instruction::SendMessage { id }
        }
        K::QuerySocialValue => {
            let [person] = line.ints()?;
            Instruction::QuerySocialValue { person }
        }
        K::QueryReceivedMessages => {
            let [person] = line.ints()?;
            Instruction::QueryReceivedMessages { person }
        }
        K::StoreEmojiId => {
            let [emoji] = line.ints()?;
            Instruction::StoreEmojiId { emoji }
        }
        K::QueryPopularity => {
            let [emoji] = line.ints()?;
            Instruction::QueryPopularity { emoji }
        }
        K::DeleteColdEmoji => {
            let [limit] = line.ints()?;
            Instruction::DeleteColdEmoji { limit }
        }
        K::QueryMoney => {
            let [person] = line.ints()?;
            Instruction::QueryMoney { person }
        }
        K::LoadNetwork => unreachable!("bulk load is parsed by the caller"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_block_layout() {
        let block = LoadBlock {
            ids: vec![4, -2, 9],
            names: vec!["a".into(), "b".into(), "c".into()],
            ages: vec![1, 2, 3],
            values: vec![vec![5], vec![0, 7]],
        };
        let text = Instruction::LoadNetwork(block.clone()).to_string();
        assert_eq!(text, "ln 3\n4 -2 9\na b c\n1 2 3\n5\n0 7");
        assert_eq!(block.line_count(), text.lines().count());
        let rels: Vec<_> = block.relations().collect();
        assert_eq!(rels, vec![(-2, 4, 5), (9, -2, 7)]);
    }

    #[test]
    fn single_person_load_has_no_relation_rows() {
        let block = LoadBlock {
            ids: vec![1],
            names: vec!["x".into()],
            ages: vec![10],
            values: Vec::new(),
        };
        assert_eq!(block.line_count(), 4);
        let parsed = parse(&render(&[Instruction::LoadNetwork(block.clone())]));
        assert_eq!(parsed, Ok(vec![Instruction::LoadNetwork(block)]));
    }

    #[test]
    fn message_lines_render_type_flag() {
        let m = Instruction::AddMessage(Message {
            id: 12,
            body: MessageBody::RedEnvelope { money: 30 },
            sender: 3,
            audience: Audience::Tag(-8),
        });
        assert_eq!(m.to_string(), "arem 12 30 1 3 -8");
        assert_eq!(m.kind(), CommandKind::AddRedEnvelopeMessage);
    }

    #[test]
    fn parse_reads_back_mixed_sequence() {
        let text = "ln 2\n1 2\np1 p2\n20 30\n0\nap 3 bob 44\n\nqts\nam 5 -9 0 1 2\natt 1 2 -3\n";
        let parsed = parse(text).expect("valid text");
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[0], Instruction::LoadNetwork(LoadBlock::minimal()));
        assert_eq!(render(&parsed), text.replace("\n\n", "\n"));
    }

    #[test]
    fn parse_reports_line_numbers() {
        assert_eq!(
            parse("ap 1 a 2\nxx 3"),
            Err(ParseError::UnknownCommand {
                line: 2,
                alias: "xx".into()
            })
        );
        assert!(matches!(
            parse("qv 1"),
            Err(ParseError::Arity {
                line: 1,
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            parse("am 1 2 5 1 2"),
            Err(ParseError::MessageType { found: 5, .. })
        ));
        assert!(matches!(
            parse("ln 3\n1 2 3\na b c"),
            Err(ParseError::TruncatedLoad { line: 1, .. })
        ));
        assert!(matches!(
            parse("ln 2\n1 2\na b\n1 1\n3 4"),
            Err(ParseError::RowLength { line: 5, .. })
        ));
    }
}
