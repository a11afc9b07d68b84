//! Interest and match reconciliation.
//!
//! An `Interest` is the directed record of one user's intent, a `Match` the
//! undirected pair with the set of members that expressed it. Every function
//! here leaves the two in agreement: a match is mutual exactly when both
//! members sent interest, and then every interest between them is accepted.

use serde::Serialize;
use uuid::Uuid;

use rishta_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Interest, InterestStatus, Match, User};
use crate::store::{Store, Withdrawal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Pending,
    Friends,
}

impl PairStatus {
    pub fn of(pair: &Match) -> Self {
        if pair.is_mutual() {
            PairStatus::Friends
        } else {
            PairStatus::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Debug, Clone)]
pub struct ExpressOutcome {
    pub interest: Interest,
    pub pair: Match,
    pub status: PairStatus,
    /// The sender had already expressed interest on this pair; nothing changed.
    pub already_sent: bool,
    /// This call turned a one-sided match into a mutual one.
    pub became_mutual: bool,
}

#[derive(Debug, Clone)]
pub struct RespondOutcome {
    pub interest: Interest,
    /// The match after the response; `None` when a reject removed it or none existed.
    pub pair: Option<Match>,
    pub became_mutual: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CancelOutcome {
    pub interest_deleted: bool,
    pub match_deleted: Option<Match>,
}

fn record(transition: &'static str) {
    metrics::counter!("rishta_interest_transitions_total", "transition" => transition).increment(1);
}

fn require_user<S: Store + ?Sized>(store: &S, user: Uuid) -> AppResult<User> {
    store
        .find_user(user)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
}

/// Both ends of a new interest must exist, and the receiver must still be active.
fn require_parties<S: Store + ?Sized>(store: &S, sender: Uuid, receiver: Uuid) -> AppResult<()> {
    require_user(store, sender)?;
    if !require_user(store, receiver)?.is_active {
        return Err(AppError::new(ErrorCode::AccountInactive, "this account is no longer active"));
    }
    Ok(())
}

/// Loads a match and checks that `user` belongs to it.
pub fn require_member<S: Store + ?Sized>(store: &S, match_id: Uuid, user: Uuid) -> AppResult<Match> {
    let pair = store
        .find_match(match_id)?
        .ok_or_else(|| AppError::new(ErrorCode::MatchNotFound, "match not found"))?;
    if !pair.has_member(user) {
        return Err(AppError::new(ErrorCode::NotMatchMember, "you are not part of this match"));
    }
    Ok(pair)
}

pub fn are_friends<S: Store + ?Sized>(store: &S, a: Uuid, b: Uuid) -> AppResult<bool> {
    Ok(store.find_match_by_pair(a, b)?.is_some_and(|m| m.is_mutual()))
}

/// Records `sender`'s interest in `receiver` on both the directed interest and
/// the pair's match, promoting the pair to friends when the interest is
/// reciprocated. Repeating the call is a no-op reported through `already_sent`.
pub fn express_interest<S: Store + ?Sized>(
    store: &S,
    sender: Uuid,
    receiver: Uuid,
) -> AppResult<ExpressOutcome> {
    if sender == receiver {
        return Err(AppError::new(ErrorCode::CannotTargetSelf, "cannot express interest in yourself"));
    }
    require_parties(store, sender, receiver)?;

    let prior = store.find_match_by_pair(sender, receiver)?;
    let already_sent = prior.as_ref().is_some_and(|m| m.has_sent(sender));
    let was_mutual = prior.as_ref().is_some_and(|m| m.is_mutual());

    let (mut interest, _) = store.insert_interest(sender, receiver)?;
    if interest.status == InterestStatus::Rejected {
        interest = store.set_interest_status(interest.id, InterestStatus::Pending)?;
        record("reopened");
    }

    let pair = store.add_interest_flags(sender, receiver, &[sender])?;
    let became_mutual = pair.is_mutual() && !was_mutual;

    if pair.is_mutual() {
        store.set_pair_interest_status(sender, receiver, InterestStatus::Accepted)?;
        interest.status = InterestStatus::Accepted;
    }

    if became_mutual {
        record("mutual");
        tracing::info!(match_id = %pair.id, user_a = %sender, user_b = %receiver, "match became mutual");
    } else if !already_sent {
        record("expressed");
    }

    Ok(ExpressOutcome {
        status: PairStatus::of(&pair),
        interest,
        pair,
        already_sent,
        became_mutual,
    })
}

/// Creates only the directed interest, leaving the match to be formed when
/// the receiver accepts. A rejected interest is re-opened.
pub fn send_interest<S: Store + ?Sized>(store: &S, sender: Uuid, receiver: Uuid) -> AppResult<Interest> {
    if sender == receiver {
        return Err(AppError::new(ErrorCode::CannotTargetSelf, "cannot send interest to yourself"));
    }
    require_parties(store, sender, receiver)?;

    let (interest, inserted) = store.insert_interest(sender, receiver)?;
    if inserted {
        record("expressed");
        return Ok(interest);
    }

    match interest.status {
        InterestStatus::Rejected => {
            record("reopened");
            store.set_interest_status(interest.id, InterestStatus::Pending)
        }
        InterestStatus::Pending | InterestStatus::Accepted => {
            Err(AppError::new(ErrorCode::InterestAlreadySent, "interest already sent"))
        }
    }
}

pub fn respond_to_interest<S: Store + ?Sized>(
    store: &S,
    interest_id: Uuid,
    responder: Uuid,
    decision: Decision,
) -> AppResult<RespondOutcome> {
    let interest = store
        .find_interest(interest_id)?
        .ok_or_else(|| AppError::new(ErrorCode::InterestNotFound, "interest not found"))?;

    if interest.to_user != responder {
        return Err(AppError::forbidden("only the recipient can respond to this interest"));
    }

    let (from, to) = (interest.from_user, interest.to_user);

    match decision {
        Decision::Accept => {
            if interest.status == InterestStatus::Accepted {
                return Err(AppError::new(ErrorCode::InterestAlreadyResolved, "interest already accepted"));
            }
            let was_mutual = store.find_match_by_pair(from, to)?.is_some_and(|m| m.is_mutual());
            let pair = store.add_interest_flags(from, to, &[from, to])?;
            store.set_pair_interest_status(from, to, InterestStatus::Accepted)?;
            let interest = store.set_interest_status(interest.id, InterestStatus::Accepted)?;

            record("accepted");
            let became_mutual = !was_mutual;
            if became_mutual {
                record("mutual");
            }
            Ok(RespondOutcome { interest, pair: Some(pair), became_mutual })
        }
        Decision::Reject => {
            match interest.status {
                InterestStatus::Accepted => {
                    return Err(AppError::new(
                        ErrorCode::InterestAlreadyResolved,
                        "interest already accepted",
                    ));
                }
                InterestStatus::Rejected => {
                    let pair = store.find_match_by_pair(from, to)?;
                    return Ok(RespondOutcome { interest, pair, became_mutual: false });
                }
                InterestStatus::Pending => {}
            }

            let interest = store.set_interest_status(interest.id, InterestStatus::Rejected)?;

            // Withdraw the sender's one-sided flag; a mutual match stays.
            let pair = match store.find_match_by_pair(from, to)? {
                Some(m) => match store.withdraw_interest(m.id, from)? {
                    Withdrawal::Deleted(_) | Withdrawal::Missing => None,
                    Withdrawal::Mutual(m) => Some(m),
                    Withdrawal::NotSent => Some(m),
                },
                None => None,
            };

            record("rejected");
            Ok(RespondOutcome { interest, pair, became_mutual: false })
        }
    }
}

/// Withdraws `sender`'s interest in `receiver`: the pending interest is
/// deleted and the sender leaves the match's sender set, deleting the match
/// when nobody is left. Friends cannot be cancelled, only unfriended.
pub fn cancel_interest<S: Store + ?Sized>(
    store: &S,
    sender: Uuid,
    receiver: Uuid,
) -> AppResult<CancelOutcome> {
    let pair = store.find_match_by_pair(sender, receiver)?;
    if pair.as_ref().is_some_and(|m| m.is_mutual()) {
        return Err(AppError::new(
            ErrorCode::CannotCancelMutual,
            "you are already matched; unfriend instead",
        ));
    }

    let mut outcome = CancelOutcome::default();

    // The flag goes first: if the pair turned mutual meanwhile, nothing is touched.
    if let Some(m) = pair {
        match store.withdraw_interest(m.id, sender)? {
            Withdrawal::Deleted(m) => outcome.match_deleted = Some(m),
            Withdrawal::Mutual(_) => {
                // reciprocated between the read above and the lock
                return Err(AppError::new(
                    ErrorCode::CannotCancelMutual,
                    "you are already matched; unfriend instead",
                ));
            }
            Withdrawal::NotSent | Withdrawal::Missing => {}
        }
    }
    outcome.interest_deleted = store.delete_pending_interest(sender, receiver)?;

    if !outcome.interest_deleted && outcome.match_deleted.is_none() {
        return Err(AppError::new(ErrorCode::InterestNotFound, "no pending interest to cancel"));
    }

    record("cancelled");
    Ok(outcome)
}

/// Cancel addressed by interest id. Only the sender may cancel, and only
/// while the interest is pending.
pub fn cancel_interest_by_id<S: Store + ?Sized>(
    store: &S,
    interest_id: Uuid,
    requester: Uuid,
) -> AppResult<CancelOutcome> {
    let interest = store
        .find_interest(interest_id)?
        .ok_or_else(|| AppError::new(ErrorCode::InterestNotFound, "interest not found"))?;
    if interest.from_user != requester {
        return Err(AppError::forbidden("only the sender can cancel this interest"));
    }
    if interest.status != InterestStatus::Pending {
        return Err(AppError::new(ErrorCode::InterestAlreadyResolved, "interest already resolved"));
    }
    cancel_interest(store, interest.from_user, interest.to_user)
}

/// Cancel addressed by match id, on behalf of the requesting member.
pub fn cancel_by_match<S: Store + ?Sized>(
    store: &S,
    match_id: Uuid,
    requester: Uuid,
) -> AppResult<CancelOutcome> {
    let pair = require_member(store, match_id, requester)?;
    cancel_interest(store, requester, pair.other(requester))
}

/// Dissolves the pair: messages and match are deleted and every interest
/// between the two users is marked rejected.
pub fn unfriend<S: Store + ?Sized>(store: &S, match_id: Uuid, requester: Uuid) -> AppResult<Match> {
    let pair = require_member(store, match_id, requester)?;
    let removed = store.dissolve_match(&pair, true)?;

    record("unfriended");
    tracing::info!(match_id = %pair.id, requester = %requester, messages = removed, "pair unfriended");
    Ok(pair)
}

/// Deletes the conversation and its match, leaving interests untouched.
pub fn delete_conversation<S: Store + ?Sized>(
    store: &S,
    match_id: Uuid,
    requester: Uuid,
) -> AppResult<Match> {
    let pair = require_member(store, match_id, requester)?;
    store.dissolve_match(&pair, false)?;
    record("conversation_deleted");
    Ok(pair)
}
