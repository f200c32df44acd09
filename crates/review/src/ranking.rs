//! Public advocate ranking.
//!
//! One ordering rule serves both the public listing and `my rank`: course
//! count descending, display name ascending, user id as the stable tie-break.

use serde::{Deserialize, Serialize};

use coursehub_core::UserId;

use crate::profile::AdvocateProfile;

/// An approved profile annotated with its position in the public listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedAdvocate {
    pub profile: AdvocateProfile,
    pub course_count: u64,
    /// 1-based.
    pub rank: usize,
}

/// Order approved profiles for the public listing.
///
/// Non-approved entries are dropped here rather than trusted to be
/// pre-filtered, so listing and rank can never diverge.
pub fn rank_advocates(entries: Vec<(AdvocateProfile, u64)>) -> Vec<RankedAdvocate> {
    let mut approved: Vec<(AdvocateProfile, u64)> = entries
        .into_iter()
        .filter(|(profile, _)| profile.is_public())
        .collect();

    approved.sort_by(|(a, a_count), (b, b_count)| {
        b_count
            .cmp(a_count)
            .then_with(|| a.public_name.to_lowercase().cmp(&b.public_name.to_lowercase()))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    approved
        .into_iter()
        .enumerate()
        .map(|(i, (profile, course_count))| RankedAdvocate {
            profile,
            course_count,
            rank: i + 1,
        })
        .collect()
}

/// 1-based rank of a user in the public ordering, or `None` when the user has
/// no approved profile.
pub fn my_rank(ranked: &[RankedAdvocate], user_id: UserId) -> Option<usize> {
    ranked
        .iter()
        .find(|r| r.profile.user_id == user_id)
        .map(|r| r.rank)
}
