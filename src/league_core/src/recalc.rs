use std::collections::HashMap;
use tracing::debug;

use crate::match_record::MatchRecord;
use crate::rating::{RatingChange, RatingEngine};

/// Team name to current Elo rating
pub type Ratings = HashMap<String, f64>;

/// Team name to matches played
pub type MatchCounts = HashMap<String, u32>;

/// Apply one match to the running rating state and fill in the record's
/// rating snapshot. Teams not yet rated enter at the initial rating.
///
/// Both live recording and history replay go through here, so the two
/// paths perform the same floating-point operations in the same order.
pub fn apply_match(
    engine: &RatingEngine,
    ratings: &mut Ratings,
    match_counts: &mut MatchCounts,
    record: &mut MatchRecord,
) -> RatingChange {
    let initial = engine.config().initial_rating;
    let rating_a = ratings.get(&record.team_a).copied().unwrap_or(initial);
    let rating_b = ratings.get(&record.team_b).copied().unwrap_or(initial);
    let matches_a = match_counts.get(&record.team_a).copied().unwrap_or(0);
    let matches_b = match_counts.get(&record.team_b).copied().unwrap_or(0);

    let change = engine.rating_delta(
        rating_a,
        rating_b,
        matches_a,
        matches_b,
        record.goals_a,
        record.goals_b,
        record.venue,
    );

    let new_rating_a = rating_a + change.change_a;
    let new_rating_b = rating_b + change.change_b;

    record.rating_a_before = rating_a;
    record.rating_b_before = rating_b;
    record.rating_a_after = new_rating_a;
    record.rating_b_after = new_rating_b;
    record.change_a = change.change_a;
    record.change_b = change.change_b;

    ratings.insert(record.team_a.clone(), new_rating_a);
    ratings.insert(record.team_b.clone(), new_rating_b);
    match_counts.insert(record.team_a.clone(), matches_a + 1);
    match_counts.insert(record.team_b.clone(), matches_b + 1);

    change
}

/// Rebuild every rating from scratch by replaying the history in order.
///
/// Each record's rating snapshot is overwritten. Returns fresh rating and
/// match count maps covering every team in the history.
pub fn recalculate_all_ratings(
    engine: &RatingEngine,
    history: &mut [MatchRecord],
) -> (Ratings, MatchCounts) {
    let mut ratings = Ratings::new();
    let mut match_counts = MatchCounts::new();

    for record in history.iter_mut() {
        apply_match(engine, &mut ratings, &mut match_counts, record);
    }

    debug!(
        matches = history.len(),
        teams = ratings.len(),
        "replayed match history"
    );

    (ratings, match_counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeagueConfig;
    use crate::match_record::Venue;
    use chrono::NaiveDateTime;

    fn engine() -> RatingEngine {
        RatingEngine::new(LeagueConfig::default())
    }

    fn history() -> Vec<MatchRecord> {
        let games = [
            ("Lions", "Tigers", 2, 0, Venue::HomeA),
            ("Bears", "Wolves", 1, 1, Venue::HomeA),
            ("Tigers", "Bears", 3, 1, Venue::Neutral),
            ("Wolves", "Lions", 0, 4, Venue::HomeB),
            ("Lions", "Bears", 1, 2, Venue::HomeA),
        ];
        games
            .iter()
            .enumerate()
            .map(|(i, &(a, b, ga, gb, venue))| {
                MatchRecord::new(i as u32 + 1, NaiveDateTime::default(), a, b, ga, gb, venue)
            })
            .collect()
    }

    #[test]
    fn test_replay_matches_incremental() {
        let engine = engine();
        let mut live = history();
        let mut ratings = Ratings::new();
        let mut counts = MatchCounts::new();
        for record in live.iter_mut() {
            apply_match(&engine, &mut ratings, &mut counts, record);
        }

        let mut replayed = history();
        let (replay_ratings, replay_counts) = recalculate_all_ratings(&engine, &mut replayed);

        assert_eq!(ratings, replay_ratings);
        assert_eq!(counts, replay_counts);
        assert_eq!(live, replayed);
    }

    #[test]
    fn test_recalculation_idempotent() {
        let engine = engine();
        let mut history = history();
        let first = recalculate_all_ratings(&engine, &mut history);
        let snapshot = history.clone();
        let second = recalculate_all_ratings(&engine, &mut history);

        assert_eq!(first, second);
        assert_eq!(snapshot, history);
    }

    #[test]
    fn test_ratings_are_zero_sum() {
        let engine = engine();
        let mut history = history();
        let (ratings, counts) = recalculate_all_ratings(&engine, &mut history);

        let total: f64 = ratings.values().sum();
        assert!((total - 4.0 * 1500.0).abs() < 1e-9);
        assert_eq!(counts["Lions"], 3);
        assert_eq!(counts["Wolves"], 2);
    }

    #[test]
    fn test_stale_snapshot_overwritten() {
        let engine = engine();
        let mut history = history();
        history[0].rating_a_before = 9999.0;
        history[0].change_a = 123.0;
        recalculate_all_ratings(&engine, &mut history);

        assert_eq!(history[0].rating_a_before, 1500.0);
        assert_eq!(history[0].change_a, -history[0].change_b);
        assert_eq!(history[1].rating_a_before, 1500.0);
        assert_eq!(history[2].rating_a_before, history[0].rating_b_after);
    }

    #[test]
    fn test_empty_history() {
        let (ratings, counts) = recalculate_all_ratings(&engine(), &mut []);
        assert!(ratings.is_empty());
        assert!(counts.is_empty());
    }
}
