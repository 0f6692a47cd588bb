//! Journey ranking for search results.
//!
//! Orders matched journeys so the most useful trains come first for a
//! passenger standing at the boarding station.

use std::cmp::Ordering;

use chrono::{Local, NaiveDate};

use super::matcher::MatchedJourney;

/// Compare two journeys for ranking.
///
/// Journeys are ranked by:
/// 1. Origin priority (trains starting at the boarding station first)
/// 2. Departure timestamp on `date_ref` (earlier is better)
/// 3. Train number, lexicographically, with no number sorting as ""
fn compare(a: &MatchedJourney, b: &MatchedJourney, date_ref: NaiveDate) -> Ordering {
    b.originates
        .cmp(&a.originates)
        .then_with(|| a.departure_at(date_ref).cmp(&b.departure_at(date_ref)))
        .then_with(|| a.train.sort_number().cmp(b.train.sort_number()))
}

/// Rank journeys by preference, best first.
///
/// The sort is stable: journeys with equal keys keep their input order.
/// `date_ref` defaults to today.
pub fn rank_journeys(
    mut journeys: Vec<MatchedJourney>,
    date_ref: Option<NaiveDate>,
) -> Vec<MatchedJourney> {
    let date_ref = date_ref.unwrap_or_else(|| Local::now().date_naive());
    journeys.sort_by(|a, b| compare(a, b, date_ref));
    journeys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Category, ClockTime, Direction, OperatingDays, StationId, Train, TrainId,
    };
    use crate::planner::matcher::JourneyPoint;
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn journey(id: u32, number: Option<&str>, dep: &str, offset: u32, originates: bool) -> MatchedJourney {
        let train = Train {
            id: TrainId(id),
            train_number: number.map(str::to_string),
            direction: Direction::TowardB,
            departure_time: ClockTime::parse(dep).unwrap(),
            operating_days: OperatingDays::Daily,
            is_campania_express: false,
            category: Category::Standard,
            start_station_id: StationId(1),
            end_station_id: StationId(2),
        };
        MatchedJourney {
            train: Arc::new(train),
            departure: JourneyPoint {
                station_id: StationId(1),
                time: Some(ClockTime::parse(dep).unwrap()),
                day_offset: offset,
            },
            arrival: None,
            originates,
            stops: vec![],
        }
    }

    fn ids(journeys: &[MatchedJourney]) -> Vec<u32> {
        journeys.iter().map(|j| j.train.id.0).collect()
    }

    #[test]
    fn rank_by_departure() {
        let ranked = rank_journeys(
            vec![
                journey(1, Some("3"), "09:00", 0, false),
                journey(2, Some("2"), "07:30", 0, false),
                journey(3, Some("1"), "08:15", 0, false),
            ],
            Some(date()),
        );
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
    }

    #[test]
    fn origin_priority_beats_earlier_clock() {
        // A starts here at 08:00; B only calls here at 07:59
        let ranked = rank_journeys(
            vec![
                journey(2, Some("B"), "07:59", 0, false),
                journey(1, Some("A"), "08:00", 0, true),
            ],
            Some(date()),
        );
        assert_eq!(ids(&ranked), vec![1, 2]);
    }

    #[test]
    fn train_number_breaks_ties() {
        let ranked = rank_journeys(
            vec![
                journey(1, Some("2210"), "08:00", 0, false),
                journey(2, None, "08:00", 0, false),
                journey(3, Some("1104"), "08:00", 0, false),
            ],
            Some(date()),
        );
        // None sorts as "", before any number
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
    }

    #[test]
    fn after_midnight_sorts_last() {
        let ranked = rank_journeys(
            vec![
                journey(1, Some("1"), "00:10", 1, false),
                journey(2, Some("2"), "23:50", 0, false),
            ],
            Some(date()),
        );
        assert_eq!(ids(&ranked), vec![2, 1]);
    }

    #[test]
    fn empty_input() {
        assert!(rank_journeys(vec![], Some(date())).is_empty());
    }
}
