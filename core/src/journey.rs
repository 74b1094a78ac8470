//! Journey rules and the bounded bidirectional traversal.
//!
//! When a flight is created, every valid 1–3 leg journey that includes it
//! must be enumerated. [`enumerate_journeys`] does this as a pure function
//! over the seed flight and the set of same-day flights, so the traversal
//! can be tested without a store or a bus. Persistence and cache
//! invalidation happen in the consumer runtime.
//!
//! The traversal keeps a frontier of paths and a visited set keyed by the
//! ordered flight-id tuple (the signature). Paths grow forwards from the
//! last leg's destination and backwards from the first leg's source, so a
//! seed in the middle of a connection is still discovered. The visited set
//! guarantees each signature is built at most once per event, which is what
//! makes replays converge.

use crate::types::{signature_of, AirportCode, Flight, FlightId, Money};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashSet, VecDeque};

/// Connection rules for multi-leg journeys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JourneyRules {
    /// Minimum time between arrival of one leg and departure of the next.
    pub min_layover: Duration,
    /// Maximum time between arrival of one leg and departure of the next.
    pub max_layover: Duration,
    /// Maximum end-to-end journey time.
    pub max_span: Duration,
    /// Maximum number of legs.
    pub max_legs: usize,
}

impl JourneyRules {
    /// Whether the gap between `arrival` and `departure` is an admissible
    /// layover. Both bounds are inclusive.
    #[must_use]
    pub fn layover_ok(&self, arrival: DateTime<Utc>, departure: DateTime<Utc>) -> bool {
        let gap = departure - arrival;
        gap >= self.min_layover && gap <= self.max_layover
    }
}

impl Default for JourneyRules {
    fn default() -> Self {
        Self {
            min_layover: Duration::minutes(30),
            max_layover: Duration::hours(4),
            max_span: Duration::hours(24),
            max_legs: 3,
        }
    }
}

/// A valid journey produced by the traversal, ready for persistence.
///
/// Carries the derived fields the store needs; the journey id is assigned
/// at insert time so replays of the same signature stay idempotent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyCandidate {
    /// Flight ids in travel order.
    pub legs: SmallVec<[FlightId; 3]>,
    /// First leg's source airport.
    pub source_airport: AirportCode,
    /// Last leg's destination airport.
    pub destination_airport: AirportCode,
    /// First leg's departure instant.
    pub departure: DateTime<Utc>,
    /// Last leg's arrival instant.
    pub arrival: DateTime<Utc>,
    /// Sum of leg prices.
    pub total_price: Money,
}

impl JourneyCandidate {
    fn from_path(path: &[&Flight]) -> Self {
        let first = path[0];
        let last = path[path.len() - 1];
        Self {
            legs: path.iter().map(|f| f.id).collect(),
            source_airport: first.source_airport.clone(),
            destination_airport: last.destination_airport.clone(),
            departure: first.departure,
            arrival: last.arrival,
            total_price: Money::saturating_sum(path.iter().map(|f| f.price)),
        }
    }

    /// Uniqueness key: the ordered flight-id tuple.
    #[must_use]
    pub fn signature(&self) -> String {
        signature_of(&self.legs)
    }
}

/// Enumerate every valid journey that includes `seed`.
///
/// `same_day` is the set of candidate connection flights (in practice, all
/// ACTIVE flights departing on the seed's UTC calendar day; it may include
/// the seed itself, which is never used twice). The traversal is bounded by
/// `rules.max_legs`, so with `n` same-day flights the worst case is O(n²)
/// enumerated paths.
///
/// The result is deterministic for a given input: calling this twice yields
/// the same candidates, and the visited set guarantees each signature
/// appears at most once.
#[must_use]
pub fn enumerate_journeys(
    seed: &Flight,
    same_day: &[Flight],
    rules: &JourneyRules,
) -> Vec<JourneyCandidate> {
    let mut frontier: VecDeque<Vec<&Flight>> = VecDeque::new();
    frontier.push_back(vec![seed]);

    let mut visited: HashSet<String> = HashSet::new();
    let mut accepted = Vec::new();

    while let Some(path) = frontier.pop_front() {
        let signature = signature_of(&path.iter().map(|f| f.id).collect::<Vec<_>>());
        if !visited.insert(signature) {
            continue;
        }

        if is_valid_journey(&path, rules) {
            accepted.push(JourneyCandidate::from_path(&path));
        }

        if path.len() >= rules.max_legs {
            continue;
        }

        let first = path[0];
        let last = path[path.len() - 1];

        for next in same_day {
            if path.iter().any(|f| f.id == next.id) {
                continue;
            }

            // Forward: depart from where the path currently ends.
            if next.source_airport == last.destination_airport
                && rules.layover_ok(last.arrival, next.departure)
                && next.arrival - first.departure <= rules.max_span
            {
                let mut extended = path.clone();
                extended.push(next);
                frontier.push_back(extended);
            }

            // Backward: arrive where the path currently starts.
            if next.destination_airport == first.source_airport
                && rules.layover_ok(next.arrival, first.departure)
                && last.arrival - next.departure <= rules.max_span
            {
                let mut extended = Vec::with_capacity(path.len() + 1);
                extended.push(next);
                extended.extend_from_slice(&path);
                frontier.push_back(extended);
            }
        }
    }

    accepted
}

/// Full acceptance check for a path.
///
/// Extension already enforces connectivity, layovers, and the span cap, but
/// acceptance re-checks everything so the function stands alone as the
/// definition of a valid journey.
fn is_valid_journey(path: &[&Flight], rules: &JourneyRules) -> bool {
    if path.is_empty() || path.len() > rules.max_legs {
        return false;
    }

    let first = path[0];
    let last = path[path.len() - 1];

    if first.source_airport == last.destination_airport {
        return false;
    }
    if last.arrival - first.departure > rules.max_span {
        return false;
    }

    let mut seen: HashSet<FlightId> = HashSet::with_capacity(path.len());
    if !path.iter().all(|f| seen.insert(f.id)) {
        return false;
    }

    path.windows(2).all(|pair| {
        pair[0].destination_airport == pair[1].source_airport
            && rules.layover_ok(pair[0].arrival, pair[1].departure)
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::types::FlightStatus;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, minute, 0).unwrap()
    }

    fn flight(src: &str, dst: &str, dep: DateTime<Utc>, arr: DateTime<Utc>) -> Flight {
        Flight {
            id: FlightId::new(),
            source_airport: AirportCode::parse(src).unwrap(),
            destination_airport: AirportCode::parse(dst).unwrap(),
            departure: dep,
            arrival: arr,
            airplane_id: "AC-1".to_string(),
            price: Money::from_cents(10_000),
            status: FlightStatus::Active,
        }
    }

    fn signatures(candidates: &[JourneyCandidate]) -> HashSet<String> {
        candidates.iter().map(JourneyCandidate::signature).collect()
    }

    #[test]
    fn single_flight_yields_one_journey() {
        let seed = flight("AAA", "BBB", at(10, 0), at(11, 0));
        let found = enumerate_journeys(&seed, std::slice::from_ref(&seed), &JourneyRules::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].legs.as_slice(), &[seed.id]);
        assert_eq!(found[0].total_price, seed.price);
    }

    #[test]
    fn enumerates_forward_backward_and_combined_paths() {
        // f1: AAA→BBB, seed: BBB→CCC, f2: CCC→DDD, f3: DDD→EEE, f4: CCC→BBB
        let f1 = flight("AAA", "BBB", at(8, 0), at(9, 0));
        let seed = flight("BBB", "CCC", at(10, 0), at(11, 0));
        let f2 = flight("CCC", "DDD", at(12, 0), at(13, 0));
        let f3 = flight("DDD", "EEE", at(14, 0), at(15, 0));
        let f4 = flight("CCC", "BBB", at(11, 45), at(12, 45));
        let day = vec![
            f1.clone(),
            seed.clone(),
            f2.clone(),
            f3.clone(),
            f4.clone(),
        ];

        let found = enumerate_journeys(&seed, &day, &JourneyRules::default());

        let expected: HashSet<String> = [
            signature_of(&[seed.id]),
            signature_of(&[f1.id, seed.id]),
            signature_of(&[seed.id, f2.id]),
            signature_of(&[f1.id, seed.id, f2.id]),
            signature_of(&[seed.id, f2.id, f3.id]),
            // BBB→CCC→BBB is rejected (round trip), but AAA→BBB→CCC→BBB is valid.
            signature_of(&[f1.id, seed.id, f4.id]),
        ]
        .into_iter()
        .collect();

        assert_eq!(signatures(&found), expected);
        assert_eq!(found.len(), 6);
    }

    #[test]
    fn round_trip_to_origin_is_rejected() {
        let seed = flight("BBB", "CCC", at(10, 0), at(11, 0));
        let back = flight("CCC", "BBB", at(12, 0), at(13, 0));
        let day = vec![seed.clone(), back.clone()];

        let found = enumerate_journeys(&seed, &day, &JourneyRules::default());
        assert_eq!(signatures(&found), HashSet::from([signature_of(&[seed.id])]));
    }

    #[test]
    fn layover_bounds_are_inclusive() {
        let seed = flight("AAA", "BBB", at(6, 0), at(7, 0));
        let exact_min = flight("BBB", "CCC", at(7, 30), at(8, 30));
        let below_min = flight("BBB", "DDD", at(7, 29), at(8, 30));
        let exact_max = flight("BBB", "EEE", at(11, 0), at(12, 0));
        let above_max = flight("BBB", "FFF", at(11, 1), at(12, 0));
        let day = vec![
            seed.clone(),
            exact_min.clone(),
            below_min.clone(),
            exact_max.clone(),
            above_max.clone(),
        ];

        let found = enumerate_journeys(&seed, &day, &JourneyRules::default());
        let sigs = signatures(&found);

        assert!(sigs.contains(&signature_of(&[seed.id, exact_min.id])));
        assert!(sigs.contains(&signature_of(&[seed.id, exact_max.id])));
        assert!(!sigs.contains(&signature_of(&[seed.id, below_min.id])));
        assert!(!sigs.contains(&signature_of(&[seed.id, above_max.id])));
    }

    #[test]
    fn span_over_24_hours_is_rejected() {
        // Each leg is fine on its own; together they stretch past a day.
        let seed = flight("AAA", "BBB", at(0, 0), at(12, 0));
        let long = Flight {
            departure: at(16, 0),
            arrival: Utc.with_ymd_and_hms(2026, 3, 15, 2, 0, 0).unwrap(),
            ..flight("BBB", "CCC", at(16, 0), at(17, 0))
        };
        let day = vec![seed.clone(), long];

        let found = enumerate_journeys(&seed, &day, &JourneyRules::default());
        assert_eq!(signatures(&found), HashSet::from([signature_of(&[seed.id])]));
    }

    #[test]
    fn never_exceeds_max_legs() {
        // A chain long enough for 5 legs; only windows of ≤3 through the seed.
        let a = flight("AAA", "BBB", at(5, 0), at(6, 0));
        let b = flight("BBB", "CCC", at(7, 0), at(8, 0));
        let seed = flight("CCC", "DDD", at(9, 0), at(10, 0));
        let c = flight("DDD", "EEE", at(11, 0), at(12, 0));
        let d = flight("EEE", "FFF", at(13, 0), at(14, 0));
        let day = vec![a, b.clone(), seed.clone(), c.clone(), d];

        let found = enumerate_journeys(&seed, &day, &JourneyRules::default());
        assert!(found.iter().all(|j| j.legs.len() <= 3));
        assert!(signatures(&found).contains(&signature_of(&[b.id, seed.id, c.id])));
    }

    #[test]
    fn replaying_the_same_event_converges() {
        let f1 = flight("AAA", "BBB", at(8, 0), at(9, 0));
        let seed = flight("BBB", "CCC", at(10, 0), at(11, 0));
        let f2 = flight("CCC", "DDD", at(12, 0), at(13, 0));
        let day = vec![f1, seed.clone(), f2];

        let first = enumerate_journeys(&seed, &day, &JourneyRules::default());
        let second = enumerate_journeys(&seed, &day, &JourneyRules::default());
        assert_eq!(signatures(&first), signatures(&second));
        assert_eq!(first.len(), second.len());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const AIRPORTS: [&str; 5] = ["AAA", "BBB", "CCC", "DDD", "EEE"];

        prop_compose! {
            fn arb_flight()(
                src in 0usize..AIRPORTS.len(),
                dst_offset in 1usize..AIRPORTS.len(),
                dep_minute in 0u32..1200,
                block_minutes in 40u32..300,
                price_cents in 1_000u64..100_000,
            ) -> Flight {
                let dst = (src + dst_offset) % AIRPORTS.len();
                let dep = Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap()
                    + Duration::minutes(i64::from(dep_minute));
                Flight {
                    id: FlightId::new(),
                    source_airport: AirportCode::parse(AIRPORTS[src]).unwrap(),
                    destination_airport: AirportCode::parse(AIRPORTS[dst]).unwrap(),
                    departure: dep,
                    arrival: dep + Duration::minutes(i64::from(block_minutes)),
                    airplane_id: "AC-1".to_string(),
                    price: Money::from_cents(price_cents),
                    status: FlightStatus::Active,
                }
            }
        }

        proptest! {
            #[test]
            fn every_candidate_satisfies_the_journey_invariants(
                flights in proptest::collection::vec(arb_flight(), 1..12)
            ) {
                let rules = JourneyRules::default();
                let seed = flights[0].clone();
                let found = enumerate_journeys(&seed, &flights, &rules);

                let mut seen_signatures = HashSet::new();
                for journey in &found {
                    // Signature is unique per event.
                    prop_assert!(seen_signatures.insert(journey.signature()));
                    // The seed is part of every enumerated journey.
                    prop_assert!(journey.legs.contains(&seed.id));
                    prop_assert!((1..=rules.max_legs).contains(&journey.legs.len()));
                    prop_assert_ne!(&journey.source_airport, &journey.destination_airport);
                    prop_assert!(journey.arrival - journey.departure <= rules.max_span);

                    // Legs are contiguous with admissible layovers and no reuse.
                    let legs: Vec<&Flight> = journey
                        .legs
                        .iter()
                        .map(|id| flights.iter().find(|f| f.id == *id).unwrap())
                        .collect();
                    let mut ids = HashSet::new();
                    for leg in &legs {
                        prop_assert!(ids.insert(leg.id));
                    }
                    for pair in legs.windows(2) {
                        prop_assert_eq!(&pair[0].destination_airport, &pair[1].source_airport);
                        prop_assert!(rules.layover_ok(pair[0].arrival, pair[1].departure));
                    }
                    let total = Money::saturating_sum(legs.iter().map(|f| f.price));
                    prop_assert_eq!(journey.total_price, total);
                }
            }
        }
    }
}
