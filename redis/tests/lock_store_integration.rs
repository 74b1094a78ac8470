//! Integration tests for seat holds and the search cache.
//!
//! These require a running Redis instance:
//! `docker run -d -p 6379:6379 redis:7-alpine`
//!
//! Run with: `cargo test -p aerobook-redis -- --ignored`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code uses expect for clear failure messages

use aerobook_core::types::{
    AirportCode, FlightId, Journey, JourneyId, JourneyStatus, Money, SeatId,
};
use aerobook_redis::{SearchCache, SeatHoldStore};
use chrono::{NaiveDate, TimeZone, Utc};
use std::time::Duration;

const REDIS_URL: &str = "redis://127.0.0.1:6379";

async fn hold_store() -> SeatHoldStore {
    let conn = aerobook_redis::connect(REDIS_URL)
        .await
        .expect("Failed to connect to Redis");
    SeatHoldStore::new(conn)
}

fn seats(count: usize) -> Vec<SeatId> {
    (0..count).map(|_| SeatId::new()).collect()
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn reserve_then_release_restores_availability() {
    let store = hold_store().await;
    let flight = FlightId::new();
    let chosen = seats(3);

    let granted = store
        .reserve(flight, &chosen, Duration::from_secs(60))
        .await
        .unwrap();
    assert!(granted);

    // While held, nothing is available.
    let free = store.available(flight, &chosen).await.unwrap();
    assert!(free.is_empty());

    let released = store.release(flight, &chosen).await.unwrap();
    assert_eq!(released, 3);

    let free = store.available(flight, &chosen).await.unwrap();
    assert_eq!(free, chosen);
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn overlapping_reserve_fails_without_side_effect() {
    let store = hold_store().await;
    let flight = FlightId::new();
    let first = seats(2);

    assert!(store
        .reserve(flight, &first, Duration::from_secs(60))
        .await
        .unwrap());

    // Second request overlaps on one seat: must fail and write nothing.
    let fresh = SeatId::new();
    let overlapping = vec![first[0], fresh];
    let granted = store
        .reserve(flight, &overlapping, Duration::from_secs(60))
        .await
        .unwrap();
    assert!(!granted);

    let free = store.available(flight, &[fresh]).await.unwrap();
    assert_eq!(free, vec![fresh], "losing request must not hold anything");

    store.release(flight, &first).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn expired_holds_become_reservable_again() {
    let store = hold_store().await;
    let flight = FlightId::new();
    let chosen = seats(3);

    // Simulates a booker that crashed after reserving: the hold must fall
    // off on its own after the TTL.
    assert!(store
        .reserve(flight, &chosen, Duration::from_millis(300))
        .await
        .unwrap());
    assert!(!store
        .reserve(flight, &chosen, Duration::from_secs(60))
        .await
        .unwrap());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(store
        .reserve(flight, &chosen, Duration::from_secs(60))
        .await
        .unwrap());

    store.release(flight, &chosen).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn concurrent_reserves_admit_exactly_one() {
    let store = hold_store().await;
    let flight = FlightId::new();
    let chosen = seats(2);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        let chosen = chosen.clone();
        handles.push(tokio::spawn(async move {
            store
                .reserve(flight, &chosen, Duration::from_secs(60))
                .await
                .unwrap()
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            granted += 1;
        }
    }
    assert_eq!(granted, 1, "the reserve script must linearise admissions");

    store.release(flight, &chosen).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn cleanup_counts_expired_entries() {
    let store = hold_store().await;
    let flight = FlightId::new();

    assert!(store
        .reserve(flight, &seats(2), Duration::from_millis(100))
        .await
        .unwrap());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let removed = store.cleanup(flight).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(store.cleanup(flight).await.unwrap(), 0);
}

fn journey(date: NaiveDate) -> Journey {
    let departure = Utc
        .from_utc_datetime(&date.and_hms_opt(9, 0, 0).unwrap());
    Journey {
        id: JourneyId::new(),
        legs: [FlightId::new()].into_iter().collect(),
        source_airport: AirportCode::parse("JFK").unwrap(),
        destination_airport: AirportCode::parse("LAX").unwrap(),
        departure,
        arrival: departure + chrono::Duration::hours(6),
        total_price: Money::from_cents(32_000),
        status: JourneyStatus::Active,
    }
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn cache_round_trips_and_invalidates_by_route() {
    let conn = aerobook_redis::connect(REDIS_URL).await.unwrap();
    let cache = SearchCache::new(conn);

    let day_one = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    let day_two = NaiveDate::from_ymd_opt(2026, 7, 2).unwrap();
    let journeys_one = vec![journey(day_one)];
    let journeys_two = vec![journey(day_two)];

    cache
        .put("JFK", "LAX", day_one, &journeys_one, Duration::from_secs(60))
        .await
        .unwrap();
    cache
        .put("JFK", "LAX", day_two, &journeys_two, Duration::from_secs(60))
        .await
        .unwrap();

    let hit = cache.get("JFK", "LAX", day_one).await.unwrap();
    assert_eq!(hit, Some(journeys_one));

    // Invalidation takes out every cached day for the route.
    let deleted = cache.invalidate_route("JFK", "LAX").await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(cache.get("JFK", "LAX", day_one).await.unwrap(), None);
    assert_eq!(cache.get("JFK", "LAX", day_two).await.unwrap(), None);
}
