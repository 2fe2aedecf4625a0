//! Integration tests for concurrent ingest
//!
//! These tests verify that:
//! - Concurrent ingests all succeed
//! - Every subscriber sees readings in persistence order
//! - Slow subscribers do not hold back fast ones

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use sensor_relay::{
    Reading,
    actors::{broadcaster::BroadcasterHandle, messages::Subscription},
    service::ReadingService,
    storage::MemoryBackend,
};

use crate::helpers::{memory_service, payload};

async fn drain(subscription: &mut Subscription, count: usize) -> Vec<Reading> {
    let mut readings = Vec::with_capacity(count);
    for _ in 0..count {
        let reading = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
            .await
            .unwrap()
            .unwrap();
        readings.push(reading);
    }
    readings
}

#[tokio::test]
async fn test_two_concurrent_ingests() {
    let service = memory_service();
    let mut subscriber = service.broadcaster().subscribe().await.unwrap();

    let (first, second) = tokio::join!(
        service.ingest(payload(Some(10.0), None)),
        service.ingest(payload(Some(20.0), None)),
    );
    assert!(first.success && second.success);

    let pushed = drain(&mut subscriber, 2).await;
    let mut stored = service.latest_readings(2).await.data.unwrap();
    stored.reverse();

    // delivery order is persistence order
    assert_eq!(pushed, stored);

    let mut temperatures: Vec<_> = pushed.iter().filter_map(|r| r.temperature).collect();
    temperatures.sort_by(f64::total_cmp);
    assert_eq!(temperatures, vec![10.0, 20.0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_ingests_keep_order() {
    let service = memory_service();
    let mut first = service.broadcaster().subscribe().await.unwrap();
    let mut second = service.broadcaster().subscribe().await.unwrap();

    let tasks = (0..40).map(|i| {
        let service = service.clone();
        tokio::spawn(async move { service.ingest(payload(None, Some(i as f64))).await })
    });

    for response in join_all(tasks).await {
        assert!(response.unwrap().success);
    }

    let seen_first = drain(&mut first, 40).await;
    let seen_second = drain(&mut second, 40).await;

    let mut stored = service.latest_readings(40).await.data.unwrap();
    stored.reverse();

    assert_eq!(seen_first, stored);
    assert_eq!(seen_second, stored);

    for pair in seen_first.windows(2) {
        assert!(pair[0].id < pair[1].id);
        assert!(pair[0].created_at <= pair[1].created_at);
    }
}

#[tokio::test]
async fn test_concurrent_subscribe_and_unsubscribe() {
    let service = memory_service();
    let broadcaster = service.broadcaster().clone();

    let tasks = (0..20).map(|_| {
        let broadcaster = broadcaster.clone();
        tokio::spawn(async move {
            let subscription = broadcaster.subscribe().await.unwrap();
            broadcaster.unsubscribe(subscription.id).await
        })
    });

    for removed in join_all(tasks).await {
        assert!(removed.unwrap());
    }

    assert_eq!(broadcaster.stats().await.unwrap().subscribers, 0);
}

#[tokio::test]
async fn test_slow_subscriber_does_not_hold_back_ingest() {
    let service = ReadingService::new(Arc::new(MemoryBackend::new()), BroadcasterHandle::spawn(2));
    let mut fast = service.broadcaster().subscribe().await.unwrap();
    let mut slow = service.broadcaster().subscribe().await.unwrap();

    for i in 0..5 {
        let response = tokio::time::timeout(
            Duration::from_secs(1),
            service.ingest(payload(Some(i as f64), None)),
        )
        .await
        .unwrap();
        assert!(response.success);

        let reading = drain(&mut fast, 1).await;
        assert_eq!(reading[0].temperature, Some(i as f64));
    }

    // the slow subscriber kept its first two readings and missed the rest
    let kept = drain(&mut slow, 2).await;
    assert_eq!(kept[0].temperature, Some(0.0));
    assert_eq!(kept[1].temperature, Some(1.0));

    let stats = service.broadcaster().stats().await.unwrap();
    assert_eq!(stats.published, 5);
    assert_eq!(stats.dropped, 3);
    assert_eq!(stats.subscribers, 2);
    assert_eq!(service.latest_readings(10).await.data.unwrap().len(), 5);
}
