// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::api::{ClientInfo, ManagerApi};
use crate::fake::FakeManager;

fn client() -> ClientInfo {
    ClientInfo {
        name: "dev@workstation".to_string(),
        install_id: "install-1".to_string(),
        version: "0.1.0".to_string(),
    }
}

#[test]
fn remain_period_is_a_third_with_a_floor() {
    assert_eq!(
        SessionKeeper::remain_period(Duration::from_secs(15)),
        Duration::from_secs(5)
    );
    assert_eq!(
        SessionKeeper::remain_period(Duration::from_secs(2)),
        Duration::from_secs(1)
    );
    assert_eq!(
        SessionKeeper::remain_period(Duration::from_millis(900)),
        Duration::from_secs(1)
    );
}

#[tokio::test(start_paused = true)]
async fn pings_at_the_derived_period() {
    let api = FakeManager::new().with_idle_timeout(Duration::from_secs(15));
    let arrival = api.arrive(client()).await.unwrap();
    let cancel = Cancel::new();
    let _events = SessionKeeper::spawn(
        api.clone(),
        arrival.session,
        arrival.idle_timeout,
        cancel.clone(),
    );

    tokio::time::sleep(Duration::from_secs(16)).await;
    // Period 5s: ticks at 5, 10, 15.
    assert_eq!(api.remain_count(), 3);
    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn failing_pings_past_idle_timeout_invalidate() {
    let api = FakeManager::new().with_idle_timeout(Duration::from_secs(6));
    let arrival = api.arrive(client()).await.unwrap();
    api.set_remain_fails(true);
    let cancel = Cancel::new();
    let mut events = SessionKeeper::spawn(
        api.clone(),
        arrival.session,
        arrival.idle_timeout,
        cancel.clone(),
    );

    let event = tokio::time::timeout(Duration::from_secs(60), events.recv())
        .await
        .unwrap();
    assert_eq!(event, Some(SessionEvent::Invalidated));
    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn single_failure_does_not_invalidate() {
    let api = FakeManager::new().with_idle_timeout(Duration::from_secs(30));
    let arrival = api.arrive(client()).await.unwrap();
    let cancel = Cancel::new();
    let mut events = SessionKeeper::spawn(
        api.clone(),
        arrival.session,
        arrival.idle_timeout,
        cancel.clone(),
    );

    // One failed ping, then recovery.
    api.set_remain_fails(true);
    tokio::time::sleep(Duration::from_secs(11)).await;
    api.set_remain_fails(false);
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(events.try_recv().is_err(), "session must stay valid");
    cancel.cancel();
}

#[tokio::test]
async fn cancel_stops_the_keeper() {
    let api = FakeManager::new();
    let arrival = api.arrive(client()).await.unwrap();
    let cancel = Cancel::new();
    let mut events = SessionKeeper::spawn(
        api.clone(),
        arrival.session,
        arrival.idle_timeout,
        cancel.clone(),
    );
    cancel.cancel();
    // Channel closes when the loop exits.
    assert_eq!(events.recv().await, None);
}
