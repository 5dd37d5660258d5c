use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::{FocusSession, FocusSummary, Store};

pub type SharedStore = Arc<Mutex<Store>>;

pub const FOCUS_TICK: Duration = Duration::from_secs(1);

/// Count the active focus session down once per second.
///
/// Returns the summary when the timer reaches zero, or `None` when the
/// session goes away some other way (ended early).
pub async fn run_focus_countdown(store: SharedStore) -> Option<FocusSummary> {
    run_focus_countdown_every(store, FOCUS_TICK, |_| {}).await
}

/// Same as `run_focus_countdown` with a custom period and a hook that sees
/// the session after every tick.
pub async fn run_focus_countdown_every<F>(
    store: SharedStore,
    period: Duration,
    mut on_tick: F,
) -> Option<FocusSummary>
where
    F: FnMut(&FocusSession),
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        let mut store = store.lock().await;
        if store.focus_session().is_none() {
            tracing::debug!("Focus session gone, stopping countdown");
            return None;
        }
        if let Some(summary) = store.tick_focus() {
            return Some(summary);
        }
        if let Some(session) = store.focus_session() {
            on_tick(session);
        }
    }
}

/// Background mascot decay and spawn expiry. Abort the handle on teardown.
pub fn spawn_mascot_decay(store: SharedStore, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Starting mascot decay every {:?}", period);

        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;

            let mut store = store.lock().await;
            if let Some(mood) = store.update_mascot_status() {
                tracing::debug!("Mascot is {}", mood);
            }
            store.expire_spawn(Utc::now());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MASCOT_KEY;
    use crate::core::{KeyValueStorage, Mascot, MemoryStorage, Personality};
    use chrono::Duration as ChronoDuration;

    fn shared(storage: MemoryStorage) -> SharedStore {
        Arc::new(Mutex::new(Store::load(Box::new(storage))))
    }

    #[tokio::test]
    async fn test_countdown_finishes_and_grants_xp() {
        let store = shared(MemoryStorage::new());
        store.lock().await.start_focus_session(1, None).unwrap();

        let mut ticks = 0;
        let summary = run_focus_countdown_every(store.clone(), Duration::from_millis(1), |_| ticks += 1)
            .await
            .unwrap();

        assert!(summary.completed);
        assert_eq!(summary.focused_minutes, 1);
        assert_eq!(summary.bonus_xp, 2);
        assert_eq!(ticks, 59);

        let store = store.lock().await;
        assert!(store.focus_session().is_none());
        assert_eq!(store.stats().xp, 2);
    }

    #[tokio::test]
    async fn test_countdown_stops_when_session_ends() {
        let store = shared(MemoryStorage::new());
        store.lock().await.start_focus_session(5, None).unwrap();

        let countdown = tokio::spawn(run_focus_countdown_every(
            store.clone(),
            Duration::from_millis(5),
            |_| {},
        ));
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.lock().await.end_focus_session().unwrap();

        assert!(countdown.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decay_task_updates_mascot() {
        let storage = MemoryStorage::new();
        let three_hours_ago = Utc::now() - ChronoDuration::hours(3);
        let mascot = Mascot::new("Dusty".to_string(), Personality::Calm, three_hours_ago);
        storage
            .set(MASCOT_KEY, &serde_json::to_string(&mascot).unwrap())
            .unwrap();
        let store = shared(storage);

        let handle = spawn_mascot_decay(store.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let store = store.lock().await;
        let hunger = store.mascot().unwrap().hunger;
        assert!(hunger > 64.0 && hunger < 66.0, "hunger was {}", hunger);
    }
}
