//! Event loop with debounced recomputation
//!
//! Discrete events recompute immediately. Continuous events (year ranges,
//! biennial inputs) only schedule a recompute after the quiescence window,
//! so a burst of slider moves produces one snapshot. A discrete event that
//! changes something while a recompute is pending absorbs it; one that changes
//! nothing leaves the pending recompute to its timer.

use std::time::Duration;

use diplo_core::Debouncer;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::error::ExplorerResult;
use crate::events::UserEvent;
use crate::state::AppState;

/// Drive `app` from `rx` until the channel closes
///
/// `publish` runs after every recompute. Returns the number of recomputes.
pub async fn run_events<F>(
    app: &mut AppState,
    mut rx: mpsc::UnboundedReceiver<UserEvent>,
    delay: Duration,
    mut publish: F,
) -> ExplorerResult<usize>
where
    F: FnMut(&AppState) -> ExplorerResult<()>,
{
    let mut debouncer: Debouncer<Instant> = Debouncer::new(delay);
    let mut recomputes = 0usize;

    loop {
        let deadline = debouncer.deadline();

        tokio::select! {
            biased;

            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                let continuous = event.is_continuous();
                let applied = app.handle(event);

                if continuous {
                    if applied {
                        let at = debouncer.schedule(Instant::now());
                        debug!(delay_ms = delay.as_millis() as u64, ?at, "Scheduled recompute");
                    }
                } else if applied {
                    if debouncer.cancel() {
                        debug!("Pending recompute absorbed by discrete event");
                    }
                    app.refresh();
                    publish(app)?;
                    recomputes += 1;
                }
            }

            _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if debouncer.fire_if_due(Instant::now()) && app.is_stale() {
                    app.refresh();
                    publish(app)?;
                    recomputes += 1;
                }
            }
        }
    }

    // Input ended with a recompute still pending
    if debouncer.cancel() || app.is_stale() {
        app.refresh();
        publish(app)?;
        recomputes += 1;
    }

    info!(
        events = app.total_events(),
        recomputes,
        revision = app.revision(),
        "Event stream finished"
    );
    Ok(recomputes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerConfig;
    use diplo_core::update::RangeTarget;
    use diplo_core::{Facet, FilterState, Language, Record, RecordStore, RecordType, TaxonRank};

    const DELAY: Duration = Duration::from_millis(500);

    fn app() -> AppState {
        let records = [1980, 1990, 2000, 2010]
            .into_iter()
            .map(|year| Record {
                family: "Julidae".to_string(),
                taxon_rank: TaxonRank::Species,
                record_type: Some(RecordType::SpecimenRecord),
                publication_year: Some(year),
                literature_id: Some(format!("L{year}")),
                ..Default::default()
            })
            .collect();
        AppState::new(
            RecordStore::new(records),
            FilterState::default(),
            Language::Ja,
            &MarkerConfig::default(),
        )
    }

    fn set_range(from: i32) -> UserEvent {
        UserEvent::SetRange {
            target: RangeTarget::Publication,
            from: Some(from),
            to: Some(2010),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_recompute() {
        let mut app = app();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            tx.send(UserEvent::SetRangeEnabled {
                target: RangeTarget::Publication,
                enabled: true,
            })
            .unwrap();
            for from in [1981, 1985, 1990] {
                tx.send(set_range(from)).unwrap();
                time::sleep(Duration::from_millis(100)).await;
            }
            time::sleep(Duration::from_secs(2)).await;
            tx.send(UserEvent::SetFacet {
                facet: Facet::Family,
                value: "Julidae".to_string(),
            })
            .unwrap();
        });

        let mut published = Vec::new();
        let count = run_events(&mut app, rx, DELAY, |app| {
            published.push((app.revision(), app.view().record_info.record_count));
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(count, 3);
        assert_eq!(published, vec![(1, 4), (2, 3), (3, 3)]);
        assert_eq!(app.total_events(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discrete_event_absorbs_pending_recompute() {
        let mut app = app();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            tx.send(UserEvent::SetRangeEnabled {
                target: RangeTarget::Publication,
                enabled: true,
            })
            .unwrap();
            time::sleep(Duration::from_secs(1)).await;
            tx.send(set_range(1995)).unwrap();
            time::sleep(Duration::from_millis(100)).await;
            tx.send(UserEvent::SetMonthsEnabled { enabled: true }).unwrap();
            time::sleep(Duration::from_secs(1)).await;
        });

        let mut queries = Vec::new();
        let count = run_events(&mut app, rx, DELAY, |app| {
            queries.push(app.view().query.clone());
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(count, 2);
        assert!(queries[0].contains("publicationYearFrom=1980"));
        assert!(queries[1].contains("publicationYearFrom=1995"));
        assert!(queries[1].contains("filterCollectionMonthActive=1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_op_discrete_event_keeps_quiet_window() {
        let mut app = app();
        let (tx, rx) = mpsc::unbounded_channel();
        let start = Instant::now();

        tokio::spawn(async move {
            tx.send(UserEvent::SetRangeEnabled {
                target: RangeTarget::Publication,
                enabled: true,
            })
            .unwrap();
            tx.send(set_range(1995)).unwrap();
            time::sleep(Duration::from_millis(100)).await;
            tx.send(UserEvent::Unknown).unwrap();
            tx.send(UserEvent::SetMonthsEnabled { enabled: false }).unwrap();
            time::sleep(Duration::from_secs(2)).await;
        });

        let mut published = Vec::new();
        let count = run_events(&mut app, rx, DELAY, |app| {
            published.push((start.elapsed(), app.view().record_info.record_count));
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(count, 2);
        assert!(published[0].0 < DELAY);
        assert_eq!(published[0].1, 4);
        let (at, visible) = published[1];
        assert!(at >= DELAY && at < DELAY + Duration::from_millis(50), "published at {at:?}");
        assert_eq!(visible, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_input_flushes_pending() {
        let mut app = app();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(UserEvent::SetRangeEnabled {
            target: RangeTarget::Publication,
            enabled: true,
        })
        .unwrap();
        tx.send(set_range(2000)).unwrap();
        drop(tx);

        let mut counts = Vec::new();
        let count = run_events(&mut app, rx, DELAY, |app| {
            counts.push(app.view().record_info.record_count);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(counts, vec![4, 2]);
        assert!(!app.is_stale());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_op_events_do_not_publish() {
        let mut app = app();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(UserEvent::Unknown).unwrap();
        tx.send(UserEvent::ClearFacet {
            facet: Facet::Genus,
        })
        .unwrap();
        drop(tx);

        let count = run_events(&mut app, rx, DELAY, |_| Ok(())).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(app.revision(), 0);
    }
}
