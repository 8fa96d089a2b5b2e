//! Main application state
//!
//! Owns the record store, the filter state and the last derived view. Events
//! change the filter state through [`AppState::handle`]; [`AppState::refresh`]
//! runs the full recompute. The runner decides when to refresh, so a burst of
//! continuous inputs costs one recompute.

use std::collections::VecDeque;

use diplo_core::codec;
use diplo_core::markers::nearby_records;
use diplo_core::navigation::{
    BIENNIAL_INTERVALS, biennial_year_options, cycle_biennial_interval, cycle_biennial_target,
    cycle_facet,
};
use diplo_core::update::{RangeTarget, StateAction, apply};
use diplo_core::view::MapSettings;
use diplo_core::{
    DerivedView, FilterState, Language, RecordStore, RecordType, compute_visible, derive_view,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MarkerConfig;
use crate::events::UserEvent;

const MAX_LOG_EVENTS: usize = 100;

/// Recent event for the snapshot log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Sequence number among all events received
    pub seq: usize,
    pub type_name: String,
    /// Whether the event changed anything
    pub applied: bool,
}

/// One record in the nearby-record lookup result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearbyRecord {
    /// Index into the visible record set
    pub index: usize,
    pub record_type: Option<RecordType>,
    pub scientific_name: String,
    pub japanese_name: String,
    pub prefecture: Option<String>,
    pub literature: Option<String>,
}

/// Records around a clicked marker, the clicked one first
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearbySelection {
    pub clicked: usize,
    pub records: Vec<NearbyRecord>,
}

#[derive(Debug)]
pub struct AppState {
    store: RecordStore,
    state: FilterState,
    language: Language,
    map: MapSettings,
    nearby_radius_px: f64,
    view: DerivedView,
    nearby: Option<NearbySelection>,
    /// Number of recomputes since start
    revision: u64,
    /// State changed since the last recompute
    stale: bool,
    event_log: VecDeque<LoggedEvent>,
    total_events: usize,
}

impl AppState {
    pub fn new(store: RecordStore, state: FilterState, language: Language, marker: &MarkerConfig) -> Self {
        let map = marker.map_settings();
        let view = derive_view(&store, &state, language, &map);
        info!(
            records = store.len(),
            visible = view.record_info.record_count,
            "Initial view ready"
        );
        Self {
            store,
            state,
            language,
            map,
            nearby_radius_px: marker.nearby_radius_px,
            view,
            nearby: None,
            revision: 0,
            stale: false,
            event_log: VecDeque::new(),
            total_events: 0,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Last published view; may lag behind [`Self::state`] while stale
    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    pub fn nearby(&self) -> Option<&NearbySelection> {
        self.nearby.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn event_log(&self) -> &VecDeque<LoggedEvent> {
        &self.event_log
    }

    pub fn total_events(&self) -> usize {
        self.total_events
    }

    /// Apply an event without recomputing; returns whether anything changed
    pub fn handle(&mut self, event: UserEvent) -> bool {
        let type_name = event.type_name();
        let applied = self.dispatch(event);
        debug!(event = type_name, applied, "Handled event");

        self.total_events += 1;
        self.event_log.push_front(LoggedEvent {
            seq: self.total_events,
            type_name: type_name.to_string(),
            applied,
        });
        self.event_log.truncate(MAX_LOG_EVENTS);

        if applied {
            self.stale = true;
        }
        applied
    }

    /// Full recompute from the current state
    pub fn refresh(&mut self) {
        self.view = derive_view(&self.store, &self.state, self.language, &self.map);
        self.revision += 1;
        self.stale = false;
        debug!(revision = self.revision, query = %self.view.query, "Recomputed view");
    }

    /// Handle an event and recompute immediately if it changed anything
    pub fn process_event(&mut self, event: UserEvent) -> bool {
        let applied = self.handle(event);
        if applied {
            self.refresh();
        }
        applied
    }

    /// Back to the default state, keeping the language
    pub fn reset(&mut self) {
        self.state = FilterState::default();
        self.nearby = None;
        self.refresh();
    }

    fn dispatch(&mut self, event: UserEvent) -> bool {
        if let Some(action) = event.to_action() {
            let mut next = self.state.clone();
            apply(&mut next, action.clone());
            self.seed_enabled_filter(&mut next, &action);
            return self.replace_state(next);
        }

        match event {
            UserEvent::CycleFacet { facet, direction } => {
                let next = cycle_facet(&self.store, &self.state, facet, direction, self.language);
                self.replace_state(next)
            }
            UserEvent::CycleBiennialTarget { direction } => {
                let next = cycle_biennial_target(&self.store, &self.state, direction);
                self.replace_state(next)
            }
            UserEvent::CycleBiennialInterval { direction } => {
                let next = cycle_biennial_interval(&self.state, direction);
                self.replace_state(next)
            }
            UserEvent::SetLanguage { language } => {
                let changed = language != self.language;
                self.language = language;
                changed
            }
            UserEvent::SelectRecord { index } => self.select_record(index),
            UserEvent::LoadQuery { query } => self.replace_state(codec::decode(&query)),
            _ => false,
        }
    }

    fn replace_state(&mut self, next: FilterState) -> bool {
        if next == self.state {
            return false;
        }
        self.state = next;
        self.nearby = None;
        true
    }

    /// Enabling a filter with no values picks the same starting values as the controls
    fn seed_enabled_filter(&self, next: &mut FilterState, action: &StateAction) {
        match action {
            StateAction::SetRangeEnabled {
                target,
                enabled: true,
            } => {
                let bounds = self.store.year_bounds();
                let (range, extent) = match target {
                    RangeTarget::Publication => (&mut next.publication_years, bounds.publication),
                    RangeTarget::Collection => (&mut next.collection_years, bounds.collection),
                };
                if range.from.is_none() && range.to.is_none() {
                    range.from = Some(extent.min);
                    range.to = Some(extent.max);
                }
            }
            StateAction::SetBiennialEnabled(true) => {
                if next.biennial.target_year.is_none() {
                    next.biennial.target_year = biennial_year_options(&self.store).first().copied();
                }
                if next.biennial.interval.is_none() {
                    next.biennial.interval = Some(*BIENNIAL_INTERVALS.start());
                }
            }
            _ => {}
        }
    }

    fn select_record(&mut self, index: usize) -> bool {
        let visible = compute_visible(self.store.records(), &self.state);
        let indices = nearby_records(&visible, index, &self.map.viewport, self.nearby_radius_px);
        if indices.is_empty() {
            let changed = self.nearby.is_some();
            self.nearby = None;
            return changed;
        }

        let records = indices
            .into_iter()
            .map(|i| {
                let record = visible[i];
                NearbyRecord {
                    index: i,
                    record_type: record.record_type,
                    scientific_name: record.scientific_name.clone(),
                    japanese_name: record.japanese_name.clone(),
                    prefecture: record
                        .prefecture
                        .as_deref()
                        .map(|p| self.store.prefectures().label(p, self.language)),
                    literature: record
                        .literature_id
                        .as_deref()
                        .map(|id| self.store.literature_label(id, self.language)),
                }
            })
            .collect();
        self.nearby = Some(NearbySelection {
            clicked: index,
            records,
        });
        true
    }
}
