//! Pure state transitions
//!
//! Every user-facing change to a [`FilterState`] goes through [`apply`], which
//! keeps the linked toggles consistent:
//!
//! - switching exclude-dubious on hides the three doubtful record types, and
//!   switching it off shows them
//! - toggling any doubtful record type recomputes exclude-dubious as
//!   "no doubtful type visible"
//! - the legend master toggle sets all seven record types at once

use serde::{Deserialize, Serialize};

use crate::record::{LifeStage, RecordType};
use crate::state::{
    ChartMode, Classification, Facet, FilterState, TypeVisibility, YearAxis, YearCountMode,
};

/// One of the independent exclusion toggles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    Unpublished,
    Dubious,
    Citation,
    Undescribed,
    Unranked,
}

/// Which year-range filter an action targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeTarget {
    Publication,
    Collection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateAction {
    SetFacet { facet: Facet, value: String },
    ClearFacet(Facet),
    SetRecordType { record_type: RecordType, visible: bool },
    SetLegendMaster(bool),
    SetExclusion { exclusion: Exclusion, value: bool },
    SetRangeEnabled { target: RangeTarget, enabled: bool },
    SetRange {
        target: RangeTarget,
        from: Option<i32>,
        to: Option<i32>,
    },
    SetBiennialEnabled(bool),
    SetBiennialTarget(Option<i32>),
    SetBiennialInterval(Option<u32>),
    SetMonthsEnabled(bool),
    SetMonth { month: u8, selected: bool },
    SetLifeStagesEnabled(bool),
    SetLifeStage { stage: LifeStage, selected: bool },
    SetClassification(Classification),
    SetChartMode(ChartMode),
    SetYearAxis(YearAxis),
    SetYearCountMode(YearCountMode),
    SetShowHigherTaxonomy(bool),
    Reset,
}

impl StateAction {
    /// Inputs that arrive as a stream of small edits and should be debounced
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            StateAction::SetRange { .. }
                | StateAction::SetBiennialTarget(_)
                | StateAction::SetBiennialInterval(_)
        )
    }
}

fn set_doubtful(types: &mut TypeVisibility, visible: bool) {
    for record_type in RecordType::ALL.into_iter().filter(|t| t.is_doubtful()) {
        types.set(record_type, visible);
    }
}

/// Apply one action in place
pub fn apply(state: &mut FilterState, action: StateAction) {
    match action {
        StateAction::SetFacet { facet, value } => state.facets.set(facet, value),
        StateAction::ClearFacet(facet) => state.facets.clear(facet),
        StateAction::SetRecordType {
            record_type,
            visible,
        } => {
            state.types.set(record_type, visible);
            if record_type.is_doubtful() {
                state.exclusions.dubious = !state.types.any_doubtful();
            }
        }
        StateAction::SetLegendMaster(on) => {
            state.legend_master = on;
            state.types = TypeVisibility::all(on);
            state.exclusions.dubious = !state.types.any_doubtful();
        }
        StateAction::SetExclusion { exclusion, value } => match exclusion {
            Exclusion::Unpublished => state.exclusions.unpublished = value,
            Exclusion::Dubious => {
                state.exclusions.dubious = value;
                set_doubtful(&mut state.types, !value);
            }
            Exclusion::Citation => state.exclusions.citation = value,
            Exclusion::Undescribed => state.exclusions.undescribed = value,
            Exclusion::Unranked => state.exclusions.unranked = value,
        },
        StateAction::SetRangeEnabled { target, enabled } => {
            range_mut(state, target).enabled = enabled;
        }
        StateAction::SetRange { target, from, to } => {
            let range = range_mut(state, target);
            range.from = from;
            range.to = to;
        }
        StateAction::SetBiennialEnabled(enabled) => state.biennial.enabled = enabled,
        StateAction::SetBiennialTarget(year) => state.biennial.target_year = year,
        StateAction::SetBiennialInterval(interval) => state.biennial.interval = interval,
        StateAction::SetMonthsEnabled(enabled) => state.months.enabled = enabled,
        StateAction::SetMonth { month, selected } => {
            if (1..=12).contains(&month) {
                state.months.months[usize::from(month - 1)] = selected;
            }
        }
        StateAction::SetLifeStagesEnabled(enabled) => state.life_stages.enabled = enabled,
        StateAction::SetLifeStage { stage, selected } => match stage {
            LifeStage::Adult => state.life_stages.adult = selected,
            LifeStage::JuvenileUnknown => state.life_stages.juvenile_unknown = selected,
        },
        StateAction::SetClassification(c) => state.display.classification = c,
        StateAction::SetChartMode(mode) => state.display.chart_mode = mode,
        StateAction::SetYearAxis(axis) => state.display.year_axis = axis,
        StateAction::SetYearCountMode(unit) => state.display.year_count = unit,
        StateAction::SetShowHigherTaxonomy(show) => state.show_higher_taxonomy = show,
        StateAction::Reset => *state = FilterState::default(),
    }
}

fn range_mut(state: &mut FilterState, target: RangeTarget) -> &mut crate::state::YearRangeFilter {
    match target {
        RangeTarget::Publication => &mut state.publication_years,
        RangeTarget::Collection => &mut state.collection_years,
    }
}

/// Consuming variant of [`apply`]
pub fn applied(mut state: FilterState, action: StateAction) -> FilterState {
    apply(&mut state, action);
    state
}
