//! User event definitions
//!
//! One JSON object per line, tagged by `event`. Unrecognized tags parse as
//! [`UserEvent::Unknown`] and are ignored.

use diplo_core::navigation::Direction;
use diplo_core::record::{LifeStage, RecordType};
use diplo_core::state::{ChartMode, Classification, Facet, YearAxis, YearCountMode};
use diplo_core::update::{Exclusion, RangeTarget, StateAction};
use diplo_core::Language;
use serde::{Deserialize, Serialize};

/// All user interactions the explorer understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UserEvent {
    // ========== Facets ==========
    SetFacet {
        facet: Facet,
        value: String,
    },
    ClearFacet {
        facet: Facet,
    },
    CycleFacet {
        facet: Facet,
        direction: Direction,
    },

    // ========== Toggles ==========
    SetRecordType {
        record_type: RecordType,
        visible: bool,
    },
    SetLegendMaster {
        value: bool,
    },
    SetExclusion {
        exclusion: Exclusion,
        value: bool,
    },
    SetShowHigherTaxonomy {
        value: bool,
    },

    // ========== Year filters ==========
    SetRangeEnabled {
        target: RangeTarget,
        enabled: bool,
    },
    SetRange {
        target: RangeTarget,
        #[serde(default)]
        from: Option<i32>,
        #[serde(default)]
        to: Option<i32>,
    },
    SetBiennialEnabled {
        enabled: bool,
    },
    SetBiennialTarget {
        #[serde(default)]
        year: Option<i32>,
    },
    SetBiennialInterval {
        #[serde(default)]
        interval: Option<u32>,
    },
    CycleBiennialTarget {
        direction: Direction,
    },
    CycleBiennialInterval {
        direction: Direction,
    },

    // ========== Months & life stages ==========
    SetMonthsEnabled {
        enabled: bool,
    },
    SetMonth {
        month: u8,
        selected: bool,
    },
    SetLifeStagesEnabled {
        enabled: bool,
    },
    SetLifeStage {
        stage: LifeStage,
        selected: bool,
    },

    // ========== Display ==========
    SetClassification {
        value: Classification,
    },
    SetChartMode {
        value: ChartMode,
    },
    SetYearAxis {
        value: YearAxis,
    },
    SetYearCountMode {
        value: YearCountMode,
    },
    SetLanguage {
        language: Language,
    },

    // ========== Map ==========
    /// Click on the marker of a visible record
    SelectRecord {
        index: usize,
    },

    // ========== Whole state ==========
    /// Replace the state with a decoded query string
    LoadQuery {
        query: String,
    },
    Reset,

    #[serde(other)]
    Unknown,
}

impl UserEvent {
    /// Inputs that arrive in bursts (sliders, text boxes) and are debounced
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            UserEvent::SetRange { .. }
                | UserEvent::SetBiennialTarget { .. }
                | UserEvent::SetBiennialInterval { .. }
        )
    }

    /// Event type name for logging
    pub fn type_name(&self) -> &'static str {
        match self {
            UserEvent::SetFacet { .. } => "set_facet",
            UserEvent::ClearFacet { .. } => "clear_facet",
            UserEvent::CycleFacet { .. } => "cycle_facet",
            UserEvent::SetRecordType { .. } => "set_record_type",
            UserEvent::SetLegendMaster { .. } => "set_legend_master",
            UserEvent::SetExclusion { .. } => "set_exclusion",
            UserEvent::SetShowHigherTaxonomy { .. } => "set_show_higher_taxonomy",
            UserEvent::SetRangeEnabled { .. } => "set_range_enabled",
            UserEvent::SetRange { .. } => "set_range",
            UserEvent::SetBiennialEnabled { .. } => "set_biennial_enabled",
            UserEvent::SetBiennialTarget { .. } => "set_biennial_target",
            UserEvent::SetBiennialInterval { .. } => "set_biennial_interval",
            UserEvent::CycleBiennialTarget { .. } => "cycle_biennial_target",
            UserEvent::CycleBiennialInterval { .. } => "cycle_biennial_interval",
            UserEvent::SetMonthsEnabled { .. } => "set_months_enabled",
            UserEvent::SetMonth { .. } => "set_month",
            UserEvent::SetLifeStagesEnabled { .. } => "set_life_stages_enabled",
            UserEvent::SetLifeStage { .. } => "set_life_stage",
            UserEvent::SetClassification { .. } => "set_classification",
            UserEvent::SetChartMode { .. } => "set_chart_mode",
            UserEvent::SetYearAxis { .. } => "set_year_axis",
            UserEvent::SetYearCountMode { .. } => "set_year_count_mode",
            UserEvent::SetLanguage { .. } => "set_language",
            UserEvent::SelectRecord { .. } => "select_record",
            UserEvent::LoadQuery { .. } => "load_query",
            UserEvent::Reset => "reset",
            UserEvent::Unknown => "unknown",
        }
    }

    /// The pure state transition behind this event, if it is one
    ///
    /// Navigation, language, selection and query loading need the store or
    /// the application state and are handled there.
    pub fn to_action(&self) -> Option<StateAction> {
        let action = match self.clone() {
            UserEvent::SetFacet { facet, value } => StateAction::SetFacet { facet, value },
            UserEvent::ClearFacet { facet } => StateAction::ClearFacet(facet),
            UserEvent::SetRecordType {
                record_type,
                visible,
            } => StateAction::SetRecordType {
                record_type,
                visible,
            },
            UserEvent::SetLegendMaster { value } => StateAction::SetLegendMaster(value),
            UserEvent::SetExclusion { exclusion, value } => {
                StateAction::SetExclusion { exclusion, value }
            }
            UserEvent::SetShowHigherTaxonomy { value } => StateAction::SetShowHigherTaxonomy(value),
            UserEvent::SetRangeEnabled { target, enabled } => {
                StateAction::SetRangeEnabled { target, enabled }
            }
            UserEvent::SetRange { target, from, to } => StateAction::SetRange { target, from, to },
            UserEvent::SetBiennialEnabled { enabled } => StateAction::SetBiennialEnabled(enabled),
            UserEvent::SetBiennialTarget { year } => StateAction::SetBiennialTarget(year),
            UserEvent::SetBiennialInterval { interval } => {
                StateAction::SetBiennialInterval(interval)
            }
            UserEvent::SetMonthsEnabled { enabled } => StateAction::SetMonthsEnabled(enabled),
            UserEvent::SetMonth { month, selected } => StateAction::SetMonth { month, selected },
            UserEvent::SetLifeStagesEnabled { enabled } => {
                StateAction::SetLifeStagesEnabled(enabled)
            }
            UserEvent::SetLifeStage { stage, selected } => {
                StateAction::SetLifeStage { stage, selected }
            }
            UserEvent::SetClassification { value } => StateAction::SetClassification(value),
            UserEvent::SetChartMode { value } => StateAction::SetChartMode(value),
            UserEvent::SetYearAxis { value } => StateAction::SetYearAxis(value),
            UserEvent::SetYearCountMode { value } => StateAction::SetYearCountMode(value),
            UserEvent::Reset => StateAction::Reset,
            UserEvent::CycleFacet { .. }
            | UserEvent::CycleBiennialTarget { .. }
            | UserEvent::CycleBiennialInterval { .. }
            | UserEvent::SetLanguage { .. }
            | UserEvent::SelectRecord { .. }
            | UserEvent::LoadQuery { .. }
            | UserEvent::Unknown => return None,
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_facet() {
        let json = r#"{"event":"set_facet","facet":"genus","value":"Parafontaria"}"#;
        let event: UserEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event.to_action(),
            Some(StateAction::SetFacet {
                facet: Facet::Genus,
                value: "Parafontaria".to_string()
            })
        );
        assert!(!event.is_continuous());
    }

    #[test]
    fn test_parse_wire_enums() {
        let json = r#"{"event":"set_record_type","record_type":"doubtful-literature-record","visible":true}"#;
        let event: UserEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            UserEvent::SetRecordType {
                record_type: RecordType::DoubtfulLiteratureRecord,
                visible: true
            }
        ));

        let json = r#"{"event":"cycle_facet","facet":"prefecture","direction":"prev"}"#;
        let event: UserEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.type_name(), "cycle_facet");
        assert_eq!(event.to_action(), None);

        let json = r#"{"event":"set_chart_mode","value":"ratio"}"#;
        let event: UserEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.to_action(), Some(StateAction::SetChartMode(ChartMode::Ratio)));
    }

    #[test]
    fn test_parse_continuous_with_missing_bounds() {
        let json = r#"{"event":"set_range","target":"collection","from":1990}"#;
        let event: UserEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_continuous());
        assert_eq!(
            event.to_action(),
            Some(StateAction::SetRange {
                target: RangeTarget::Collection,
                from: Some(1990),
                to: None
            })
        );
    }

    #[test]
    fn test_parse_unknown_event() {
        let json = r#"{"event":"zoom_map","level":9}"#;
        let event: UserEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, UserEvent::Unknown);
    }

    #[test]
    fn test_parse_unit_reset() {
        let event: UserEvent = serde_json::from_str(r#"{"event":"reset"}"#).unwrap();
        assert_eq!(event.to_action(), Some(StateAction::Reset));
    }
}
