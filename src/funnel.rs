use serde::{Deserialize, Serialize};
use tracing::warn;

/// Module categories, in the order their columns appear in the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Traffic,
    Funnel,
    Qualification,
    Close,
    Revenue,
}

pub struct FunnelModule {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub columns: &'static [&'static str],
    pub inputs: &'static [&'static str],
}

const fn module(
    id: &'static str,
    name: &'static str,
    category: Category,
    columns: &'static [&'static str],
    inputs: &'static [&'static str],
) -> FunnelModule {
    FunnelModule { id, name, category, columns, inputs }
}

use Category::*;

pub static MODULES: &[FunnelModule] = &[
    module("paid-ads", "Paid Ads", Traffic,
        &["Adspend", "Impr", "Reach", "CPM", "Clicks", "CTR-%", "CPC"],
        &["Adspend", "Impr", "Reach", "Clicks"]),
    module("cold-email", "Cold Email", Traffic,
        &["Emails Sent", "Opened", "Open-%", "Clicks", "CTR-%"],
        &["Emails Sent", "Opened", "Clicks"]),
    module("cold-calls", "Cold Calls", Traffic,
        &["Calls Dialed", "Reached", "Reach-%"],
        &["Calls Dialed", "Reached"]),
    module("organic", "Organic", Traffic, &["Clicks"], &["Clicks"]),

    module("classic-vsl", "Classic VSL (Optin, VSL, Survey)", Funnel,
        &["Leads", "LP-%", "CPL", "Survey", "VideoCR-%", "CPS"],
        &["Leads", "Survey"]),
    module("classic-vsl-organic", "Classic VSL (no adspend)", Funnel,
        &["Leads", "LP-%", "Survey", "VideoCR-%"],
        &["Leads", "Survey"]),
    module("direct-vsl", "Direct VSL (no optin)", Funnel,
        &["Survey", "VideoCR-%", "CPS"], &["Survey"]),
    module("direct-vsl-organic", "Direct VSL (no adspend)", Funnel,
        &["Survey", "VideoCR-%"], &["Survey"]),
    module("classic-vsl-no-survey", "Classic VSL without survey", Funnel,
        &["Leads", "LP-%", "CPL"], &["Leads"]),
    module("classic-vsl-no-survey-organic", "Classic VSL without survey (no adspend)", Funnel,
        &["Leads", "LP-%"], &["Leads"]),
    module("direct-no-survey", "Direct (no optin, no survey)", Funnel, &[], &[]),

    module("survey-qualified", "Qualified survey", Qualification,
        &["SurveyQuali", "SurveyQuali-%", "SurveyQuali-€"], &["SurveyQuali"]),
    module("survey-qualified-organic", "Qualified survey (no adspend)", Qualification,
        &["SurveyQuali", "SurveyQuali-%"], &["SurveyQuali"]),
    module("survey-unqualified", "Survey (unqualified)", Qualification, &[], &[]),
    module("no-survey", "No survey", Qualification, &[], &[]),
    module("direct-call-booking", "Direct call booking", Qualification, &[], &[]),
    module("direct-call-booking-coldcalls", "Direct call booking (cold calls)", Qualification, &[], &[]),
    module("direct-call-booking-coldcalls-withclicks", "Direct call booking (cold calls with landing page)", Qualification,
        &["Clicks", "Int-%"], &["Clicks"]),

    module("1-call-close", "1-Call Close", Close,
        &["ClosingBooking", "Booking-%", "Booking-€", "ClosingTermin", "Quali-%", "Termin-€",
          "ClosingCall", "SUR-%", "SUR-€"],
        &["ClosingBooking", "ClosingTermin", "ClosingCall"]),
    module("1-call-close-organic", "1-Call Close (no adspend)", Close,
        &["ClosingBooking", "Booking-%", "ClosingTermin", "Quali-%", "ClosingCall", "SUR-%"],
        &["ClosingBooking", "ClosingTermin", "ClosingCall"]),
    module("2-call-close", "2-Call Close", Close,
        &["SettingBooking", "SB-%", "SB-€", "SettingTermin", "SQ-%", "ST-€", "SettingCall", "SS-%", "SS-€",
          "ClosingBooking", "CB-%", "CB-€", "ClosingTermin", "CQ-%", "CT-€", "ClosingCall", "CS-%", "CS-€"],
        &["SettingBooking", "SettingTermin", "SettingCall", "ClosingBooking", "ClosingTermin", "ClosingCall"]),
    module("2-call-close-organic", "2-Call Close (no adspend)", Close,
        &["SettingBooking", "SB-%", "SettingTermin", "SQ-%", "SettingCall", "SS-%",
          "ClosingBooking", "CB-%", "ClosingTermin", "CQ-%", "ClosingCall", "CS-%"],
        &["SettingBooking", "SettingTermin", "SettingCall", "ClosingBooking", "ClosingTermin", "ClosingCall"]),

    module("revenue-paid", "Revenue & ROI", Revenue,
        &["Units", "CC%", "LC%", "Revenue", "Cash", "CC-Rate%", "CPA", "EPA-C", "R-P/L", "C-P/L", "R-ROI", "C-ROI"],
        &["Units", "Revenue", "Cash"]),
    module("revenue-organic", "Revenue (no adspend)", Revenue,
        &["Units", "CC%", "LC%", "Revenue", "Cash", "CC-Rate%", "EPA-C"],
        &["Units", "Revenue", "Cash"]),
];

pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub modules: &'static [&'static str],
}

pub static PRESETS: &[Preset] = &[
    Preset {
        id: "classic-qualified-1call",
        name: "Classic VSL | Qualified Survey | 1-Call Close",
        modules: &["classic-vsl", "survey-qualified", "1-call-close"],
    },
    Preset {
        id: "classic-qualified-2call",
        name: "Classic VSL | Qualified Survey | 2-Call Close",
        modules: &["classic-vsl", "survey-qualified", "2-call-close"],
    },
    Preset {
        id: "classic-nosurvey-1call",
        name: "Classic VSL | No Survey | 1-Call Close",
        modules: &["classic-vsl-no-survey", "no-survey", "1-call-close"],
    },
    Preset {
        id: "direct-survey-1call",
        name: "Direct VSL | Survey | 1-Call Close",
        modules: &["direct-vsl", "survey-unqualified", "1-call-close"],
    },
    Preset {
        id: "direct-survey-2call",
        name: "Direct VSL | Survey | 2-Call Close",
        modules: &["direct-vsl", "survey-unqualified", "2-call-close"],
    },
    Preset {
        id: "direct-call-booking-2call",
        name: "Direct Call Booking | 2-Call Close",
        modules: &["direct-call-booking", "no-survey", "2-call-close"],
    },
];

/// Used when a funnel names neither modules nor a known preset
pub const LEGACY_MODULES: &[&str] = &[
    "paid-ads", "classic-vsl", "survey-qualified", "1-call-close", "revenue-paid",
];

pub fn find_module(id: &str) -> Option<&'static FunnelModule> {
    MODULES.iter().find(|m| m.id == id)
}

pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// A funnel as written in the config file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunnelDef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
}

impl FunnelDef {
    /// Explicit modules win over the preset; neither falls back to the legacy layout.
    pub fn config(&self) -> FunnelConfig {
        let modules: Vec<String> = if !self.modules.is_empty() {
            self.modules.clone()
        } else if let Some(preset) = self.preset.as_deref().and_then(find_preset) {
            preset.modules.iter().map(|s| s.to_string()).collect()
        } else {
            LEGACY_MODULES.iter().map(|s| s.to_string()).collect()
        };
        FunnelConfig::from_modules(&self.id, &self.name, &modules)
    }
}

pub fn default_funnels() -> Vec<FunnelDef> {
    let legacy: Vec<String> = LEGACY_MODULES.iter().map(|s| s.to_string()).collect();
    vec![
        FunnelDef {
            id: "fb-ads".to_string(),
            name: "Facebook Ads".to_string(),
            preset: Some("classic-qualified-1call".to_string()),
            modules: legacy.clone(),
        },
        FunnelDef {
            id: "yt-ads".to_string(),
            name: "YouTube Ads".to_string(),
            preset: Some("classic-qualified-1call".to_string()),
            modules: legacy,
        },
    ]
}

/// Column layout of one funnel, composed from its modules
#[derive(Clone, Debug, PartialEq)]
pub struct FunnelConfig {
    pub id: String,
    pub name: String,
    pub modules: Vec<String>,
    /// Month grid columns, starting with `Tag` and `Datum`
    pub columns: Vec<String>,
    pub inputs: Vec<String>,
    pub kpi_cols: Vec<String>,
}

impl FunnelConfig {
    pub fn from_modules(id: &str, name: &str, module_ids: &[String]) -> Self {
        for unknown in module_ids.iter().filter(|m| find_module(m).is_none()) {
            warn!(funnel = id, module = %unknown, "unknown funnel module ignored");
        }

        let mut columns = vec!["Tag".to_string(), "Datum".to_string()];
        let mut inputs: Vec<String> = Vec::new();
        let mut kpi_cols: Vec<String> = Vec::new();

        // Category order decides column order, not the order the funnel lists its modules
        let mut selected: Vec<&FunnelModule> = MODULES
            .iter()
            .filter(|m| module_ids.iter().any(|id| id == m.id))
            .collect();
        selected.sort_by_key(|m| m.category);

        for module in selected {
            for &col in module.columns {
                if columns.iter().any(|c| c == col) {
                    continue;
                }
                columns.push(col.to_string());
                if module.inputs.contains(&col) {
                    inputs.push(col.to_string());
                } else {
                    kpi_cols.push(col.to_string());
                }
            }
        }

        Self {
            id: id.to_string(),
            name: name.to_string(),
            modules: module_ids.to_vec(),
            columns,
            inputs,
            kpi_cols,
        }
    }

    pub fn is_input(&self, col: &str) -> bool {
        self.inputs.iter().any(|c| c == col)
    }

    /// Year grid columns: `Monat` followed by every data column
    pub fn year_columns(&self) -> Vec<String> {
        std::iter::once("Monat".to_string())
            .chain(self.columns.iter().skip(2).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compose_legacy_funnel() {
        let cfg = FunnelConfig::from_modules("fb", "FB", &ids(LEGACY_MODULES));
        assert_eq!(&cfg.columns[..4], &["Tag", "Datum", "Adspend", "Impr"]);
        assert!(cfg.is_input("Adspend"));
        assert!(cfg.is_input("Cash"));
        assert!(!cfg.is_input("CPM"));
        assert!(cfg.kpi_cols.contains(&"R-ROI".to_string()));
        assert_eq!(cfg.columns.len(), 2 + cfg.inputs.len() + cfg.kpi_cols.len());
    }

    #[test]
    fn test_category_order_wins_over_listing_order() {
        let cfg = FunnelConfig::from_modules("x", "X", &ids(&["1-call-close", "paid-ads"]));
        assert_eq!(cfg.columns[2], "Adspend");
        let closing = cfg.columns.iter().position(|c| c == "ClosingBooking").unwrap();
        let clicks = cfg.columns.iter().position(|c| c == "Clicks").unwrap();
        assert!(clicks < closing);
    }

    #[test]
    fn test_duplicate_columns_collapse() {
        let cfg = FunnelConfig::from_modules(
            "x",
            "X",
            &ids(&["cold-email", "direct-call-booking-coldcalls-withclicks"]),
        );
        assert_eq!(cfg.columns.iter().filter(|c| *c == "Clicks").count(), 1);
        assert_eq!(cfg.inputs.iter().filter(|c| *c == "Clicks").count(), 1);
    }

    #[test]
    fn test_unknown_modules_are_skipped() {
        let cfg = FunnelConfig::from_modules("x", "X", &ids(&["nope", "organic"]));
        assert_eq!(cfg.columns, vec!["Tag", "Datum", "Clicks"]);
    }

    #[test]
    fn test_def_prefers_modules_then_preset_then_legacy() {
        let mut def = FunnelDef {
            id: "a".to_string(),
            name: "A".to_string(),
            preset: Some("direct-survey-1call".to_string()),
            modules: ids(&["organic"]),
        };
        assert_eq!(def.config().inputs, vec!["Clicks"]);

        def.modules.clear();
        assert!(def.config().is_input("Survey"));
        assert!(!def.config().is_input("Adspend"));

        def.preset = Some("missing".to_string());
        assert!(def.config().is_input("Adspend"));
    }

    #[test]
    fn test_year_columns() {
        let cfg = FunnelConfig::from_modules("x", "X", &ids(&["organic"]));
        assert_eq!(cfg.year_columns(), vec!["Monat", "Clicks"]);
    }
}
