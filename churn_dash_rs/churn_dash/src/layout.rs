use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    #[default]
    Single,
    Bulk,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    PredictionForm,
    BulkForm,
    SingleButton,
    BulkButton,
    KpiRow,
    ChartsRow,
    SectionHeader,
    BulkResults,
}

impl Region {
    pub const ALL: [Region; 8] = [
        Region::PredictionForm,
        Region::BulkForm,
        Region::SingleButton,
        Region::BulkButton,
        Region::KpiRow,
        Region::ChartsRow,
        Region::SectionHeader,
        Region::BulkResults,
    ];

    /// CSS selector of the region in the page markup.
    pub fn selector(self) -> &'static str {
        match self {
            Region::PredictionForm => "#predictionForm",
            Region::BulkForm => "#bulkForm",
            Region::SingleButton => "#btnSingle",
            Region::BulkButton => "#btnBulk",
            Region::KpiRow => ".kpi-row",
            Region::ChartsRow => ".charts-row",
            Region::SectionHeader => ".section-header",
            Region::BulkResults => "#bulkResults",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleEffect {
    /// Value for `style.display`.
    Display(&'static str),
    /// Replacement for the whole `class` attribute.
    Class(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionRule {
    pub region: Region,
    pub effect: RuleEffect,
}

impl ViewMode {
    /// The full configuration applied when entering this mode. Applying it
    /// twice is the same as applying it once.
    pub fn layout(self) -> [RegionRule; 8] {
        Region::ALL.map(|region| RegionRule {
            region,
            effect: self.effect(region),
        })
    }

    pub fn effect(self, region: Region) -> RuleEffect {
        use RuleEffect::{Class, Display};
        match (self, region) {
            (ViewMode::Single, Region::PredictionForm) => Display("block"),
            (ViewMode::Single, Region::BulkForm) => Display("none"),
            (ViewMode::Single, Region::SingleButton) => Class("btn"),
            (ViewMode::Single, Region::BulkButton) => Class("btn btn-outline"),
            (ViewMode::Single, Region::KpiRow) => Display("grid"),
            (ViewMode::Single, Region::ChartsRow) => Display("grid"),
            (ViewMode::Single, Region::SectionHeader) => Display("flex"),
            (ViewMode::Single, Region::BulkResults) => Display("none"),
            (ViewMode::Bulk, Region::PredictionForm) => Display("none"),
            (ViewMode::Bulk, Region::BulkForm) => Display("block"),
            (ViewMode::Bulk, Region::SingleButton) => Class("btn btn-outline"),
            (ViewMode::Bulk, Region::BulkButton) => Class("btn"),
            (ViewMode::Bulk, Region::KpiRow) => Display("none"),
            (ViewMode::Bulk, Region::ChartsRow) => Display("none"),
            (ViewMode::Bulk, Region::SectionHeader) => Display("none"),
            (ViewMode::Bulk, Region::BulkResults) => Display("block"),
        }
    }

    /// `display` value for a region, or `""` when the mode changes its class
    /// instead.
    pub fn display(self, region: Region) -> &'static str {
        match self.effect(region) {
            RuleEffect::Display(value) => value,
            RuleEffect::Class(_) => "",
        }
    }

    /// Class list for a region, or `""` when the mode changes its display
    /// instead.
    pub fn class(self, region: Region) -> &'static str {
        match self.effect(region) {
            RuleEffect::Class(value) => value,
            RuleEffect::Display(_) => "",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Single => f.write_str("single"),
            ViewMode::Bulk => f.write_str("bulk"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    /// Anything other than `bulk` selects the single view.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "bulk" {
            ViewMode::Bulk
        } else {
            ViewMode::Single
        })
    }
}
