use std::mem;

/// Structural classification of a grid cell.
///
/// Governs which cells may be selected together: see [`Region::compatible`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Header,
    Body,
    Weekly,
    Quarterly,
    Total,
    Other,
}

impl Region {
    /// Two regions may share a selection if they are equal, or if both are
    /// body/total (a drag may run from the daily rows into the grand total).
    pub fn compatible(self, other: Region) -> bool {
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (Region::Body, Region::Total) | (Region::Total, Region::Body)
        )
    }
}

/// Table section a row is rendered in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Head,
    Body,
    Foot,
}

/// Per-row metadata attached by the grid renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowMarker {
    ColumnHeader,
    /// Day of month, 1-based
    Day(u32),
    /// Month index, 0-based
    Month(u32),
    SummaryHead,
    Summary,
    YearHead,
    YearSummary,
    Spacer,
    WeeklyHeader,
    /// Week bucket, 1-based
    Week(u32),
    QuarterHeader,
    /// Quarter, 1-based
    Quarter(u32),
}

impl RowMarker {
    /// True if both markers are the same kind of row, ignoring the index.
    pub fn same_kind(&self, other: &RowMarker) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    pub fn is_total(&self) -> bool {
        matches!(
            self,
            RowMarker::SummaryHead
                | RowMarker::Summary
                | RowMarker::YearHead
                | RowMarker::YearSummary
        )
    }
}

/// Derive the region of a row from its structural position.
///
/// First match wins: total markers, weekly marker, quarterly marker,
/// section membership, weekly override in the footer, then `Other`.
pub fn classify(section: Section, marker: RowMarker) -> Region {
    if marker.is_total() {
        return Region::Total;
    }
    if let RowMarker::Week(_) = marker {
        return Region::Weekly;
    }
    if let RowMarker::Quarter(_) = marker {
        return Region::Quarterly;
    }
    match section {
        Section::Head => Region::Header,
        Section::Body => Region::Body,
        Section::Foot if marker == RowMarker::WeeklyHeader => Region::Weekly,
        Section::Foot => Region::Other,
    }
}
