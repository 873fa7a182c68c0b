use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::format::{format_input, format_kpi};
use crate::funnel::FunnelConfig;
use crate::grid::Grid;
use crate::store::MonthData;

/// At most this many week buckets are shown per month
pub const MAX_WEEKS: usize = 5;

fn ratio(num: f64, den: f64) -> f64 {
    if den != 0.0 { num / den } else { 0.0 }
}

fn pct(num: f64, den: f64) -> f64 {
    ratio(num, den) * 100.0
}

/// First non-zero denominator wins
fn pct_first(num: f64, dens: &[f64]) -> f64 {
    dens.iter()
        .find(|&&d| d != 0.0)
        .map(|&d| num / d * 100.0)
        .unwrap_or(0.0)
}

/// Derived KPIs from the raw input columns.
///
/// `get` returns the value of an input column (0 when absent).
pub fn calculate(get: impl Fn(&str) -> f64) -> Vec<(&'static str, f64)> {
    let adspend = get("Adspend");
    let impr = get("Impr");
    let clicks = get("Clicks");
    let leads = get("Leads");
    let survey = get("Survey");
    let survey_quali = get("SurveyQuali");
    let units = get("Units");
    let revenue = get("Revenue");
    let cash = get("Cash");
    let emails_sent = get("Emails Sent");
    let opened = get("Opened");
    let calls_dialed = get("Calls Dialed");
    let reached = get("Reached");
    let closing_booking = get("ClosingBooking");
    let closing_termin = get("ClosingTermin");
    let closing_call = get("ClosingCall");
    let setting_booking = get("SettingBooking");
    let setting_termin = get("SettingTermin");
    let setting_call = get("SettingCall");
    let sales = get("Sales");

    vec![
        ("CPM", ratio(adspend, impr / 1000.0)),
        ("CTR-%", pct_first(clicks, &[impr, opened])),
        ("CPC", ratio(adspend, clicks)),
        ("Open-%", pct(opened, emails_sent)),
        ("Reach-%", pct(reached, calls_dialed)),
        ("Int-%", pct(clicks, reached)),
        ("LP-%", pct(leads, clicks)),
        ("CPL", ratio(adspend, leads)),
        ("VideoCR-%", pct_first(survey, &[leads, clicks])),
        ("CPS", ratio(adspend, survey)),
        ("SurveyQuali-%", pct(survey_quali, survey)),
        ("SurveyQuali-€", ratio(adspend, survey_quali)),
        ("Booking-%", pct_first(closing_booking, &[survey_quali, survey, leads, clicks])),
        ("Booking-€", ratio(adspend, closing_booking)),
        ("Quali-%", pct(closing_termin, closing_booking)),
        ("Termin-€", ratio(adspend, closing_termin)),
        ("SUR-%", pct(closing_call, closing_termin)),
        ("SUR-€", ratio(adspend, closing_call)),
        ("SB-%", pct_first(setting_booking, &[survey_quali, survey, leads, reached, clicks])),
        ("SB-€", ratio(adspend, setting_booking)),
        ("SQ-%", pct(setting_termin, setting_booking)),
        ("ST-€", ratio(adspend, setting_termin)),
        ("SS-%", pct(setting_call, setting_termin)),
        ("SS-€", ratio(adspend, setting_call)),
        ("CB-%", pct(closing_booking, setting_call)),
        ("CB-€", ratio(adspend, closing_booking)),
        ("CQ-%", pct(closing_termin, closing_booking)),
        ("CT-€", ratio(adspend, closing_termin)),
        ("CS-%", pct(closing_call, closing_termin)),
        ("CS-€", ratio(adspend, closing_call)),
        ("CC%", pct_first(units, &[sales, closing_call])),
        ("LC%", pct_first(units, &[leads, survey, clicks])),
        ("CC-Rate%", pct(cash, revenue)),
        ("CPA", ratio(adspend, units)),
        ("EPA-C", ratio(cash, units)),
        ("R-P/L", revenue - adspend),
        ("C-P/L", cash - adspend),
        ("R-ROI", ratio(revenue, adspend)),
        ("C-ROI", ratio(cash, adspend)),
    ]
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month >= 11 { (year + 1, 0) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm + 1, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// Days of the month grouped into weeks ending on Sunday, capped at [`MAX_WEEKS`].
pub fn week_buckets(year: i32, month: u32) -> Vec<Vec<u32>> {
    let mut weeks = Vec::new();
    let mut bucket = Vec::new();

    for day in 1..=days_in_month(year, month) {
        bucket.push(day);
        let is_sunday = NaiveDate::from_ymd_opt(year, month + 1, day)
            .map_or(false, |d| d.weekday() == Weekday::Sun);
        if is_sunday {
            weeks.push(std::mem::take(&mut bucket));
        }
    }
    if !bucket.is_empty() {
        weeks.push(bucket);
    }

    weeks.truncate(MAX_WEEKS);
    weeks
}

/// ISO week label of a bucket, taken from its Monday when it has one
pub fn bucket_week_label(year: i32, month: u32, bucket: &[u32]) -> String {
    let date = |d: u32| NaiveDate::from_ymd_opt(year, month + 1, d);
    let monday = bucket
        .iter()
        .filter_map(|&d| date(d))
        .find(|d| d.weekday() == Weekday::Mon);
    match monday.or_else(|| bucket.first().and_then(|&d| date(d))) {
        Some(d) => format!("KW{}", d.iso_week().week()),
        None => "—".to_string(),
    }
}

/// Sum every input column over the given days of one month.
/// Returns the totals and whether any value was present.
pub fn sum_days(data: &MonthData, inputs: &[String], days: &[u32]) -> (BTreeMap<String, f64>, bool) {
    let mut totals: BTreeMap<String, f64> = inputs.iter().map(|k| (k.clone(), 0.0)).collect();
    let mut has_any = false;

    for day in days {
        for input in inputs {
            if let Some(v) = data.get(&format!("{}_{}", input, day)).filter(|v| v.is_finite()) {
                *totals.entry(input.clone()).or_insert(0.0) += v;
                has_any = true;
            }
        }
    }
    (totals, has_any)
}

/// Record totals and KPIs of one aggregate under `{column}{suffix}`.
fn emit(
    values: &mut HashMap<String, f64>,
    funnel: &FunnelConfig,
    totals: &BTreeMap<String, f64>,
    suffix: &str,
) {
    for (col, &v) in totals {
        if v != 0.0 {
            values.insert(format!("{}{}", col, suffix), v);
        }
    }
    let get = |k: &str| totals.get(k).copied().unwrap_or(0.0);
    for (kpi, v) in calculate(get) {
        if funnel.kpi_cols.iter().any(|c| c == kpi) {
            values.insert(format!("{}{}", kpi, suffix), v);
        }
    }
}

/// Format a computed cell: input columns as amounts, everything else as KPI.
pub fn format_computed(funnel: &FunnelConfig, value: f64, key: &str) -> String {
    if funnel.is_input(crate::format::column_of(key)) {
        format_input(value, key)
    } else {
        format_kpi(value, key)
    }
}

/// Recompute every derived cell of a month grid from stored data.
pub fn refresh_month(grid: &mut Grid, funnel: &FunnelConfig, data: &MonthData, year: i32, month: u32) {
    let mut values: HashMap<String, f64> = HashMap::new();
    let days: Vec<u32> = (1..=days_in_month(year, month)).collect();

    for &day in &days {
        let (totals, has_any) = sum_days(data, &funnel.inputs, &[day]);
        if has_any {
            let get = |k: &str| totals.get(k).copied().unwrap_or(0.0);
            for (kpi, v) in calculate(get) {
                values.insert(format!("{}_{}", kpi, day), v);
            }
        }
    }

    let (month_totals, has_any) = sum_days(data, &funnel.inputs, &days);
    if has_any {
        emit(&mut values, funnel, &month_totals, "");
    }

    for (i, bucket) in week_buckets(year, month).iter().enumerate() {
        let (totals, has_any) = sum_days(data, &funnel.inputs, bucket);
        if has_any {
            emit(&mut values, funnel, &totals, &format!("_W{}", i + 1));
        }
    }

    grid.sync_inputs(data, format_input);
    grid.apply_computed(&values, |v, k| format_computed(funnel, v, k));
}

/// Recompute a year grid from the twelve stored months (index = month).
pub fn refresh_year(grid: &mut Grid, funnel: &FunnelConfig, months: &[MonthData], year: i32) {
    let mut values: HashMap<String, f64> = HashMap::new();
    let mut year_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut quarter_totals: Vec<BTreeMap<String, f64>> = vec![BTreeMap::new(); 4];
    let mut year_any = false;
    let mut quarter_any = [false; 4];

    for (m, data) in months.iter().enumerate().take(12) {
        let days: Vec<u32> = (1..=days_in_month(year, m as u32)).collect();
        let (totals, has_any) = sum_days(data, &funnel.inputs, &days);
        if !has_any {
            continue;
        }
        emit(&mut values, funnel, &totals, &format!("_M{}", m + 1));
        for (k, v) in &totals {
            *year_totals.entry(k.clone()).or_insert(0.0) += v;
            *quarter_totals[m / 3].entry(k.clone()).or_insert(0.0) += v;
        }
        year_any = true;
        quarter_any[m / 3] = true;
    }

    for (q, totals) in quarter_totals.iter().enumerate() {
        if quarter_any[q] {
            emit(&mut values, funnel, totals, &format!("_Q{}", q + 1));
        }
    }
    if year_any {
        emit(&mut values, funnel, &year_totals, "");
    }

    grid.apply_computed(&values, |v, k| format_computed(funnel, v, k));
}
