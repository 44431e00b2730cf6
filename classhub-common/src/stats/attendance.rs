//! Attendance aggregation
//!
//! Turns a user's raw attendance rows into per-course and overall
//! present/total/percentage figures. Nothing here is persisted; the
//! summary is recomputed from the full record set on every read.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Percentage at or above which a student is in good standing
pub const GOOD_STANDING_PERCENT: f64 = 75.0;

/// Percentage below which attendance is critical
pub const CRITICAL_PERCENT: f64 = 60.0;

/// One attendance fact as read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub classroom_id: String,
    pub date: NaiveDate,
    pub is_present: bool,
}

/// Display labels for a classroom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseLabel {
    pub classroom_id: String,
    pub course_name: String,
    pub course_code: String,
}

/// Presentation bucket for an attendance percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    /// 75% and above
    Good,
    /// 60% up to (not including) 75%
    Warning,
    /// Below 60%
    Critical,
}

impl Standing {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= GOOD_STANDING_PERCENT {
            Standing::Good
        } else if percentage >= CRITICAL_PERCENT {
            Standing::Warning
        } else {
            Standing::Critical
        }
    }
}

/// Running present/total counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceTally {
    pub present: u32,
    pub total: u32,
}

impl AttendanceTally {
    pub fn record(&mut self, is_present: bool) {
        self.total += 1;
        if is_present {
            self.present += 1;
        }
    }

    /// `present / total * 100`, defined as 0 when there are no records.
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            f64::from(self.present) / f64::from(self.total) * 100.0
        } else {
            0.0
        }
    }

    pub fn standing(&self) -> Standing {
        Standing::from_percentage(self.percentage())
    }

    pub fn needs_intervention(&self) -> bool {
        self.percentage() < GOOD_STANDING_PERCENT
    }

    /// Consecutive present sessions needed to reach 75%.
    ///
    /// Smallest integer `x >= 0` with `(present + x) / (total + x) >= 0.75`,
    /// i.e. `ceil((75 * total - 100 * present) / 25)`, clamped at zero.
    pub fn classes_needed(&self) -> u32 {
        let deficit = 75 * i64::from(self.total) - 100 * i64::from(self.present);
        if deficit <= 0 {
            return 0;
        }
        // deficit > 0 here, so this is ceiling division
        let needed = (deficit + 24) / 25;
        u32::try_from(needed).unwrap_or(u32::MAX)
    }

    pub fn figures(&self) -> AttendanceFigures {
        AttendanceFigures {
            present: self.present,
            total: self.total,
            percentage: self.percentage(),
            standing: self.standing(),
            needs_intervention: self.needs_intervention(),
            classes_needed: self.classes_needed(),
        }
    }
}

/// Derived figures for one scope (a course, or overall)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFigures {
    pub present: u32,
    pub total: u32,
    pub percentage: f64,
    pub standing: Standing,
    pub needs_intervention: bool,
    pub classes_needed: u32,
}

/// Per-course attendance line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAttendance {
    pub classroom_id: String,
    pub course_name: String,
    pub course_code: String,
    #[serde(flatten)]
    pub figures: AttendanceFigures,
}

/// Overall plus per-course attendance for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub overall: AttendanceFigures,
    pub courses: Vec<CourseAttendance>,
    /// Number of courses below the good-standing threshold
    pub courses_needing_attention: usize,
}

/// Summarize attendance rows.
///
/// Courses appear in `labels` order; a labelled course without rows is
/// reported with zero figures. Rows for a classroom without a label are
/// still counted and reported under the classroom id.
pub fn summarize(records: &[AttendanceEntry], labels: &[CourseLabel]) -> AttendanceSummary {
    let mut overall = AttendanceTally::default();
    let mut per_course: BTreeMap<&str, AttendanceTally> = BTreeMap::new();

    for record in records {
        overall.record(record.is_present);
        per_course
            .entry(record.classroom_id.as_str())
            .or_default()
            .record(record.is_present);
    }

    let mut courses = Vec::with_capacity(labels.len().max(per_course.len()));
    let mut seen = HashSet::new();

    for label in labels {
        if !seen.insert(label.classroom_id.as_str()) {
            continue;
        }
        let tally = per_course
            .get(label.classroom_id.as_str())
            .copied()
            .unwrap_or_default();
        courses.push(CourseAttendance {
            classroom_id: label.classroom_id.clone(),
            course_name: label.course_name.clone(),
            course_code: label.course_code.clone(),
            figures: tally.figures(),
        });
    }

    for (classroom_id, tally) in &per_course {
        if seen.contains(classroom_id) {
            continue;
        }
        courses.push(CourseAttendance {
            classroom_id: classroom_id.to_string(),
            course_name: classroom_id.to_string(),
            course_code: String::new(),
            figures: tally.figures(),
        });
    }

    let courses_needing_attention = courses
        .iter()
        .filter(|c| c.figures.needs_intervention)
        .count();

    AttendanceSummary {
        overall: overall.figures(),
        courses,
        courses_needing_attention,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn entry(classroom: &str, d: u32, is_present: bool) -> AttendanceEntry {
        AttendanceEntry {
            classroom_id: classroom.to_string(),
            date: day(d),
            is_present,
        }
    }

    fn label(id: &str, name: &str) -> CourseLabel {
        CourseLabel {
            classroom_id: id.to_string(),
            course_name: name.to_string(),
            course_code: format!("{}-101", name),
        }
    }

    fn tally(present: u32, total: u32) -> AttendanceTally {
        AttendanceTally { present, total }
    }

    #[test]
    fn test_zero_records_is_zero_percent() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.overall.total, 0);
        assert_eq!(summary.overall.percentage, 0.0);
        assert!(!summary.overall.percentage.is_nan());

        let t = AttendanceTally::default();
        assert_eq!(t.percentage(), 0.0);
        assert_eq!(t.classes_needed(), 0);
    }

    #[test]
    fn test_percentage_matches_formula_and_bounds() {
        for total in 1..=40u32 {
            for present in 0..=total {
                let p = tally(present, total).percentage();
                assert!((0.0..=100.0).contains(&p));
                assert_eq!(p, f64::from(present) / f64::from(total) * 100.0);
            }
        }
    }

    #[test]
    fn test_standing_thresholds() {
        assert_eq!(Standing::from_percentage(100.0), Standing::Good);
        assert_eq!(Standing::from_percentage(75.0), Standing::Good);
        assert_eq!(Standing::from_percentage(74.99), Standing::Warning);
        assert_eq!(Standing::from_percentage(60.0), Standing::Warning);
        assert_eq!(Standing::from_percentage(59.99), Standing::Critical);
        assert_eq!(Standing::from_percentage(0.0), Standing::Critical);
    }

    #[test]
    fn test_classes_needed_for_seventy_percent() {
        let x = tally(70, 100).classes_needed();
        assert!(x > 0);
        let reach = f64::from(70 + x) / f64::from(100 + x);
        let one_short = f64::from(70 + x - 1) / f64::from(100 + x - 1);
        assert!(reach >= 0.75, "{} sessions should reach 75%", x);
        assert!(one_short < 0.75, "{} sessions should be the minimum", x);
        assert_eq!(x, 20);
    }

    #[test]
    fn test_classes_needed_is_minimal_everywhere() {
        for total in 0..=60u32 {
            for present in 0..=total {
                let x = tally(present, total).classes_needed();
                if x == 0 {
                    assert!(total == 0 || 4 * present >= 3 * total);
                } else {
                    assert!(4 * (present + x) >= 3 * (total + x));
                    assert!(4 * (present + x - 1) < 3 * (total + x - 1));
                }
            }
        }
    }

    #[test]
    fn test_classes_needed_never_negative_when_above_target() {
        assert_eq!(tally(10, 10).classes_needed(), 0);
        assert_eq!(tally(9, 10).classes_needed(), 0);
        assert_eq!(tally(3, 4).classes_needed(), 0);
    }

    #[test]
    fn test_summary_per_course_and_overall() {
        let records = vec![
            entry("math", 1, true),
            entry("math", 2, true),
            entry("math", 3, false),
            entry("math", 4, true),
            entry("phys", 1, false),
            entry("phys", 2, true),
        ];
        let labels = vec![label("phys", "Physics"), label("math", "Maths")];

        let summary = summarize(&records, &labels);

        assert_eq!(summary.overall.present, 4);
        assert_eq!(summary.overall.total, 6);
        assert_eq!(summary.courses.len(), 2);

        // Label order is preserved
        assert_eq!(summary.courses[0].course_name, "Physics");
        assert_eq!(summary.courses[0].figures.percentage, 50.0);
        assert_eq!(summary.courses[0].figures.standing, Standing::Critical);
        assert_eq!(summary.courses[1].course_name, "Maths");
        assert_eq!(summary.courses[1].figures.percentage, 75.0);
        assert!(!summary.courses[1].figures.needs_intervention);

        assert_eq!(summary.courses_needing_attention, 1);
    }

    #[test]
    fn test_labelled_course_without_rows_reports_zero() {
        let summary = summarize(&[], &[label("art", "Art")]);
        assert_eq!(summary.courses.len(), 1);
        assert_eq!(summary.courses[0].figures.total, 0);
        assert_eq!(summary.courses[0].figures.percentage, 0.0);
    }

    #[test]
    fn test_unlabelled_rows_are_still_counted() {
        let summary = summarize(&[entry("ghost", 1, true)], &[]);
        assert_eq!(summary.courses.len(), 1);
        assert_eq!(summary.courses[0].classroom_id, "ghost");
        assert_eq!(summary.courses[0].figures.percentage, 100.0);
    }
}
