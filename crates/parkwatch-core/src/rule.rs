//! Overtime rules per billing type

use chrono::{DateTime, Utc};
use parkwatch_api::{BillingType, Session};
use parkwatch_config::RulesPolicy;
use parkwatch_util::{civil_date, civil_hour, hours_between};

/// Result of evaluating one session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Verdict {
    pub is_overtime: bool,
    /// Elapsed hours since entry
    pub hours_parked: f64,
    /// Hours beyond the hourly allowance; 0 for day passes
    pub overtime_hours: f64,
}

/// Stateless overtime predicate.
///
/// - `Hourly`: overtime once more than `hourly_allowance_hours` have elapsed.
/// - `DayPass`: overtime while the civil clock reads `00:00` up to
///   `day_pass_window_end_hour` on a civil day other than the entry day.
///   Outside that window a day pass is never flagged, even the afternoon
///   after entry.
/// - Anything else: never overtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvertimeRule {
    hourly_allowance_hours: f64,
    day_pass_window_end_hour: u32,
}

impl Default for OvertimeRule {
    fn default() -> Self {
        Self::from(RulesPolicy::default())
    }
}

impl From<RulesPolicy> for OvertimeRule {
    fn from(policy: RulesPolicy) -> Self {
        Self::new(policy.hourly_allowance_hours, policy.day_pass_window_end_hour)
    }
}

impl OvertimeRule {
    pub fn new(hourly_allowance_hours: f64, day_pass_window_end_hour: u32) -> Self {
        Self {
            hourly_allowance_hours,
            day_pass_window_end_hour,
        }
    }

    pub fn hourly_allowance_hours(&self) -> f64 {
        self.hourly_allowance_hours
    }

    pub fn day_pass_window_end_hour(&self) -> u32 {
        self.day_pass_window_end_hour
    }

    /// Evaluate a billing type entered at `entry` as of `now`
    pub fn evaluate(
        &self,
        billing_type: BillingType,
        entry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Verdict {
        let hours_parked = hours_between(entry, now);

        match billing_type {
            BillingType::Hourly => Verdict {
                is_overtime: hours_parked > self.hourly_allowance_hours,
                hours_parked,
                overtime_hours: (hours_parked - self.hourly_allowance_hours).max(0.0),
            },
            BillingType::DayPass => Verdict {
                is_overtime: civil_date(now) != civil_date(entry)
                    && civil_hour(now) < self.day_pass_window_end_hour,
                hours_parked,
                overtime_hours: 0.0,
            },
            BillingType::Unknown => Verdict {
                is_overtime: false,
                hours_parked,
                overtime_hours: 0.0,
            },
        }
    }

    /// Evaluate an active session.
    ///
    /// Callers filter out exited sessions first. Fails only when the entry
    /// time cannot be resolved to an instant.
    pub fn evaluate_session(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> parkwatch_util::Result<Verdict> {
        debug_assert!(session.is_active(), "exited sessions are not evaluated");
        let entry = session.entry_instant()?;
        Ok(self.evaluate(session.billing_type, entry, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use parkwatch_api::Vehicle;
    use parkwatch_util::{civil_offset, ParkwatchError};

    /// Instant at a civil date/time
    fn civil(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        civil_offset()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_hourly_just_over_allowance() {
        let rule = OvertimeRule::default();
        let now = civil(2025, 12, 25, 18, 0);
        let entry = now - Duration::hours(6) - Duration::seconds(1);

        let verdict = rule.evaluate(BillingType::Hourly, entry, now);
        assert!(verdict.is_overtime);
        assert!((verdict.overtime_hours - 1.0 / 3600.0).abs() < 1e-6);
        assert!((verdict.overtime_hours - 0.0003).abs() < 0.0001);
    }

    #[test]
    fn test_hourly_under_allowance() {
        let rule = OvertimeRule::default();
        let now = civil(2025, 12, 25, 18, 0);
        let entry = now - Duration::hours(5) - Duration::minutes(59);

        let verdict = rule.evaluate(BillingType::Hourly, entry, now);
        assert!(!verdict.is_overtime);
        assert_eq!(verdict.overtime_hours, 0.0);
    }

    #[test]
    fn test_hourly_exactly_at_allowance_is_not_overtime() {
        let rule = OvertimeRule::default();
        let now = civil(2025, 12, 25, 18, 0);
        let verdict = rule.evaluate(BillingType::Hourly, now - Duration::hours(6), now);
        assert!(!verdict.is_overtime);
    }

    #[test]
    fn test_hourly_custom_allowance() {
        let rule = OvertimeRule::new(2.0, 6);
        let now = civil(2025, 12, 25, 18, 0);
        let verdict = rule.evaluate(BillingType::Hourly, now - Duration::hours(3), now);
        assert!(verdict.is_overtime);
        assert!((verdict.overtime_hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_day_pass_same_day_never_overtime() {
        let rule = OvertimeRule::default();
        let entry = civil(2025, 12, 25, 0, 30);
        for hour in 0..24 {
            let now = civil(2025, 12, 25, hour, 45);
            if now < entry {
                continue;
            }
            assert!(
                !rule.evaluate(BillingType::DayPass, entry, now).is_overtime,
                "same-day check at {hour}:45 should not be overtime"
            );
        }
    }

    #[test]
    fn test_day_pass_next_day_night_window() {
        let rule = OvertimeRule::default();
        let entry = civil(2025, 12, 25, 9, 0);

        let verdict = rule.evaluate(BillingType::DayPass, entry, civil(2025, 12, 26, 3, 0));
        assert!(verdict.is_overtime);
        assert_eq!(verdict.overtime_hours, 0.0);
        assert!((verdict.hours_parked - 18.0).abs() < 1e-9);

        // Window closes at 06:00
        let verdict = rule.evaluate(BillingType::DayPass, entry, civil(2025, 12, 26, 5, 59));
        assert!(verdict.is_overtime);
        let verdict = rule.evaluate(BillingType::DayPass, entry, civil(2025, 12, 26, 6, 0));
        assert!(!verdict.is_overtime);
    }

    #[test]
    fn test_day_pass_next_day_morning_not_flagged() {
        let rule = OvertimeRule::default();
        let entry = civil(2025, 12, 25, 9, 0);
        let verdict = rule.evaluate(BillingType::DayPass, entry, civil(2025, 12, 26, 10, 0));
        assert!(!verdict.is_overtime);

        // Flagged again once the following night window opens
        let verdict = rule.evaluate(BillingType::DayPass, entry, civil(2025, 12, 27, 1, 0));
        assert!(verdict.is_overtime);
    }

    #[test]
    fn test_day_pass_uses_civil_dates_not_utc() {
        let rule = OvertimeRule::default();
        // 20:00 UTC on the 24th is 01:30 civil on the 25th
        let entry = Utc.with_ymd_and_hms(2025, 12, 24, 17, 0, 0).unwrap(); // 22:30 civil, 24th
        let now = Utc.with_ymd_and_hms(2025, 12, 24, 20, 0, 0).unwrap();
        assert!(rule.evaluate(BillingType::DayPass, entry, now).is_overtime);

        // Same UTC date but the civil day also matches: not overtime
        let entry = Utc.with_ymd_and_hms(2025, 12, 24, 19, 0, 0).unwrap(); // 00:30 civil, 25th
        assert!(!rule.evaluate(BillingType::DayPass, entry, now).is_overtime);
    }

    #[test]
    fn test_unknown_billing_never_overtime() {
        let rule = OvertimeRule::default();
        let entry = civil(2020, 1, 1, 0, 0);
        let now = civil(2025, 12, 26, 3, 0);
        let verdict = rule.evaluate(BillingType::Unknown, entry, now);
        assert!(!verdict.is_overtime);
        assert_eq!(verdict.overtime_hours, 0.0);
    }

    #[test]
    fn test_evaluate_session_parses_entry_time() {
        let rule = OvertimeRule::default();
        let session = Session {
            entry_time: "25/12/2025, 10:00:00".into(),
            exit_time: None,
            billing_type: BillingType::Hourly,
            vehicle: Vehicle {
                number_plate: "KA01AB1234".into(),
                vehicle_type: "Car".into(),
            },
        };

        let verdict = rule
            .evaluate_session(&session, civil(2025, 12, 25, 17, 30))
            .unwrap();
        assert!(verdict.is_overtime);
        assert!((verdict.hours_parked - 7.5).abs() < 1e-9);

        let broken = Session {
            entry_time: "sometime".into(),
            ..session
        };
        assert!(matches!(
            rule.evaluate_session(&broken, civil(2025, 12, 25, 17, 30)),
            Err(ParkwatchError::MalformedTimeFormat { .. })
        ));
    }
}
