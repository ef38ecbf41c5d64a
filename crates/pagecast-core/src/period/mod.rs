//! Calendar periods
//!
//! A [`Period`] is one occurrence of a cadence: a day, a week or a month. The
//! [`PeriodKey`] identifies it; two dates map to the same key exactly when
//! they fall into the same occurrence.
//!
//! Weeks run Monday to Sunday unless the cadence says otherwise. A week that
//! starts on another day is keyed by the ISO week of its first day; every ISO
//! week contains exactly one such day, so keys stay unique.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, Offset, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

/// Wall clock of the vault owner
///
/// A named zone follows its daylight-saving rules; a fixed offset never
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultZone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl VaultZone {
    pub fn utc() -> Self {
        VaultZone::Fixed(Utc.fix())
    }

    /// `instant` as read on this wall clock
    pub fn localize(&self, instant: &DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            VaultZone::Fixed(offset) => instant.with_timezone(offset),
            VaultZone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
        }
    }
}

impl fmt::Display for VaultZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultZone::Fixed(offset) => write!(f, "{}", offset),
            VaultZone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Recurrence rule of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    Daily,
    Weekly { starts_on: Weekday },
    Monthly,
}

impl Cadence {
    /// ISO weeks (Monday start)
    pub fn weekly() -> Self {
        Cadence::Weekly {
            starts_on: Weekday::Mon,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly { .. } => "weekly",
            Cadence::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Weekly { starts_on } if *starts_on != Weekday::Mon => {
                write!(f, "weekly (from {})", starts_on)
            }
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Which occurrence of a cadence a page belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Day(NaiveDate),
    Week { iso_year: i32, week: u32 },
    Month { year: i32, month: u32 },
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PeriodKey::Week { iso_year, week } => write!(f, "{:04}-W{:02}", iso_year, week),
            PeriodKey::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
        }
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One occurrence of a cadence with its inclusive date bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    #[serde(skip)]
    pub cadence: Cadence,
    pub key: PeriodKey,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// The period of `cadence` that contains `date`
    pub fn containing(cadence: Cadence, date: NaiveDate) -> Self {
        match cadence {
            Cadence::Daily => Self {
                cadence,
                key: PeriodKey::Day(date),
                start: date,
                end: date,
            },
            Cadence::Weekly { starts_on } => {
                let back = (7 + date.weekday().num_days_from_monday()
                    - starts_on.num_days_from_monday())
                    % 7;
                let start = date - Duration::days(i64::from(back));
                let iso = start.iso_week();
                Self {
                    cadence,
                    key: PeriodKey::Week {
                        iso_year: iso.year(),
                        week: iso.week(),
                    },
                    start,
                    end: start + Duration::days(6),
                }
            }
            Cadence::Monthly => {
                let start = date.with_day(1).unwrap_or(date);
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(start);
                Self {
                    cadence,
                    key: PeriodKey::Month {
                        year: start.year(),
                        month: start.month(),
                    },
                    start,
                    end,
                }
            }
        }
    }

    /// The period containing `instant` as seen on the `zone` wall clock
    ///
    /// The calendar date of the instant decides; an instant exactly at
    /// midnight belongs to the day that starts there.
    pub fn at_instant(cadence: Cadence, instant: &DateTime<Utc>, zone: &VaultZone) -> Self {
        Self::containing(cadence, zone.localize(instant).date_naive())
    }

    /// Step `n` whole periods forward (negative: backward)
    ///
    /// `None` when the result leaves the supported calendar range.
    pub fn shift(&self, n: i32) -> Option<Self> {
        if n == 0 {
            return Some(*self);
        }
        let anchor = match self.cadence {
            Cadence::Daily => self
                .start
                .checked_add_signed(Duration::try_days(i64::from(n))?)?,
            Cadence::Weekly { .. } => self
                .start
                .checked_add_signed(Duration::try_weeks(i64::from(n))?)?,
            Cadence::Monthly => {
                let months = Months::new(n.unsigned_abs());
                if n > 0 {
                    self.start.checked_add_months(months)?
                } else {
                    self.start.checked_sub_months(months)?
                }
            }
        };
        Some(Self::containing(self.cadence, anchor))
    }

    /// The immediately preceding period under the same cadence
    pub fn previous(&self) -> Option<Self> {
        self.shift(-1)
    }
}
