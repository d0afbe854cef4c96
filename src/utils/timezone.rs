use chrono::offset::Offset;
use chrono::{DateTime, Datelike, FixedOffset, Local, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::consts::{DATE_FORMAT, MONTH_FORMAT};
use crate::error::AppError;

/// Timezone used to turn API timestamps into month/day bucket keys.
///
/// The API reports UTC timestamps; bucketing in UTC is the default so the
/// keys match the raw `YYYY-MM` prefix of the timestamp string.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Timezone {
    Local,
    Named(Tz),
}

impl Default for Timezone {
    fn default() -> Self {
        Timezone::Named(chrono_tz::UTC)
    }
}

impl Timezone {
    pub(crate) fn parse(value: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = value else {
            return Ok(Timezone::default());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("utc")
            || trimmed.eq_ignore_ascii_case("z")
        {
            return Ok(Timezone::default());
        }
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(Timezone::Local);
        }
        Tz::from_str(trimmed)
            .map(Timezone::Named)
            .map_err(|_| AppError::InvalidTimezone {
                input: trimmed.to_string(),
            })
    }

    pub(crate) fn to_fixed_offset(self, utc: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Timezone::Local => {
                let local = utc.with_timezone(&Local);
                let offset = local.offset().fix();
                local.with_timezone(&offset)
            }
            Timezone::Named(tz) => {
                let local = utc.with_timezone(&tz);
                let offset = local.offset().fix();
                local.with_timezone(&offset)
            }
        }
    }

    pub(crate) fn month_key(self, utc: DateTime<Utc>) -> String {
        self.to_fixed_offset(utc).format(MONTH_FORMAT).to_string()
    }

    pub(crate) fn day_key(self, utc: DateTime<Utc>) -> String {
        self.to_fixed_offset(utc).format(DATE_FORMAT).to_string()
    }

    pub(crate) fn year(self, utc: DateTime<Utc>) -> i32 {
        self.to_fixed_offset(utc).year()
    }
}
