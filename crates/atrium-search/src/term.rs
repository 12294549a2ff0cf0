//! Query term inputs.
//!
//! Callers hand the builder either free text or a structured date
//! descriptor. The two shapes are resolved into a [`TermInput`] variant once,
//! at the builder boundary; the compiler only ever matches on the variant and
//! never re-inspects raw input.

use chrono::{Months, NaiveDate};
use serde_json::{Value, json};

use crate::CompileError;

/// A term handed to `query` or `multi_query`.
#[derive(Debug, Clone, PartialEq)]
pub enum TermInput {
    /// Free text, compiled as a match or query-string clause.
    Text(String),
    /// Structured date descriptor, compiled as a range clause.
    Date(DateInput),
}

impl TermInput {
    /// Returns true for text terms that are empty or whitespace-only.
    ///
    /// Blank terms are silently ignored by the builder rather than erroring.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Date(_) => false,
        }
    }
}

impl From<&str> for TermInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for TermInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<DateInput> for TermInput {
    fn from(date: DateInput) -> Self {
        Self::Date(date)
    }
}

/// A date with optional month and day, as entered in advanced search forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    /// Year (required).
    pub year: i32,
    /// Month 1-12, when given.
    pub month: Option<u32>,
    /// Day of month, when given.
    pub day: Option<u32>,
}

impl PartialDate {
    /// A year-only date.
    pub fn year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    /// A year-and-month date.
    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day: None,
        }
    }

    /// A full calendar date.
    pub fn day(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
        }
    }

    /// Returns the ISO date truncated to the finest given unit.
    fn floor(&self) -> Result<NaiveDate, CompileError> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
            .ok_or_else(|| CompileError::InvalidDate(format!("{self:?}")))
    }

    /// Returns the floor advanced by one unit at the coarsest omitted
    /// granularity: +1 day when a day is given, +1 month when only a month
    /// is, +1 year otherwise.
    fn next(&self) -> Result<NaiveDate, CompileError> {
        let floor = self.floor()?;
        let next = if self.day.is_some() {
            floor.succ_opt()
        } else if self.month.is_some() {
            floor.checked_add_months(Months::new(1))
        } else {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        };
        next.ok_or_else(|| CompileError::InvalidDate(format!("{self:?}")))
    }
}

/// A structured date descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput {
    /// A single (possibly partial) date, covering the whole unit it names.
    Single(PartialDate),
    /// An explicit from/to pair; either side may be absent.
    Span {
        /// Inclusive lower bound.
        from: Option<PartialDate>,
        /// Inclusive upper bound (inclusive of the whole unit it names).
        to: Option<PartialDate>,
    },
}

impl DateInput {
    /// Computes the half-open `[gte, lt)` bounds of this descriptor.
    ///
    /// A `Single` date spans exactly the unit it names: `1999` is all of
    /// 1999, `1999-06` all of June 1999. A `Span` keeps both named units
    /// inside the interval, omitting whichever bound is absent.
    pub fn bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), CompileError> {
        match self {
            Self::Single(date) => Ok((Some(date.floor()?), Some(date.next()?))),
            Self::Span { from, to } => {
                let gte = from.map(|d| d.floor()).transpose()?;
                let lt = to.map(|d| d.next()).transpose()?;
                Ok((gte, lt))
            }
        }
    }

    /// Renders this descriptor as a range clause body (`gte`/`lt` keys).
    pub fn to_range_body(&self) -> Result<Value, CompileError> {
        let (gte, lt) = self.bounds()?;
        let mut body = serde_json::Map::new();
        if let Some(gte) = gte {
            body.insert("gte".to_string(), json!(gte.format("%Y-%m-%d").to_string()));
        }
        if let Some(lt) = lt {
            body.insert("lt".to_string(), json!(lt.format("%Y-%m-%d").to_string()));
        }
        Ok(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds_of(input: DateInput) -> (String, String) {
        let (gte, lt) = input.bounds().unwrap();
        (
            gte.unwrap().format("%Y-%m-%d").to_string(),
            lt.unwrap().format("%Y-%m-%d").to_string(),
        )
    }

    #[test]
    fn year_only_spans_the_year() {
        let (gte, lt) = bounds_of(DateInput::Single(PartialDate::year(1999)));
        assert_eq!(gte, "1999-01-01");
        assert_eq!(lt, "2000-01-01");
    }

    #[test]
    fn year_and_month_spans_the_month() {
        let (gte, lt) = bounds_of(DateInput::Single(PartialDate::month(1999, 6)));
        assert_eq!(gte, "1999-06-01");
        assert_eq!(lt, "1999-07-01");
    }

    #[test]
    fn full_date_spans_the_day() {
        let (gte, lt) = bounds_of(DateInput::Single(PartialDate::day(1999, 6, 15)));
        assert_eq!(gte, "1999-06-15");
        assert_eq!(lt, "1999-06-16");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (gte, lt) = bounds_of(DateInput::Single(PartialDate::month(1999, 12)));
        assert_eq!(gte, "1999-12-01");
        assert_eq!(lt, "2000-01-01");
    }

    #[test]
    fn month_end_rolls_over() {
        let (gte, lt) = bounds_of(DateInput::Single(PartialDate::day(1999, 12, 31)));
        assert_eq!(gte, "1999-12-31");
        assert_eq!(lt, "2000-01-01");
    }

    #[test]
    fn span_keeps_both_years_inside() {
        let (gte, lt) = bounds_of(DateInput::Span {
            from: Some(PartialDate::year(1999)),
            to: Some(PartialDate::year(2001)),
        });
        assert_eq!(gte, "1999-01-01");
        assert_eq!(lt, "2002-01-01");
    }

    #[test]
    fn open_ended_span_omits_absent_bound() {
        let input = DateInput::Span {
            from: Some(PartialDate::year(2010)),
            to: None,
        };
        let (gte, lt) = input.bounds().unwrap();
        assert!(gte.is_some());
        assert!(lt.is_none());

        let body = input.to_range_body().unwrap();
        assert_eq!(body, serde_json::json!({"gte": "2010-01-01"}));
    }

    #[test]
    fn invalid_month_is_a_compile_error() {
        let input = DateInput::Single(PartialDate::month(1999, 13));
        assert!(matches!(input.bounds(), Err(CompileError::InvalidDate(_))));
    }

    #[test]
    fn blank_text_terms_are_blank() {
        assert!(TermInput::from("   ").is_blank());
        assert!(TermInput::from("").is_blank());
        assert!(!TermInput::from("bridge").is_blank());
        assert!(!TermInput::Date(DateInput::Single(PartialDate::year(1999))).is_blank());
    }
}
