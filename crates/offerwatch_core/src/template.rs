use chrono::{Months, NaiveDate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A value was supplied but the template has no slot for it.
    #[error("value {value} for {mark} has no placeholder in template `{template}`")]
    MissingPlaceholder {
        mark: &'static str,
        value: i64,
        template: String,
    },
    #[error("year/month/day {year}-{month}-{day} is not a valid date")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// Expand `{year}`, `{month}` and `{day}` placeholders in a selector
/// template. Only the supplied components are substituted; supplying a
/// component the template has no placeholder for is an error, since it
/// almost certainly means a misconfigured selector.
pub fn fill_date_template(
    template: &str,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
) -> Result<String, TemplateError> {
    // Reject combinations that cannot form a real date before touching
    // the template. Unsupplied components fall back to a trivially valid
    // stand-in so partial fills still validate the supplied parts.
    let (y, m, d) = (year.unwrap_or(2024), month.unwrap_or(1), day.unwrap_or(1));
    if NaiveDate::from_ymd_opt(y, m, d).is_none() {
        return Err(TemplateError::InvalidDate {
            year: y,
            month: m,
            day: d,
        });
    }

    let mut out = template.to_owned();
    let slots: [(&'static str, Option<i64>); 3] = [
        ("{year}", year.map(i64::from)),
        ("{month}", month.map(i64::from)),
        ("{day}", day.map(i64::from)),
    ];
    for (mark, value) in slots {
        if let Some(value) = value {
            if !out.contains(mark) {
                return Err(TemplateError::MissingPlaceholder {
                    mark,
                    value,
                    template: template.to_owned(),
                });
            }
            out = out.replace(mark, &value.to_string());
        }
    }
    Ok(out)
}

/// Add `months` to a date, clamping the day to the end of the target
/// month (Aug 31 + 6 months = Feb 28/29). Saturates at the calendar
/// limit, which is unreachable for any sane month offset.
pub fn shift_months(from: NaiveDate, months: u32) -> NaiveDate {
    from.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
