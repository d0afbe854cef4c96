use crate::consts::MAX_YEAR_SPAN;
use crate::error::AppError;

/// Parse a year list such as `2019`, `2019,2020` or `2018-2020`.
/// An empty string or `all` means no year restriction.
pub(crate) fn parse_years(s: &str) -> Result<Vec<i32>, AppError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return Ok(Vec::new());
    }

    let invalid = || AppError::InvalidYear {
        input: s.to_string(),
    };

    let mut years = Vec::new();
    for part in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let start: i32 = start.trim().parse().map_err(|_| invalid())?;
            let end: i32 = end.trim().parse().map_err(|_| invalid())?;
            let span = i64::from(end) - i64::from(start) + 1;
            if !(1..=MAX_YEAR_SPAN).contains(&span) {
                return Err(invalid());
            }
            years.extend(start..=end);
        } else {
            years.push(part.parse().map_err(|_| invalid())?);
        }
    }
    years.sort_unstable();
    years.dedup();
    Ok(years)
}
