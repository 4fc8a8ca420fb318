use crate::errors::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// One observation from an uploaded term-structure file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermPoint {
    pub time_to_maturity: f64,
    pub price: f64,
}

/// Parse an uploaded two-column table of (time to maturity, price) rows.
///
/// Columns may be separated by commas, tabs or spaces. A leading header row
/// is skipped when its first two cells are not numeric. Blank lines and
/// `#` comments are ignored. Extra columns are ignored.
pub fn parse_points(raw: &[u8]) -> LedgerResult<Vec<TermPoint>> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| LedgerError::Validation(format!("term structure is not utf-8: {e}")))?;

    let mut points = Vec::new();
    let mut seen_row = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut cells = line
            .split(|c: char| c == ',' || c == '\t' || c == ';' || c.is_whitespace())
            .filter(|c| !c.is_empty());
        let (Some(first), Some(second)) = (cells.next(), cells.next()) else {
            return Err(LedgerError::Validation(format!(
                "term structure line {line_no}: expected two columns"
            )));
        };

        let parsed = (first.parse::<f64>(), second.parse::<f64>());
        let (time_to_maturity, price) = match parsed {
            (Ok(t), Ok(p)) => (t, p),
            _ if !seen_row => {
                // header
                seen_row = true;
                continue;
            }
            _ => {
                return Err(LedgerError::Validation(format!(
                    "term structure line {line_no}: non-numeric value"
                )))
            }
        };
        seen_row = true;

        if !time_to_maturity.is_finite() || time_to_maturity < 0.0 {
            return Err(LedgerError::Validation(format!(
                "term structure line {line_no}: time to maturity must be finite and >= 0"
            )));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(LedgerError::Validation(format!(
                "term structure line {line_no}: price must be finite and > 0"
            )));
        }

        points.push(TermPoint { time_to_maturity, price });
    }

    if points.is_empty() {
        return Err(LedgerError::Validation("term structure file has no data rows".into()));
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_skipped() {
        let raw = b"Maturity Days,Rates\n1,0.0231\n2,0.0232\n";
        let points = parse_points(raw).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], TermPoint { time_to_maturity: 1.0, price: 0.0231 });
    }

    #[test]
    fn test_mixed_separators_and_comments() {
        let raw = b"# exported curve\n0.5\t98.1\n\n1.0   96.4 extra\n";
        let points = parse_points(raw).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].price, 96.4);
    }

    #[test]
    fn test_bad_row_after_data_rejected() {
        let raw = b"1,0.02\nabc,def\n";
        let err = parse_points(raw).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(parse_points(b"1,0\n").is_err());
        assert!(parse_points(b"-1,5\n").is_err());
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(parse_points(b"time,price\n").is_err());
        assert!(parse_points(b"").is_err());
    }
}
