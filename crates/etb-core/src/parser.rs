//! Free-text expense line parsing: `"<amount> <category>"`.

use crate::{errors::Error, Result};

/// A successfully parsed expense line.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedExpense {
    pub amount: f64,
    pub category: String,
}

/// Parse one free-text line into an amount and a category.
///
/// The line is split on the first whitespace run: the first token is the
/// amount (comma accepted as decimal separator), the trimmed remainder is
/// the category. Command lines and reserved keyboard labels are routed away
/// before this function is called.
pub fn parse_expense_line(text: &str) -> Result<ParsedExpense> {
    let mut parts = text.trim_start().splitn(2, char::is_whitespace);
    let token = parts.next().unwrap_or("");
    let Some(rest) = parts.next() else {
        return Err(Error::MalformedInput);
    };

    let amount: f64 = token.replace(',', ".").parse().map_err(|_| Error::NotANumber)?;
    if !amount.is_finite() {
        return Err(Error::NotANumber);
    }
    if amount <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    let category = rest.trim();
    if category.is_empty() {
        return Err(Error::EmptyCategory);
    }

    Ok(ParsedExpense {
        amount,
        category: category.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dot_and_comma_decimals() {
        assert_eq!(
            parse_expense_line("150 Кофе").unwrap(),
            ParsedExpense { amount: 150.0, category: "Кофе".into() }
        );
        assert_eq!(parse_expense_line("99.90 такси").unwrap().amount, 99.90);
        assert_eq!(parse_expense_line("99,90 такси").unwrap().amount, 99.90);
    }

    #[test]
    fn category_keeps_inner_spaces_and_loses_outer_ones() {
        let p = parse_expense_line("  200   обед в кафе  ").unwrap();
        assert_eq!(p.amount, 200.0);
        assert_eq!(p.category, "обед в кафе");
    }

    #[test]
    fn single_token_is_malformed() {
        assert!(matches!(parse_expense_line("150"), Err(Error::MalformedInput)));
        assert!(matches!(parse_expense_line(""), Err(Error::MalformedInput)));
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        assert!(matches!(parse_expense_line("кофе 150"), Err(Error::NotANumber)));
        assert!(matches!(parse_expense_line("1.2.3 еда"), Err(Error::NotANumber)));
        assert!(matches!(parse_expense_line("inf еда"), Err(Error::NotANumber)));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        assert!(matches!(parse_expense_line("-5 такси"), Err(Error::NonPositiveAmount)));
        assert!(matches!(parse_expense_line("0 такси"), Err(Error::NonPositiveAmount)));
        assert!(matches!(parse_expense_line("-0,5 такси"), Err(Error::NonPositiveAmount)));
    }

    #[test]
    fn empty_category_is_rejected() {
        assert!(matches!(parse_expense_line("150   "), Err(Error::EmptyCategory)));
    }
}
