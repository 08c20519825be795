//! Grouping of positioned tokens into visual rows.

use crate::models::token::Token;

/// Tokens judged to lie on the same visual line.
///
/// Tokens are kept in clustering order (ascending `y1`); use
/// [`Row::sorted_by_x`] for left-to-right consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    tokens: Vec<&'a Token>,
}

impl<'a> Row<'a> {
    pub fn new(tokens: Vec<&'a Token>) -> Self {
        Self { tokens }
    }

    /// Tokens in clustering order.
    pub fn tokens(&self) -> &[&'a Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens ordered left to right (stable on equal `x1`).
    pub fn sorted_by_x(&self) -> Vec<&'a Token> {
        let mut tokens = self.tokens.clone();
        tokens.sort_by_key(|t| t.x1);
        tokens
    }

    /// Row text: left-to-right token texts joined with single spaces.
    pub fn text(&self) -> String {
        join_texts(&self.sorted_by_x())
    }
}

/// Join token texts with single spaces.
pub(crate) fn join_texts(tokens: &[&Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clusters tokens into rows by vertical proximity.
#[derive(Debug, Clone, Copy)]
pub struct RowClusterer {
    y_tolerance: f64,
}

impl RowClusterer {
    pub fn new(y_tolerance: f64) -> Self {
        Self { y_tolerance }
    }

    /// Cluster tokens into rows.
    ///
    /// Tokens are visited in ascending `y1`. A token joins the open row when
    /// its vertical center is within tolerance of the row's running center,
    /// which then moves to the midpoint of itself and the new center. The
    /// running center is therefore order-dependent, not a true mean.
    pub fn cluster<'a>(&self, tokens: &'a [Token]) -> Vec<Row<'a>> {
        let mut sorted: Vec<&Token> = tokens.iter().collect();
        sorted.sort_by_key(|t| t.y1);

        let mut rows = Vec::new();
        let mut current: Vec<&Token> = Vec::new();
        let mut current_y: Option<f64> = None;

        for token in sorted {
            let cy = token.center_y();

            match current_y {
                Some(y) if (cy - y).abs() > self.y_tolerance => {
                    rows.push(Row::new(std::mem::take(&mut current)));
                    current.push(token);
                    current_y = Some(cy);
                }
                Some(y) => {
                    current.push(token);
                    current_y = Some((y + cy) / 2.0);
                }
                None => {
                    current.push(token);
                    current_y = Some(cy);
                }
            }
        }

        if !current.is_empty() {
            rows.push(Row::new(current));
        }

        rows
    }
}

impl Default for RowClusterer {
    fn default() -> Self {
        Self::new(12.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(x1: i32, y1: i32, y2: i32, text: &str) -> Token {
        Token::new(x1, y1, x1 + 40, y2, text)
    }

    #[test]
    fn test_empty_input() {
        assert!(RowClusterer::default().cluster(&[]).is_empty());
    }

    #[test]
    fn test_two_rows() {
        let tokens = vec![
            tok(300, 52, 64, "25.00"),
            tok(10, 10, 22, "Paracetamol"),
            tok(10, 50, 62, "Syringe"),
            tok(300, 11, 23, "12.50"),
        ];

        let rows = RowClusterer::default().cluster(&tokens);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text(), "Paracetamol 12.50");
        assert_eq!(rows[1].text(), "Syringe 25.00");
    }

    #[test]
    fn test_running_center_is_incremental() {
        let tokens = vec![
            tok(0, 4, 16, "a"),
            tok(50, 14, 26, "b"),
            tok(100, 22, 34, "c"),
        ];

        let rows = RowClusterer::new(12.0).cluster(&tokens);
        // a: center 10, b: 20 (|20-10| <= 12, running -> 15),
        // c: 28 (|28-15| = 13 > 12) opens a new row.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn test_running_center_favours_early_tokens() {
        // Centers 0, 12, 18, 24: running centers 0 -> 6 -> 12 -> 18.
        // A true mean of the first three (10) would reject the 4th token.
        let tokens = vec![
            tok(0, -6, 6, "a"),
            tok(10, 6, 18, "b"),
            tok(20, 12, 24, "c"),
            tok(30, 18, 30, "d"),
        ];

        let rows = RowClusterer::new(12.0).cluster(&tokens);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 4);
    }

    #[test]
    fn test_rows_partition_tokens() {
        let tokens: Vec<Token> = (0..20)
            .map(|i| tok(i * 7 % 100, i * 9, i * 9 + 10, "t"))
            .collect();

        let rows = RowClusterer::default().cluster(&tokens);
        let total: usize = rows.iter().map(Row::len).sum();
        assert_eq!(total, tokens.len());
    }

    #[test]
    fn test_sorts_by_top_edge_not_center() {
        // The tall token starts higher but its center is far below.
        let tokens = vec![
            Token::new(0, 10, 40, 20, "short"),
            Token::new(50, 0, 90, 80, "tall"),
        ];

        let rows = RowClusterer::default().cluster(&tokens);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tokens()[0].text, "tall");
        assert_eq!(rows[1].tokens()[0].text, "short");
    }
}
