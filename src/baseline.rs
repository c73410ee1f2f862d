use crate::Token;

/// Flags tokens that sit higher or lower than their successor.
#[derive(Debug, Clone, Copy)]
pub struct BaselineAnalyzer {
    tolerance: u32,
}

impl BaselineAnalyzer {
    pub fn new(tolerance: u32) -> Self {
        Self { tolerance }
    }

    /// The first and last token are never irregular.
    pub fn check(&self, tokens: &[Token], index: usize) -> bool {
        if index == 0 || index + 1 >= tokens.len() {
            return false;
        }
        let top = tokens[index].bounding_box.top;
        let next_top = tokens[index + 1].bounding_box.top;
        top.abs_diff(next_top) > self.tolerance
    }
}

impl Default for BaselineAnalyzer {
    fn default() -> Self {
        Self::new(crate::Thresholds::default().baseline_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;

    fn tokens(tops: &[u32]) -> Vec<Token> {
        tops.iter()
            .enumerate()
            .map(|(i, top)| {
                let b_box = BoundingBox::new(i as u32 * 30, *top, 20, 30);
                Token::new(format!("w{i}"), b_box, 90.0)
            })
            .collect()
    }

    #[test]
    fn single_token_is_never_irregular() {
        assert!(!BaselineAnalyzer::default().check(&tokens(&[10]), 0));
    }

    #[test]
    fn first_and_last_are_never_irregular() {
        let analyzer = BaselineAnalyzer::default();
        let tokens = tokens(&[0, 40, 0, 90]);
        assert!(!analyzer.check(&tokens, 0));
        assert!(analyzer.check(&tokens, 1));
        assert!(analyzer.check(&tokens, 2));
        assert!(!analyzer.check(&tokens, 3));

        let pair = &tokens[..2];
        assert!(!analyzer.check(pair, 0));
        assert!(!analyzer.check(pair, 1));
    }

    #[test]
    fn tolerance_is_exclusive() {
        let analyzer = BaselineAnalyzer::default();
        let tokens = tokens(&[10, 10, 12, 15, 15]);
        assert!(!analyzer.check(&tokens, 1));
        assert!(analyzer.check(&tokens, 2));
        assert!(!analyzer.check(&tokens, 3));
    }

    #[test]
    fn offset_direction_does_not_matter() {
        let analyzer = BaselineAnalyzer::default();
        assert!(analyzer.check(&tokens(&[0, 20, 10]), 1));
        assert!(analyzer.check(&tokens(&[0, 10, 20]), 1));
    }

    #[test]
    fn out_of_range_index_is_not_irregular() {
        assert!(!BaselineAnalyzer::default().check(&tokens(&[0, 5, 10]), 7));
    }
}
