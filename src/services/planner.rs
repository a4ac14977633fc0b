use crate::models::SubdivisionPlan;

pub const DEFAULT_UNIT_TOKENS: usize = 700;
pub const DEFAULT_MIN_PARTS: usize = 1;
pub const DEFAULT_MAX_PARTS: usize = 15;

/// Chooses how many subchapters a chapter of a given size is cut into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Planner {
    pub unit_tokens: usize,
    pub min_parts: usize,
    pub max_parts: usize,
}

impl Default for Planner {
    fn default() -> Self {
        Self {
            unit_tokens: DEFAULT_UNIT_TOKENS,
            min_parts: DEFAULT_MIN_PARTS,
            max_parts: DEFAULT_MAX_PARTS,
        }
    }
}

impl Planner {
    pub fn new(unit_tokens: usize, min_parts: usize, max_parts: usize) -> Self {
        Self {
            unit_tokens: unit_tokens.max(1),
            min_parts,
            max_parts: max_parts.max(min_parts),
        }
    }

    /// `clamp(ceil(token_count / unit_tokens), min_parts, max_parts)`
    pub fn plan(&self, token_count: usize) -> SubdivisionPlan {
        let unit = self.unit_tokens.max(1);
        let raw = token_count.div_ceil(unit);
        SubdivisionPlan {
            target_count: raw.clamp(self.min_parts, self.max_parts.max(self.min_parts)),
        }
    }
}

/// Plan with the default 700-token unit and a 1..=15 range.
pub fn plan(token_count: usize) -> SubdivisionPlan {
    Planner::default().plan(token_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_boundaries() {
        assert_eq!(plan(0).target_count, 1);
        assert_eq!(plan(700).target_count, 1);
        assert_eq!(plan(701).target_count, 2);
        assert_eq!(plan(10500).target_count, 15);
        // ceil(15000 / 700) = 22
        assert_eq!(plan(15000).target_count, 15);
    }

    #[test]
    fn custom_unit_and_bounds() {
        let planner = Planner::new(100, 2, 5);
        assert_eq!(planner.plan(50).target_count, 2);
        assert_eq!(planner.plan(301).target_count, 4);
        assert_eq!(planner.plan(10_000).target_count, 5);
    }

    #[test]
    fn zero_unit_is_treated_as_one() {
        let planner = Planner::new(0, 1, 15);
        assert_eq!(planner.unit_tokens, 1);
        assert_eq!(planner.plan(3).target_count, 3);
    }
}
