// src/ast/source.rs

use rustc_hash::FxHashMap;

use super::ExprId;

/// A 1-based line/column position rendered into diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Side table of source positions produced by the parser.
///
/// `line_offsets` holds, for each line, the byte offset one past its
/// terminating newline, in ascending order. Positions are absolute byte
/// offsets into the source text.
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    positions: FxHashMap<ExprId, u32>,
    line_offsets: Vec<u32>,
}

impl SourceInfo {
    pub fn new(positions: FxHashMap<ExprId, u32>, line_offsets: Vec<u32>) -> Self {
        Self {
            positions,
            line_offsets,
        }
    }

    pub fn set_position(&mut self, id: ExprId, offset: u32) {
        self.positions.insert(id, offset);
    }

    pub fn position(&self, id: ExprId) -> Option<u32> {
        self.positions.get(&id).copied()
    }

    /// Resolve an expression id to a line/column location.
    ///
    /// Ids with no recorded position fall back to `1:1` so that issues always
    /// carry a well-formed location.
    pub fn location(&self, id: ExprId) -> SourceLocation {
        let Some(position) = self.position(id) else {
            return SourceLocation::default();
        };
        let line_idx = self.line_offsets.partition_point(|&offset| offset <= position);
        let line_start = if line_idx == 0 {
            0
        } else {
            self.line_offsets[line_idx - 1]
        };
        SourceLocation {
            line: line_idx as u32 + 1,
            column: position - line_start + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> SourceInfo {
        // Two lines of ten bytes each: offsets just past each newline.
        let mut info = SourceInfo::new(FxHashMap::default(), vec![10, 20]);
        info.set_position(ExprId(1), 0);
        info.set_position(ExprId(2), 9);
        info.set_position(ExprId(3), 10);
        info.set_position(ExprId(4), 15);
        info
    }

    #[test]
    fn locations_are_one_based() {
        let info = info();
        assert_eq!(info.location(ExprId(1)), SourceLocation { line: 1, column: 1 });
        assert_eq!(info.location(ExprId(2)), SourceLocation { line: 1, column: 10 });
        assert_eq!(info.location(ExprId(3)), SourceLocation { line: 2, column: 1 });
        assert_eq!(info.location(ExprId(4)), SourceLocation { line: 2, column: 6 });
    }

    #[test]
    fn missing_position_defaults() {
        let info = info();
        assert_eq!(info.location(ExprId(99)), SourceLocation::default());
    }
}
