//! Parser configuration

/// Options controlling error recovery and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Try synthesising a missing closing token before entering panic mode
    pub insert_missing: bool,
    /// Longest closer run tried before a token that fits nowhere. Open
    /// blocks are always closed at end of input and before an outer closer
    pub max_insertions: usize,
    /// Recoveries allowed at one lookahead before it is skipped outright
    pub max_recoveries_per_token: usize,
    /// Record diagnostics on the tree (error nodes are built either way)
    pub collect_diagnostics: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            insert_missing: true,
            max_insertions: 2,
            max_recoveries_per_token: 3,
            collect_diagnostics: true,
        }
    }
}

impl ParseOptions {
    /// Options for callers that only need the tree shape
    pub fn without_diagnostics() -> Self {
        Self {
            collect_diagnostics: false,
            ..Self::default()
        }
    }

    /// Recover only by panic mode
    pub fn without_insertion() -> Self {
        Self {
            insert_missing: false,
            ..Self::default()
        }
    }
}
