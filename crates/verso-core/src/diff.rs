//! Line-level diffs between two text contents.
//!
//! Stateless: nothing here touches a repository. [`generate_diff`] is the
//! positional comparison (line *i* of old against line *i* of new), so an
//! inserted line shifts everything after it into removed+added pairs.
//! [`LcsDiff`] is available behind the same [`DiffAlgorithm`] contract
//! for callers that want an aligned diff instead.

use serde::{Deserialize, Serialize};

/// How a line relates the old content to the new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTag {
    Unchanged,
    Added,
    Removed,
}

/// One tagged line of diff output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub tag: LineTag,
    pub line: String,
}

impl DiffLine {
    fn new(tag: LineTag, line: &str) -> Self {
        Self {
            tag,
            line: line.to_string(),
        }
    }

    /// Unified-diff style marker for this line.
    pub fn marker(&self) -> char {
        match self.tag {
            LineTag::Unchanged => ' ',
            LineTag::Added => '+',
            LineTag::Removed => '-',
        }
    }
}

/// Net change in non-blank line count between two contents.
///
/// `deletions` is always `-additions`: both come from the same count delta,
/// not from independent added/removed tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub additions: i64,
    pub deletions: i64,
}

/// Diff of one path between two versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub lines: Vec<DiffLine>,
    pub stats: FileStats,
}

impl FileDiff {
    /// Positional diff plus stats for `path`.
    pub fn compute(path: &str, old: &str, new: &str) -> Self {
        Self {
            path: path.to_string(),
            lines: generate_diff(old, new),
            stats: file_stats(old, new),
        }
    }
}

/// A strategy for turning two contents into tagged lines.
pub trait DiffAlgorithm {
    fn diff(&self, old: &str, new: &str) -> Vec<DiffLine>;
}

/// Index-by-index comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalDiff;

impl DiffAlgorithm for PositionalDiff {
    fn diff(&self, old: &str, new: &str) -> Vec<DiffLine> {
        let old_lines: Vec<&str> = old.split('\n').collect();
        let new_lines: Vec<&str> = new.split('\n').collect();
        let max_lines = old_lines.len().max(new_lines.len());

        let mut out = Vec::with_capacity(max_lines);
        for i in 0..max_lines {
            // A missing line on the shorter side compares as "".
            let old_line = old_lines.get(i).copied().unwrap_or("");
            let new_line = new_lines.get(i).copied().unwrap_or("");

            if old_line == new_line {
                out.push(DiffLine::new(LineTag::Unchanged, old_line));
            } else {
                if !old_line.is_empty() {
                    out.push(DiffLine::new(LineTag::Removed, old_line));
                }
                if !new_line.is_empty() {
                    out.push(DiffLine::new(LineTag::Added, new_line));
                }
            }
        }
        out
    }
}

/// Longest-common-subsequence alignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct LcsDiff;

impl DiffAlgorithm for LcsDiff {
    fn diff(&self, old: &str, new: &str) -> Vec<DiffLine> {
        let old_lines: Vec<&str> = old.split('\n').collect();
        let new_lines: Vec<&str> = new.split('\n').collect();

        let table = lcs_table(&old_lines, &new_lines);
        lcs_backtrack(&table, &old_lines, &new_lines)
            .into_iter()
            .map(|op| match op {
                EditOp::Equal(oi) => DiffLine::new(LineTag::Unchanged, old_lines[oi]),
                EditOp::Delete(oi) => DiffLine::new(LineTag::Removed, old_lines[oi]),
                EditOp::Insert(ni) => DiffLine::new(LineTag::Added, new_lines[ni]),
            })
            .collect()
    }
}

/// Compute the positional diff between two contents.
pub fn generate_diff(old: &str, new: &str) -> Vec<DiffLine> {
    PositionalDiff.diff(old, new)
}

/// Compare non-blank line counts of two contents.
pub fn file_stats(old: &str, new: &str) -> FileStats {
    let old_count = count_non_blank(old);
    let new_count = count_non_blank(new);
    FileStats {
        additions: new_count - old_count,
        deletions: old_count - new_count,
    }
}

/// Render tagged lines as text, one marker-prefixed line each.
pub fn render(lines: &[DiffLine]) -> String {
    let mut out = String::new();
    for l in lines {
        out.push(l.marker());
        out.push_str(&l.line);
        out.push('\n');
    }
    out
}

/// Returns true if the data appears to be binary (contains null byte in first 8KB).
pub fn is_binary(data: &[u8]) -> bool {
    let check_len = data.len().min(8192);
    data[..check_len].contains(&0)
}

/// Blank means nothing but whitespace or U+FEFF.
fn count_non_blank(content: &str) -> i64 {
    content
        .split('\n')
        .filter(|l| {
            !l.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
                .is_empty()
        })
        .count() as i64
}

/// Compute the longest common subsequence table for two slices of lines.
fn lcs_table(old: &[&str], new: &[&str]) -> Vec<Vec<usize>> {
    let m = old.len();
    let n = new.len();
    let mut table = vec![vec![0usize; n + 1]; m + 1];

    for i in 1..=m {
        for j in 1..=n {
            if old[i - 1] == new[j - 1] {
                table[i][j] = table[i - 1][j - 1] + 1;
            } else {
                table[i][j] = table[i - 1][j].max(table[i][j - 1]);
            }
        }
    }

    table
}

#[derive(Debug, PartialEq)]
enum EditOp {
    Equal(usize), // old_idx
    Insert(usize), // new_idx
    Delete(usize), // old_idx
}

/// Walk the table back from the end; removals come out before additions.
fn lcs_backtrack(table: &[Vec<usize>], old: &[&str], new: &[&str]) -> Vec<EditOp> {
    let mut ops = Vec::new();
    let mut i = old.len();
    let mut j = new.len();

    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old[i - 1] == new[j - 1] {
            ops.push(EditOp::Equal(i - 1));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i][j - 1] >= table[i - 1][j]) {
            ops.push(EditOp::Insert(j - 1));
            j -= 1;
        } else {
            ops.push(EditOp::Delete(i - 1));
            i -= 1;
        }
    }

    ops.reverse();
    ops
}
