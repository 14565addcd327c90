//! Top-ten table and its markdown file format.
//!
//! ```text
//! # High Scores
//!
//! 1. ABC - 1200
//! 2. ZZ - 340
//! ```

use serde::{Deserialize, Serialize};

pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: i64,
}

/// Reads every well-formed `N. NAME - SCORE` line; anything else is skipped.
pub fn parse_markdown(raw: &str) -> Vec<HighScoreEntry> {
    raw.lines().filter_map(parse_line).collect()
}

/// `N.` rank, optional spaces, 1-3 uppercase letters, optional spaces around
/// `-`, digits. `1.ABC-100` and `1.  AB -  50` are both accepted.
fn parse_line(line: &str) -> Option<HighScoreEntry> {
    let line = line.trim();
    let (rank, rest) = line.split_once('.')?;
    if rank.is_empty() || !rank.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (name, score) = rest.split_once('-')?;
    let name = name.trim();
    if name.is_empty() || name.len() > 3 || !name.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let score = score.trim_start();
    if score.is_empty() || !score.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(HighScoreEntry {
        name: name.to_string(),
        score: score.parse().ok()?,
    })
}

/// Serializes the best `MAX_ENTRIES` entries, highest first.
pub fn to_markdown(entries: &[HighScoreEntry]) -> String {
    let mut out = String::from("# High Scores\n\n");
    for (index, entry) in top_entries(entries).iter().enumerate() {
        out.push_str(&format!("{}. {} - {}\n", index + 1, entry.name, entry.score));
    }
    out
}

/// Uppercases, keeps A-Z only, truncates to three letters.
pub fn normalize_name(raw: &str) -> Option<String> {
    let name: String = raw
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase())
        .take(3)
        .collect();
    (!name.is_empty()).then_some(name)
}

fn top_entries(entries: &[HighScoreEntry]) -> Vec<HighScoreEntry> {
    let mut sorted = entries.to_vec();
    // Stable sort keeps earlier entries ahead on ties.
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted.truncate(MAX_ENTRIES);
    sorted
}

#[derive(Debug, Clone, Default)]
pub struct HighScoreTable {
    entries: Vec<HighScoreEntry>,
}

impl HighScoreTable {
    pub fn new(entries: Vec<HighScoreEntry>) -> Self {
        Self {
            entries: top_entries(&entries),
        }
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn qualifies(&self, score: i64) -> bool {
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().is_some_and(|last| score > last.score)
    }

    /// Returns the 1-based rank the entry landed at, or `None` if it did not
    /// make the table.
    pub fn insert(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }
        let position = self
            .entries
            .iter()
            .position(|existing| entry.score > existing.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
        self.entries.truncate(MAX_ENTRIES);
        Some(position + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: i64) -> HighScoreEntry {
        HighScoreEntry {
            name: name.to_string(),
            score,
        }
    }

    #[test]
    fn parse_skips_malformed_lines() {
        let raw = "# High Scores\n\n1. ABC - 1200\n2. abc - 50\n3. TOOLONG - 10\n\
                   garbage\n4. ZZ - 340\n5. Q - -4\n6. X - 12.5\n";
        let entries = parse_markdown(raw);
        assert_eq!(entries, vec![entry("ABC", 1200), entry("ZZ", 340)]);
    }

    #[test]
    fn parse_tolerates_hand_edited_spacing() {
        let raw = "1.ABC-100\n2.  AB -  50\n3. Z  -7\n4. A B - 1\n";
        assert_eq!(
            parse_markdown(raw),
            vec![entry("ABC", 100), entry("AB", 50), entry("Z", 7)]
        );
    }

    #[test]
    fn unreadable_content_parses_to_empty() {
        assert!(parse_markdown("").is_empty());
        assert!(parse_markdown("\u{0}\u{1}binary").is_empty());
    }

    #[test]
    fn markdown_is_sorted_and_capped() {
        let entries: Vec<_> = (0..12).map(|i| entry("AAA", i * 10)).collect();
        let text = to_markdown(&entries);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "# High Scores");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "1. AAA - 110");
        assert_eq!(lines.len(), 2 + MAX_ENTRIES);
        assert_eq!(lines[11], "10. AAA - 20");
        assert_eq!(parse_markdown(&text).len(), MAX_ENTRIES);
    }

    #[test]
    fn normalize_name_filters_and_truncates() {
        assert_eq!(normalize_name("ab1cd"), Some("ABC".to_string()));
        assert_eq!(normalize_name("z"), Some("Z".to_string()));
        assert_eq!(normalize_name("123 !"), None);
    }

    #[test]
    fn qualification_requires_free_slot_or_beating_last() {
        let mut table = HighScoreTable::new(vec![entry("A", 5)]);
        assert!(table.qualifies(0));

        let full: Vec<_> = (1..=10).map(|i| entry("B", i * 100)).collect();
        table = HighScoreTable::new(full);
        assert!(!table.qualifies(100));
        assert!(table.qualifies(101));
    }

    #[test]
    fn insert_ranks_and_evicts_lowest() {
        let full: Vec<_> = (1..=10).map(|i| entry("B", i * 100)).collect();
        let mut table = HighScoreTable::new(full);
        assert_eq!(table.insert(entry("NEW", 550)), Some(6));
        assert_eq!(table.entries().len(), MAX_ENTRIES);
        assert_eq!(table.entries().last().map(|e| e.score), Some(200));
        assert_eq!(table.insert(entry("LOW", 150)), None);
    }
}
