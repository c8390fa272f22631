use serde::{Deserialize, Serialize};

pub const SEARCH_HISTORY_NAMESPACE: &str = "recentSearches";
pub const MAX_SEARCH_HISTORY: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut history = Self::default();
        for entry in entries {
            let term = normalize(&entry);
            if term.is_empty() || history.entries.contains(&term) {
                continue;
            }
            if history.entries.len() == MAX_SEARCH_HISTORY {
                break;
            }
            history.entries.push(term);
        }
        history
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&mut self, term: &str) -> bool {
        let term = normalize(term);
        if term.is_empty() {
            return false;
        }
        self.entries.retain(|existing| existing != &term);
        self.entries.insert(0, term);
        self.entries.truncate(MAX_SEARCH_HISTORY);
        true
    }

    pub fn remove(&mut self, term: &str) -> bool {
        let term = normalize(term);
        let before = self.entries.len();
        self.entries.retain(|existing| existing != &term);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn normalize(term: &str) -> String {
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}
