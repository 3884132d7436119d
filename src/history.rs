use serde::{Deserialize, Serialize};

/// Where the history lives and how it is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PersistenceMode {
    /// In-memory append-only text; nothing is written to disk.
    TransientBuffer,
    /// Appended to the backing file and mirrored in memory.
    FileAppendMirrored,
    /// Appended to the backing file; the file is the only copy.
    #[default]
    FileAppendOnly,
    /// Ordered list of fragments, joined with newlines for display.
    InMemoryList,
}

impl PersistenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientBuffer => "transient-buffer",
            Self::FileAppendMirrored => "file-append-mirrored",
            Self::FileAppendOnly => "file-append-only",
            Self::InMemoryList => "in-memory-list",
        }
    }

    /// Whether captures are written to the backing store.
    pub fn uses_store(&self) -> bool {
        !matches!(self, Self::TransientBuffer)
    }

    /// Whether `current_text` is read back from the backing store.
    pub fn reads_store(&self) -> bool {
        matches!(self, Self::FileAppendMirrored | Self::FileAppendOnly)
    }

    fn is_list(&self) -> bool {
        matches!(self, Self::InMemoryList)
    }
}

impl std::fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The accumulated fragments, in capture order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRecord {
    /// Every fragment followed by `'\n'`, concatenated.
    Log(String),
    /// One element per fragment.
    List(Vec<String>),
}

impl HistoryRecord {
    pub fn for_mode(mode: PersistenceMode) -> Self {
        if mode.is_list() {
            Self::List(Vec::new())
        } else {
            Self::Log(String::new())
        }
    }

    /// Rebuild a record from previously persisted text.
    ///
    /// A list is recovered line by line; the trailing newline a log leaves
    /// behind does not produce an empty fragment.
    pub fn from_persisted(mode: PersistenceMode, text: &str) -> Self {
        match Self::for_mode(mode) {
            Self::Log(_) => Self::Log(text.to_string()),
            Self::List(_) => {
                let text = text.strip_suffix('\n').unwrap_or(text);
                if text.is_empty() {
                    Self::List(Vec::new())
                } else {
                    Self::List(text.split('\n').map(str::to_string).collect())
                }
            }
        }
    }

    pub fn push(&mut self, fragment: &str) {
        match self {
            Self::Log(log) => {
                log.push_str(fragment);
                log.push('\n');
            }
            Self::List(list) => list.push(fragment.to_string()),
        }
    }

    pub fn clear(&mut self) {
        match self {
            Self::Log(log) => log.clear(),
            Self::List(list) => list.clear(),
        }
    }

    /// Full text: the log as-is, or the list joined with `'\n'`.
    pub fn materialize(&self) -> String {
        match self {
            Self::Log(log) => log.clone(),
            Self::List(list) => list.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_terminates_every_fragment() {
        let mut record = HistoryRecord::for_mode(PersistenceMode::TransientBuffer);
        record.push("alpha");
        record.push("beta");
        assert_eq!(record.materialize(), "alpha\nbeta\n");
    }

    #[test]
    fn list_joins_without_trailing_separator() {
        let mut record = HistoryRecord::for_mode(PersistenceMode::InMemoryList);
        record.push("alpha");
        record.push("beta");
        assert_eq!(record.materialize(), "alpha\nbeta");

        record.clear();
        assert_eq!(record, HistoryRecord::List(Vec::new()));
        assert_eq!(record.materialize(), "");
    }

    #[test]
    fn list_from_persisted_log_text() {
        let record = HistoryRecord::from_persisted(PersistenceMode::InMemoryList, "a\nb\n");
        assert_eq!(record, HistoryRecord::List(vec!["a".into(), "b".into()]));

        let record = HistoryRecord::from_persisted(PersistenceMode::InMemoryList, "a\nb");
        assert_eq!(record.materialize(), "a\nb");

        let record = HistoryRecord::from_persisted(PersistenceMode::InMemoryList, "");
        assert_eq!(record, HistoryRecord::List(Vec::new()));
    }

    #[test]
    fn mode_names_match_config_values() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: PersistenceMode,
        }
        for mode in [
            PersistenceMode::TransientBuffer,
            PersistenceMode::FileAppendMirrored,
            PersistenceMode::FileAppendOnly,
            PersistenceMode::InMemoryList,
        ] {
            let parsed: Wrapper = toml::from_str(&format!("mode = \"{mode}\"")).unwrap();
            assert_eq!(parsed.mode, mode);
        }
    }
}
