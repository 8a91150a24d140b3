use serde::{Deserialize, Serialize};

/// Options for a parameter-map history traversal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Disabled nodes forward their map untouched instead of recording reads/writes.
    pub ignore_disabled: bool,
    /// Only follow edges that contribute to compiled output (hidden or non-connectable default
    /// pins are skipped).
    pub filter_for_compilation: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            ignore_disabled: true,
            filter_for_compilation: true,
        }
    }
}

/// Options for the reference IR translator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    /// Report an error when a `FailIfPreviouslyNotSet` variable is read before any write.
    pub fail_on_unset_reads: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            history: HistoryConfig::default(),
            fail_on_unset_reads: true,
        }
    }
}
