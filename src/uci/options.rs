//! Engine options exposed over `setoption`.

/// Clamp ranges for the spin options.
pub const HASH_MIN_MB: usize = 1;
pub const HASH_MAX_MB: usize = 65536;
pub const THREADS_MIN: usize = 1;
pub const THREADS_MAX: usize = 256;

/// Current option values.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub weights_path: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            hash_mb: 64,
            threads: 1,
            weights_path: None,
        }
    }
}

/// What a `setoption` asks the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionAction {
    ResizeHash(usize),
    SetThreads(usize),
    ClearHash,
    LoadWeights(String),
    Unknown,
}

impl EngineOptions {
    /// The `option` declaration lines advertised after `uci`.
    #[must_use]
    pub fn declarations(&self) -> Vec<String> {
        vec![
            format!(
                "option name Hash type spin default {} min {HASH_MIN_MB} max {HASH_MAX_MB}",
                self.hash_mb
            ),
            format!(
                "option name Threads type spin default {} min {THREADS_MIN} max {THREADS_MAX}",
                self.threads
            ),
            "option name Clear Hash type button".to_string(),
            "option name Weights type string default <empty>".to_string(),
        ]
    }

    /// Apply one `setoption`, updating the stored value and returning
    /// the action the engine must take. Names are case-insensitive.
    pub fn apply(&mut self, name: &str, value: Option<&str>) -> OptionAction {
        match name.to_ascii_lowercase().as_str() {
            "hash" => {
                let mb = value
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(self.hash_mb)
                    .clamp(HASH_MIN_MB, HASH_MAX_MB);
                self.hash_mb = mb;
                OptionAction::ResizeHash(mb)
            }
            "threads" => {
                let threads = value
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(self.threads)
                    .clamp(THREADS_MIN, THREADS_MAX);
                self.threads = threads;
                OptionAction::SetThreads(threads)
            }
            "clear hash" => OptionAction::ClearHash,
            "weights" => match value {
                Some(path) if !path.is_empty() && path != "<empty>" => {
                    self.weights_path = Some(path.to_string());
                    OptionAction::LoadWeights(path.to_string())
                }
                _ => OptionAction::Unknown,
            },
            _ => OptionAction::Unknown,
        }
    }
}
