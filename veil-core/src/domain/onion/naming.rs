// veil-core/src/domain/onion/naming.rs

/// Mints synthetic column names for precomputed expressions.
///
/// One namer lives inside each `OnionSet`; local names are sequential per
/// namer, global names are indexed by a caller-supplied canonical position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualColumnNamer {
    local_prefix: String,
    global_prefix: String,
    next: usize,
}

pub const DEFAULT_LOCAL_PREFIX: &str = "_virtual_local_";
pub const DEFAULT_GLOBAL_PREFIX: &str = "_virtual_global_";

impl Default for VirtualColumnNamer {
    fn default() -> Self {
        Self::with_prefixes(DEFAULT_LOCAL_PREFIX, DEFAULT_GLOBAL_PREFIX)
    }
}

impl VirtualColumnNamer {
    pub fn with_prefixes(local: impl Into<String>, global: impl Into<String>) -> Self {
        Self {
            local_prefix: local.into(),
            global_prefix: global.into(),
            next: 0,
        }
    }

    pub fn next_local(&mut self) -> String {
        let name = format!("{}{}", self.local_prefix, self.next);
        self.next += 1;
        name
    }

    pub fn global(&self, index: usize) -> String {
        format!("{}{}", self.global_prefix, index)
    }

    pub fn issued(&self) -> usize {
        self.next
    }

    /// Marks an externally assigned name as taken, so `next_local` never
    /// reissues it.
    pub fn reserve(&mut self, name: &str) {
        if let Some(n) = name
            .strip_prefix(self.local_prefix.as_str())
            .and_then(|suffix| suffix.parse::<usize>().ok())
        {
            self.next = self.next.max(n + 1);
        }
    }

    /// Skips past every local name `other` may have issued.
    pub fn advance_past(&mut self, other: &VirtualColumnNamer) {
        self.next = self.next.max(other.next);
    }
}
