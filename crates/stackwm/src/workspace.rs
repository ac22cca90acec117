#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkspaceTarget {
    Index(usize),
    Next,
    Prev,
}

impl WorkspaceTarget {
    /// Parses the one-based form used in keybindings (`"1"` is the first
    /// workspace) as well as `next`/`prev`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "next" | "n" | "+1" => Some(WorkspaceTarget::Next),
            "prev" | "previous" | "p" | "-1" => Some(WorkspaceTarget::Prev),
            s => s
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .map(WorkspaceTarget::Index),
        }
    }
}

pub struct Workspaces {
    current: usize,
    count: usize,
}

impl Workspaces {
    pub fn new(count: usize) -> Self {
        Self {
            current: 0,
            count: count.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.count
    }

    pub fn resolve(&self, target: WorkspaceTarget) -> usize {
        match target {
            WorkspaceTarget::Index(i) => i,
            WorkspaceTarget::Next => (self.current + 1) % self.count,
            WorkspaceTarget::Prev => (self.current + self.count - 1) % self.count,
        }
    }

    /// Makes `index` current. Out-of-range indices leave everything unchanged.
    pub fn switch(&mut self, index: usize) -> bool {
        if !self.contains(index) {
            return false;
        }
        self.current = index;
        true
    }
}
