/// Position in the current workspace's visible ordering.
///
/// The cursor is only meaningful together with the length of that ordering;
/// every change to the visible set goes through [`FocusCycle::revalidate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusCycle {
    cursor: Option<usize>,
}

impl FocusCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn next(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            self.cursor = None;
            return None;
        }
        let next = match self.cursor {
            Some(i) if i < len => (i + 1) % len,
            Some(_) => 0,
            None => 0,
        };
        self.cursor = Some(next);
        self.cursor
    }

    pub fn prev(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            self.cursor = None;
            return None;
        }
        let prev = match self.cursor {
            Some(i) if i > 0 && i < len => i - 1,
            _ => len - 1,
        };
        self.cursor = Some(prev);
        self.cursor
    }

    pub fn set(&mut self, index: usize, len: usize) {
        self.cursor = (index < len).then_some(index);
    }

    /// Clamps the cursor into `0..len`.
    pub fn revalidate(&mut self, len: usize) -> Option<usize> {
        self.cursor = match self.cursor {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => None,
        };
        self.cursor
    }
}
