/// Trigger region at the bottom of the movie list.
///
/// The list "sees" the sentinel once the selection is within `threshold`
/// rows of the last loaded row. After `unregister` it never fires again.
#[derive(Debug, Clone)]
pub struct Sentinel {
    threshold: usize,
    registered: bool,
}

impl Sentinel {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            registered: true,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn unregister(&mut self) {
        self.registered = false;
    }

    /// Whether the sentinel is in view for a list of `len` rows with
    /// `selected` highlighted.
    pub fn observe(&self, selected: Option<usize>, len: usize) -> bool {
        if !self.registered {
            return false;
        }
        if len == 0 {
            return true;
        }
        let selected = selected.unwrap_or(0).min(len - 1);
        len - 1 - selected <= self.threshold
    }
}
