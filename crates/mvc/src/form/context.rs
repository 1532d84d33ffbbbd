use std::collections::HashMap;

/// Counters of one render pass: how many times each repeated field has been
/// rendered so far, per action.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    counters: HashMap<(String, String), usize>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of this rendering of `field` and advances the counter.
    pub fn next(&mut self, action: &str, field: &str) -> usize {
        let counter = self.counters.entry((action.to_string(), field.to_string())).or_insert(0);
        let index = *counter;
        *counter += 1;
        index
    }

    /// Starts a new render pass.
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_action_and_field() {
        let mut ctx = RenderContext::new();
        assert_eq!(ctx.next("edit", "tag"), 0);
        assert_eq!(ctx.next("edit", "tag"), 1);
        assert_eq!(ctx.next("edit", "alias"), 0);
        assert_eq!(ctx.next("", "tag"), 0);

        ctx.reset();
        assert_eq!(ctx.next("edit", "tag"), 0);
    }
}
