use std::any::Any;
use std::fmt;

pub(crate) type BoxedEffect = Box<dyn Any + Send + Sync>;

struct Entry {
    index: usize,
    name: &'static str,
    value: Option<BoxedEffect>,
}

/// The live side effects of a run, ordered by step index.
///
/// While a sequence runs, this is always the contiguous prefix of steps whose
/// attempt succeeded and that have not been compensated yet. Steps see it
/// during [`attempt`](crate::Step::attempt) and
/// [`compensate`](crate::Step::compensate); callers receive it back from a
/// Factory run (the committed effects) or from a halted unwind (the stranded
/// effects).
#[derive(Default)]
pub struct Effects {
    entries: Vec<Entry>,
}

impl Effects {
    /// Create an empty effect list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, index: usize, name: &'static str, value: BoxedEffect) {
        debug_assert_eq!(index, self.entries.len(), "effects must stay contiguous");
        self.entries.push(Entry {
            index,
            name,
            value: Some(value),
        });
    }

    /// Remove the most recent effect that still holds a value.
    ///
    /// Slots whose value was taken are discarded on the way down. Returns
    /// `None` once the list is empty.
    pub(crate) fn pop(&mut self) -> Option<(usize, BoxedEffect)> {
        while let Some(entry) = self.entries.pop() {
            if let Some(value) = entry.value {
                return Some((entry.index, value));
            }
        }
        None
    }

    /// Number of live effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no effect is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the effect produced by the step at `index`.
    ///
    /// Returns `None` if there is no such step, the effect is not a `T`, or it
    /// was already taken.
    #[must_use]
    pub fn get<T: 'static>(&self, index: usize) -> Option<&T> {
        self.entries
            .get(index)
            .and_then(|entry| entry.value.as_ref())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Borrow the effect produced by the last step named `name`.
    #[must_use]
    pub fn named<T: 'static>(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.name == name)
            .and_then(|entry| entry.value.as_ref())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Take ownership of the effect produced by the step at `index`.
    ///
    /// The slot stays in place (so indices remain stable) but no longer holds
    /// a value. Returns `None` on a type mismatch, leaving the value untouched.
    pub fn take<T: 'static>(&mut self, index: usize) -> Option<T> {
        let slot = &mut self.entries.get_mut(index)?.value;
        if !slot.as_ref().is_some_and(|value| value.is::<T>()) {
            return None;
        }
        slot.take()
            .and_then(|value| value.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Names of the steps whose effects are listed, in step order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.name).collect()
    }
}

impl fmt::Debug for Effects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| (entry.index, entry.name)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Effects {
        let mut effects = Effects::new();
        effects.push(0, "alloc", Box::new(vec![1_u8, 2, 3]));
        effects.push(1, "open", Box::new(String::from("/tmp/out")));
        effects
    }

    #[test]
    fn new_effects_are_empty() {
        let effects = Effects::new();
        assert!(effects.is_empty());
        assert_eq!(effects.len(), 0);
    }

    #[test]
    fn get_downcasts_by_index() {
        let effects = sample();

        assert_eq!(effects.get::<Vec<u8>>(0), Some(&vec![1, 2, 3]));
        assert_eq!(effects.get::<String>(1).map(String::as_str), Some("/tmp/out"));
    }

    #[test]
    fn get_returns_none_for_wrong_type_or_index() {
        let effects = sample();

        assert!(effects.get::<String>(0).is_none());
        assert!(effects.get::<String>(5).is_none());
    }

    #[test]
    fn named_finds_effect_by_step_name() {
        let effects = sample();
        assert_eq!(effects.named::<Vec<u8>>("alloc"), Some(&vec![1, 2, 3]));
        assert!(effects.named::<Vec<u8>>("missing").is_none());
    }

    #[test]
    fn take_keeps_indices_stable() {
        let mut effects = sample();

        let buffer = effects.take::<Vec<u8>>(0);

        assert_eq!(buffer, Some(vec![1, 2, 3]));
        assert_eq!(effects.len(), 2);
        assert!(effects.get::<Vec<u8>>(0).is_none());
        assert_eq!(effects.get::<String>(1).map(String::as_str), Some("/tmp/out"));
    }

    #[test]
    fn take_with_wrong_type_leaves_value() {
        let mut effects = sample();

        assert!(effects.take::<String>(0).is_none());
        assert!(effects.get::<Vec<u8>>(0).is_some());
    }

    #[test]
    fn pop_returns_most_recent_effect() {
        let mut effects = sample();

        let (index, value) = effects.pop().expect("effect present");

        assert_eq!(index, 1);
        assert_eq!(
            value.downcast::<String>().ok().map(|boxed| *boxed),
            Some(String::from("/tmp/out"))
        );
        assert_eq!(effects.names(), vec!["alloc"]);
    }

    #[test]
    fn pop_skips_taken_slots() {
        let mut effects = sample();
        effects.push(2, "lock", Box::new(9_u32));
        assert_eq!(effects.take::<String>(1).as_deref(), Some("/tmp/out"));
        assert_eq!(effects.take::<u32>(2), Some(9));

        let (index, value) = effects.pop().expect("alloc is still held");

        assert_eq!(index, 0);
        assert_eq!(
            value.downcast::<Vec<u8>>().ok().map(|boxed| *boxed),
            Some(vec![1, 2, 3])
        );
        assert!(effects.is_empty());
        assert!(effects.pop().is_none());
    }

    #[test]
    fn debug_lists_indices_and_names() {
        let effects = sample();
        assert_eq!(format!("{effects:?}"), r#"[(0, "alloc"), (1, "open")]"#);
    }
}
