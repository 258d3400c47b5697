//! Per-replica stroke state for brushes that remember previous samples.

/// Maximum number of concurrent symmetry replicas.
pub const MAX_REPLICAS: usize = 64;

/// One state slot per replica index. `None` addresses slot 0.
#[derive(Debug, Clone)]
pub struct ReplicaSlots<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for ReplicaSlots<T> {
    fn default() -> Self {
        Self {
            slots: (0..MAX_REPLICAS).map(|_| None).collect(),
        }
    }
}

impl<T> ReplicaSlots<T> {
    /// Start a stroke. Without a replica id every slot is reset first.
    pub fn begin(&mut self, replica: Option<usize>, state: T) {
        if replica.is_none() {
            self.clear();
        }
        if let Some(slot) = self.slot_mut(replica) {
            *slot = Some(state);
        }
    }

    /// State for `replica`, initializing it with `init` when missing.
    pub fn get_or_begin(&mut self, replica: Option<usize>, init: impl FnOnce() -> T) -> Option<&mut T> {
        self.slot_mut(replica).map(|slot| slot.get_or_insert_with(init))
    }

    pub fn get(&self, replica: Option<usize>) -> Option<&T> {
        self.slots.get(replica.unwrap_or(0)).and_then(Option::as_ref)
    }

    /// End a stroke. Without a replica id every slot is cleared.
    pub fn end(&mut self, replica: Option<usize>) {
        match replica {
            None => self.clear(),
            Some(_) => {
                if let Some(slot) = self.slot_mut(replica) {
                    *slot = None;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn active(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn slot_mut(&mut self, replica: Option<usize>) -> Option<&mut Option<T>> {
        self.slots.get_mut(replica.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_clears_only_that_replica() {
        let mut slots = ReplicaSlots::default();
        slots.begin(Some(0), 'a');
        slots.begin(Some(3), 'b');
        assert_eq!(slots.active(), 2);
        slots.end(Some(3));
        assert_eq!(slots.active(), 1);
        assert_eq!(slots.get_or_begin(Some(0), || 'z'), Some(&mut 'a'));
    }

    #[test]
    fn test_plain_begin_resets_all() {
        let mut slots = ReplicaSlots::default();
        slots.begin(Some(5), 1);
        slots.begin(None, 2);
        assert_eq!(slots.active(), 1);
        slots.end(None);
        assert_eq!(slots.active(), 0);
    }

    #[test]
    fn test_out_of_range_replica_is_ignored() {
        let mut slots = ReplicaSlots::default();
        slots.begin(Some(MAX_REPLICAS), 1);
        assert_eq!(slots.active(), 0);
        assert!(slots.get_or_begin(Some(MAX_REPLICAS + 1), || 1).is_none());
    }

    #[test]
    fn test_lazy_init() {
        let mut slots: ReplicaSlots<u8> = ReplicaSlots::default();
        *slots.get_or_begin(Some(2), || 7).unwrap() += 1;
        assert_eq!(slots.get_or_begin(Some(2), || 0), Some(&mut 8));
    }
}
