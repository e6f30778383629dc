use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    sync::{Arc, LazyLock, OnceLock},
};

use log::{debug, trace};
use parking_lot::RwLock;

use super::{CsvRecord, InstructionSet};

type Slot = Arc<OnceLock<Arc<dyn Any + Send + Sync>>>;

static GLOBAL: LazyLock<ShapeCache> = LazyLock::new(ShapeCache::new);

/// Memoizes the [`InstructionSet`] of each record type.
///
/// Every record type gets its own slot. The slot is created under a short
/// write lock, then filled outside of it, so building one instruction set
/// never blocks lookups of another type. Callers racing on the same type
/// wait for the first build instead of repeating it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tagged_csv::{csv_record, shape::ShapeCache};
///
/// #[derive(Debug, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// csv_record!(Point { x => "x", y => "y" });
///
/// let cache = ShapeCache::new();
/// let first = cache.resolve::<Point>();
/// let second = cache.resolve::<Point>();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(first.header(), vec!["x", "y"]);
/// ```
#[derive(Default)]
pub struct ShapeCache {
    slots: RwLock<HashMap<TypeId, Slot>>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used when no explicit cache is given.
    pub fn global() -> &'static ShapeCache {
        &GLOBAL
    }

    /// Returns the instruction set of `R`, building it on first use.
    pub fn resolve<R: CsvRecord>(&self) -> Arc<InstructionSet<R>> {
        let slot = self.slot(TypeId::of::<R>());
        let entry = slot.get_or_init(|| {
            let instructions = InstructionSet::build(&R::shape());
            debug!(
                "Built {} field instructions for {}",
                instructions.len(),
                type_name::<R>()
            );
            Arc::new(instructions) as Arc<dyn Any + Send + Sync>
        });

        // Slots are keyed by `TypeId::of::<R>()` and only ever filled with an
        // `InstructionSet<R>`, so the downcast cannot fail.
        Arc::clone(entry)
            .downcast::<InstructionSet<R>>()
            .unwrap_or_else(|_| unreachable!("slot of {} holds another type", type_name::<R>()))
    }

    /// Whether the instruction set of `R` has been built.
    pub fn contains<R: 'static>(&self) -> bool {
        self.slots
            .read()
            .get(&TypeId::of::<R>())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of record types with a built instruction set.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: TypeId) -> Slot {
        if let Some(slot) = self.slots.read().get(&key) {
            trace!("Shape cache hit");
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().entry(key).or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
    };

    use super::ShapeCache;
    use crate::codec::{BoxError, Capabilities, CsvValue, MarshalCsv};

    static PROBES: AtomicUsize = AtomicUsize::new(0);
    static RACE_PROBES: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Default, PartialEq)]
    struct Probed(u8);

    impl MarshalCsv for Probed {
        fn marshal_csv(&self) -> Result<String, BoxError> {
            Ok(self.0.to_string())
        }
    }

    impl CsvValue for Probed {
        fn capabilities() -> Capabilities<Self> {
            PROBES.fetch_add(1, Ordering::SeqCst);
            Capabilities::new().with_marshal_csv()
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct RaceProbed(u8);

    impl CsvValue for RaceProbed {
        fn capabilities() -> Capabilities<Self> {
            RACE_PROBES.fetch_add(1, Ordering::SeqCst);
            Capabilities::new()
        }
    }

    #[derive(Debug, Default)]
    struct Probe {
        value: Probed,
        label: String,
    }

    crate::csv_record!(Probe {
        value => "value",
        label => "label",
    });

    #[derive(Debug, Default)]
    struct Raced {
        value: RaceProbed,
    }

    crate::csv_record!(Raced { value => "value" });

    #[derive(Debug, Default)]
    struct Other {
        id: u32,
    }

    crate::csv_record!(Other { id => "id" });

    #[derive(Debug, Default)]
    struct Pair {
        left: String,
        right: String,
    }

    crate::csv_record!(Pair {
        left => "left",
        right => "right",
    });

    #[test]
    fn resolves_each_shape_once() {
        let cache = ShapeCache::new();
        assert!(!cache.contains::<Probe>());

        let first = cache.resolve::<Probe>();
        let second = cache.resolve::<Probe>();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(PROBES.load(Ordering::SeqCst), 1);
        assert!(cache.contains::<Probe>());
        assert_eq!(first.position_of("label"), second.position_of("label"));
    }

    #[test]
    fn shapes_are_cached_independently() {
        let cache = ShapeCache::new();

        let other = cache.resolve::<Other>();
        assert_eq!(other.header(), vec!["id"]);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains::<Raced>());
    }

    #[test]
    fn concurrent_resolution_builds_once() {
        let cache = ShapeCache::new();

        let resolved: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.resolve::<Raced>()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        assert_eq!(RACE_PROBES.load(Ordering::SeqCst), 1);
        assert!(resolved.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn global_cache_is_shared() {
        let first = ShapeCache::global().resolve::<Other>();
        let second = ShapeCache::global().resolve::<Other>();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn each_slot_returns_its_own_type() {
        let cache = ShapeCache::new();

        let other = cache.resolve::<Other>();
        let pair = cache.resolve::<Pair>();
        let other_again = cache.resolve::<Other>();

        assert_eq!(pair.header(), vec!["left", "right"]);
        assert_eq!(other_again.header(), vec!["id"]);
        assert!(Arc::ptr_eq(&other, &other_again));
        assert_eq!(cache.len(), 2);
    }
}
