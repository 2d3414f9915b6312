use hashbrown::hash_map::RawEntryMut;
use hashbrown::HashMap;
use rustc_hash::FxHasher;
use std::cell::RefCell;
use std::fmt;
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

/// A hash-consed handle. Call contexts form deep chains which are compared
/// and hashed constantly as cache keys, so the handle stores its hash up
/// front and equality short-circuits on pointer identity.
pub struct Interned<T> {
    data: Rc<T>,
    hash: u64,
}

impl<T> Clone for Interned<T> {
    fn clone(&self) -> Self {
        Interned {
            data: self.data.clone(),
            hash: self.hash,
        }
    }
}

impl<T> Deref for Interned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> Hash for Interned<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl<T: PartialEq> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        // `Rc::eq` tries pointer equality before falling back to a deep
        // comparison, and interning makes the pointer check almost always hit.
        self.data == other.data
    }
}

impl<T: Eq> Eq for Interned<T> {}

impl<T: PartialOrd> PartialOrd for Interned<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        if Rc::ptr_eq(&self.data, &other.data) {
            return Some(std::cmp::Ordering::Equal);
        }
        self.data.partial_cmp(&other.data)
    }
}

impl<T: Ord> Ord for Interned<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if Rc::ptr_eq(&self.data, &other.data) {
            return std::cmp::Ordering::Equal;
        }
        self.data.cmp(&other.data)
    }
}

impl<T: fmt::Debug> fmt::Debug for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data.fmt(f)
    }
}

pub struct Interner<T> {
    store: RefCell<HashMap<Rc<T>, (), BuildHasherDefault<FxHasher>>>,
}

impl<T: fmt::Debug> fmt::Debug for Interner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").field("store", &self.store).finish()
    }
}

impl<T: Hash + Eq> Interner<T> {
    pub fn new() -> Self {
        Interner {
            store: RefCell::new(HashMap::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }

    pub fn intern(&self, obj: T) -> Interned<T> {
        let mut store = self.store.borrow_mut();
        let hash = {
            let mut hasher = BuildHasher::build_hasher(store.hasher());
            obj.hash(&mut hasher);
            hasher.finish()
        };
        let data = match store.raw_entry_mut().from_key_hashed_nocheck(hash, &obj) {
            RawEntryMut::Occupied(occ) => occ.key().clone(),
            RawEntryMut::Vacant(vac) => vac.insert_hashed_nocheck(hash, Rc::new(obj), ()).0.clone(),
        };
        Interned { data, hash }
    }
}

impl<T: Hash + Eq> Default for Interner<T> {
    fn default() -> Self {
        Interner::new()
    }
}
