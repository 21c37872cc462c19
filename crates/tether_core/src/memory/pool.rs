//! # Object Pool
//!
//! Recycling allocator for objects churned on the per-tick hot path
//! (entities, events, state records).
//!
//! Every object a pool constructs is stamped with a weak back-reference to
//! that pool. The stamp is an identity check and a routing hint for
//! [`free`]; it never keeps the pool alive.
//!
//! ## Construction strategies
//!
//! One [`Pool`] type covers three shapes:
//!
//! 1. **Homogeneous** - [`Pool::new`], one concrete `T: Default`.
//! 2. **Base/derived** - [`Pool::derived`], a base type such as
//!    `Box<dyn Trait>` always produced by one fixed constructor.
//! 3. **Factory-bound** - [`Pool::with_factory`], an injected closure for
//!    types without a no-argument constructor.
//!
//! # Thread Safety
//!
//! The free list sits behind a `parking_lot` mutex so pool handles and
//! stamps can be moved between threads, but the intended use is one pool
//! per room, driven from one thread.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Source of process-unique pool identities.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a pool instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolId(u64);

impl PoolId {
    fn fresh() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identity.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// An object that can be recycled by a [`Pool`].
///
/// Implementors embed a [`PoolStamp<Self>`] and expose it; the pool writes
/// it once when the object is first constructed.
pub trait Poolable: Sized + Send + 'static {
    /// Returns the stamp naming the pool that produced this object.
    fn stamp(&self) -> &PoolStamp<Self>;

    /// Returns the stamp mutably. Only the pool writes through this.
    fn stamp_mut(&mut self) -> &mut PoolStamp<Self>;

    /// Restores the object to its freshly-allocated state.
    ///
    /// Must leave the stamp untouched.
    fn reset(&mut self);
}

/// Weak back-reference from a pooled object to its owning pool.
pub struct PoolStamp<T> {
    owner: Option<(PoolId, Weak<PoolShared<T>>)>,
}

impl<T> PoolStamp<T> {
    /// A stamp for an object no pool has produced yet.
    #[must_use]
    pub const fn unstamped() -> Self {
        Self { owner: None }
    }

    /// Returns the identity of the producing pool, if any.
    #[must_use]
    pub fn pool_id(&self) -> Option<PoolId> {
        self.owner.as_ref().map(|(id, _)| *id)
    }

    /// Returns true if a pool has produced this object.
    #[must_use]
    pub const fn is_stamped(&self) -> bool {
        self.owner.is_some()
    }

    /// Returns true if `pool` produced this object.
    #[must_use]
    pub fn belongs_to(&self, pool: &Pool<T>) -> bool {
        self.owner
            .as_ref()
            .is_some_and(|(_, weak)| Weak::as_ptr(weak) == Arc::as_ptr(&pool.shared))
    }

    /// Returns a handle to the producing pool if it is still alive.
    #[must_use]
    pub fn pool(&self) -> Option<Pool<T>> {
        let (_, weak) = self.owner.as_ref()?;
        weak.upgrade().map(|shared| Pool { shared })
    }

    fn assign(&mut self, pool: &Pool<T>) {
        debug_assert!(self.owner.is_none(), "object stamped twice");
        self.owner = Some((pool.shared.id, Arc::downgrade(&pool.shared)));
    }
}

impl<T> Default for PoolStamp<T> {
    fn default() -> Self {
        Self::unstamped()
    }
}

impl<T> fmt::Debug for PoolStamp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pool_id() {
            Some(id) => write!(f, "PoolStamp({id})"),
            None => f.write_str("PoolStamp(unstamped)"),
        }
    }
}

/// How a pool builds an object when its free list is empty.
enum Construct<T> {
    /// Fixed constructor: homogeneous and base/derived pools.
    Fixed(fn() -> T),
    /// Injected factory.
    Factory(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T> Construct<T> {
    fn build(&self) -> T {
        match self {
            Self::Fixed(ctor) => ctor(),
            Self::Factory(factory) => factory(),
        }
    }
}

impl<T> Clone for Construct<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(ctor) => Self::Fixed(*ctor),
            Self::Factory(factory) => Self::Factory(Arc::clone(factory)),
        }
    }
}

/// State shared between a pool handle and the stamps of its objects.
struct PoolShared<T> {
    id: PoolId,
    free_list: Mutex<Vec<T>>,
    construct: Construct<T>,
}

/// A recycling pool of `T`.
///
/// Cloning a `Pool` clones the handle: both handles address the same free
/// list. Use [`Pool::clone_factory`] for an independent, empty pool with
/// the same construction strategy.
///
/// # Example
///
/// ```rust,ignore
/// let pool: Pool<Packet> = Pool::new();
/// let packet = pool.allocate();   // fresh or recycled, always reset
/// pool.deallocate(packet);        // reset and parked on the free list
/// ```
pub struct Pool<T> {
    shared: Arc<PoolShared<T>>,
}

impl<T: Poolable> Pool<T> {
    /// Creates a homogeneous pool producing `T::default()`.
    #[must_use]
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::from_construct(Construct::Fixed(T::default))
    }

    /// Creates a base/derived pool: objects of base type `T` always built
    /// by the one concrete constructor `ctor`.
    #[must_use]
    pub fn derived(ctor: fn() -> T) -> Self {
        Self::from_construct(Construct::Fixed(ctor))
    }

    /// Creates a factory-bound pool.
    #[must_use]
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::from_construct(Construct::Factory(Arc::new(factory)))
    }

    fn from_construct(construct: Construct<T>) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                id: PoolId::fresh(),
                free_list: Mutex::new(Vec::new()),
                construct,
            }),
        }
    }

    /// Returns this pool's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.shared.id
    }

    /// Returns the number of idle objects waiting on the free list.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.shared.free_list.lock().len()
    }

    /// Returns a reset object, recycled when one is idle.
    ///
    /// Fresh objects are stamped with this pool and reset before being
    /// handed out, so both paths yield the same observable state.
    #[must_use]
    pub fn allocate(&self) -> T {
        if let Some(obj) = self.shared.free_list.lock().pop() {
            return obj;
        }

        let mut obj = self.shared.construct.build();
        obj.stamp_mut().assign(self);
        obj.reset();
        tracing::trace!(pool = %self.id(), "constructed pooled object");
        obj
    }

    /// Resets `obj` and parks it on the free list.
    ///
    /// # Panics
    ///
    /// Panics if `obj` was produced by a different pool. That is
    /// cross-pool corruption and must not be recovered from.
    pub fn deallocate(&self, mut obj: T) {
        assert!(
            obj.stamp().belongs_to(self),
            "object stamped by {:?} released to {}",
            obj.stamp().pool_id(),
            self.id(),
        );

        obj.reset();
        self.shared.free_list.lock().push(obj);
    }

    /// Returns a new, empty pool with the same construction strategy.
    #[must_use]
    pub fn clone_factory(&self) -> Self {
        Self::from_construct(self.shared.construct.clone())
    }
}

impl<T: Poolable + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.shared.id)
            .field("free", &self.shared.free_list.lock().len())
            .finish()
    }
}

/// Releases `obj` to the pool that produced it.
///
/// If that pool has already been dropped the object is simply dropped.
///
/// # Panics
///
/// Panics if `obj` was never produced by a pool.
pub fn free<T: Poolable>(obj: T) {
    assert!(obj.stamp().is_stamped(), "freeing an object no pool produced");

    if let Some(pool) = obj.stamp().pool() {
        pool.deallocate(obj);
    }
}

/// Installs `obj` in `slot`, first freeing whatever occupied it.
pub fn replace<T: Poolable>(slot: &mut Option<T>, obj: T) {
    if let Some(previous) = slot.replace(obj) {
        free(previous);
    }
}

/// Frees every object left in `queue`, leaving it empty.
pub fn drain<T: Poolable>(queue: &mut VecDeque<T>) {
    while let Some(obj) = queue.pop_front() {
        free(obj);
    }
}
