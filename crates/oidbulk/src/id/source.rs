use crate::{MAX_COUNTER, ObjectId, SystemClock, TimeSource};
use portable_atomic::{AtomicU32, Ordering};
use rand::{Rng, rng};

/// A thread-safe supplier of unique [`ObjectId`]s.
///
/// Every batch task pulls identifiers from the same source concurrently, so
/// implementations must hand out distinct values without external locking.
pub trait IdentifierSource: Send + Sync {
    /// Returns the next identifier.
    fn next_id(&self) -> ObjectId;
}

/// The default [`IdentifierSource`].
///
/// Produces `secs | process tag | counter` identifiers. The process tag is
/// drawn once at construction and the counter is a lock-free atomic that wraps
/// at 2^24, so one generator stays unique as long as it issues fewer than
/// 16,777,216 identifiers per second.
#[derive(Debug)]
pub struct ObjectIdGenerator<T = SystemClock> {
    process_tag: [u8; 5],
    counter: AtomicU32,
    clock: T,
}

impl ObjectIdGenerator<SystemClock> {
    /// Creates a generator with a random process tag and counter seed, using
    /// the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ObjectIdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> ObjectIdGenerator<T> {
    /// Creates a generator with a random process tag and counter seed.
    pub fn with_clock(clock: T) -> Self {
        let mut rng = rng();
        let process_tag: [u8; 5] = rng.random();
        let counter = rng.random::<u32>() & MAX_COUNTER;
        Self::from_components(process_tag, counter, clock)
    }

    /// Creates a generator from explicit components. The first identifier
    /// carries `counter` (truncated to 24 bits).
    ///
    /// Intended for tests and for deployments that assign process tags
    /// themselves.
    pub const fn from_components(process_tag: [u8; 5], counter: u32, clock: T) -> Self {
        Self {
            process_tag,
            counter: AtomicU32::new(counter & MAX_COUNTER),
            clock,
        }
    }

    pub const fn process_tag(&self) -> [u8; 5] {
        self.process_tag
    }
}

impl<T> IdentifierSource for ObjectIdGenerator<T>
where
    T: TimeSource + Send + Sync,
{
    fn next_id(&self) -> ObjectId {
        // 2^32 is a multiple of 2^24, so masking after a wrapping add keeps
        // the sequence continuous across the u32 overflow.
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) & MAX_COUNTER;
        ObjectId::from_parts(self.clock.current_secs(), self.process_tag, counter)
    }
}
