//! Scoped recording sessions.
//!
//! While a session is active, every [`Queueable`] constructed on the current
//! thread is appended to the innermost session's log. Sessions live on a
//! thread-local stack: [`AnnotatedQueue::begin`] pushes one and hands back a
//! [`QueueGuard`], and the guard pops it again on [`QueueGuard::end`] or when
//! dropped (early `?` returns and panics included).
//!
//! Alongside each entry the queue keeps an [`Annotation`] describing
//! ownership between recorded objects: a tensor observable owns its factors,
//! a measurement owns its observable.
//!
//! # Example
//!
//! ```rust
//! use qtape_ir::prelude::*;
//!
//! let session = AnnotatedQueue::begin();
//! let z = PrimitiveObservable::pauli_z(0);
//! let m = expval(z.clone()).unwrap();
//! let queue = session.end();
//!
//! assert_eq!(queue.len(), 2);
//! assert_eq!(queue.get_annotation(z.id()).owner, Some(m.id()));
//! assert_eq!(queue.get_annotation(m.id()).owns, vec![z.id()]);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::error::{TapeError, TapeResult};
use crate::measure::MeasurementProcess;
use crate::observable::{PrimitiveObservable, Tensor};
use crate::operation::Operation;
use crate::wires::Wires;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static ACTIVE: RefCell<Vec<Session>> = const { RefCell::new(Vec::new()) };
}

/// A slot of the active stack, tagged with the identity of its guard.
struct Session {
    id: u64,
    queue: AnnotatedQueue,
}

/// Identity of a queueable object.
///
/// Allocated once per construction; clones share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub(crate) fn fresh() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that can be recorded into a session.
pub trait Queueable {
    /// Stable identity.
    fn id(&self) -> ObjectId;

    /// Human-readable kind tag.
    fn name(&self) -> &str;

    /// Target wires.
    fn wires(&self) -> &Wires;

    /// Numeric parameters, possibly empty.
    fn parameters(&self) -> Vec<f64>;

    /// Snapshot of this object as a queue entry.
    fn to_queued(&self) -> QueuedObject;

    /// Record this object into the active session, if any.
    ///
    /// Fails with [`TapeError::DuplicateEntry`] if the identity is already
    /// recorded there.
    fn queue(&self) -> TapeResult<()> {
        with_active(|q| q.record(self.to_queued()).map(|_| ())).unwrap_or(Ok(()))
    }
}

/// A recorded object.
#[derive(Debug, Clone)]
pub enum QueuedObject {
    /// A gate instruction.
    Operation(Operation),
    /// An elementary observable.
    Observable(PrimitiveObservable),
    /// A tensor product of observables.
    Tensor(Tensor),
    /// A terminal measurement.
    Measurement(MeasurementProcess),
}

impl QueuedObject {
    fn as_queueable(&self) -> &dyn Queueable {
        match self {
            QueuedObject::Operation(o) => o,
            QueuedObject::Observable(o) => o,
            QueuedObject::Tensor(t) => t,
            QueuedObject::Measurement(m) => m,
        }
    }

    /// Identity of the recorded object.
    pub fn id(&self) -> ObjectId {
        self.as_queueable().id()
    }

    /// Kind tag of the recorded object.
    pub fn name(&self) -> &str {
        self.as_queueable().name()
    }

    /// Wires of the recorded object.
    pub fn wires(&self) -> &Wires {
        self.as_queueable().wires()
    }

    /// The operation, if this entry is one.
    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            QueuedObject::Operation(o) => Some(o),
            _ => None,
        }
    }

    /// The measurement, if this entry is one.
    pub fn as_measurement(&self) -> Option<&MeasurementProcess> {
        match self {
            QueuedObject::Measurement(m) => Some(m),
            _ => None,
        }
    }
}

/// Ownership bookkeeping for one recorded object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// The object this one is a component of.
    pub owner: Option<ObjectId>,
    /// The objects this one is composed of, in order.
    pub owns: Vec<ObjectId>,
}

impl Annotation {
    /// True if neither key is set.
    pub fn is_empty(&self) -> bool {
        self.owner.is_none() && self.owns.is_empty()
    }
}

/// One slot of the queue arena.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// The recorded object.
    pub object: QueuedObject,
    /// Its annotation.
    pub annotation: Annotation,
}

/// An ordered log of recorded objects with per-object annotations.
#[derive(Debug, Clone, Default)]
pub struct AnnotatedQueue {
    entries: Vec<QueueEntry>,
    index: FxHashMap<ObjectId, usize>,
}

impl AnnotatedQueue {
    /// Create a detached queue that is not on the active stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a recording session on the current thread.
    pub fn begin() -> QueueGuard {
        let session = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let depth = ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(Session {
                id: session,
                queue: AnnotatedQueue::new(),
            });
            stack.len()
        });
        debug!(session, depth, "Recording session started");
        QueueGuard {
            session,
            depth,
            released: false,
            _not_send: PhantomData,
        }
    }

    /// Run `f` inside a fresh session and return the drained queue.
    pub fn capture<R>(f: impl FnOnce() -> R) -> (AnnotatedQueue, R) {
        let session = Self::begin();
        let value = f();
        (session.end(), value)
    }

    /// True if a session is active on the current thread.
    pub fn is_recording() -> bool {
        Self::depth() > 0
    }

    /// Number of nested sessions on the current thread.
    pub fn depth() -> usize {
        ACTIVE.with(|stack| stack.borrow().len())
    }

    /// Append an object.
    ///
    /// Returns the arena index of the new entry.
    pub fn record(&mut self, object: QueuedObject) -> TapeResult<usize> {
        let id = object.id();
        if self.index.contains_key(&id) {
            return Err(TapeError::DuplicateEntry {
                id,
                name: object.name().to_string(),
            });
        }
        Ok(self.push(object))
    }

    fn push(&mut self, object: QueuedObject) -> usize {
        let slot = self.entries.len();
        trace!(id = %object.id(), name = object.name(), slot, "Recorded");
        self.index.insert(object.id(), slot);
        self.entries.push(QueueEntry {
            object,
            annotation: Annotation::default(),
        });
        slot
    }

    /// Replace the stored snapshot of an already recorded object.
    fn refresh(&mut self, object: QueuedObject) {
        if let Some(&slot) = self.index.get(&object.id()) {
            self.entries[slot].object = object;
        }
    }

    /// Set the `owner` annotation of `obj`. No-op if `obj` is not recorded.
    pub fn annotate_owner(&mut self, obj: ObjectId, owner: ObjectId) {
        if let Some(&slot) = self.index.get(&obj) {
            self.entries[slot].annotation.owner = Some(owner);
        }
    }

    /// Set the `owns` annotation of `obj`. No-op if `obj` is not recorded.
    pub fn annotate_owns(&mut self, obj: ObjectId, owns: Vec<ObjectId>) {
        if let Some(&slot) = self.index.get(&obj) {
            self.entries[slot].annotation.owns = owns;
        }
    }

    /// The annotation of `obj`; empty if `obj` was never recorded.
    pub fn get_annotation(&self, obj: ObjectId) -> Annotation {
        self.index
            .get(&obj)
            .map(|&slot| self.entries[slot].annotation.clone())
            .unwrap_or_default()
    }

    /// The recorded snapshot of `obj`.
    pub fn get(&self, obj: ObjectId) -> Option<&QueuedObject> {
        self.index.get(&obj).map(|&slot| &self.entries[slot].object)
    }

    /// Check whether `obj` is recorded.
    pub fn contains(&self, obj: ObjectId) -> bool {
        self.index.contains_key(&obj)
    }

    /// Entries in recording order.
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Recorded objects in recording order.
    pub fn objects(&self) -> impl Iterator<Item = &QueuedObject> {
        self.entries.iter().map(|e| &e.object)
    }

    /// Consume the queue, yielding its entries in order.
    pub fn into_entries(self) -> Vec<QueueEntry> {
        self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle to an active session; pops it when ended or dropped.
///
/// Not `Send`: the session lives on the creating thread's stack.
#[must_use = "dropping the guard immediately ends the session"]
pub struct QueueGuard {
    session: u64,
    depth: usize,
    released: bool,
    _not_send: PhantomData<*const ()>,
}

impl QueueGuard {
    /// Nesting level of this session (1 for the outermost).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Inspect a snapshot of the session while it is still recording.
    ///
    /// Returns `None` once the session has been released, including by an
    /// outer session ending first. `f` runs on a copy, so it may construct
    /// and record further objects.
    pub fn with_queue<R>(&self, f: impl FnOnce(&AnnotatedQueue) -> R) -> Option<R> {
        let snapshot = ACTIVE.with(|stack| {
            stack
                .borrow()
                .iter()
                .find(|s| s.id == self.session)
                .map(|s| s.queue.clone())
        });
        snapshot.as_ref().map(f)
    }

    /// Pop the session and return everything it recorded.
    pub fn end(mut self) -> AnnotatedQueue {
        self.released = true;
        let queue = pop_session(self.session).unwrap_or_default();
        debug!(
            session = self.session,
            entries = queue.len(),
            "Recording session ended"
        );
        queue
    }
}

impl Drop for QueueGuard {
    fn drop(&mut self) {
        if !self.released {
            if let Some(queue) = pop_session(self.session) {
                debug!(
                    session = self.session,
                    discarded = queue.len(),
                    "Recording session abandoned"
                );
            }
        }
    }
}

/// Pop the session tagged `session`, discarding any sessions above it.
///
/// Sessions are matched by identity, so a guard whose session was already
/// discarded never touches a newer session that reuses its stack slot.
fn pop_session(session: u64) -> Option<AnnotatedQueue> {
    ACTIVE
        .try_with(|stack| {
            let mut stack = stack.borrow_mut();
            let Some(pos) = stack.iter().rposition(|s| s.id == session) else {
                warn!(session, "Recording session was already released by an outer session");
                return None;
            };
            let depth = pos + 1;
            if stack.len() > depth {
                warn!(
                    session,
                    inner = stack.len() - depth,
                    "Ending a session with inner sessions still active; discarding them"
                );
                stack.truncate(depth);
            }
            stack.pop().map(|s| s.queue)
        })
        .ok()
        .flatten()
}

/// Run `f` against the innermost active session, if any.
pub(crate) fn with_active<R>(f: impl FnOnce(&mut AnnotatedQueue) -> R) -> Option<R> {
    ACTIVE.with(|stack| stack.borrow_mut().last_mut().map(|s| f(&mut s.queue)))
}

/// Record a freshly constructed object into the active session.
///
/// Fresh identities cannot collide, so no duplicate check is needed.
pub(crate) fn register(object: impl FnOnce() -> QueuedObject) {
    with_active(|q| {
        let object = object();
        debug_assert!(!q.contains(object.id()));
        q.push(object);
    });
}

/// Update the snapshot of an object that changed after being recorded.
pub(crate) fn refresh(object: impl FnOnce() -> QueuedObject) {
    with_active(|q| q.refresh(object()));
}

/// Record the ownership edge `owner → owned` in the active session.
pub(crate) fn link(owner: ObjectId, owned: &[ObjectId]) {
    with_active(|q| {
        for &o in owned {
            q.annotate_owner(o, owner);
        }
        q.annotate_owns(owner, owned.to_vec());
    });
}

/// Clear the `owns` annotation of `owner` in the active session.
pub(crate) fn disown(owner: ObjectId) {
    with_active(|q| q.annotate_owns(owner, vec![]));
}
