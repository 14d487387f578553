//! Engine-object handles and the typed field wrappers that carry them.
//!
//! A handle is opaque to the codec: it is never written to the output.
//! [`Asset`] and [`Template`] fields are replaced by catalog identifiers,
//! [`LiveRef`] fields by Live-Reference identifiers.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// A host-engine object kind that handles can point to.
pub trait EngineType: 'static {
    /// Tag stored in every handle of this kind.
    const TYPE_NAME: &'static str;
}

/// Opaque reference to an engine-managed object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub instance_id: u64,
    pub type_tag: &'static str,
}

impl ObjectHandle {
    pub const fn new(instance_id: u64, type_tag: &'static str) -> Self {
        Self {
            instance_id,
            type_tag,
        }
    }

    pub const fn of<T: EngineType>(instance_id: u64) -> Self {
        Self::new(instance_id, T::TYPE_NAME)
    }

    pub fn is<T: EngineType>(&self) -> bool {
        self.type_tag == T::TYPE_NAME
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_tag, self.instance_id)
    }
}

// ---------------------------------------------------------------------------
// Catalog handle fields
// ---------------------------------------------------------------------------

macro_rules! catalog_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<T: EngineType> {
            handle: Option<ObjectHandle>,
            _marker: PhantomData<fn() -> T>,
        }

        impl<T: EngineType> $name<T> {
            pub const fn none() -> Self {
                Self {
                    handle: None,
                    _marker: PhantomData,
                }
            }

            pub const fn new(instance_id: u64) -> Self {
                Self {
                    handle: Some(ObjectHandle::of::<T>(instance_id)),
                    _marker: PhantomData,
                }
            }

            /// Wrap `handle` if it points to a `T`.
            pub fn from_handle(handle: ObjectHandle) -> Option<Self> {
                handle.is::<T>().then(|| Self {
                    handle: Some(handle),
                    _marker: PhantomData,
                })
            }

            pub fn handle(&self) -> Option<ObjectHandle> {
                self.handle
            }

            pub fn is_set(&self) -> bool {
                self.handle.is_some()
            }

            pub fn clear(&mut self) {
                self.handle = None;
            }

            pub(crate) fn assign(&mut self, handle: Option<ObjectHandle>) {
                self.handle = handle;
            }
        }

        impl<T: EngineType> Default for $name<T> {
            fn default() -> Self {
                Self::none()
            }
        }

        impl<T: EngineType> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T: EngineType> Copy for $name<T> {}

        impl<T: EngineType> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.handle == other.handle
            }
        }

        impl<T: EngineType> Eq for $name<T> {}

        impl<T: EngineType> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.handle).finish()
            }
        }
    };
}

catalog_handle!(
    /// Field holding a handle into the Asset catalog.
    Asset
);

catalog_handle!(
    /// Field holding a handle into the Template catalog.
    Template
);

// ---------------------------------------------------------------------------
// LiveRef
// ---------------------------------------------------------------------------

/// Field referencing a live object instance.
///
/// Resolution on deserialize happens after the whole graph is walked, so the
/// handle lives in a shared slot that the pending action fills in later.
pub struct LiveRef<T: EngineType> {
    slot: Rc<Cell<Option<ObjectHandle>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: EngineType> LiveRef<T> {
    pub fn none() -> Self {
        Self {
            slot: Rc::new(Cell::new(None)),
            _marker: PhantomData,
        }
    }

    pub fn new(instance_id: u64) -> Self {
        let live = Self::none();
        live.slot.set(Some(ObjectHandle::of::<T>(instance_id)));
        live
    }

    /// Wrap `handle` if it points to a `T`.
    pub fn from_handle(handle: ObjectHandle) -> Option<Self> {
        handle.is::<T>().then(|| {
            let live = Self::none();
            live.slot.set(Some(handle));
            live
        })
    }

    pub fn handle(&self) -> Option<ObjectHandle> {
        self.slot.get()
    }

    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn clear(&mut self) {
        self.slot.set(None);
    }

    pub(crate) fn shared_slot(&self) -> Rc<Cell<Option<ObjectHandle>>> {
        Rc::clone(&self.slot)
    }
}

impl<T: EngineType> Default for LiveRef<T> {
    fn default() -> Self {
        Self::none()
    }
}

// A clone gets its own slot; only pending resolutions share it.
impl<T: EngineType> Clone for LiveRef<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::new(Cell::new(self.slot.get())),
            _marker: PhantomData,
        }
    }
}

impl<T: EngineType> PartialEq for LiveRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot.get() == other.slot.get()
    }
}

impl<T: EngineType> fmt::Debug for LiveRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LiveRef").field(&self.slot.get()).finish()
    }
}
