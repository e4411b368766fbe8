#![forbid(unsafe_code)]

//! Opaque sheet content.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Consumer-supplied payload of a sheet.
///
/// The engine never inspects content; it only hands it to the
/// [`SheetRenderer`](crate::SheetRenderer). Clones share the payload.
#[derive(Clone)]
pub struct Content(Rc<dyn Any>);

impl Content {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Borrow the payload as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Whether both handles share one payload.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Content(..)")
    }
}

impl From<&'static str> for Content {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
