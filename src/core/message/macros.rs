//! Macros for entity element access
//!
//! Every entity wraps the element it was read from; these macros provide the
//! shared accessors.

#[doc(hidden)]
macro_rules! element_access {
    ($ty:ty) => {
        impl $ty {
            /// The underlying element
            pub fn element(&self) -> &$crate::core::node::Element {
                &self.element
            }

            /// Mutable access to the underlying element
            pub fn element_mut(&mut self) -> &mut $crate::core::node::Element {
                &mut self.element
            }

            /// Consume into the underlying element
            pub fn into_element(self) -> $crate::core::node::Element {
                self.element
            }
        }
    };
}
