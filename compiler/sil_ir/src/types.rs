//! Value types as seen by the instruction utilities.
//!
//! The utilities never inspect full nominal types. They only need to know
//! whether a value is an object or an address, and a coarse shape used by
//! closure matching and cast assertions.

/// Semantic category of a value. Mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueCategory {
    /// A loadable value held in registers.
    Object,
    /// The address of a memory location.
    Address,
}

/// Coarse shape of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeShape {
    /// Integers, booleans, and other bitwise-copyable values.
    Trivial,
    /// A class reference (or class metatype).
    Class,
    /// A function value: thin, thick, or a closure context.
    Function,
    /// A struct or tuple.
    Aggregate,
    /// An optional wrapping some other type.
    Optional,
    /// An untyped raw pointer.
    RawPointer,
    /// Anything else (generic, existential, resilient).
    Opaque,
}

/// The type of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct SilType {
    pub category: ValueCategory,
    pub shape: TypeShape,
}

impl SilType {
    /// An object of the given shape.
    #[inline]
    pub const fn object(shape: TypeShape) -> Self {
        Self {
            category: ValueCategory::Object,
            shape,
        }
    }

    /// An address of a location holding the given shape.
    #[inline]
    pub const fn address(shape: TypeShape) -> Self {
        Self {
            category: ValueCategory::Address,
            shape,
        }
    }

    #[inline]
    pub fn is_address(self) -> bool {
        self.category == ValueCategory::Address
    }

    #[inline]
    pub fn is_object(self) -> bool {
        self.category == ValueCategory::Object
    }

    #[inline]
    pub fn is_function(self) -> bool {
        self.shape == TypeShape::Function
    }

    #[inline]
    pub fn is_class(self) -> bool {
        self.shape == TypeShape::Class
    }

    /// The same shape viewed as an address.
    #[inline]
    pub const fn to_address(self) -> Self {
        Self::address(self.shape)
    }

    /// The same shape viewed as an object.
    #[inline]
    pub const fn to_object(self) -> Self {
        Self::object(self.shape)
    }
}
