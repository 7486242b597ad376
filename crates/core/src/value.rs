use crate::list::SharedList;
use crate::types::TypeKind;
use std::fmt;

/// Three-component float vector
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector { x, y, z }
    }

    pub fn from_array(v: [f32; 3]) -> Self {
        Vector::new(v[0], v[1], v[2])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn cross(self, other: Vector) -> Vector {
        Vector::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn zip_with(self, other: Vector, f: impl Fn(f32, f32) -> f32) -> Vector {
        Vector::new(f(self.x, other.x), f(self.y, other.y), f(self.z, other.z))
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A value held by a tuple slot
///
/// Lists are reference-counted handles; cloning a `Value` holding a list
/// shares the allocation rather than copying elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f32),
    Int32(i32),
    FVec3(Vector),
    FloatList(SharedList<f32>),
    Int32List(SharedList<i32>),
    FVec3List(SharedList<Vector>),
}

impl Value {
    pub fn kind(&self) -> TypeKind {
        match self {
            Value::Float(_) => TypeKind::Float,
            Value::Int32(_) => TypeKind::Int32,
            Value::FVec3(_) => TypeKind::FVec3,
            Value::FloatList(_) => TypeKind::FloatList,
            Value::Int32List(_) => TypeKind::Int32List,
            Value::FVec3List(_) => TypeKind::FVec3List,
        }
    }

    /// Value used for slots nobody provided
    pub fn default_for(kind: TypeKind) -> Value {
        match kind {
            TypeKind::Float => Value::Float(0.0),
            TypeKind::Int32 => Value::Int32(0),
            TypeKind::FVec3 => Value::FVec3(Vector::ZERO),
            TypeKind::FloatList => Value::FloatList(SharedList::new()),
            TypeKind::Int32List => Value::Int32List(SharedList::new()),
            TypeKind::FVec3List => Value::FVec3List(SharedList::new()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &SharedList<T>) -> fmt::Result {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            write!(f, "]")
        }

        match self {
            Value::Float(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::FVec3(v) => write!(f, "{}", v),
            Value::FloatList(items) => list(f, items),
            Value::Int32List(items) => list(f, items),
            Value::FVec3List(items) => list(f, items),
        }
    }
}

/// Rust types that can live in a tuple slot
pub trait TupleValue: Sized {
    const KIND: TypeKind;

    fn into_value(self) -> Value;
    fn from_value(value: Value) -> Option<Self>;
    fn from_value_ref(value: &Value) -> Option<&Self>;
}

/// Element types that have a list type
pub trait ListElement: TupleValue + Clone + Send + Sync + 'static {
    const LIST_KIND: TypeKind;

    fn wrap_list(list: SharedList<Self>) -> Value;
    fn unwrap_list(value: Value) -> Option<SharedList<Self>>;
    fn unwrap_list_ref(value: &Value) -> Option<&SharedList<Self>>;
}

macro_rules! element_value {
    ($ty:ty, $variant:ident, $list_variant:ident) => {
        impl TupleValue for $ty {
            const KIND: TypeKind = TypeKind::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn from_value_ref(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl ListElement for $ty {
            const LIST_KIND: TypeKind = TypeKind::$list_variant;

            fn wrap_list(list: SharedList<Self>) -> Value {
                Value::$list_variant(list)
            }

            fn unwrap_list(value: Value) -> Option<SharedList<Self>> {
                match value {
                    Value::$list_variant(list) => Some(list),
                    _ => None,
                }
            }

            fn unwrap_list_ref(value: &Value) -> Option<&SharedList<Self>> {
                match value {
                    Value::$list_variant(list) => Some(list),
                    _ => None,
                }
            }
        }
    };
}

element_value!(f32, Float, FloatList);
element_value!(i32, Int32, Int32List);
element_value!(Vector, FVec3, FVec3List);

impl<T: ListElement> TupleValue for SharedList<T> {
    const KIND: TypeKind = T::LIST_KIND;

    fn into_value(self) -> Value {
        T::wrap_list(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        T::unwrap_list(value)
    }

    fn from_value_ref(value: &Value) -> Option<&Self> {
        T::unwrap_list_ref(value)
    }
}
