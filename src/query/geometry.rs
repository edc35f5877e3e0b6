//! Fixed-dimension points and boxes, and the conversions from parsed queries.
//!
//! Open range bounds collapse to the coordinate type's extreme finite values
//! rather than to infinities, so every produced box is closed and can be
//! compared or encoded without special cases.

use std::fmt;
use std::str::FromStr;

use crate::core::ParseError;
use crate::query::parser::{Query, QueryKind};

/// Numeric types usable as point coordinates.
pub trait Coordinate: Copy + PartialOrd + FromStr + fmt::Display + fmt::Debug {
    /// Most negative finite value.
    const LOWEST: Self;
    /// Most positive finite value.
    const HIGHEST: Self;

    /// False for values that do not order against others (NaN).
    fn is_ordered(self) -> bool {
        true
    }
}

macro_rules! integer_coordinate {
    ($($ty:ty),*) => {
        $(
            impl Coordinate for $ty {
                const LOWEST: Self = <$ty>::MIN;
                const HIGHEST: Self = <$ty>::MAX;
            }
        )*
    };
}

macro_rules! float_coordinate {
    ($($ty:ty),*) => {
        $(
            impl Coordinate for $ty {
                const LOWEST: Self = <$ty>::MIN;
                const HIGHEST: Self = <$ty>::MAX;

                fn is_ordered(self) -> bool {
                    !self.is_nan()
                }
            }
        )*
    };
}

integer_coordinate!(i32, i64, u32, u64);
float_coordinate!(f32, f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<T, const N: usize> {
    coords: [T; N],
}

impl<T: Coordinate, const N: usize> Point<T, N> {
    pub const DIMS: usize = N;

    pub fn new(coords: [T; N]) -> Self {
        Self { coords }
    }

    pub fn get(&self, axis: usize) -> T {
        self.coords[axis]
    }

    pub fn set(&mut self, axis: usize, value: T) {
        self.coords[axis] = value;
    }

    pub fn coords(&self) -> &[T; N] {
        &self.coords
    }
}

impl<const N: usize> Point<f64, N> {
    pub fn distance_squared(&self, other: &Self) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

impl<T: fmt::Display, const N: usize> fmt::Display for Point<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (axis, value) in self.coords.iter().enumerate() {
            if axis > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}

/// Axis-aligned box with `min[i] <= max[i]` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<T, const N: usize> {
    pub min: Point<T, N>,
    pub max: Point<T, N>,
}

impl<T: Coordinate, const N: usize> Range<T, N> {
    /// Inclusive on both ends.
    pub fn contains(&self, point: &Point<T, N>) -> bool {
        (0..N).all(|axis| {
            let value = point.get(axis);
            self.min.get(axis) <= value && value <= self.max.get(axis)
        })
    }
}

/// Reads the first `N` elements of a point-like query as one coordinate each.
pub fn query_to_point<T: Coordinate, const N: usize>(
    query: &Query,
) -> Result<Point<T, N>, ParseError> {
    check_dimensions(query, N)?;
    let mut out = Point::new([T::LOWEST; N]);
    for axis in 0..N {
        let elem = query.element(axis)?;
        if elem.num_values() != 1 {
            return Err(ParseError::ValueCount {
                element: axis,
                expected: 1,
                actual: elem.num_values(),
            });
        }
        if elem.is_value_empty(0)? {
            return Err(ParseError::EmptyValue { element: axis });
        }
        out.set(axis, parse_coordinate(elem.value(0)?)?);
    }
    Ok(out)
}

/// Reads every element of a range query as a `low:high` pair, filling open
/// bounds with the type's extremes and ordering each pair.
pub fn query_to_range<T: Coordinate, const N: usize>(
    query: &Query,
) -> Result<Range<T, N>, ParseError> {
    check_dimensions(query, N)?;
    let mut min = Point::new([T::LOWEST; N]);
    let mut max = Point::new([T::HIGHEST; N]);
    for axis in 0..N {
        let elem = query.element(axis)?;
        if elem.num_values() != 2 {
            return Err(ParseError::ValueCount {
                element: axis,
                expected: 2,
                actual: elem.num_values(),
            });
        }
        let first = if elem.is_value_empty(0)? {
            T::LOWEST
        } else {
            parse_coordinate(elem.value(0)?)?
        };
        let second = if elem.is_value_empty(1)? {
            T::HIGHEST
        } else {
            parse_coordinate(elem.value(1)?)?
        };
        let (low, high) = if second < first {
            (second, first)
        } else {
            (first, second)
        };
        min.set(axis, low);
        max.set(axis, high);
    }
    Ok(Range { min, max })
}

fn check_dimensions(query: &Query, ndims: usize) -> Result<(), ParseError> {
    let actual = query.num_coordinates();
    if query.kind() == QueryKind::None || actual != ndims {
        return Err(ParseError::Dimensions {
            expected: ndims,
            actual,
        });
    }
    Ok(())
}

fn parse_coordinate<T: Coordinate>(raw: &str) -> Result<T, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        value: raw.to_string(),
        type_name: std::any::type_name::<T>(),
    };
    let value = raw.parse::<T>().map_err(|_| invalid())?;
    if !value.is_ordered() {
        return Err(invalid());
    }
    Ok(value)
}
