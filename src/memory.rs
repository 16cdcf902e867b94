use num::{NumCast, Zero, Float};
use std::{
    fmt::{Debug, Display, LowerExp}, iter::Sum, ops::{Add, AddAssign, Sub, SubAssign, Div}, str::FromStr
};
use rand::distributions::uniform::SampleUniform;

/// Floating point types the clustering engine can operate on ([`f32`] and [`f64`]).
pub trait Primitive: Add + AddAssign + Sum + Sub + SubAssign + Div + Zero + Float + NumCast + SampleUniform
                + FromStr + PartialOrd + Copy + Default + Display + Debug + Sync + Send + LowerExp + 'static
                + for<'a> AddAssign<&'a Self> + for<'a> Sub<&'a Self> {}
impl Primitive for f32 {}
impl Primitive for f64 {}
