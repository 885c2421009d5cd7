//! Conversion of metric inputs into `f64` observations.
//!
//! Loss and accuracy values usually come out of a training step as
//! single-element tensors; plain numbers are accepted as well.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};

use crate::error::MetricError;

/// A value that can be recorded by a meter.
pub trait IntoScalar {
    /// Convert into a single `f64`, failing for non-scalar inputs.
    fn into_f64(self) -> Result<f64, MetricError>;
}

macro_rules! impl_into_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoScalar for $ty {
                #[inline]
                fn into_f64(self) -> Result<f64, MetricError> {
                    Ok(self as f64)
                }
            }
        )*
    };
}

impl_into_scalar!(f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<B: Backend, const D: usize> IntoScalar for Tensor<B, D> {
    fn into_f64(self) -> Result<f64, MetricError> {
        let elements = self.shape().num_elements();
        if elements != 1 {
            return Err(MetricError::NotScalar { elements });
        }
        Ok(self.into_scalar().elem::<f64>())
    }
}

impl<B: Backend, const D: usize> IntoScalar for Tensor<B, D, Int> {
    fn into_f64(self) -> Result<f64, MetricError> {
        let elements = self.shape().num_elements();
        if elements != 1 {
            return Err(MetricError::NotScalar { elements });
        }
        Ok(self.into_scalar().elem::<f64>())
    }
}
