//! Dense CPU math primitives on raw slices.
//!
//! BLAS-1/2 style building blocks the normalization kernels are composed
//! from. Lengths are the caller's responsibility; every function checks
//! them with `debug_assert!` only.

use grn_core::Element;

/// x[i] = value
pub fn set<T: Element>(x: &mut [T], value: T) {
    x.iter_mut().for_each(|v| *v = value);
}

/// x[i] = x[i]²
pub fn sqr<T: Element>(x: &mut [T]) {
    for v in x.iter_mut() {
        *v = *v * *v;
    }
}

/// x[i] = x[i] + alpha
pub fn add_scalar<T: Element>(x: &mut [T], alpha: T) {
    for v in x.iter_mut() {
        *v = *v + alpha;
    }
}

/// x[i] = x[i]^p
///
/// `p == 0.5` takes the exact `sqrt` path.
pub fn powx<T: Element>(x: &mut [T], p: T) {
    let half = T::from_f64_lossy(0.5);
    if p == half {
        x.iter_mut().for_each(|v| *v = v.sqrt());
    } else {
        x.iter_mut().for_each(|v| *v = v.powf(p));
    }
}

/// y[i] = y[i] / d[i]
///
/// No zero guard: IEEE infinities and NaNs propagate.
pub fn div<T: Element>(y: &mut [T], d: &[T]) {
    debug_assert_eq!(y.len(), d.len());
    for (v, &den) in y.iter_mut().zip(d) {
        *v = *v / den;
    }
}

/// y[i] = a[i] * b[i]
pub fn mul<T: Element>(a: &[T], b: &[T], y: &mut [T]) {
    debug_assert_eq!(a.len(), y.len());
    debug_assert_eq!(b.len(), y.len());
    for ((out, &av), &bv) in y.iter_mut().zip(a).zip(b) {
        *out = av * bv;
    }
}

/// y[i] = alpha * x[i] + y[i]
pub fn axpy<T: Element>(alpha: T, x: &[T], y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    for (out, &xv) in y.iter_mut().zip(x) {
        *out = alpha * xv + *out;
    }
}

/// y = alpha * Aᵀ·x + beta * y
///
/// `a` is an `m × n` row-major matrix, `x` has length `m`, `y` has length
/// `n`. With `beta == 0` the previous contents of `y` are ignored, so a NaN
/// left in scratch memory cannot leak into the result.
pub fn gemv_t<T: Element>(m: usize, n: usize, alpha: T, a: &[T], x: &[T], beta: T, y: &mut [T]) {
    debug_assert_eq!(a.len(), m * n);
    debug_assert_eq!(x.len(), m);
    debug_assert_eq!(y.len(), n);

    if beta == T::zero() {
        set(y, T::zero());
    } else if beta != T::one() {
        y.iter_mut().for_each(|v| *v = *v * beta);
    }

    for (row, &xv) in a.chunks_exact(n.max(1)).take(m).zip(x) {
        let scale = alpha * xv;
        for (out, &av) in y.iter_mut().zip(row) {
            *out = *out + scale * av;
        }
    }
}

/// Σ_i x[i·incx] · y[i·incy] over `n` terms.
pub fn strided_dot<T: Element>(n: usize, x: &[T], incx: usize, y: &[T], incy: usize) -> T {
    debug_assert!(n == 0 || x.len() > (n - 1) * incx);
    debug_assert!(n == 0 || y.len() > (n - 1) * incy);
    x.iter()
        .step_by(incx.max(1))
        .zip(y.iter().step_by(incy.max(1)))
        .take(n)
        .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
}
