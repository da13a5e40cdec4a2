use faer::{Col, ColRef, unzip, zip};

use crate::E;

pub(crate) fn dot(x1: ColRef<E>, x2: ColRef<E>) -> E {
    let mut acc = 0.;
    zip!(x1, x2).for_each(|unzip!(x1, x2)| acc += *x1 * *x2);
    acc
}

pub(crate) fn norm2(x: ColRef<E>) -> E {
    dot(x, x).sqrt()
}

/// `y <- y + alpha * x`
pub(crate) fn axpy(alpha: E, x: ColRef<E>, y: &mut Col<E>) {
    zip!(x, y.as_mut()).for_each(|unzip!(x, y)| *y += alpha * *x);
}

pub(crate) fn scale(alpha: E, x: &mut Col<E>) {
    zip!(x.as_mut()).for_each(|unzip!(x)| *x *= alpha);
}

pub(crate) fn cwise_multiply(x1: ColRef<E>, x2: ColRef<E>) -> Col<E> {
    let mut out = Col::<E>::zeros(x1.nrows());
    zip!(x1, x2, out.as_mut()).for_each(|unzip!(x1, x2, out)| *out = *x1 * *x2);
    out
}

pub(crate) fn cwise_quotient(x1: ColRef<E>, x2: ColRef<E>) -> Col<E> {
    let mut out = Col::<E>::zeros(x1.nrows());
    zip!(x1, x2, out.as_mut()).for_each(|unzip!(x1, x2, out)| *out = *x1 / *x2);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        let x1 = Col::from_fn(3, |i| [1.0, 2.0, 3.0][i]);
        let x2 = Col::from_fn(3, |i| [4.0, 5.0, 6.0][i]);
        assert_eq!(dot(x1.as_ref(), x2.as_ref()), 32.0);
    }

    #[test]
    fn test_axpy() {
        let x = Col::from_fn(3, |i| [1.0, 1.0, 1.0][i]);
        let mut y = Col::from_fn(3, |i| [0.0, 0.0, 0.0][i]);
        axpy(2.0, x.as_ref(), &mut y);
        assert_eq!(y, Col::from_fn(3, |i| [2.0, 2.0, 2.0][i]));
    }

    #[test]
    fn test_cwise_quotient() {
        let x1 = Col::from_fn(3, |i| [1.0, 2.0, 3.0][i]);
        let x2 = Col::from_fn(3, |i| [4.0, 5.0, 6.0][i]);
        let result = cwise_quotient(x1.as_ref(), x2.as_ref());
        let expected = Col::from_fn(3, |i| [0.25, 0.4, 0.5][i]);
        assert_eq!(result, expected);
    }
}
