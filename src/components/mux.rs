use crate::builder::{ops::*, BuilderHooks, Connector};

/// `a` when `select` is low, `b` when it is high.
pub fn mux2<T: BuilderHooks>(
    a: &Connector<T>,
    b: &Connector<T>,
    select: &Connector<T>,
) -> Connector<T> {
    or!(and!(*a, select.invert()), and!(*b, *select))
}
