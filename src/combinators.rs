//! Element-wise helpers over slices. None of them allocate; iteration is
//! always in index order.

/// `dst[i] = f(&src[i])` for every `i < src.len()`.
///
/// Violation if `dst` is shorter than `src`.
#[track_caller]
pub fn map_into<T, U>(src: &[T], dst: &mut [U], mut f: impl FnMut(&T) -> U) {
    if dst.len() < src.len() {
        crate::failure::violation(format!(
            "map_into destination holds {} of {} elements",
            dst.len(),
            src.len()
        ));
    }
    for (d, s) in dst.iter_mut().zip(src) {
        *d = f(s);
    }
}

/// Copy every element that satisfies `pred` to the front of `dst`, in
/// order. Returns how many were written.
///
/// Violation if more elements pass than `dst` can hold.
#[track_caller]
pub fn filter_into<T: Clone>(src: &[T], dst: &mut [T], mut pred: impl FnMut(&T) -> bool) -> usize {
    let mut n = 0;
    for s in src {
        if pred(s) {
            match dst.get_mut(n) {
                Some(d) => *d = s.clone(),
                None => crate::failure::violation(format!(
                    "filter_into destination holds only {} elements",
                    dst.len()
                )),
            }
            n += 1;
        }
    }
    n
}

/// Left fold.
pub fn reduce<T, A>(src: &[T], init: A, combine: impl FnMut(A, &T) -> A) -> A {
    src.iter().fold(init, combine)
}

pub fn for_each<T>(src: &[T], f: impl FnMut(&T)) {
    src.iter().for_each(f)
}
