//! Optional values, tagged results and the branch-selection sugar over them.
//!
//! `Opt<T>` and `Res<T, E>` are the native sum types. What this module adds
//! is the contract surface: wrong-variant extraction is a contract violation
//! routed through [`crate::failure`], not an ordinary panic, and
//! [`Select`] gives a statement form and an expression form for choosing a
//! branch by variant.

use crate::failure::violation;

pub type Opt<T> = Option<T>;
pub type Res<T, E> = Result<T, E>;

#[inline]
pub const fn some<T>(v: T) -> Opt<T> {
    Some(v)
}

#[inline]
pub const fn none<T>() -> Opt<T> {
    None
}

#[inline]
pub const fn ok<T, E>(v: T) -> Res<T, E> {
    Ok(v)
}

#[inline]
pub const fn err<T, E>(e: E) -> Res<T, E> {
    Err(e)
}

/// Checked extraction for `Opt`.
pub trait OptExt<T> {
    /// The payload; violation `"unwrap on absent"` otherwise.
    fn unwrap_present(self) -> T;
}

impl<T> OptExt<T> for Opt<T> {
    #[inline]
    #[track_caller]
    fn unwrap_present(self) -> T {
        match self {
            Some(v) => v,
            None => violation("unwrap on absent"),
        }
    }
}

/// Checked extraction for `Res`, in both directions.
pub trait ResExt<T, E> {
    /// The success payload; violation `"unwrap_ok on err"` otherwise.
    fn unwrap_success(self) -> T;
    /// The error payload; violation `"unwrap_err on ok"` otherwise.
    fn unwrap_failure(self) -> E;
    /// The success payload, or `default` on error.
    fn unwrap_ok_or(self, default: T) -> T;
}

impl<T, E> ResExt<T, E> for Res<T, E> {
    #[inline]
    #[track_caller]
    fn unwrap_success(self) -> T {
        match self {
            Ok(v) => v,
            Err(_) => violation("unwrap_ok on err"),
        }
    }

    #[inline]
    #[track_caller]
    fn unwrap_failure(self) -> E {
        match self {
            Ok(_) => violation("unwrap_err on ok"),
            Err(e) => e,
        }
    }

    #[inline]
    fn unwrap_ok_or(self, default: T) -> T {
        self.unwrap_or(default)
    }
}

/// Branch selection by variant.
///
/// The hit branch receives the `some`/`ok` payload; the miss branch
/// receives `()` for an absent option and the error payload for a result.
pub trait Select<T, E>: Sized {
    /// Expression form: evaluates to whichever branch ran.
    fn select<R>(self, hit: impl FnOnce(T) -> R, miss: impl FnOnce(E) -> R) -> R;

    /// Statement form.
    fn when(self, hit: impl FnOnce(T), miss: impl FnOnce(E)) {
        self.select(hit, miss)
    }
}

impl<T> Select<T, ()> for Opt<T> {
    #[inline]
    fn select<R>(self, hit: impl FnOnce(T) -> R, miss: impl FnOnce(()) -> R) -> R {
        match self {
            Some(v) => hit(v),
            None => miss(()),
        }
    }
}

impl<T, E> Select<T, E> for Res<T, E> {
    #[inline]
    fn select<R>(self, hit: impl FnOnce(T) -> R, miss: impl FnOnce(E) -> R) -> R {
        match self {
            Ok(v) => hit(v),
            Err(e) => miss(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn prop_opt_round_trip(v in any::<i64>(), d in any::<i64>()) {
            prop_assert!(some(v).is_some());
            prop_assert!(!none::<i64>().is_some());
            prop_assert_eq!(some(v).unwrap_present(), v);
            prop_assert_eq!(some(v).unwrap_or(d), v);
            prop_assert_eq!(none::<i64>().unwrap_or(d), d);
            prop_assert_eq!(some(v).map(|x| x.wrapping_add(1)), some(v.wrapping_add(1)));
            prop_assert_eq!(none::<i64>().map(|x| x.wrapping_add(1)), None);
        }

        #[test]
        fn prop_res_round_trip(v in any::<u32>(), e in ".{0,8}", d in any::<u32>()) {
            let good: Res<u32, String> = ok(v);
            let bad: Res<u32, String> = err(e.clone());
            prop_assert!(good.is_ok() != good.is_err());
            prop_assert!(bad.is_ok() != bad.is_err());
            prop_assert_eq!(good.clone().unwrap_success(), v);
            prop_assert_eq!(bad.clone().unwrap_failure(), e.clone());
            prop_assert_eq!(good.clone().unwrap_ok_or(d), v);
            prop_assert_eq!(bad.clone().unwrap_ok_or(d), d);
            // Each map form preserves the other variant.
            prop_assert_eq!(good.clone().map_err(|s| s.len()), Ok(v));
            prop_assert_eq!(bad.clone().map(|x| x / 2), Err(e));
        }
    }

    #[test]
    #[should_panic(expected = "unwrap on absent")]
    fn unwrap_on_absent_is_violation() {
        let _ = none::<u8>().unwrap_present();
    }

    #[test]
    #[should_panic(expected = "unwrap_ok on err")]
    fn unwrap_ok_on_err_is_violation() {
        let _ = err::<u8, &str>("no").unwrap_success();
    }

    #[test]
    #[should_panic(expected = "unwrap_err on ok")]
    fn unwrap_err_on_ok_is_violation() {
        let _ = ok::<u8, &str>(1).unwrap_failure();
    }

    /// Invariant: exactly one branch runs, with the payload bound.
    #[test]
    fn select_runs_one_branch() {
        assert_eq!(some(3).select(|v| v * 2, |()| -1), 6);
        assert_eq!(none::<i32>().select(|v| v * 2, |()| -1), -1);
        assert_eq!(ok::<i32, &str>(3).select(|v| v.to_string(), |e| e.into()), "3");
        assert_eq!(err::<i32, &str>("bad").select(|v| v.to_string(), |e| e.into()), "bad");

        let hits = RefCell::new(Vec::new());
        some(7).when(|v| hits.borrow_mut().push(v), |()| hits.borrow_mut().push(0));
        none::<i32>().when(|v| hits.borrow_mut().push(v), |()| hits.borrow_mut().push(0));
        assert_eq!(hits.into_inner(), vec![7, 0]);
    }
}
