//! DynStr: owning growable byte string that is always nul-terminated.
//!
//! Storage is a `DynVec<u8>` holding the content followed by one `0`
//! byte, so `cstr()` hands out the backing bytes without copying. Before
//! the first write nothing is allocated and `cstr()` points at a static
//! terminator.

use crate::dyn_vec::DynVec;
use crate::failure::violation;
use crate::view::View;
use core::ffi::{c_char, CStr};
use core::fmt;
use core::hash::{Hash, Hasher};

static EMPTY_CSTR: [u8; 1] = [0];

#[derive(Clone, Default)]
pub struct DynStr {
    // Empty, or content followed by exactly one trailing nul.
    bytes: DynVec<u8>,
}

/// Byte counter used for the formatting dry run.
struct Measure(usize);

impl fmt::Write for Measure {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

impl DynStr {
    pub const fn new() -> Self {
        Self {
            bytes: DynVec::new(),
        }
    }

    /// Room for `cap` content bytes plus the terminator.
    #[track_caller]
    pub fn with_capacity(cap: usize) -> Self {
        let mut bytes = DynVec::with_capacity(cap + 1);
        bytes.push(0);
        Self { bytes }
    }

    #[track_caller]
    pub fn from_bytes(b: &[u8]) -> Self {
        let mut s = Self::with_capacity(b.len());
        s.append_bytes(b);
        s
    }

    /// Fresh string holding exactly the formatted output.
    #[track_caller]
    pub fn formatted(args: fmt::Arguments<'_>) -> Self {
        let n = measure(args);
        let mut s = Self::with_capacity(n);
        s.write_formatted(args);
        s
    }

    /// Fresh string `a` followed by `b`.
    #[track_caller]
    pub fn concat(a: &DynStr, b: &DynStr) -> Self {
        let mut s = Self::with_capacity(a.len() + b.len());
        s.append_bytes(a.as_bytes());
        s.append_bytes(b.as_bytes());
        s
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len().saturating_sub(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content bytes that fit without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity().saturating_sub(1)
    }

    #[track_caller]
    pub fn push(&mut self, b: u8) {
        self.open_tail(1);
        self.bytes.push(b);
        self.bytes.push(0);
    }

    #[track_caller]
    pub fn push_char(&mut self, c: char) {
        let mut tmp = [0u8; 4];
        self.append(c.encode_utf8(&mut tmp));
    }

    /// Remove and return the last content byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let _nul = self.bytes.pop();
        let last = self.bytes.pop();
        self.bytes.push(0);
        last
    }

    #[track_caller]
    pub fn append(&mut self, s: &str) {
        self.append_bytes(s.as_bytes());
    }

    #[track_caller]
    pub fn append_bytes(&mut self, b: &[u8]) {
        self.open_tail(b.len());
        self.bytes.extend_from_slice(b);
        self.bytes.push(0);
    }

    /// Append formatted output. The size is measured first so the buffer
    /// grows at most once.
    #[track_caller]
    pub fn format(&mut self, args: fmt::Arguments<'_>) {
        let n = measure(args);
        self.open_tail(n);
        self.bytes.push(0);
        self.write_formatted(args);
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<u8> {
        self.as_bytes().get(i).copied()
    }

    /// Content bytes in `[start, end)` with `View` clamping rules.
    pub fn slice(&self, start: usize, end: usize) -> View<'_, u8> {
        self.as_view().subview(start, end)
    }

    #[inline]
    pub fn as_view(&self) -> View<'_, u8> {
        View::from_slice(self.as_bytes())
    }

    /// Length zero; capacity and terminator stay.
    pub fn clear(&mut self) {
        if !self.bytes.is_empty() {
            self.bytes.clear();
            self.bytes.push(0);
        }
    }

    /// Release the buffer.
    pub fn free(&mut self) {
        self.bytes.free();
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        let all = self.bytes.as_slice();
        &all[..all.len().saturating_sub(1)]
    }

    /// Content followed by the terminator: `cstr()[len()] == 0`.
    #[inline]
    pub fn cstr(&self) -> &[u8] {
        if self.bytes.is_empty() {
            &EMPTY_CSTR
        } else {
            self.bytes.as_slice()
        }
    }

    /// C view up to the first nul (the whole content unless it embeds one).
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(self.cstr()).unwrap_or_default()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const c_char {
        self.cstr().as_ptr().cast()
    }

    pub fn to_str(&self) -> Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }

    // Drop the terminator and make room for `additional` bytes plus a new one.
    #[track_caller]
    fn open_tail(&mut self, additional: usize) {
        let _nul = self.bytes.pop();
        self.bytes.reserve(additional + 1);
    }

    // Expects a terminated buffer; writes before the terminator.
    #[track_caller]
    fn write_formatted(&mut self, args: fmt::Arguments<'_>) {
        if fmt::Write::write_fmt(self, args).is_err() {
            violation("formatting trait implementation returned an error");
        }
    }
}

fn measure(args: fmt::Arguments<'_>) -> usize {
    let mut m = Measure(0);
    // A Display impl that fails here fails again on the real pass.
    let _ = fmt::Write::write_fmt(&mut m, args);
    m.0
}

impl fmt::Write for DynStr {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s);
        Ok(())
    }
}

impl From<&str> for DynStr {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl From<&[u8]> for DynStr {
    fn from(b: &[u8]) -> Self {
        Self::from_bytes(b)
    }
}

impl fmt::Display for DynStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for DynStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl PartialEq for DynStr {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for DynStr {}

impl PartialEq<str> for DynStr {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for DynStr {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Hash for DynStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}
