//! Minimal positional formatter (`cprintf`).
//!
//! Understands `%d`, `%x`, `%p`, `%s` and `%%`. Any other `%c` pair is echoed
//! as-is so malformed format strings are visible in the output instead of
//! silently swallowed. Formatting stops at the end of the string, at a NUL
//! byte, or at a trailing lone `%`.
//!
//! Arguments are consumed left to right, one per placeholder. A missing
//! argument prints as `0` for numeric placeholders and `(null)` for `%s`;
//! a non-string argument given to `%s` also prints `(null)`.

use crate::output::Output;

const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Fallback for absent strings.
const NULL_STR: &str = "(null)";

/// One positional `cprintf` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'s> {
    Int(i64),
    Uint(u64),
    Ptr(usize),
    Str(Option<&'s str>),
}

impl Arg<'_> {
    fn as_signed(&self) -> i64 {
        match *self {
            Arg::Int(v) => v,
            Arg::Uint(v) => v as i64,
            Arg::Ptr(p) => p as i64,
            Arg::Str(_) => 0,
        }
    }

    fn as_unsigned(&self) -> u64 {
        match *self {
            Arg::Int(v) => v as u64,
            Arg::Uint(v) => v,
            Arg::Ptr(p) => p as u64,
            Arg::Str(_) => 0,
        }
    }
}

impl From<i32> for Arg<'_> {
    fn from(v: i32) -> Self {
        Arg::Int(v.into())
    }
}

impl From<i64> for Arg<'_> {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<u32> for Arg<'_> {
    fn from(v: u32) -> Self {
        Arg::Uint(v.into())
    }
}

impl From<u64> for Arg<'_> {
    fn from(v: u64) -> Self {
        Arg::Uint(v)
    }
}

impl From<usize> for Arg<'_> {
    fn from(v: usize) -> Self {
        Arg::Uint(v as u64)
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(p: *const T) -> Self {
        Arg::Ptr(p as usize)
    }
}

impl<'s> From<&'s str> for Arg<'s> {
    fn from(s: &'s str) -> Self {
        Arg::Str(Some(s))
    }
}

impl<'s> From<Option<&'s str>> for Arg<'s> {
    fn from(s: Option<&'s str>) -> Self {
        Arg::Str(s)
    }
}

fn print_unsigned(mut x: u64, base: u64, neg: bool, emit: &mut dyn FnMut(u8)) {
    // u64 in base 10 is at most 20 digits, plus a sign.
    let mut buf = [0u8; 24];
    let mut i = 0;

    loop {
        buf[i] = DIGITS[(x % base) as usize];
        i += 1;
        x /= base;
        if x == 0 {
            break;
        }
    }

    if neg {
        buf[i] = b'-';
        i += 1;
    }

    while i > 0 {
        i -= 1;
        emit(buf[i]);
    }
}

fn print_int(x: i64, base: u64, emit: &mut dyn FnMut(u8)) {
    print_unsigned(x.unsigned_abs(), base, x < 0, emit);
}

/// Render `fmt` with `args`, one byte at a time, into `emit`.
pub fn format(fmt: &[u8], args: &[Arg<'_>], emit: &mut dyn FnMut(u8)) {
    let mut args = args.iter();
    let mut i = 0;

    while i < fmt.len() && fmt[i] != 0 {
        let c = fmt[i];
        i += 1;

        if c != b'%' {
            emit(c);
            continue;
        }

        let Some(&conv) = fmt.get(i).filter(|&&b| b != 0) else {
            break;
        };
        i += 1;

        match conv {
            b'd' => print_int(args.next().map_or(0, Arg::as_signed), 10, emit),
            b'x' | b'p' => print_unsigned(args.next().map_or(0, Arg::as_unsigned), 16, false, emit),
            b's' => {
                let s = match args.next() {
                    Some(&Arg::Str(Some(s))) => s,
                    _ => NULL_STR,
                };
                // Strings are NUL-terminated as far as the console cares.
                for &b in s.as_bytes().iter().take_while(|&&b| b != 0) {
                    emit(b);
                }
            }
            b'%' => emit(b'%'),
            other => {
                emit(b'%');
                emit(other);
            }
        }
    }
}

impl Output<'_> {
    /// Formatted print under the output lock (when locking is enabled).
    ///
    /// A `None` format string is a kernel bug and panics.
    pub fn vprintf(&self, fmt: Option<&[u8]>, args: &[Arg<'_>]) {
        let _guard = self.acquire();

        let Some(fmt) = fmt else {
            self.panic(format_args!("null fmt"));
        };

        format(fmt, args, &mut |b| self.putc(b));
    }

    pub fn cprintf(&self, fmt: &str, args: &[Arg<'_>]) {
        self.vprintf(Some(fmt.as_bytes()), args);
    }
}

/// `cprintf!(out, "%s: %d\n", name, 42)`: converts each argument into an
/// [`Arg`] and calls `cprintf` on whatever `out` is (an `Output` or a
/// `Console`).
#[macro_export]
macro_rules! cprintf {
    ($out:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $out.cprintf($fmt, &[$($crate::printf::Arg::from($arg)),*])
    };
}
