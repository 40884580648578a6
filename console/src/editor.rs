// =============================================================================
// kconsole — Line Editor
// =============================================================================
//
// Turns raw input bytes into committed lines. Runs in interrupt context with
// the input lock held, so nothing in here may sleep or log.
//
// CONTROL BYTES:
//   Ctrl-U         kill the in-progress line
//   Ctrl-H, DEL    backspace
//   Tab            complete the current word against the command registry
//   Ctrl-P         process dump (reported back, run after the lock drops)
//   Ctrl-D         end of file: stored, echoed, commits the line
//   '\r'           normalized to '\n'
//
// Printable ASCII and '\n' are stored and echoed. Anything else is ignored.
//
// COMMIT:
//   `w` moves up to `e` on '\n', on Ctrl-D, and whenever the ring becomes
//   exactly full. Each commit is reported to the caller, which wakes readers.
//
// Echo happens inside the same input-lock hold as the ring update, so the
// screen always matches the ring.
// =============================================================================

use bitflags::bitflags;

use crate::config::MAX_COMMAND_LENGTH;
use crate::output::Output;
use crate::printf::Arg;
use crate::registry::CommandRegistry;
use crate::ring::InputRing;
use crate::stats::Stats;
use crate::trie::Matches;

/// Control-`x`.
const fn ctrl(x: u8) -> u8 {
    x - b'@'
}

pub const KILL_LINE: u8 = ctrl(b'U');
pub const BACKSPACE: u8 = ctrl(b'H');
pub const DELETE: u8 = 0x7f;
pub const PROC_DUMP: u8 = ctrl(b'P');
pub const EOF: u8 = ctrl(b'D');

bitflags! {
    /// What the caller must do after the input lock is released.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Effects: u8 {
        /// `w` advanced; wake blocked readers.
        const COMMIT   = 1 << 0;
        /// Ctrl-P was typed.
        const PROCDUMP = 1 << 1;
    }
}

/// Bytes the default path stores.
fn is_accepted(c: u8) -> bool {
    matches!(c, b' '..=b'~' | b'\n' | EOF)
}

/// Word boundaries for completion.
fn is_boundary(c: u8) -> bool {
    c == b' ' || c == b'\n'
}

/// One input-lock hold's worth of editing state.
pub struct LineEditor<'e, 'a> {
    ring: &'e mut InputRing,
    out: &'e Output<'a>,
    commands: Option<&'e CommandRegistry>,
    prompt: &'e str,
    stats: &'e Stats,
}

impl<'e, 'a> LineEditor<'e, 'a> {
    pub fn new(
        ring: &'e mut InputRing,
        out: &'e Output<'a>,
        commands: Option<&'e CommandRegistry>,
        prompt: &'e str,
        stats: &'e Stats,
    ) -> Self {
        Self {
            ring,
            out,
            commands,
            prompt,
            stats,
        }
    }

    pub fn handle_byte(&mut self, c: u8) -> Effects {
        match c {
            KILL_LINE => {
                self.kill_line();
                Effects::empty()
            }
            BACKSPACE | DELETE => {
                if self.ring.unpush().is_some() {
                    self.out.erase();
                }
                Effects::empty()
            }
            b'\t' => self.autocomplete(),
            PROC_DUMP => Effects::PROCDUMP,
            _ => self.accept(c),
        }
    }

    fn kill_line(&mut self) {
        while self.ring.last_pending().is_some_and(|c| c != b'\n') {
            self.ring.unpush();
            self.out.erase();
        }
    }

    fn accept(&mut self, c: u8) -> Effects {
        let c = if c == b'\r' { b'\n' } else { c };
        if !is_accepted(c) {
            self.stats.control_ignored();
            return Effects::empty();
        }
        if !self.ring.push(c) {
            self.stats.byte_dropped();
            return Effects::empty();
        }
        self.out.echo(c);

        if c == b'\n' || c == EOF || self.ring.is_full() {
            self.ring.commit();
            Effects::COMMIT
        } else {
            Effects::empty()
        }
    }

    /// Append `suffix` after `e`, echoing as we go. Stops at capacity and
    /// commits if the ring fills up.
    fn append(&mut self, suffix: &[u8]) -> Effects {
        for &c in suffix {
            if !self.ring.push(c) {
                self.stats.byte_dropped();
                break;
            }
            self.out.echo(c);
            if self.ring.is_full() {
                self.ring.commit();
                return Effects::COMMIT;
            }
        }
        Effects::empty()
    }

    fn autocomplete(&mut self) -> Effects {
        let w = self.ring.w();
        let e = self.ring.e();

        let mut start = e;
        while start != w && !is_boundary(self.ring.at(start.wrapping_sub(1))) {
            start = start.wrapping_sub(1);
        }
        let len = e.wrapping_sub(start);
        if len == 0 {
            return Effects::empty();
        }

        let Some(registry) = self.commands else {
            self.reprompt();
            return Effects::empty();
        };
        if len >= registry.name_limit() {
            self.reprompt();
            return Effects::empty();
        }

        let mut word = [0u8; MAX_COMMAND_LENGTH];
        for (i, slot) in word[..len].iter_mut().enumerate() {
            *slot = self.ring.at(start.wrapping_add(i));
        }
        let prefix = &word[..len];

        match registry.complete(prefix) {
            Matches::One(name) => self.append(&name.as_bytes()[len..]),
            Matches::Many => {
                self.out.echo(b'\n');
                for name in registry.table().matching(prefix) {
                    self.out.cprintf("%s\n", &[Arg::from(name)]);
                }
                self.show_prompt();
                Effects::empty()
            }
            Matches::None => {
                self.reprompt();
                Effects::empty()
            }
        }
    }

    /// No-match path: fresh line, prompt, in-progress input.
    fn reprompt(&self) {
        self.out.echo(b'\n');
        self.show_prompt();
    }

    fn show_prompt(&self) {
        self.out.cprintf("%s", &[Arg::from(self.prompt)]);
        for c in self.ring.pending() {
            self.out.echo(c);
        }
    }
}
