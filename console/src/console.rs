// =============================================================================
// kconsole — Console Device
// =============================================================================
//
// The one console instance a kernel boots with. It ties together:
//
//   - the input ring and line editor (fed from the UART/keyboard interrupt)
//   - the blocking reader (process context, the only place that sleeps)
//   - the output path (echo, cprintf, device writes, panic)
//   - the command registry (built once from the root directory)
//
// BOOT ORDER:
//   1. `Console::new`          — output works immediately, unlocked
//   2. `Console::init`         — registers the device, enables output locking
//   3. `Console::load_commands` — once the filesystem is mounted
//
// Until step 3, Tab takes the no-match path.
// =============================================================================

use core::fmt;
use core::panic::PanicInfo;

use spin::Once;

use crate::config::ConsoleConfig;
use crate::device::{CONSOLE, Device, DeviceTable, InodeLock};
use crate::editor::{EOF, Effects, LineEditor};
use crate::error::ConsoleError;
use crate::output::Output;
use crate::platform::{CharSink, CharSource, Cpu};
use crate::printf::Arg;
use crate::registry::{CommandRegistry, FileSystem};
use crate::ring::InputRing;
use crate::sched::Scheduler;
use crate::stats::{Stats, StatsSnapshot};
use crate::sync::{CondVar, SpinLock};

pub struct Console<'a> {
    config: ConsoleConfig,
    output: Output<'a>,
    input: SpinLock<InputRing>,
    /// Signalled whenever the commit point advances.
    readable: CondVar,
    sched: &'a dyn Scheduler,
    commands: Once<CommandRegistry>,
    stats: Stats,
}

impl<'a> Console<'a> {
    pub fn new(
        config: ConsoleConfig,
        sink: &'a dyn CharSink,
        cpu: &'a dyn Cpu,
        sched: &'a dyn Scheduler,
    ) -> Self {
        Self {
            config,
            output: Output::new(sink, cpu),
            input: SpinLock::new("input", InputRing::new()),
            readable: CondVar::new(),
            sched,
            commands: Once::new(),
            stats: Stats::new(),
        }
    }

    /// Register as device [`CONSOLE`] and turn on output locking.
    pub fn init<'t>(&'t self, devices: &mut DeviceTable<'t>) -> Result<(), ConsoleError> {
        devices.register(CONSOLE, self)?;
        self.output.set_locking(true);
        log::info!("console: registered as device {}", CONSOLE);
        Ok(())
    }

    /// Build the command registry from the root directory of `fs`.
    ///
    /// Only the first call has any effect; the registry is immutable once
    /// built.
    pub fn load_commands(&self, fs: &dyn FileSystem) -> &CommandRegistry {
        self.commands
            .call_once(|| CommandRegistry::scan(fs, &self.config, &self.stats))
    }

    pub fn commands(&self) -> Option<&CommandRegistry> {
        self.commands.get()
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn output(&self) -> &Output<'a> {
        &self.output
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Interrupt entry: drain `source`, editing the ring byte by byte.
    ///
    /// Never sleeps. A Ctrl-P process dump runs after the input lock has
    /// been released.
    pub fn intr<S: CharSource + ?Sized>(&self, source: &mut S) {
        let mut dump = false;
        {
            let mut ring = self.input.lock();
            let mut editor = LineEditor::new(
                &mut ring,
                &self.output,
                self.commands.get(),
                self.config.prompt,
                &self.stats,
            );
            while let Some(c) = source.get() {
                let fx = editor.handle_byte(c);
                if fx.contains(Effects::COMMIT) {
                    self.readable.notify_all(self.sched);
                }
                dump |= fx.contains(Effects::PROCDUMP);
            }
        }
        if dump {
            self.sched.dump_processes();
        }
    }

    /// Blocking read of at most one line into `dst`.
    ///
    /// Waits until committed input exists. Stops after a newline (included)
    /// or at an end-of-file marker; an end-of-file marker met after some
    /// bytes were delivered is left in the ring so the next read returns 0.
    /// A process killed while waiting gets [`ConsoleError::Killed`] and
    /// nothing is consumed.
    pub fn read(&self, dst: &mut [u8]) -> Result<usize, ConsoleError> {
        let mut ring = self.input.lock();
        let mut n = 0;

        while n < dst.len() {
            while !ring.has_committed() {
                if self.sched.current_killed() {
                    drop(ring);
                    self.stats.read_cancelled();
                    log::debug!("console: read cancelled, process killed");
                    return Err(ConsoleError::Killed);
                }
                ring = self.readable.wait(ring, self.sched);
            }

            let Some(c) = ring.pop() else {
                continue;
            };
            if c == EOF {
                if n > 0 {
                    // Keep the marker so the caller's next read sees 0.
                    ring.unpop();
                }
                break;
            }
            dst[n] = c;
            n += 1;
            if c == b'\n' {
                break;
            }
        }
        Ok(n)
    }

    /// Raw write of every byte in `src`, as one logical write.
    pub fn write(&self, src: &[u8]) -> usize {
        self.output.write(src)
    }

    pub fn cprintf(&self, fmt: &str, args: &[Arg<'_>]) {
        self.output.cprintf(fmt, args);
    }

    pub fn vprintf(&self, fmt: Option<&[u8]>, args: &[Arg<'_>]) {
        self.output.vprintf(fmt, args);
    }

    /// `core::fmt` output, used by `kprint!` and the logger.
    pub fn print(&self, args: fmt::Arguments<'_>) {
        self.output.print(args);
    }

    pub fn panic(&self, msg: fmt::Arguments<'_>) -> ! {
        self.output.panic(msg)
    }

    pub fn on_panic(&self, info: &PanicInfo<'_>) -> ! {
        self.output.on_panic(info)
    }

    #[cfg(test)]
    pub(crate) fn with_ring<R>(&self, f: impl FnOnce(&InputRing) -> R) -> R {
        f(&self.input.lock())
    }
}

impl Device for Console<'_> {
    fn read(&self, ip: &dyn InodeLock, dst: &mut [u8]) -> Result<usize, ConsoleError> {
        ip.unlock();
        let result = Console::read(self, dst);
        ip.lock();
        result
    }

    fn write(&self, ip: &dyn InodeLock, src: &[u8]) -> Result<usize, ConsoleError> {
        ip.unlock();
        let n = Console::write(self, src);
        ip.lock();
        Ok(n)
    }
}
