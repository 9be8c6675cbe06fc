use std::io;
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use rtprompt_core::KeyParser;

use crate::{ConsoleError, ConsoleInput, ConsoleOutput, ConsoleResult, KeySink, RawModeGuard};

/// Poll timeout after which a lone ESC is treated as the Escape key
const IDLE_FLUSH_MS: libc::c_int = 50;

const READ_BUFFER_SIZE: usize = 1024;

pub struct UnixConsoleInput {
    stdin_fd: i32,
    running: Arc<AtomicBool>,
    wake_fds: (i32, i32), // (read, write)
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl UnixConsoleInput {
    pub fn new() -> ConsoleResult<Self> {
        // Self-pipe for waking up poll on stop
        let mut fds = [0i32; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error().into());
        }
        let flags = unsafe { libc::fcntl(fds[0], libc::F_GETFL) };
        if flags != -1 {
            unsafe { libc::fcntl(fds[0], libc::F_SETFL, flags | libc::O_NONBLOCK) };
        }

        Ok(Self {
            stdin_fd: io::stdin().as_raw_fd(),
            running: Arc::new(AtomicBool::new(false)),
            wake_fds: (fds[0], fds[1]),
            reader: Mutex::new(None),
        })
    }

    fn enter_raw_mode(fd: i32) -> io::Result<libc::termios> {
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut original) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let mut raw = original;
        raw.c_lflag &= !(libc::ICANON
            | libc::ECHO
            | libc::ECHOE
            | libc::ECHOK
            | libc::ECHONL
            | libc::ISIG
            | libc::IEXTEN);
        raw.c_iflag &= !(libc::IXON
            | libc::IXOFF
            | libc::ICRNL
            | libc::INLCR
            | libc::IGNCR
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP);
        raw.c_oflag &= !libc::OPOST;
        raw.c_cflag &= !libc::CSIZE;
        raw.c_cflag |= libc::CS8;
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(original)
    }

    fn poll_loop(stdin_fd: i32, wake_read: i32, running: Arc<AtomicBool>, mut sink: KeySink) {
        let mut parser = KeyParser::new();
        let mut buf = [0u8; READ_BUFFER_SIZE];

        while running.load(Ordering::Acquire) {
            let mut fds = [
                libc::pollfd { fd: stdin_fd, events: libc::POLLIN, revents: 0 },
                libc::pollfd { fd: wake_read, events: libc::POLLIN, revents: 0 },
            ];
            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, IDLE_FLUSH_MS) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                running.store(false, Ordering::Release);
                sink(Err(err.into()));
                break;
            }

            if rc == 0 {
                if parser.has_pending() {
                    for event in parser.flush() {
                        sink(Ok(event));
                    }
                }
                continue;
            }

            // Drain wake pipe; the loop condition decides whether to stop
            if fds[1].revents & libc::POLLIN != 0 {
                let mut drain = [0u8; 64];
                unsafe { libc::read(wake_read, drain.as_mut_ptr() as *mut _, drain.len()) };
                continue;
            }

            let revents = fds[0].revents;
            if revents & (libc::POLLERR | libc::POLLNVAL) != 0 {
                running.store(false, Ordering::Release);
                sink(Err(ConsoleError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "stdin is no longer readable",
                ))));
                break;
            }
            if revents & (libc::POLLIN | libc::POLLHUP) == 0 {
                continue;
            }

            let n = unsafe { libc::read(stdin_fd, buf.as_mut_ptr() as *mut _, buf.len()) };
            if n < 0 {
                let err = io::Error::last_os_error();
                if !matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) {
                    warn!("stdin read failed: {err}");
                    sink(Err(err.into()));
                }
                continue;
            }
            if n == 0 {
                debug!("stdin closed");
                running.store(false, Ordering::Release);
                sink(Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()));
                break;
            }

            for event in parser.feed(&buf[..n as usize]) {
                sink(Ok(event));
            }
        }
        debug!("key reader exiting");
    }
}

impl ConsoleInput for UnixConsoleInput {
    fn enable_raw_mode(&self) -> ConsoleResult<RawModeGuard> {
        let stdin_fd = self.stdin_fd;
        let original = Self::enter_raw_mode(stdin_fd)
            .map_err(|e| ConsoleError::TerminalMode(format!("stdin is not a usable terminal: {e}")))?;

        let restore_fn = move || unsafe {
            let _ = libc::tcsetattr(stdin_fd, libc::TCSANOW, &original);
        };

        Ok(RawModeGuard::new(restore_fn, "Unix VT".to_string()))
    }

    fn start_reader(&self, sink: KeySink) -> ConsoleResult<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ConsoleError::AlreadyRunning);
        }
        let stdin_fd = self.stdin_fd;
        let wake_read = self.wake_fds.0;
        let running = Arc::clone(&self.running);

        let spawned = thread::Builder::new()
            .name("rtprompt-keys".to_string())
            .spawn(move || Self::poll_loop(stdin_fd, wake_read, running, sink));
        match spawned {
            Ok(handle) => {
                *self.reader.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }

    fn stop_reader(&self) -> ConsoleResult<()> {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        // Wake the poll by writing a byte
        let _ = unsafe { libc::write(self.wake_fds.1, &1u8 as *const _ as *const _, 1) };

        let handle = self.reader.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("key reader thread panicked");
            }
        }

        if was_running {
            Ok(())
        } else {
            Err(ConsoleError::NotRunning)
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn raise_interrupt(&self) {
        debug!("raising SIGINT");
        unsafe {
            libc::raise(libc::SIGINT);
        }
    }
}

impl Drop for UnixConsoleInput {
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            let _ = self.stop_reader();
        }
        unsafe {
            libc::close(self.wake_fds.0);
            libc::close(self.wake_fds.1);
        }
    }
}

/// Unix console output. Writes are buffered until [`flush`](ConsoleOutput::flush)
/// so a whole repaint reaches the terminal in one piece.
pub struct UnixConsoleOutput {
    stdout_fd: i32,
    pending: Mutex<Vec<u8>>,
}

impl UnixConsoleOutput {
    pub fn new() -> Self {
        Self {
            stdout_fd: libc::STDOUT_FILENO,
            pending: Mutex::new(Vec::new()),
        }
    }

    fn write_all(&self, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            let n = unsafe {
                libc::write(self.stdout_fd, bytes.as_ptr() as *const libc::c_void, bytes.len())
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            bytes = &bytes[n as usize..];
        }
        Ok(())
    }
}

impl Default for UnixConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleOutput for UnixConsoleOutput {
    fn write_raw(&self, bytes: &[u8]) -> ConsoleResult<()> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&self) -> ConsoleResult<()> {
        let bytes = std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner));
        self.write_all(&bytes)?;
        Ok(())
    }
}

impl Drop for UnixConsoleOutput {
    fn drop(&mut self) {
        let _ = ConsoleOutput::flush(self);
    }
}
