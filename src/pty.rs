//! PTY host: spawns the user's login shell in a pseudo-terminal and proxies
//! every byte of input and output through channels the event loop can poll
//! without blocking.
//!
//! Grounded in `codex-rs/utils/pty/src/lib.rs` and `codex-rs/core/src/pty.rs`:
//! a `portable_pty` master/slave pair, a blocking reader task that forwards
//! chunks over a `broadcast` channel, and a writer task drained from an
//! `mpsc` channel.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::io::Write as _;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use portable_pty::CommandBuilder;
use portable_pty::PtySize;
use portable_pty::native_pty_system;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::error::WtfError;

pub const READ_CHUNK_SIZE: usize = 4 * 1024;

/// An interactive PTY-backed shell session.
pub struct PtyHost {
    master: Box<dyn portable_pty::MasterPty + Send>,
    writer_tx: mpsc::Sender<Vec<u8>>,
    output_tx: broadcast::Sender<Vec<u8>>,
    killer: StdMutex<Box<dyn portable_pty::ChildKiller + Send + Sync>>,
    child_pid: Option<u32>,
    reader_handle: Option<JoinHandle<()>>,
    writer_handle: Option<JoinHandle<()>>,
    wait_handle: Option<JoinHandle<()>>,
    exited: Arc<AtomicBool>,
    current_size: StdMutex<(u16, u16)>,
}

impl std::fmt::Debug for PtyHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHost")
            .field("child_pid", &self.child_pid)
            .field("exited", &self.exited.load(Ordering::SeqCst))
            .finish()
    }
}

/// Resolve the shell to spawn: `$SHELL`, falling back to `/bin/bash`.
pub fn login_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string())
}

impl PtyHost {
    /// Spawn the login shell attached to a fresh PTY, inheriting the parent
    /// environment.
    pub fn spawn(rows: u16, cols: u16) -> Result<(Self, broadcast::Receiver<Vec<u8>>)> {
        let shell = login_shell();
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| WtfError::PtySpawn {
                shell: shell.clone(),
                source: std::io::Error::other(e),
            })?;

        let mut builder = CommandBuilder::new(&shell);
        builder.cwd(std::env::current_dir().unwrap_or_else(|_| ".".into()));
        let env: HashMap<String, String> = std::env::vars().collect();
        for (key, value) in &env {
            builder.env(key, value);
        }

        let mut child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| WtfError::PtySpawn {
                shell: shell.clone(),
                source: std::io::Error::other(e),
            })?;
        drop(pair.slave);
        let child_pid = child.process_id();
        let killer = child.clone_killer();

        let (writer_tx, mut writer_rx) = mpsc::channel::<Vec<u8>>(256);
        let (output_tx, output_rx) = broadcast::channel::<Vec<u8>>(256);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| WtfError::PtySpawn {
                shell: shell.clone(),
                source: std::io::Error::other(e),
            })?;
        let output_tx_clone = output_tx.clone();
        let reader_handle = tokio::task::spawn_blocking(move || {
            let mut buf = [0u8; READ_CHUNK_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if output_tx_clone.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(5));
                        continue;
                    }
                    Err(_) => break,
                }
            }
        });

        let writer = pair.master.take_writer().map_err(|e| WtfError::PtySpawn {
            shell: shell.clone(),
            source: std::io::Error::other(e),
        })?;
        let writer = Arc::new(StdMutex::new(writer));
        let writer_handle = tokio::spawn({
            let writer = Arc::clone(&writer);
            async move {
                while let Some(bytes) = writer_rx.recv().await {
                    let writer = Arc::clone(&writer);
                    let _ = tokio::task::spawn_blocking(move || {
                        if let Ok(mut guard) = writer.lock() {
                            let _ = guard.write_all(&bytes);
                            let _ = guard.flush();
                        }
                    })
                    .await;
                }
            }
        });

        let exited = Arc::new(AtomicBool::new(false));
        let wait_exited = Arc::clone(&exited);
        let wait_handle = tokio::task::spawn_blocking(move || {
            let _ = child.wait();
            wait_exited.store(true, Ordering::SeqCst);
        });

        let initial_rx = output_tx.subscribe();
        drop(output_rx);

        Ok((
            Self {
                master: pair.master,
                writer_tx,
                output_tx,
                killer: StdMutex::new(killer),
                child_pid,
                reader_handle: Some(reader_handle),
                writer_handle: Some(writer_handle),
                wait_handle: Some(wait_handle),
                exited,
                current_size: StdMutex::new((rows, cols)),
            },
            initial_rx,
        ))
    }

    pub fn writer(&self) -> mpsc::Sender<Vec<u8>> {
        self.writer_tx.clone()
    }

    pub fn subscribe_output(&self) -> broadcast::Receiver<Vec<u8>> {
        self.output_tx.subscribe()
    }

    pub fn write_bytes(&self, bytes: Vec<u8>) {
        let _ = self.writer_tx.try_send(bytes);
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    pub fn child_pid(&self) -> Option<u32> {
        self.child_pid
    }

    /// Resize the PTY. Failure is non-fatal -- logged and otherwise ignored.
    pub fn resize(&self, rows: u16, cols: u16) {
        let mut current = self.current_size.lock().unwrap();
        if *current == (rows, cols) {
            return;
        }
        let result = self.master.resize(PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        });
        if result.is_ok() {
            *current = (rows, cols);
        } else {
            tracing::warn!(?result, "pty resize failed");
        }
    }

    /// Best-effort check of whether the child's terminal is currently in
    /// canonical mode with echo disabled -- the "secret mode" signal used by
    /// the input router to suppress line-buffer capture during password
    /// prompts.
    #[cfg(unix)]
    pub fn is_secret_mode(&self) -> bool {
        let fd = self.master.as_raw_fd();
        let Some(fd) = fd else { return false };
        unsafe {
            let mut term: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut term) != 0 {
                return false;
            }
            let canonical = term.c_lflag & libc::ICANON != 0;
            let echo = term.c_lflag & libc::ECHO != 0;
            canonical && !echo
        }
    }

    #[cfg(not(unix))]
    pub fn is_secret_mode(&self) -> bool {
        false
    }
}

impl Drop for PtyHost {
    fn drop(&mut self) {
        if let Ok(mut killer) = self.killer.lock() {
            let _ = killer.kill();
        }
        if let Some(h) = self.reader_handle.take() {
            h.abort();
        }
        if let Some(h) = self.writer_handle.take() {
            h.abort();
        }
        if let Some(h) = self.wait_handle.take() {
            h.abort();
        }
    }
}
