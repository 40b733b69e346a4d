//! `wtf-cli`: an interactive terminal wrapper that spawns a login shell in a
//! PTY and overlays a command palette, history picker, settings panel,
//! full-screen app mode, and an AI chat sidebar grounded in the live
//! terminal buffer.

pub mod altscreen;
pub mod app;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod fullscreen;
pub mod history;
pub mod input_router;
pub mod llm;
pub mod logging;
pub mod model_cache;
pub mod normalizer;
pub mod overlays;
pub mod pty;
pub mod pty_cwd;
pub mod scrollback;
pub mod status_bar;
pub mod tui;
