#![warn(clippy::pedantic)]

//! Snapdesk: a remote-control agent. Commands arrive over a chat-style
//! transport and turn into local machine actions - status, a stitched
//! screenshot of every display, launching the remote-desktop helper.

mod commands;
mod config;
mod transport;

use anyhow::Result as AnyResult;

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stderr());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    let config = config::Config::load_or_default();
    log::info!(
        "snapdesk v{} on \"{}\", prefix {:?}",
        env!("CARGO_PKG_VERSION"),
        snapdesk_core::telemetry::host_name(),
        config.command_prefix
    );

    let dispatcher = std::sync::Arc::new(commands::Dispatcher::new(
        snapdesk_core::capture::LiveScreens,
        snapdesk_core::locate::OsFilesystem,
        config.command_prefix.clone(),
        config.remote_desktop_exe,
    ));

    let (reply_tx, reply_rx) = crossbeam::channel::unbounded();
    let requests = transport::spawn_stdin_reader(config.command_prefix, reply_tx.clone());
    let server = std::thread::spawn(move || commands::serve(dispatcher, requests, reply_tx));

    // Runs until stdin closes and every in-flight reply has been delivered.
    transport::deliver_all(reply_rx, std::env::current_dir()?);

    server
        .join()
        .map_err(|_| anyhow::anyhow!("dispatch loop panicked"))?;
    Ok(())
}
