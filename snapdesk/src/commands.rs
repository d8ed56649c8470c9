//! The command set and its dispatcher.
//!
//! Pure message passing: a transport hands over a [`Request`], the dispatcher
//! returns a [`Reply`], the transport delivers it. All error-to-text
//! translation happens here - the core crate never formats user-visible
//! strings.

use snapdesk_core::{capture, locate, telemetry};

/// Embed colors lifted from the command cards.
pub const COLOR_WHITE: u32 = 0xff_ff_ff;
pub const COLOR_GREEN: u32 = 0x00_ff_00;
pub const COLOR_BLUE: u32 = 0x6e_97_de;

#[derive(
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    Ping,
    Info,
    Screenshot,
    Rdp,
    Help,
}

impl Command {
    /// One-line blurb, used by the help card.
    #[must_use]
    pub fn blurb(self) -> &'static str {
        match self {
            Self::Ping => "Tracks the latency and replies with an embedded message.",
            Self::Info => {
                "Displays the name of the PC where the program is running, \
                 CPU Usage, RAM Usage, and Uptime."
            }
            Self::Screenshot => "Takes a screenshot of all screens from the PC.",
            Self::Rdp => "Opens the remote desktop application.",
            Self::Help => "Provides information about available commands.",
        }
    }

    /// Parse a chat line of the form `<prefix><name>`.
    ///
    /// # Errors
    /// [`ParseError::NotACommand`] for lines without the prefix (plain
    /// chatter), [`ParseError::Unknown`] for a prefixed name we don't serve.
    pub fn parse(line: &str, prefix: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let Some(name) = line.strip_prefix(prefix) else {
            return Err(ParseError::NotACommand);
        };
        let name = name.trim();
        name.parse().map_err(|_| ParseError::Unknown {
            name: name.to_owned(),
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// No prefix - not addressed to us at all.
    #[error("not a command")]
    NotACommand,
    #[error("unknown command \"{name}\"")]
    Unknown { name: String },
}

/// One incoming command plus the instant it arrived, for latency tracking.
#[derive(Debug)]
pub struct Request {
    pub command: Command,
    pub received: std::time::Instant,
}

impl Request {
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            received: std::time::Instant::now(),
        }
    }
}

/// An embed-style card: title, body, 24-bit accent color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: &'static str,
    pub description: String,
    pub color: u32,
}

/// What goes back to the chat channel.
#[derive(Debug)]
pub enum Reply {
    Card(Card),
    /// A card plus a named byte attachment (the screenshot).
    Attachment {
        filename: &'static str,
        bytes: Vec<u8>,
        card: Card,
    },
    Text(String),
}

/// Maps commands onto the core operations. Stateless per request; safe to
/// share across worker threads.
pub struct Dispatcher<S, F> {
    screens: S,
    fs: F,
    prefix: String,
    rdp_exe: String,
}

impl<S: capture::ScreenSource, F: locate::Filesystem> Dispatcher<S, F> {
    pub fn new(screens: S, fs: F, prefix: String, rdp_exe: String) -> Self {
        Self {
            screens,
            fs,
            prefix,
            rdp_exe,
        }
    }

    /// Handle one request, synchronously. May take a while (the locator walks
    /// whole volumes); deadlines are the caller's business, not ours.
    pub fn handle(&self, request: &Request) -> Reply {
        log::info!("handling {:?}", request.command);
        match request.command {
            Command::Ping => self.ping(request),
            Command::Info => Self::info(),
            Command::Screenshot => self.screenshot(),
            Command::Rdp => self.rdp(),
            Command::Help => self.help(),
        }
    }

    fn ping(&self, request: &Request) -> Reply {
        let latency = request.received.elapsed();
        Reply::Card(Card {
            title: "Ping Result",
            description: format!("Latency: {:.0} ms", latency.as_secs_f64() * 1000.0),
            color: COLOR_WHITE,
        })
    }

    fn info() -> Reply {
        let info = telemetry::collect();
        Reply::Card(Card {
            title: "PC INFO",
            description: format!(
                ":computer: | PC: {}\n\
                 :gear: | CPU Usage: {:.0}%\n\
                 :floppy_disk: | RAM Usage: {} MB\n\
                 :clock1: | UPTIME: {}\n",
                info.host_name,
                info.cpu_usage_percent,
                info.used_ram_mb,
                telemetry::format_uptime(info.uptime),
            ),
            color: COLOR_GREEN,
        })
    }

    fn screenshot(&self) -> Reply {
        match capture::composite_all_displays(&self.screens) {
            Ok(bytes) => Reply::Attachment {
                filename: capture::ATTACHMENT_NAME,
                bytes,
                card: Card {
                    title: "Screenshot",
                    description: format!(
                        "Screenshot of all screens from PC: {}",
                        telemetry::host_name()
                    ),
                    color: COLOR_GREEN,
                },
            },
            Err(e) => Reply::Text(format!("Failed to capture screens: {e}")),
        }
    }

    fn rdp(&self) -> Reply {
        let name = self.rdp_exe.trim();
        if name.is_empty() {
            // The locator treats an empty name as unreachable input; reject
            // it here instead of handing it a pointless whole-disk walk.
            return Reply::Text("No remote desktop executable configured.".to_owned());
        }
        let Some(path) = locate::find_executable(&self.fs, name) else {
            return Reply::Text(format!("{name} executable not found."));
        };
        match std::process::Command::new(&path).spawn() {
            Ok(child) => {
                log::info!("launched {} (pid {})", path.display(), child.id());
                Reply::Text(format!("{name} is launched."))
            }
            Err(e) => Reply::Text(format!("Failed to open {name}: {e}")),
        }
    }

    fn help(&self) -> Reply {
        use std::fmt::Write;
        use strum::IntoEnumIterator;

        let mut description =
            String::from("Here's a list of available commands and their descriptions:\n");
        for command in Command::iter() {
            let name: &'static str = command.into();
            // Infallible, String's Write never errs.
            let _ = writeln!(description, "{}{}: {}", self.prefix, name, command.blurb());
        }
        Reply::Card(Card {
            title: "Help",
            description,
            color: COLOR_BLUE,
        })
    }
}

/// Serve requests until the request channel closes.
///
/// One worker thread per request: a slow volume walk must not block a ping.
/// Replies funnel back in completion order, which is fine - each reply is
/// self-describing.
pub fn serve<S, F>(
    dispatcher: std::sync::Arc<Dispatcher<S, F>>,
    requests: crossbeam::channel::Receiver<Request>,
    replies: crossbeam::channel::Sender<Reply>,
) where
    S: capture::ScreenSource + Send + Sync + 'static,
    F: locate::Filesystem + Send + Sync + 'static,
{
    let mut workers = Vec::new();
    for request in requests.iter() {
        let dispatcher = std::sync::Arc::clone(&dispatcher);
        let replies = replies.clone();
        workers.push(std::thread::spawn(move || {
            let reply = dispatcher.handle(&request);
            // Delivery side hung up - shutdown, nowhere to put the reply.
            let _ = replies.send(reply);
        }));
    }
    for worker in workers {
        let _ = worker.join();
    }
}
