//! Console transport: stdin lines in, rendered cards out.
//!
//! The actual chat network is an external collaborator and stays out of this
//! repo. This local loop keeps the binary usable end to end and keeps the
//! dispatcher honest about its message-passing seam: the transport only ever
//! exchanges [`Request`] and [`Reply`] values with it.

use crate::commands::{Card, Command, ParseError, Reply, Request};

/// Spawn a thread that turns stdin lines into requests.
///
/// The returned channel closes on EOF. Lines without the command prefix are
/// chatter and are dropped; a prefixed-but-unknown name gets an immediate
/// text reply without ever reaching the dispatcher.
pub fn spawn_stdin_reader(
    prefix: String,
    replies: crossbeam::channel::Sender<Reply>,
) -> crossbeam::channel::Receiver<Request> {
    let (tx, rx) = crossbeam::channel::unbounded();
    std::thread::spawn(move || {
        use std::io::BufRead;
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            // Err here means stdin is gone for good, same as EOF.
            let Ok(line) = line else { break };
            match Command::parse(&line, &prefix) {
                Ok(command) => {
                    if tx.send(Request::new(command)).is_err() {
                        break;
                    }
                }
                Err(ParseError::NotACommand) => {}
                Err(e @ ParseError::Unknown { .. }) => {
                    let _ = replies.send(Reply::Text(format!("{e}. Try {prefix}help.")));
                }
            }
        }
    });
    rx
}

/// Deliver replies to stdout until every sender hangs up.
///
/// Attachments land as files next to `attachment_dir`, standing in for a chat
/// upload.
pub fn deliver_all(replies: crossbeam::channel::Receiver<Reply>, attachment_dir: std::path::PathBuf) {
    for reply in replies.iter() {
        match reply {
            Reply::Card(card) => print!("{}", render_card(&card)),
            Reply::Text(text) => println!("{text}"),
            Reply::Attachment {
                filename,
                bytes,
                card,
            } => {
                print!("{}", render_card(&card));
                let path = attachment_dir.join(filename);
                match std::fs::write(&path, &bytes) {
                    Ok(()) => println!("[attached: {}]", path.display()),
                    Err(e) => {
                        log::error!("failed to write attachment {}: {e}", path.display());
                        println!("[attachment lost: {e}]");
                    }
                }
            }
        }
    }
}

/// Plain-text stand-in for an embed card.
fn render_card(card: &Card) -> String {
    use std::fmt::Write;
    let mut out = format!("[#{:06x}] {}\n", card.color, card.title);
    for line in card.description.lines() {
        // Infallible, String's Write never errs.
        let _ = writeln!(out, "  {line}");
    }
    out
}
