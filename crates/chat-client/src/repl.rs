use std::io::{self, Write};

use chat_client::{ChatSession, ChatTransport, KeyOutcome, KeyPress, ResponseMode, SendOutcome};
use shared::models::{Role, Turn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const QUIT_COMMAND: &str = "/quit";
const CONTINUATION_SUFFIX: char = '\\';

/// Reads the terminal line by line. A trailing `\` behaves like Shift+Enter,
/// anything else like Enter.
pub(crate) async fn run<T>(mut session: ChatSession, transport: &T) -> io::Result<()>
where
    T: ChatTransport + ?Sized,
{
    let mut stdout = io::stdout();
    for turn in session.turns() {
        print_turn(&mut stdout, turn)?;
    }
    print_prompt(&mut stdout, false)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if session.draft().is_empty() && line.trim() == QUIT_COMMAND {
            break;
        }

        let (text, continued) = match line.strip_suffix(CONTINUATION_SUFFIX) {
            Some(text) => (text, true),
            None => (line.as_str(), false),
        };
        for value in text.chars() {
            session.handle_key(KeyPress::char(value));
        }

        if continued {
            session.handle_key(KeyPress::shift_enter());
            print_prompt(&mut stdout, true)?;
            continue;
        }

        if session.handle_key(KeyPress::enter()) == KeyOutcome::Submit {
            submit(&mut session, transport, &mut stdout).await?;
        }
        print_prompt(&mut stdout, false)?;
    }

    Ok(())
}

async fn submit<T>(
    session: &mut ChatSession,
    transport: &T,
    stdout: &mut io::Stdout,
) -> io::Result<()>
where
    T: ChatTransport + ?Sized,
{
    if !session.draft().trim().is_empty() {
        write!(stdout, "MatherBot: ")?;
        stdout.flush()?;
    }

    let mut streamed_any = false;
    let outcome = session
        .send_with(transport, |chunk| {
            streamed_any = true;
            echo_chunk(&mut io::stdout(), chunk);
        })
        .await;

    let last_content = session
        .turns()
        .last()
        .map(|turn| turn.content.as_str())
        .unwrap_or_default();
    match outcome {
        SendOutcome::Ignored => return Ok(()),
        SendOutcome::Replied if session.mode() == ResponseMode::Streaming => writeln!(stdout)?,
        SendOutcome::Replied => writeln!(stdout, "{last_content}")?,
        SendOutcome::Failed => {
            if streamed_any {
                write!(stdout, "\nMatherBot: ")?;
            }
            writeln!(stdout, "{last_content}")?;
        }
    }
    writeln!(stdout)
}

/// Terminal output is best effort while a reply streams in; the session state
/// is what counts.
fn echo_chunk(out: &mut impl Write, chunk: &str) {
    if let Err(err) = write!(out, "{chunk}").and_then(|()| out.flush()) {
        debug!(error = %err, "failed to echo streamed chunk");
    }
}

fn print_turn(stdout: &mut io::Stdout, turn: &Turn) -> io::Result<()> {
    let speaker = match turn.role {
        Role::User => "You",
        Role::Assistant | Role::System => "MatherBot",
    };
    writeln!(stdout, "{speaker}: {}\n", turn.content)
}

fn print_prompt(stdout: &mut io::Stdout, continued: bool) -> io::Result<()> {
    write!(stdout, "{}", if continued { "... " } else { "> " })?;
    stdout.flush()
}
