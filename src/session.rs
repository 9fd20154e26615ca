//! The session driver: owns the channel and executes invocations against it.
//!
//! Every command funnels through [`Session::execute`], whatever the input
//! mode. A remote command is one strict round trip (send the request, then
//! suspend until its reply arrives), so requests reach the server in exactly
//! the order the lines were read, and each printed outcome reflects that
//! command's own reply.

use crate::channel::Channel;
use crate::interpreter::{self, Invocation};
use crate::protocol::{Request, Response};
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::Path;
use tokio::io::AsyncBufReadExt;
use tracing::debug;

/// One client session: the channel plus the stream user-visible output is
/// written to.
///
/// The session exclusively owns the channel handle; dropping the session on
/// any exit path closes the connection.
pub struct Session<C, W = std::io::Stdout> {
    channel: C,
    out: W,
}

impl<C: Channel> Session<C> {
    /// Create a session writing to stdout.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            out: std::io::stdout(),
        }
    }
}

impl<C, W> Session<C, W>
where
    C: Channel + Send,
    W: Write + Send,
{
    /// Create a session with an explicit output stream.
    pub fn with_output(channel: C, out: W) -> Self {
        Self { channel, out }
    }

    /// Execute one invocation, printing its outcome.
    ///
    /// A server-reported error (`status != "success"`) is printed and the
    /// session continues; only transport-level failures return `Err`.
    pub async fn execute(&mut self, invocation: Invocation) -> Result<()> {
        let request = match invocation {
            Invocation::Print(text) => {
                writeln!(self.out, "{text}")?;
                return Ok(());
            }
            Invocation::Remote(request) => request,
        };

        let reply = self.round_trip(&request).await?;

        if !reply.payload.is_success() {
            let message = reply.payload.error.as_deref().ok_or_else(|| {
                anyhow!(
                    "reply reported status {:?} without an error message",
                    reply.payload.status
                )
            })?;
            writeln!(self.out, "error: {message}")?;
            return Ok(());
        }

        if let Request::GetBelief { node } = &request {
            let belief = reply
                .payload
                .belief(node)
                .ok_or_else(|| anyhow!("reply is missing the belief for node \"{node}\""))?;
            writeln!(self.out, "{belief}")?;
        }

        Ok(())
    }

    /// Send one request and block until its reply is consumed.
    ///
    /// This is the only path to the wire: no send is exposed without the
    /// receive that consumes its reply, which keeps exactly one request in
    /// flight at all times.
    async fn round_trip(&mut self, request: &Request) -> Result<Response> {
        let frame = request.to_frame()?;
        debug!(frame = %frame, "sending request");
        self.channel.send(frame).await?;

        let reply = self.channel.recv().await?;
        debug!(frame = %reply, "received reply");
        Response::from_frame(&reply)
    }

    /// Interpret and execute one line; local errors are printed and absorbed.
    async fn interpret(&mut self, line: &str, line_no: Option<usize>) -> Result<()> {
        match interpreter::parse(line, line_no) {
            Ok(Some(invocation)) => self.execute(invocation).await,
            Ok(None) => Ok(()),
            Err(err) => {
                writeln!(self.out, "{err}")?;
                Ok(())
            }
        }
    }

    /// Execute one command string supplied at startup.
    pub async fn run_single(&mut self, command: &str) -> Result<()> {
        self.interpret(command, None).await
    }

    /// Prompt, read, and execute lines until `exit` or end of input.
    pub async fn run_interactive(&mut self) -> Result<()> {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            let Some(line) = lines.next_line().await? else {
                // End of input ends the session like an explicit exit.
                return Ok(());
            };

            // Checked before interpretation: `exit` is a shell word, not a
            // command, and sends nothing.
            if line.trim() == "exit" {
                return Ok(());
            }

            self.interpret(&line, None).await?;
        }
    }

    /// Replay a script file, citing 1-based line numbers in local errors.
    pub async fn run_script(&mut self, path: &Path) -> Result<()> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read script {}", path.display()))?;
        self.replay(&text).await
    }

    async fn replay(&mut self, text: &str) -> Result<()> {
        for (index, line) in text.lines().enumerate() {
            self.interpret(line, Some(index + 1)).await?;
        }
        Ok(())
    }
}
