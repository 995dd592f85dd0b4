#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The execution context handed to every check: scripted input, captured
//! output and the feedback sink.

use std::{
    fmt::{self, Display, Write as _},
    io::{self, BufRead, Cursor, Read},
};

use thiserror::Error;

/// Unwind payload used when a check reads input that was never scripted.
///
/// Unwinding (instead of returning an error) keeps the request from ever
/// reaching the caller's own error handling; the harness recognises the
/// payload and reports the dedicated failure.
#[derive(Debug)]
pub(crate) struct InputNotAllowed;

/// Aborts the current check because it asked for input that was not scripted.
pub(crate) fn deny_input() -> ! {
    std::panic::resume_unwind(Box::new(InputNotAllowed))
}

/// Errors raised while reading scripted input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The scripted input was used up.
    #[error("EOF when reading a line")]
    Eof,
    /// Reading the scripted input failed.
    #[error("could not read input: {0}")]
    Io(#[from] io::Error),
}

/// Append-only text sink a check writes its explanation into.
#[derive(Debug, Default, Clone)]
pub struct FeedbackBuffer {
    /// Everything written so far.
    text: String,
}

impl FeedbackBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` verbatim.
    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the text written so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the buffer, returning its text.
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Write for FeedbackBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.text.push_str(s);
        Ok(())
    }
}

/// Finite input source seeded with the scripted text.
///
/// When no input was scripted every read is refused: the check is aborted
/// and the harness reports that the task should not ask for input.
#[derive(Debug)]
pub struct ScriptedInput {
    /// Remaining scripted bytes.
    source:  Cursor<Vec<u8>>,
    /// Whether any input was scripted.
    allowed: bool,
    /// Set once a read was refused.
    denied:  bool,
}

impl ScriptedInput {
    /// Creates an input source over `script`.
    pub fn new(script: &str) -> Self {
        Self {
            source:  Cursor::new(script.as_bytes().to_vec()),
            allowed: !script.is_empty(),
            denied:  false,
        }
    }

    /// Returns whether reads are permitted.
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Returns whether a read was refused.
    pub fn denied(&self) -> bool {
        self.denied
    }

    /// Refuses the read when no input was scripted.
    fn check_allowed(&mut self) {
        if !self.allowed {
            self.denied = true;
            deny_input();
        }
    }
}

impl Read for ScriptedInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_allowed();
        self.source.read(buf)
    }
}

impl BufRead for ScriptedInput {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.check_allowed();
        self.source.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.source.consume(amt);
    }
}

/// Standard input and output as seen by the code under test.
#[derive(Debug)]
pub struct Console {
    /// Scripted input source.
    stdin:  ScriptedInput,
    /// Everything printed so far.
    stdout: String,
}

impl Console {
    /// Creates a console reading from `script` and capturing all output.
    pub fn new(script: &str) -> Self {
        Self {
            stdin:  ScriptedInput::new(script),
            stdout: String::new(),
        }
    }

    /// Prints `prompt`, then reads one line of scripted input without its
    /// line terminator.
    ///
    /// # Panics
    ///
    /// Unwinds with a harness-internal payload when no input was scripted;
    /// inside a harness run this ends the check with the "should not ask for
    /// user input" failure.
    pub fn input(&mut self, prompt: &str) -> Result<String, InputError> {
        self.stdout.push_str(prompt);
        self.read_line()
    }

    /// Reads one line of scripted input without its line terminator.
    ///
    /// # Panics
    ///
    /// Same as [`Console::input`].
    pub fn read_line(&mut self) -> Result<String, InputError> {
        let mut line = String::new();
        if self.stdin.read_line(&mut line)? == 0 {
            return Err(InputError::Eof);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    /// Gives direct access to the scripted input source.
    pub fn stdin(&mut self) -> &mut ScriptedInput {
        &mut self.stdin
    }

    /// Writes `value` to the captured output.
    pub fn print(&mut self, value: impl Display) {
        let _ = write!(self.stdout, "{value}");
    }

    /// Writes `value` and a newline to the captured output.
    pub fn println(&mut self, value: impl Display) {
        let _ = writeln!(self.stdout, "{value}");
    }

    /// Returns everything printed so far.
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Returns whether a read was refused because no input was scripted.
    pub fn input_denied(&self) -> bool {
        self.stdin.denied()
    }

    /// Consumes the console, returning the captured output.
    pub(crate) fn into_stdout(self) -> String {
        self.stdout
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.stdout.push_str(s);
        Ok(())
    }
}

/// Everything a check may touch while it runs.
#[derive(Debug)]
pub struct ExecutionContext {
    /// Scripted input and captured output.
    console:  Console,
    /// Explanation written by the check.
    feedback: FeedbackBuffer,
}

impl ExecutionContext {
    /// Creates a context with the given scripted input.
    pub fn new(scripted_input: &str) -> Self {
        Self {
            console:  Console::new(scripted_input),
            feedback: FeedbackBuffer::new(),
        }
    }

    /// Returns the console the code under test reads from and prints to.
    pub fn console(&mut self) -> &mut Console {
        &mut self.console
    }

    /// Returns the feedback sink.
    pub fn feedback(&mut self) -> &mut FeedbackBuffer {
        &mut self.feedback
    }

    /// Shorthand for [`Console::input`].
    pub fn input(&mut self, prompt: &str) -> Result<String, InputError> {
        self.console.input(prompt)
    }

    /// Shorthand for [`Console::print`].
    pub fn print(&mut self, value: impl Display) {
        self.console.print(value);
    }

    /// Shorthand for [`Console::println`].
    pub fn println(&mut self, value: impl Display) {
        self.console.println(value);
    }

    /// Returns everything printed so far.
    pub fn stdout(&self) -> &str {
        self.console.stdout()
    }

    /// Returns whether the check may read input.
    pub fn input_allowed(&self) -> bool {
        self.console.stdin.allowed()
    }

    /// Splits the context into its console and feedback.
    pub(crate) fn into_parts(self) -> (Console, FeedbackBuffer) {
        (self.console, self.feedback)
    }
}
