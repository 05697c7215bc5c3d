//! Progress bars for record-by-record loads, kept pinned under log output.
//!
//! Log lines are routed through [`LogWriterFactory`] so that the per-record
//! `info!` lines of an import scroll above the bar instead of tearing it.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Bar over a known number of records, `None` when there is nothing to load
pub struct LoadProgress {
    bar: Option<ProgressBar>,
}

impl LoadProgress {
    pub fn start(len: usize, message: &str) -> Self {
        if len == 0 {
            return Self { bar: None };
        }

        let bar = multi_progress().add(ProgressBar::new(len as u64));
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    pub fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(self, message: &str) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Drop the bar from the terminal, used when a load stops early
    pub fn abandon(self) {
        if let Some(bar) = self.bar {
            bar.abandon();
            multi_progress().remove(&bar);
        }
    }
}

#[derive(Default, Clone)]
pub struct LogWriterFactory;

pub struct LogWriter {
    buffer: String,
}

impl LogWriter {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn emit(line: &str) {
        let _ = multi_progress().println(line.trim_end_matches('\r'));
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.push_str(&String::from_utf8_lossy(buf));

        while let Some(idx) = self.buffer.find('\n') {
            Self::emit(&self.buffer[..idx]);
            self.buffer.drain(..idx + 1);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            Self::emit(self.buffer.trim_end_matches('\n'));
            self.buffer.clear();
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_load_has_no_bar() {
        let progress = LoadProgress::start(0, "nothing");
        assert!(progress.bar.is_none());
        progress.advance();
        progress.finish("done");
    }

    #[test]
    fn test_bar_counts_records() {
        let progress = LoadProgress::start(3, "records");
        progress.advance();
        progress.advance();
        assert_eq!(progress.bar.as_ref().map(|b| b.position()), Some(2));
        progress.abandon();
    }

    #[test]
    fn test_log_writer_buffers_partial_lines() {
        let mut writer = LogWriter::new();
        writer.write_all(b"first line\nsecond").unwrap();
        assert_eq!(writer.buffer, "second");
        writer.flush().unwrap();
        assert!(writer.buffer.is_empty());
    }
}
