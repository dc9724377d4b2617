use crate::{
    colors::{
        ARGUMENT_NAME_COLOR, EXCEPTION_COLOR, GENERAL_TEXT_COLOR, HEADER_COLOR, MEMORY_MAP_COLOR,
        NOTICE_COLOR,
    },
    types::DecodeReport,
};
use colored::{ColoredString, Colorize};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

/// Buffered sink for reports, stderr unless a file was asked for.
pub struct ReportWriter {
    sink: BufWriter<Box<dyn Write + Send>>,
}

impl ReportWriter {
    pub fn initialize(output: Option<&Path>) -> io::Result<Self> {
        let sink: Box<dyn Write + Send> = match output {
            Some(output) => {
                // escape codes in a file are noise
                colored::control::set_override(false);
                let file = File::options()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(output)?;
                Box::new(file)
            }
            None => {
                // colored crate disables stderr's coloring when stdout is redirected elsewhere, e.g.: /dev/null
                // this is a workaround for now
                // https://github.com/colored-rs/colored/issues/125#issuecomment-1691155922
                colored::control::set_override(true);
                Box::new(io::stderr())
            }
        };
        Ok(ReportWriter::from_sink(sink))
    }

    pub fn from_sink(sink: Box<dyn Write + Send>) -> Self {
        ReportWriter {
            sink: BufWriter::new(sink),
        }
    }

    pub fn write_report(&mut self, report: &DecodeReport) -> io::Result<()> {
        for piece in colorize(report) {
            write!(self.sink, "{piece}")?;
        }
        self.sink.flush()
    }

    pub fn write_diagnostic(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.sink, "{}", text.custom_color(*EXCEPTION_COLOR))?;
        self.sink.flush()
    }
}

fn is_exception(text: &str) -> bool {
    text.contains("exception") || text.contains("cannot ")
}

/// The report as colored pieces, newlines included.
pub fn colorize(report: &DecodeReport) -> Vec<ColoredString> {
    let mut pieces = vec![report.header.custom_color(*HEADER_COLOR).bold(), "\n".normal()];
    for notice in &report.notices {
        pieces.push(format!("{notice}\n").custom_color(*NOTICE_COLOR));
    }
    for line in &report.lines {
        let indent = "\t".repeat(line.depth);
        let nested = format!("\n{indent}\t");
        pieces.push(indent.normal());
        pieces.push(line.argument_name.custom_color(*ARGUMENT_NAME_COLOR));
        pieces.push(": ".custom_color(*GENERAL_TEXT_COLOR));
        let text = line.rendered_text.replace('\n', &nested);
        if is_exception(&line.rendered_text) {
            pieces.push(text.custom_color(*EXCEPTION_COLOR));
        } else {
            pieces.push(text.custom_color(*GENERAL_TEXT_COLOR));
        }
        pieces.push("\n".normal());
    }
    if let Some(memory_map) = &report.memory_map {
        pieces.push(format!("{memory_map}\n").custom_color(*MEMORY_MAP_COLOR));
    }
    for diagnostic in &report.diagnostics {
        pieces.push(format!("{diagnostic}\n").custom_color(*EXCEPTION_COLOR));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DecodedLine;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn plain_text_matches_text_lines() {
        colored::control::set_override(false);
        let report = DecodeReport {
            header: "close: long sys_close(unsigned int fd)".to_owned(),
            notices: vec![],
            lines: vec![DecodedLine::new("fd", "unsigned int: 0x3 -> \"a\"\nmore")],
            memory_map: Some("Memory mapping before syscall: unavailable: x".to_owned()),
            diagnostics: vec!["Exception in decode: boom".to_owned()],
        };
        let shared = Shared::default();
        let mut writer = ReportWriter::from_sink(Box::new(shared.clone()));
        writer.write_report(&report).unwrap();
        let written = String::from_utf8(shared.0.lock().unwrap().clone()).unwrap();
        let mut expected = report.text_lines().join("\n");
        expected.push('\n');
        assert_eq!(written, expected);
    }
}
