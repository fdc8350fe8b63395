use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::app::ViewSnapshot;
use crate::config::Config;

const DEFAULT_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    bar_width: usize,
}

impl Renderer {
    /// Colors only when the config allows it and stdout is a terminal.
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Self::for_terminal(cfg, io::stdout().is_terminal())
    }

    pub fn for_terminal(cfg: &Config, is_terminal: bool) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        let bar_width = cfg
            .get_usize("progress.width")?
            .unwrap_or(DEFAULT_BAR_WIDTH)
            .max(1);

        Ok(Self {
            color: color && is_terminal,
            bar_width,
        })
    }

    #[tracing::instrument(skip(self, out, snapshot))]
    pub fn render<W: Write>(&self, mut out: W, snapshot: &ViewSnapshot) -> anyhow::Result<()> {
        writeln!(
            out,
            "filter: {}  page {}/{}  showing {} of {} ({} total)",
            snapshot.filter,
            snapshot.page_number,
            snapshot.page_count,
            snapshot.page.len(),
            snapshot.filtered_len,
            snapshot.total_len,
        )?;

        if snapshot.page.is_empty() {
            writeln!(out, "(no items on this page)")?;
        } else {
            let headers = vec!["ID".to_string(), "Status".to_string(), "Title".to_string()];
            let rows = snapshot
                .page
                .iter()
                .map(|item| {
                    let status = if item.completed {
                        self.paint("completed", "32")
                    } else {
                        self.paint("pending", "33")
                    };
                    vec![item.id.to_string(), status, item.title.clone()]
                })
                .collect();
            write_table(&mut out, headers, rows)?;
        }

        writeln!(
            out,
            "progress [{}] {:.2}%",
            progress_bar(snapshot.progress, self.bar_width),
            snapshot.progress
        )?;
        Ok(())
    }

    pub fn render_message<W: Write>(&self, mut out: W, message: &str) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(message, "36"))?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Fill is clamped to the bar; the printed percentage is not.
fn progress_bar(progress: f64, width: usize) -> String {
    let ratio = (progress / 100.0).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
