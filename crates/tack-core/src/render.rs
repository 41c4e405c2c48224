use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::category::Category;
use crate::config::Config;
use crate::task::Task;
use crate::view::View;

pub const DONE_SUFFIX: &str = " [done]";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, view))]
    pub fn print_view(&self, view: &View<'_>) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_view(out, view)
    }

    pub fn write_view<W: Write>(&self, mut out: W, view: &View<'_>) -> anyhow::Result<()> {
        if view.is_empty() {
            writeln!(out, "No tasks ({}).", view.filter())?;
            return Ok(());
        }

        let headers = vec!["#".to_string(), "Category".to_string(), "Task".to_string()];
        let rows = view
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    task.category.to_string(),
                    self.task_text(task),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        writeln!(out, "{} task(s) shown ({}).", view.len(), view.filter())?;
        Ok(())
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_categories(&self, tasks: &[Task]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let headers = vec!["Category".to_string(), "Open".to_string(), "Done".to_string()];
        let rows = Category::ALL
            .into_iter()
            .map(|cat| {
                let (done, open): (Vec<&Task>, Vec<&Task>) = tasks
                    .iter()
                    .filter(|task| task.category == cat)
                    .partition(|task| task.completed);
                vec![
                    cat.to_string(),
                    open.len().to_string(),
                    done.len().to_string(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)
    }

    /// Task text as the user sees it, with the completion marker.
    pub fn task_text(&self, task: &Task) -> String {
        if task.completed {
            self.paint(&format!("{}{DONE_SUFFIX}", task.text), "90")
        } else {
            task.text.clone()
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
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

    for (header, width) in headers.iter().zip(widths.iter().copied()) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for &width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(widths.iter().copied()) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
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
