use std::mem;
use std::path::Path;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_document;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::db::Store;
use crate::models::{format_money, Book};
use crate::report::{export_sales, export_summary};

use super::forms::{BookField, BookForm, ConfirmBookDelete, ExportForm, ExportKind, SellForm};
use super::helpers::{centered_rect, surface_error, truncate};
use super::screens::{LedgerScreen, StatsScreen};

/// Footer space reserved for status messages and key hints.
const FOOTER_HEIGHT: u16 = 3;

/// High-level navigation states. Keeping this explicit makes it easy to
/// reason about which rendering path runs and what keyboard shortcuts should
/// do.
enum Screen {
    Catalog,
    Ledger(LedgerScreen),
    Stats(StatsScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook { id: i64, form: BookForm },
    ConfirmDelete(ConfirmBookDelete),
    Selling(SellForm),
    Filtering(String),
    Exporting(ExportForm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. Owns the [`Store`] so
/// every database and document mutation flows through one place.
pub struct App {
    store: Store,
    books: Vec<Book>,
    filtered: Vec<Book>,
    filter: Option<String>,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: Store, books: Vec<Book>) -> Self {
        let mut app = Self {
            store,
            books,
            filtered: Vec::new(),
            filter: None,
            selected: 0,
            screen: Screen::Catalog,
            mode: Mode::Normal,
            status: None,
        };
        app.apply_filter();
        app
    }

    // ---- state management -------------------------------------------------

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// Re-read the catalog after any mutation, keeping filter and selection
    /// as stable as possible.
    fn reload_books(&mut self) -> Result<()> {
        self.books = self.store.fetch_books()?;
        self.apply_filter();
        Ok(())
    }

    fn apply_filter(&mut self) {
        self.filtered = match &self.filter {
            Some(query) if !query.trim().is_empty() => {
                let needle = query.to_lowercase();
                self.books
                    .iter()
                    .filter(|book| {
                        book.title.to_lowercase().contains(&needle)
                            || book.author.to_lowercase().contains(&needle)
                            || book.description.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect()
            }
            _ => self.books.clone(),
        };

        if self.filtered.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len() - 1;
        }
    }

    fn current_book(&self) -> Option<&Book> {
        self.filtered.get(self.selected)
    }

    fn move_selection(&mut self, delta: i64) {
        if self.filtered.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.filtered.len() as i64 - 1;
        self.selected = (self.selected as i64 + delta).clamp(0, last) as usize;
    }

    // ---- key handling -----------------------------------------------------

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_add_book(code, form)?,
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Selling(form) => self.handle_sell(code, form)?,
            Mode::Filtering(query) => self.handle_filter(code, query),
            Mode::Exporting(form) => self.handle_export(code, form)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Catalog => self.handle_catalog_key(code, exit),
            Screen::Ledger(_) => self.handle_ledger_key(code, exit),
            Screen::Stats(_) => self.handle_stats_key(code, exit),
        }
    }

    fn handle_catalog_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc => {
                if self.filter.is_some() {
                    self.filter = None;
                    self.apply_filter();
                    self.set_status("Filter cleared.", StatusKind::Info);
                } else {
                    *exit = true;
                }
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.filtered.len().saturating_sub(1),
            KeyCode::Enter => self.open_selected_document(),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::AddingBook(BookForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(book) = self.current_book() {
                    let form = BookForm::from_book(book);
                    let id = book.id;
                    self.clear_status();
                    return Ok(Mode::EditingBook { id, form });
                }
                self.set_status("No book selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(book) = self.current_book() {
                    let confirm = ConfirmBookDelete::from(book);
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
                self.set_status("No book selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                if let Some(book) = self.current_book() {
                    if !book.in_stock() {
                        let title = book.display_title();
                        self.set_status(
                            format!("{title} is out of stock."),
                            StatusKind::Error,
                        );
                        return Ok(Mode::Normal);
                    }
                    let form = SellForm::for_book(book);
                    self.clear_status();
                    return Ok(Mode::Selling(form));
                }
                self.set_status("No book selected to sell.", StatusKind::Error);
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                let query = self.filter.clone().unwrap_or_default();
                return Ok(Mode::Filtering(query));
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.clear_status();
                self.screen = Screen::Ledger(LedgerScreen::load(&self.store)?);
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.clear_status();
                self.screen = Screen::Stats(StatsScreen::load(&self.store)?);
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.clear_status();
                return Ok(Mode::Exporting(ExportForm::new(ExportKind::Ledger)));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_ledger_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Ledger(ref mut ledger) = self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.screen = Screen::Catalog;
                self.clear_status();
            }
            KeyCode::Up => ledger.move_selection(-1),
            KeyCode::Down => ledger.move_selection(1),
            KeyCode::PageUp => ledger.move_selection(-5),
            KeyCode::PageDown => ledger.move_selection(5),
            KeyCode::Home => ledger.select_first(),
            KeyCode::End => ledger.select_last(),
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.clear_status();
                return Ok(Mode::Exporting(ExportForm::new(ExportKind::Ledger)));
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.clear_status();
                self.screen = Screen::Stats(StatsScreen::load(&self.store)?);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_stats_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Stats(ref mut stats) = self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.screen = Screen::Catalog;
                self.clear_status();
            }
            KeyCode::Up => stats.move_selection(-1),
            KeyCode::Down => stats.move_selection(1),
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.clear_status();
                return Ok(Mode::Exporting(ExportForm::new(ExportKind::Summary)));
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.clear_status();
                self.screen = Screen::Ledger(LedgerScreen::load(&self.store)?);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Add cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                Ok(Mode::AddingBook(form))
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                Ok(Mode::AddingBook(form))
            }
            KeyCode::Backspace => {
                form.backspace();
                form.error = None;
                Ok(Mode::AddingBook(form))
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::AddingBook(form))
            }
            KeyCode::Enter => match self.submit_book_form(&form, None) {
                Ok(title) => {
                    self.set_status(format!("Added {title}."), StatusKind::Info);
                    Ok(Mode::Normal)
                }
                Err(err) => {
                    form.error = Some(surface_error(&err));
                    Ok(Mode::AddingBook(form))
                }
            },
            _ => Ok(Mode::AddingBook(form)),
        }
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: i64, mut form: BookForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                Ok(Mode::EditingBook { id, form })
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                Ok(Mode::EditingBook { id, form })
            }
            KeyCode::Backspace => {
                form.backspace();
                form.error = None;
                Ok(Mode::EditingBook { id, form })
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::EditingBook { id, form })
            }
            KeyCode::Enter => match self.submit_book_form(&form, Some(id)) {
                Ok(title) => {
                    self.set_status(format!("Updated {title}."), StatusKind::Info);
                    Ok(Mode::Normal)
                }
                Err(err) => {
                    form.error = Some(surface_error(&err));
                    Ok(Mode::EditingBook { id, form })
                }
            },
            _ => Ok(Mode::EditingBook { id, form }),
        }
    }

    /// Shared submit path for the add and edit forms. The document copy runs
    /// before any database write, so a failed copy persists nothing; if the
    /// write itself fails, the just-imported copy is removed again so no
    /// orphan accumulates in the managed directory. A replaced document is
    /// removed only after the row update succeeded.
    fn submit_book_form(&mut self, form: &BookForm, existing_id: Option<i64>) -> Result<String> {
        let parsed = form.parse_inputs()?;
        let mut fields = parsed.fields;

        let mut imported = None;
        let replaced = if let Some(source) = parsed.new_document.as_deref() {
            let stored = self.store.documents().import(Path::new(source))?;
            let old = fields.document_path.take();
            fields.document_path = Some(stored.to_string_lossy().into_owned());
            imported = Some(stored);
            old
        } else {
            None
        };

        let title = fields.title.clone();
        let written = match existing_id {
            Some(id) => self.store.update_book(id, fields),
            None => self.store.create_book(fields).map(|_| ()),
        };
        if let Err(err) = written {
            if let Some(stored) = imported {
                if let Err(cleanup_err) = self.store.documents().remove(&stored) {
                    log::warn!("imported document was not cleaned up: {cleanup_err:#}");
                }
            }
            return Err(err);
        }

        if let Some(old) = replaced {
            if let Err(err) = self.store.documents().remove(Path::new(&old)) {
                log::warn!("replaced document was not removed: {err:#}");
            }
        }

        self.reload_books()?;
        Ok(title)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.store.delete_book(confirm.id) {
                    Ok(()) => {
                        self.reload_books()?;
                        self.set_status(format!("Deleted {}.", confirm.title), StatusKind::Info);
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                    }
                }
                Ok(Mode::Normal)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Delete cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_sell(&mut self, code: KeyCode, mut form: SellForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Sale cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                form.backspace();
                form.error = None;
                Ok(Mode::Selling(form))
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::Selling(form))
            }
            KeyCode::Enter => {
                let quantity = match form.parse_quantity() {
                    Ok(quantity) => quantity,
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        return Ok(Mode::Selling(form));
                    }
                };
                match self.store.sell(form.book_id, quantity) {
                    Ok(sale) => {
                        self.reload_books()?;
                        self.set_status(
                            format!(
                                "Sold {} x {} for {}.",
                                sale.quantity,
                                sale.book_title,
                                format_money(sale.total)
                            ),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        Ok(Mode::Selling(form))
                    }
                }
            }
            _ => Ok(Mode::Selling(form)),
        }
    }

    fn handle_filter(&mut self, code: KeyCode, mut query: String) -> Mode {
        match code {
            KeyCode::Esc => {
                self.filter = None;
                self.apply_filter();
                Mode::Normal
            }
            KeyCode::Enter => {
                if query.trim().is_empty() {
                    self.filter = None;
                } else {
                    self.filter = Some(query);
                }
                self.apply_filter();
                Mode::Normal
            }
            KeyCode::Backspace => {
                query.pop();
                self.filter = Some(query.clone());
                self.apply_filter();
                Mode::Filtering(query)
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                query.push(ch);
                self.filter = Some(query.clone());
                self.apply_filter();
                Mode::Filtering(query)
            }
            _ => Mode::Filtering(query),
        }
    }

    fn handle_export(&mut self, code: KeyCode, mut form: ExportForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Export cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                form.backspace();
                form.error = None;
                Ok(Mode::Exporting(form))
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::Exporting(form))
            }
            KeyCode::Enter => {
                let path = match form.parse_path() {
                    Ok(path) => path,
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        return Ok(Mode::Exporting(form));
                    }
                };
                let result = match form.kind {
                    ExportKind::Ledger => export_sales(&self.store, Path::new(&path)),
                    ExportKind::Summary => export_summary(&self.store, Path::new(&path)),
                };
                match result {
                    Ok(rows) => {
                        self.set_status(
                            format!("Wrote {rows} rows to {path}."),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        Ok(Mode::Exporting(form))
                    }
                }
            }
            _ => Ok(Mode::Exporting(form)),
        }
    }

    fn open_selected_document(&mut self) {
        let Some(book) = self.current_book() else {
            self.set_status("No book selected.", StatusKind::Error);
            return;
        };
        let title = book.display_title();
        let document_path = book.document_path.clone();
        match document_path.as_deref() {
            None => {
                self.set_status(
                    format!("{title} has no document attached."),
                    StatusKind::Error,
                );
            }
            Some(path) if !Path::new(path).exists() => {
                self.set_status(
                    format!("Document for {title} is missing on disk."),
                    StatusKind::Error,
                );
            }
            Some(path) => match open_document(path) {
                Ok(()) => self.set_status(format!("Opened {title}."), StatusKind::Info),
                Err(err) => {
                    self.set_status(format!("Failed to open document: {err}"), StatusKind::Error)
                }
            },
        }
    }

    // ---- drawing ----------------------------------------------------------

    pub fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(FOOTER_HEIGHT)])
            .split(frame.area());

        match &self.screen {
            Screen::Catalog => self.draw_catalog(frame, chunks[0]),
            Screen::Ledger(_) => self.draw_ledger(frame, chunks[0]),
            Screen::Stats(_) => self.draw_stats(frame, chunks[0]),
        }
        self.draw_footer(frame, chunks[1]);

        match &self.mode {
            Mode::Normal | Mode::Filtering(_) => {}
            Mode::AddingBook(form) => self.draw_book_form(frame, form, "Add Book"),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, form, "Edit Book"),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, confirm),
            Mode::Selling(form) => self.draw_sell_form(frame, form),
            Mode::Exporting(form) => self.draw_export_form(frame, form),
        }
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(area);

        let title = match &self.filter {
            Some(query) => format!(" Catalog (filter: {query}) "),
            None => " Catalog ".to_string(),
        };

        let width = columns[0].width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .filtered
            .iter()
            .map(|book| {
                let stock_style = if book.in_stock() {
                    Style::default()
                } else {
                    Style::default().fg(Color::Red)
                };
                let text = format!(
                    "{}  |  {}  |  {} in stock",
                    book.display_title(),
                    format_money(book.price),
                    book.quantity
                );
                ListItem::new(Line::from(Span::styled(truncate(&text, width), stock_style)))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if !self.filtered.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, columns[0], &mut state);

        self.draw_book_details(frame, columns[1]);
    }

    fn draw_book_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Details ");

        let Some(book) = self.current_book() else {
            let empty = Paragraph::new("No books in the catalog yet. Press + to add one.")
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, area);
            return;
        };

        let document = book
            .document_path
            .as_deref()
            .map(|path| {
                Path::new(path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string())
            })
            .unwrap_or_else(|| "-".to_string());

        let lines = vec![
            Line::from(vec![
                Span::styled("Title: ", Style::default().fg(Color::DarkGray)),
                Span::raw(book.title.clone()),
            ]),
            Line::from(vec![
                Span::styled("Author: ", Style::default().fg(Color::DarkGray)),
                Span::raw(book.author.clone()),
            ]),
            Line::from(vec![
                Span::styled("Price: ", Style::default().fg(Color::DarkGray)),
                Span::raw(format_money(book.price)),
            ]),
            Line::from(vec![
                Span::styled("In stock: ", Style::default().fg(Color::DarkGray)),
                Span::raw(book.quantity.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Added: ", Style::default().fg(Color::DarkGray)),
                Span::raw(book.added_at.clone()),
            ]),
            Line::from(vec![
                Span::styled("Document: ", Style::default().fg(Color::DarkGray)),
                Span::raw(document),
            ]),
            Line::from(""),
            Line::from(book.description.clone()),
        ];

        let details = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(details, area);
    }

    fn draw_ledger(&self, frame: &mut Frame, area: Rect) {
        let Screen::Ledger(ledger) = &self.screen else {
            return;
        };

        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = ledger
            .sales
            .iter()
            .map(|sale| {
                let text = format!(
                    "{}  {}  {} x {} = {}",
                    sale.sold_at,
                    sale.book_title,
                    sale.quantity,
                    format_money(sale.unit_price),
                    format_money(sale.total)
                );
                ListItem::new(truncate(&text, width))
            })
            .collect();

        let title = format!(" Ledger ({} sales) ", ledger.sales.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if !ledger.sales.is_empty() {
            state.select(Some(ledger.selected));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_stats(&self, frame: &mut Frame, area: Rect) {
        let Screen::Stats(stats) = &self.screen else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(area);

        let average = stats
            .stats
            .average_order
            .map(format_money)
            .unwrap_or_else(|| "-".to_string());
        let overview = Paragraph::new(vec![
            Line::from(format!("Revenue: {}", format_money(stats.stats.revenue))),
            Line::from(format!("Sales: {}", stats.stats.sale_count)),
            Line::from(format!("Units sold: {}", stats.stats.units_sold)),
            Line::from(format!("Average order: {average}")),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Totals "));
        frame.render_widget(overview, chunks[0]);

        let width = chunks[1].width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = stats
            .summaries
            .iter()
            .map(|summary| {
                let text = format!(
                    "{}  |  {} sales, {} units  |  revenue {}  |  avg {}",
                    summary.title,
                    summary.sale_count,
                    summary.units_sold,
                    format_money(summary.revenue),
                    format_money(summary.average_order)
                );
                ListItem::new(truncate(&text, width))
            })
            .collect();

        let items = if items.is_empty() {
            vec![ListItem::new("No sales recorded yet.")]
        } else {
            items
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" By Book "))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if !stats.summaries.is_empty() {
            state.select(Some(stats.selected));
        }
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let line = if let Mode::Filtering(query) = &self.mode {
            Line::from(vec![
                Span::styled("Filter: ", Style::default().fg(Color::Yellow)),
                Span::raw(query.clone()),
                Span::styled("  (Enter to apply, Esc to clear)", Style::default().fg(Color::DarkGray)),
            ])
        } else if let Some(status) = &self.status {
            Line::from(Span::styled(status.text.clone(), status.kind.style()))
        } else {
            let hints = match self.screen {
                Screen::Catalog => {
                    "+ add | e edit | - delete | s sell | enter open | f filter | l ledger | t stats | x export | q quit"
                }
                Screen::Ledger(_) => "x export | t stats | esc back | q quit",
                Screen::Stats(_) => "x export summary | l ledger | esc back | q quit",
            };
            Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))
        };

        let footer = Paragraph::new(line)
            .alignment(Alignment::Left)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, area);
    }

    fn draw_book_form(&self, frame: &mut Frame, form: &BookForm, title: &str) {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);

        let mut lines = vec![
            form.build_line("Title", BookField::Title),
            form.build_line("Author", BookField::Author),
            form.build_line("Price", BookField::Price),
            form.build_line("Quantity", BookField::Quantity),
            form.build_line("Description", BookField::Description),
            form.build_line("Document", BookField::Document),
            Line::from(""),
            Line::from(Span::styled(
                "Tab next field | Enter save | Esc cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(format!(" {title} ")))
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, area);

        let field_row = form.active.position() as u16;
        let label = match form.active {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Price => "Price",
            BookField::Quantity => "Quantity",
            BookField::Description => "Description",
            BookField::Document => "Document",
        };
        let cursor_x = area.x + 1 + label.len() as u16 + 2 + form.value_len(form.active) as u16;
        let cursor_y = area.y + 1 + field_row;
        if cursor_x < area.right() && cursor_y < area.bottom() {
            frame.set_cursor_position(Position::new(cursor_x, cursor_y));
        }
    }

    fn draw_sell_form(&self, frame: &mut Frame, form: &SellForm) {
        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);

        let mut lines = vec![
            Line::from(form.book_title.clone()),
            Line::from(format!("{} in stock", form.available)),
            Line::from(""),
            Line::from(vec![
                Span::raw("Quantity: "),
                Span::styled(form.quantity.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter confirm | Esc cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Sell Book "))
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, area);
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, confirm: &ConfirmBookDelete) {
        let area = centered_rect(55, 30, frame.area());
        frame.render_widget(Clear, area);

        let mut lines = vec![
            Line::from(format!("Delete {}?", confirm.title)),
            Line::from("Its sales history will be removed as well."),
        ];
        if confirm.has_document {
            lines.push(Line::from("The stored document file will be deleted."));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "y / Enter delete | n / Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Confirm Delete "))
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
    }

    fn draw_export_form(&self, frame: &mut Frame, form: &ExportForm) {
        let area = centered_rect(60, 30, frame.area());
        frame.render_widget(Clear, area);

        let mut lines = vec![
            Line::from(vec![
                Span::raw("Path: "),
                Span::styled(form.path.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter write CSV | Esc cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", form.kind.title())),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_book, store};
    use crate::error::LedgerError;

    fn form_with_document(source: &Path) -> BookForm {
        let mut form = BookForm::default();
        form.title = "Ghost Entry".to_string();
        form.author = "Nobody".to_string();
        form.document = source.to_string_lossy().into_owned();
        form
    }

    #[test]
    fn failed_book_write_cleans_up_imported_document() {
        let (tmp, store) = store();
        let source = tmp.path().join("attached.pdf");
        std::fs::write(&source, b"doc").unwrap();

        let mut app = App::new(store, Vec::new());
        let form = form_with_document(&source);

        // Updating a book that does not exist fails after the import ran.
        let err = app
            .submit_book_form(&form, Some(999))
            .expect_err("update of missing book must fail");
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::BookNotFound(999))
        ));

        let leftovers = std::fs::read_dir(app.store.documents().dir())
            .unwrap()
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn successful_submit_keeps_imported_document() {
        let (tmp, store) = store();
        let source = tmp.path().join("attached.pdf");
        std::fs::write(&source, b"doc").unwrap();

        let mut app = App::new(store, Vec::new());
        let form = form_with_document(&source);

        app.submit_book_form(&form, None).unwrap();

        let leftovers = std::fs::read_dir(app.store.documents().dir())
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);

        let books = app.store.fetch_books().unwrap();
        assert_eq!(books.len(), 1);
        assert!(books[0].document_path.is_some());
    }

    #[test]
    fn replaced_document_is_removed_after_successful_update() {
        let (tmp, store) = store();
        let first = tmp.path().join("first.pdf");
        std::fs::write(&first, b"one").unwrap();
        let second = tmp.path().join("second.pdf");
        std::fs::write(&second, b"two").unwrap();

        let stored_first = store.documents().import(&first).unwrap();
        let book = seed_book(&store, "Replace Me", 2.0, 1);
        store
            .update_book(
                book.id,
                crate::models::BookFields {
                    title: book.title.clone(),
                    author: book.author.clone(),
                    price: book.price,
                    quantity: book.quantity,
                    description: String::new(),
                    document_path: Some(stored_first.to_string_lossy().into_owned()),
                },
            )
            .unwrap();

        let mut app = App::new(store, Vec::new());
        let mut form = form_with_document(&second);
        form.existing_document = Some(stored_first.to_string_lossy().into_owned());

        app.submit_book_form(&form, Some(book.id)).unwrap();

        assert!(!stored_first.exists());
        let reloaded = app.store.fetch_book(book.id).unwrap();
        let current = reloaded.document_path.unwrap();
        assert!(current.ends_with("second.pdf"));
    }
}
