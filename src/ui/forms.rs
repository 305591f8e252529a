use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, BookFields};

/// Form state for book creation/editing. The document field holds a path the
/// user wants imported; it is only copied into the managed directory once the
/// rest of the form validates.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) price: String,
    pub(crate) quantity: String,
    pub(crate) description: String,
    pub(crate) document: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
    /// Path already stored in the managed directory when editing a book that
    /// has a document attached. Kept when the document field is untouched.
    pub(crate) existing_document: Option<String>,
}

/// Enumerates the fields within the book form to drive focus management.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Price,
    Quantity,
    Description,
    Document,
}

impl BookField {
    const ORDER: [BookField; 6] = [
        BookField::Title,
        BookField::Author,
        BookField::Price,
        BookField::Quantity,
        BookField::Description,
        BookField::Document,
    ];

    pub(crate) fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Everything a validated book form yields: the typed field values plus an
/// optional new document the caller still has to import.
pub(crate) struct ParsedBookForm {
    pub(crate) fields: BookFields,
    pub(crate) new_document: Option<String>,
}

impl BookForm {
    /// Populate the form from an existing book when entering edit mode.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price.to_string(),
            quantity: book.quantity.to_string(),
            description: book.description.clone(),
            document: String::new(),
            active: BookField::Title,
            error: None,
            existing_document: book.document_path.clone(),
        }
    }

    /// Cycle focus forward across the fields.
    pub(crate) fn next_field(&mut self) {
        let next = (self.active.position() + 1) % BookField::ORDER.len();
        self.active = BookField::ORDER[next];
    }

    /// Cycle focus backward across the fields.
    pub(crate) fn previous_field(&mut self) {
        let len = BookField::ORDER.len();
        let previous = (self.active.position() + len - 1) % len;
        self.active = BookField::ORDER[previous];
    }

    /// Append a character to the active field, validating allowed input so
    /// the price and quantity fields can only ever hold numeric text.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::Author => self.author.push(ch),
            BookField::Price => {
                if ch.is_ascii_digit() || (ch == '.' && !self.price.contains('.')) {
                    self.price.push(ch);
                } else {
                    return false;
                }
            }
            BookField::Quantity => {
                if ch.is_ascii_digit() {
                    self.quantity.push(ch);
                } else {
                    return false;
                }
            }
            BookField::Description => self.description.push(ch),
            BookField::Document => self.document.push(ch),
        }
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Price => {
                self.price.pop();
            }
            BookField::Quantity => {
                self.quantity.pop();
            }
            BookField::Description => {
                self.description.pop();
            }
            BookField::Document => {
                self.document.pop();
            }
        }
    }

    /// Validate and normalize form inputs before they are written to the
    /// database. The document path stays a plain string here; the caller
    /// imports it and persists the stored location.
    pub(crate) fn parse_inputs(&self) -> Result<ParsedBookForm> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(anyhow!("Author is required."));
        }

        let price_raw = self.price.trim();
        let price = if price_raw.is_empty() {
            0.0
        } else {
            price_raw
                .parse::<f64>()
                .context("Price must be a number.")?
        };
        if price < 0.0 {
            return Err(anyhow!("Price cannot be negative."));
        }

        let quantity_raw = self.quantity.trim();
        let quantity = if quantity_raw.is_empty() {
            0
        } else {
            quantity_raw
                .parse::<i64>()
                .context("Quantity must be a whole number.")?
        };
        if quantity < 0 {
            return Err(anyhow!("Quantity cannot be negative."));
        }

        let document = self.document.trim();
        let new_document = if document.is_empty() {
            None
        } else {
            Some(document.to_string())
        };

        Ok(ParsedBookForm {
            fields: BookFields {
                title: title.to_string(),
                author: author.to_string(),
                price,
                quantity,
                description: self.description.trim().to_string(),
                document_path: self.existing_document.clone(),
            },
            new_document,
        })
    }

    /// Render a styled line for the modal form.
    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let (value, is_active) = match field {
            BookField::Title => (&self.title, self.active == BookField::Title),
            BookField::Author => (&self.author, self.active == BookField::Author),
            BookField::Price => (&self.price, self.active == BookField::Price),
            BookField::Quantity => (&self.quantity, self.active == BookField::Quantity),
            BookField::Description => (&self.description, self.active == BookField::Description),
            BookField::Document => (&self.document, self.active == BookField::Document),
        };

        let placeholder = match field {
            BookField::Title | BookField::Author => "<required>",
            BookField::Document => {
                if self.existing_document.is_some() {
                    "<keep current document>"
                } else {
                    "<path to file, optional>"
                }
            }
            _ => "<optional>",
        };

        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Character length of the requested field, used to place the cursor.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Title => self.title.chars().count(),
            BookField::Author => self.author.chars().count(),
            BookField::Price => self.price.chars().count(),
            BookField::Quantity => self.quantity.chars().count(),
            BookField::Description => self.description.chars().count(),
            BookField::Document => self.document.chars().count(),
        }
    }
}

/// State for the sell prompt: which book, how many copies.
#[derive(Clone)]
pub(crate) struct SellForm {
    pub(crate) book_id: i64,
    pub(crate) book_title: String,
    pub(crate) available: i64,
    pub(crate) quantity: String,
    pub(crate) error: Option<String>,
}

impl SellForm {
    /// Seed the prompt for the selected book, defaulting to a single copy.
    pub(crate) fn for_book(book: &Book) -> Self {
        Self {
            book_id: book.id,
            book_title: book.display_title(),
            available: book.quantity,
            quantity: "1".to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_ascii_digit() {
            self.quantity.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.quantity.pop();
    }

    /// Parse the requested quantity. The insufficient-stock check itself
    /// happens in the ledger so the database row, not UI state, has the
    /// final word.
    pub(crate) fn parse_quantity(&self) -> Result<i64> {
        let raw = self.quantity.trim();
        if raw.is_empty() {
            return Err(anyhow!("Quantity is required."));
        }
        let quantity = raw.parse::<i64>().context("Quantity must be a whole number.")?;
        if quantity <= 0 {
            return Err(anyhow!("Quantity must be at least 1."));
        }
        Ok(quantity)
    }
}

/// Which report an export prompt is about to write.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExportKind {
    /// One row per sale.
    Ledger,
    /// One row per book aggregate.
    Summary,
}

impl ExportKind {
    pub(crate) fn title(self) -> &'static str {
        match self {
            ExportKind::Ledger => "Export Ledger",
            ExportKind::Summary => "Export Summary",
        }
    }

    fn default_file_name(self) -> &'static str {
        match self {
            ExportKind::Ledger => "sales.csv",
            ExportKind::Summary => "sales-summary.csv",
        }
    }
}

/// State for the export path prompt.
#[derive(Clone)]
pub(crate) struct ExportForm {
    pub(crate) kind: ExportKind,
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl ExportForm {
    pub(crate) fn new(kind: ExportKind) -> Self {
        Self {
            kind,
            path: kind.default_file_name().to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.path.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }

    pub(crate) fn parse_path(&self) -> Result<String> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(anyhow!("Target path is required."));
        }
        Ok(path.to_string())
    }
}

/// State for confirming permanent book deletion. Deleting also drops the
/// book's sales and its stored document, so the dialog spells that out.
#[derive(Clone)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) has_document: bool,
}

impl ConfirmBookDelete {
    pub(crate) fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.display_title(),
            has_document: book.document_path.is_some(),
        }
    }
}
