//! Format-specific text extraction for uploaded files

use bytes::Bytes;
use std::io::Read;

use crate::error::{Error, Result};

/// An uploaded file as received by the gateway
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original filename
    pub filename: String,
    /// Declared content type, if the client sent one
    pub content_type: Option<String>,
    /// Raw bytes
    pub data: Bytes,
}

impl FileUpload {
    /// Create a new upload
    pub fn new(filename: impl Into<String>, content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            data: data.into(),
        }
    }
}

/// File formats the built-in parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Pptx,
    Csv,
    /// Plain text, markdown and other `text/*` types
    Text,
}

impl FileKind {
    /// Map a MIME type to a file kind
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match mime.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(Self::Pptx)
            }
            "text/csv" => Some(Self::Csv),
            m if m.starts_with("text/") => Some(Self::Text),
            _ => None,
        }
    }

    /// Detect from the declared content type, falling back to the filename
    pub fn detect(content_type: Option<&str>, filename: &str) -> Option<Self> {
        content_type.and_then(Self::from_mime).or_else(|| {
            mime_guess::from_path(filename)
                .first()
                .and_then(|mime| Self::from_mime(mime.essence_str()))
        })
    }
}

/// Turns file bytes into plain text
pub trait TextExtractor: Send + Sync {
    /// Extract the text content of an upload
    fn extract(&self, upload: &FileUpload) -> Result<String>;
}

/// Multi-format file parser
#[derive(Debug, Clone, Copy, Default)]
pub struct FileParser;

impl TextExtractor for FileParser {
    fn extract(&self, upload: &FileUpload) -> Result<String> {
        let kind = FileKind::detect(upload.content_type.as_deref(), &upload.filename)
            .ok_or_else(|| {
                Error::UnsupportedFileType(format!(
                    "{} ({})",
                    upload.filename,
                    upload.content_type.as_deref().unwrap_or("unknown content type")
                ))
            })?;

        tracing::debug!(filename = %upload.filename, ?kind, bytes = upload.data.len(), "extracting text");

        let filename = upload.filename.as_str();
        let data = upload.data.as_ref();
        match kind {
            FileKind::Pdf => Self::parse_pdf(filename, data),
            FileKind::Docx => Self::parse_docx(filename, data),
            FileKind::Pptx => Self::parse_pptx(filename, data),
            FileKind::Csv => Self::parse_csv(filename, data),
            FileKind::Text => Ok(String::from_utf8_lossy(data).into_owned()),
        }
    }
}

impl FileParser {
    /// Parse PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        let content = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        Ok(content
            .replace('\0', "")
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Parse DOCX document
    fn parse_docx(filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// Parse PowerPoint presentation (.pptx)
    fn parse_pptx(filename: &str, data: &[u8]) -> Result<String> {
        let cursor = std::io::Cursor::new(data);
        let mut archive =
            zip::ZipArchive::new(cursor).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let slide_number = |name: &str| {
            name.trim_start_matches("ppt/slides/slide")
                .trim_end_matches(".xml")
                .parse::<u32>()
                .unwrap_or(0)
        };

        let mut slide_names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .map(str::to_string)
            .collect();
        slide_names.sort_by_key(|name| slide_number(name));

        let mut content = String::new();
        for slide_name in slide_names {
            let mut file = archive
                .by_name(&slide_name)
                .map_err(|e| Error::file_parse(filename, e.to_string()))?;
            let mut xml = String::new();
            file.read_to_string(&mut xml)?;

            let slide_text = Self::extract_text_from_pptx_xml(&xml);
            if !slide_text.is_empty() {
                content.push_str(&slide_text);
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// Collect `<a:t>` runs, one line per `<a:p>` paragraph
    fn extract_text_from_pptx_xml(xml: &str) -> String {
        use quick_xml::events::Event;
        use quick_xml::Reader;

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut lines = Vec::new();
        let mut line = Vec::new();
        let mut in_text_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                    in_text_element = true;
                }
                Ok(Event::Text(e)) if in_text_element => {
                    if let Ok(text) = e.unescape() {
                        let text = text.trim();
                        if !text.is_empty() {
                            line.push(text.to_string());
                        }
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"t" => in_text_element = false,
                    b"p" if !line.is_empty() => lines.push(std::mem::take(&mut line).join(" ")),
                    _ => {}
                },
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
        }
        if !line.is_empty() {
            lines.push(line.join(" "));
        }

        lines.join("\n")
    }

    /// Parse CSV file, one line per row with cells joined by spaces
    fn parse_csv(filename: &str, data: &[u8]) -> Result<String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut content = String::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::file_parse(filename, e.to_string()))?;
            content.push_str(&record.iter().collect::<Vec<_>>().join(" "));
            content.push('\n');
        }

        Ok(content)
    }
}
