//! Minimal PDF 1.4 writer: A4 pages, the two standard Helvetica faces,
//! text, strokes and rectangles. Enough for fixed-layout printable forms.

pub mod leave_form;

use std::fmt::Write as _;

pub const A4_WIDTH: f32 = 595.0;
pub const A4_HEIGHT: f32 = 842.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// One page's content stream.
#[derive(Debug, Default)]
pub struct Page {
    ops: Vec<u8>,
}

impl Page {
    fn op(&mut self, s: &str) {
        self.ops.extend_from_slice(s.as_bytes());
        self.ops.push(b'\n');
    }

    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) {
        self.op(&format!("BT /{} {:.1} Tf {:.2} {:.2} Td", font.resource(), size, x, y));
        self.ops.push(b'(');
        self.ops.extend(encode_text(text));
        self.ops.extend_from_slice(b") Tj ET\n");
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        self.op(&format!(
            "{:.2} w {:.2} {:.2} m {:.2} {:.2} l S",
            width, x1, y1, x2, y2
        ));
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32) {
        self.op(&format!("{:.2} w {:.2} {:.2} {:.2} {:.2} re S", width, x, y, w, h));
    }
}

/// WinAnsi bytes for a PDF literal string: Latin-1 letters map to their own
/// code point, the string delimiters are escaped, anything else becomes `?`.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            ' '..='~' => out.push(c as u8),
            '\u{a0}'..='\u{ff}' => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct PdfDocument {
    title: String,
    pages: Vec<Page>,
}

impl PdfDocument {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            pages: Vec::new(),
        }
    }

    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Serializes the document. Object layout:
    /// 1 catalog, 2 page tree, 3/4 fonts, 5 info, then a page + content pair
    /// per page.
    pub fn render(&self) -> Vec<u8> {
        let first_page = 6;
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| first_page + i * 2).collect();

        let mut objects: Vec<Vec<u8>> = Vec::new();

        objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

        let mut kids = String::new();
        for id in &page_ids {
            let _ = write!(kids, "{} 0 R ", id);
        }
        objects.push(
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.trim_end(),
                page_ids.len()
            )
            .into_bytes(),
        );

        objects.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );
        objects.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );

        let mut info = b"<< /Producer (cesfam-intranet) /Title (".to_vec();
        info.extend(encode_text(&self.title));
        info.extend_from_slice(b") >>");
        objects.push(info);

        for (page, id) in self.pages.iter().zip(&page_ids) {
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                    A4_WIDTH,
                    A4_HEIGHT,
                    id + 1
                )
                .into_bytes(),
            );

            let mut stream = format!("<< /Length {} >>\nstream\n", page.ops.len()).into_bytes();
            stream.extend_from_slice(&page.ops);
            stream.extend_from_slice(b"\nendstream");
            objects.push(stream);
        }

        let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());

        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend(format!("{} 0 obj\n", i + 1).into_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in &offsets {
            let _ = write!(xref, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        );
        out.extend(xref.into_bytes());

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn text_is_escaped_and_latin1_encoded() {
        assert_eq!(encode_text("a(b)\\"), b"a\\(b\\)\\\\".to_vec());
        assert_eq!(encode_text("Día"), vec![b'D', 0xED, b'a']);
        assert_eq!(encode_text("→"), b"?".to_vec());
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut page = Page::default();
        page.text(50.0, 800.0, 12.0, Font::Bold, "Hola");
        page.rect(50.0, 700.0, 100.0, 20.0, 1.0);

        let mut doc = PdfDocument::new("prueba");
        doc.add_page(page);
        let bytes = doc.render();

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        let xref_at = find(&bytes, b"\nxref\n").unwrap() + 1;
        let tail = String::from_utf8_lossy(&bytes[xref_at..]).to_string();
        let startxref: usize = tail
            .lines()
            .skip_while(|l| *l != "startxref")
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(startxref, xref_at);

        let entries: Vec<&str> = tail.lines().skip(3).take_while(|l| l.ends_with(" n ")).collect();
        assert_eq!(entries.len(), 7);
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let header = format!("{} 0 obj", i + 1);
            assert!(bytes[offset..].starts_with(header.as_bytes()), "object {}", i + 1);
        }
    }

    #[test]
    fn stream_length_matches_content() {
        let mut page = Page::default();
        page.line(0.0, 0.0, 10.0, 10.0, 0.5);
        let expected = page.ops.len();

        let mut doc = PdfDocument::new("x");
        doc.add_page(page);
        let bytes = doc.render();

        let marker = format!("<< /Length {} >>\nstream\n", expected);
        assert!(find(&bytes, marker.as_bytes()).is_some());
    }
}
