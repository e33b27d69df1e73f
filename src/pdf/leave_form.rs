use super::{A4_HEIGHT, A4_WIDTH, Font, Page, PdfDocument};

const MARGIN: f32 = 56.0;
const FIELD_GAP: f32 = 34.0;

/// Labelled blanks, top to bottom.
const FIELDS: &[&str] = &[
    "Nombre del funcionario",
    "RUT",
    "Cargo / Unidad",
    "Fecha de inicio",
    "Fecha de término",
    "Número de días solicitados",
];

const SIGNATURES: &[&str] = &["Firma funcionario", "V°B° Dirección", "V°B° Subdirección"];

fn labelled_blank(page: &mut Page, y: f32, label: &str) {
    page.text(MARGIN, y, 10.0, Font::Regular, label);
    page.line(MARGIN + 170.0, y - 2.0, A4_WIDTH - MARGIN, y - 2.0, 0.6);
}

fn checkbox(page: &mut Page, x: f32, y: f32, label: &str) {
    page.rect(x, y - 2.0, 10.0, 10.0, 0.8);
    page.text(x + 16.0, y, 10.0, Font::Regular, label);
}

/// The printable "Solicitud de Permiso" form. Static layout: every field is
/// left blank for handwriting.
pub fn render_leave_request_form() -> Vec<u8> {
    let mut page = Page::default();
    let mut y = A4_HEIGHT - MARGIN;

    page.text(MARGIN, y, 9.0, Font::Regular, "Centro de Salud Familiar (CESFAM)");
    page.text(A4_WIDTH - MARGIN - 120.0, y, 9.0, Font::Regular, "Folio N° ____________");
    y -= 40.0;

    page.text(MARGIN + 120.0, y, 16.0, Font::Bold, "SOLICITUD DE PERMISO");
    y -= 14.0;
    page.line(MARGIN, y, A4_WIDTH - MARGIN, y, 1.2);
    y -= 36.0;

    for label in &FIELDS[..3] {
        labelled_blank(&mut page, y, label);
        y -= FIELD_GAP;
    }

    page.text(MARGIN, y, 10.0, Font::Bold, "Tipo de permiso");
    checkbox(&mut page, MARGIN + 170.0, y, "Día administrativo");
    checkbox(&mut page, MARGIN + 320.0, y, "Compensatorio");
    y -= FIELD_GAP;

    for label in &FIELDS[3..] {
        labelled_blank(&mut page, y, label);
        y -= FIELD_GAP;
    }

    page.text(MARGIN, y, 10.0, Font::Bold, "Observaciones");
    y -= 8.0;
    page.rect(MARGIN, y - 90.0, A4_WIDTH - 2.0 * MARGIN, 90.0, 0.6);
    y -= 160.0;

    let slot = (A4_WIDTH - 2.0 * MARGIN) / SIGNATURES.len() as f32;
    for (i, label) in SIGNATURES.iter().enumerate() {
        let x = MARGIN + slot * i as f32;
        page.line(x + 10.0, y, x + slot - 10.0, y, 0.6);
        page.text(x + 22.0, y - 14.0, 9.0, Font::Regular, label);
    }

    page.text(
        MARGIN,
        MARGIN,
        8.0,
        Font::Regular,
        "Entregar en Secretaría con al menos 48 horas de anticipación.",
    );

    let mut doc = PdfDocument::new("Solicitud de Permiso");
    doc.add_page(page);
    doc.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_is_a_single_page_pdf_with_all_labels() {
        let bytes = render_leave_request_form();
        let text = String::from_utf8_lossy(&bytes);

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("SOLICITUD DE PERMISO"));
        assert!(text.contains("Compensatorio"));
        assert!(text.contains("RUT"));
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(render_leave_request_form(), render_leave_request_form());
    }
}
