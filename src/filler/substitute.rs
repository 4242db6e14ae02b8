use crate::docx::Paragraph;
use log::debug;

/// Applies `replace` to a paragraph, run by run first. When tags are split
/// across runs the per-run pass cannot produce the expected text, so the
/// paragraph is rewritten as a single run instead.
///
/// Returns whether the paragraph changed.
pub fn substitute_paragraph<F>(paragraph: &mut Paragraph<'_>, replace: F) -> bool
where
    F: Fn(&str) -> String,
{
    let text = paragraph.text();
    let expected = replace(&text);
    if expected == text {
        return false;
    }

    for mut run in paragraph.runs() {
        let run_text = run.text();
        let replaced = replace(&run_text);
        if replaced != run_text {
            run.set_text(&replaced);
        }
    }

    if paragraph.text() != expected {
        debug!(
            "Placeholder split across runs in '{}', rewriting paragraph",
            text
        );
        paragraph.set_text(&expected);
    }

    true
}

/// Whole-paragraph reassignment, used by the literal filler.
pub fn rewrite_paragraph<F>(paragraph: &mut Paragraph<'_>, replace: F) -> bool
where
    F: Fn(&str) -> String,
{
    let text = paragraph.text();
    let replaced = replace(&text);
    if replaced == text {
        return false;
    }
    paragraph.set_text(&replaced);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{Document, DocumentAdapter};
    use crate::filler::testing::docx_with_body;

    fn tag_replace(text: &str) -> String {
        text.replace("{RUT BENEFICIARIO}", "11.111.111-1")
    }

    #[test]
    fn test_tag_inside_one_run_keeps_other_runs() {
        let body = concat!(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>RUT: </w:t></w:r>"#,
            r#"<w:r><w:t>{RUT BENEFICIARIO}</w:t></w:r></w:p>"#
        );
        let mut doc = Document::from_bytes(&docx_with_body(body)).unwrap();
        let mut paragraphs = doc.paragraphs();

        assert!(substitute_paragraph(&mut paragraphs[0], tag_replace));
        assert_eq!(paragraphs[0].text(), "RUT: 11.111.111-1");
        assert_eq!(paragraphs[0].runs().len(), 2);
    }

    #[test]
    fn test_split_tag_falls_back_to_paragraph_rewrite() {
        let body = concat!(
            r#"<w:p><w:r><w:t>RUT: {RUT </w:t></w:r>"#,
            r#"<w:r><w:t>BENEFICIARIO}</w:t></w:r></w:p>"#
        );
        let mut doc = Document::from_bytes(&docx_with_body(body)).unwrap();
        let mut paragraphs = doc.paragraphs();

        assert!(substitute_paragraph(&mut paragraphs[0], tag_replace));
        assert_eq!(paragraphs[0].text(), "RUT: 11.111.111-1");
        assert_eq!(paragraphs[0].runs().len(), 1);
    }

    #[test]
    fn test_unchanged_paragraph_is_left_alone() {
        let body = "<w:p><w:r><w:t>Sin marcas</w:t></w:r></w:p>";
        let mut doc = Document::from_bytes(&docx_with_body(body)).unwrap();
        let mut paragraphs = doc.paragraphs();
        assert!(!substitute_paragraph(&mut paragraphs[0], tag_replace));
        assert!(!rewrite_paragraph(&mut paragraphs[0], tag_replace));
    }
}
