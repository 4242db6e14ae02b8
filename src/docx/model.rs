//! Mutable views over WordprocessingML elements.

use super::xml::{Element, Node};

pub const PARAGRAPH: &str = "w:p";
pub const RUN: &str = "w:r";
pub const TABLE: &str = "w:tbl";
pub const ROW: &str = "w:tr";
pub const CELL: &str = "w:tc";

const PARAGRAPH_PROPS: &str = "w:pPr";
const RUN_PROPS: &str = "w:rPr";
const CELL_PROPS: &str = "w:tcPr";

/// Inline containers whose runs still belong to the enclosing paragraph.
const RUN_CONTAINERS: [&str; 5] = [
    "w:hyperlink",
    "w:smartTag",
    "w:ins",
    "w:fldSimple",
    "w:customXml",
];

fn is_run_container(element: &Element) -> bool {
    RUN_CONTAINERS.iter().any(|name| element.is(name))
}

fn collect_runs<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for child in element.elements() {
        if child.is(RUN) {
            out.push(child);
        } else if is_run_container(child) {
            collect_runs(child, out);
        }
    }
}

fn collect_runs_mut<'a>(element: &'a mut Element, out: &mut Vec<&'a mut Element>) {
    for child in element.elements_mut() {
        if child.is(RUN) {
            out.push(child);
        } else if is_run_container(child) {
            collect_runs_mut(child, out);
        }
    }
}

fn run_text(run: &Element) -> String {
    let mut text = String::new();
    for child in run.elements() {
        match child.name.as_str() {
            "w:t" => text.push_str(&child.text()),
            "w:tab" => text.push('\t'),
            "w:br" | "w:cr" => text.push('\n'),
            "w:noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    text
}

/// Text content elements for `text`: `w:t` segments with tabs and breaks
/// turned into `w:tab` and `w:br`.
fn text_content(text: &str) -> Vec<Element> {
    let mut content = Vec::new();
    let mut segment = String::new();

    let flush = |segment: &mut String, content: &mut Vec<Element>| {
        if !segment.is_empty() {
            let mut t = Element::new("w:t").with_attribute("xml:space", "preserve");
            t.push_text(std::mem::take(segment));
            content.push(t);
        }
    };

    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(&mut segment, &mut content);
                content.push(Element::new("w:tab"));
            }
            '\n' => {
                flush(&mut segment, &mut content);
                content.push(Element::new("w:br"));
            }
            _ => segment.push(ch),
        }
    }
    flush(&mut segment, &mut content);
    content
}

pub fn new_run(text: &str, props: Option<Element>) -> Element {
    let mut run = Element::new(RUN);
    if let Some(props) = props {
        run.push(props);
    }
    for child in text_content(text) {
        run.push(child);
    }
    run
}

pub fn new_paragraph(text: &str) -> Element {
    let mut paragraph = Element::new(PARAGRAPH);
    if !text.is_empty() {
        paragraph.push(new_run(text, None));
    }
    paragraph
}

pub struct Run<'a> {
    element: &'a mut Element,
}

impl<'a> Run<'a> {
    pub fn text(&self) -> String {
        run_text(self.element)
    }

    /// Replaces the run's content, keeping its formatting properties.
    pub fn set_text(&mut self, text: &str) {
        self.element.children.retain(|node| match node {
            Node::Element(el) => el.is(RUN_PROPS),
            _ => false,
        });
        for child in text_content(text) {
            self.element.push(child);
        }
    }
}

pub struct Paragraph<'a> {
    element: &'a mut Element,
}

impl<'a> Paragraph<'a> {
    pub fn new(element: &'a mut Element) -> Self {
        Self { element }
    }

    pub fn text(&self) -> String {
        let mut runs = Vec::new();
        collect_runs(self.element, &mut runs);
        runs.into_iter().map(run_text).collect()
    }

    pub fn runs(&mut self) -> Vec<Run<'_>> {
        let mut runs = Vec::new();
        collect_runs_mut(self.element, &mut runs);
        runs.into_iter().map(|element| Run { element }).collect()
    }

    /// Clears every run and writes `text` into a single run carrying the
    /// first run's formatting. A run is created when the paragraph had none.
    pub fn set_text(&mut self, text: &str) {
        let props = {
            let mut runs = Vec::new();
            collect_runs(self.element, &mut runs);
            runs.first().and_then(|run| run.child(RUN_PROPS)).cloned()
        };

        let mut insert_at = None;
        let mut kept = Vec::with_capacity(self.element.children.len());
        for node in std::mem::take(&mut self.element.children) {
            let holds_runs =
                matches!(&node, Node::Element(el) if el.is(RUN) || is_run_container(el));
            if holds_runs {
                insert_at.get_or_insert(kept.len());
            } else {
                kept.push(node);
            }
        }

        let position = insert_at.unwrap_or_else(|| {
            // Right after the paragraph properties, or at the start.
            kept.iter()
                .position(|node| matches!(node, Node::Element(el) if el.is(PARAGRAPH_PROPS)))
                .map_or(0, |idx| idx + 1)
        });
        kept.insert(position, Node::Element(new_run(text, props)));
        self.element.children = kept;
    }
}

fn paragraphs_text(element: &Element) -> String {
    element
        .elements()
        .filter(|el| el.is(PARAGRAPH))
        .map(|p| {
            let mut runs = Vec::new();
            collect_runs(p, &mut runs);
            runs.into_iter().map(run_text).collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Cell<'a> {
    element: &'a mut Element,
}

impl<'a> Cell<'a> {
    pub fn text(&self) -> String {
        paragraphs_text(self.element)
    }

    pub fn paragraphs(&mut self) -> Vec<Paragraph<'_>> {
        self.element
            .elements_mut()
            .filter(|el| el.is(PARAGRAPH))
            .map(Paragraph::new)
            .collect()
    }
}

pub struct Row<'a> {
    element: &'a mut Element,
}

impl<'a> Row<'a> {
    pub fn text(&self) -> String {
        self.element
            .elements()
            .filter(|el| el.is(CELL))
            .map(paragraphs_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn cell_texts(&self) -> Vec<String> {
        self.element
            .elements()
            .filter(|el| el.is(CELL))
            .map(paragraphs_text)
            .collect()
    }

    pub fn cells(&mut self) -> Vec<Cell<'_>> {
        self.element
            .elements_mut()
            .filter(|el| el.is(CELL))
            .map(|element| Cell { element })
            .collect()
    }

    /// A new row with one cell per cell of this row, each holding only the
    /// given text. Cell width and horizontal span are carried over so the
    /// row lines up with the table grid; other styling is not.
    pub fn text_copy(&self, texts: &[String]) -> Element {
        let mut row = Element::new(ROW);
        let template_cells = self.element.elements().filter(|el| el.is(CELL));

        for (idx, template_cell) in template_cells.enumerate() {
            let mut cell = Element::new(CELL);

            let layout: Vec<Element> = template_cell
                .child(CELL_PROPS)
                .map(|props| {
                    props
                        .elements()
                        .filter(|el| el.is("w:tcW") || el.is("w:gridSpan"))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if !layout.is_empty() {
                let mut props = Element::new(CELL_PROPS);
                for el in layout {
                    props.push(el);
                }
                cell.push(props);
            }

            let text = texts.get(idx).map(String::as_str).unwrap_or_default();
            // A cell must always contain at least one paragraph.
            cell.push(new_paragraph(text));
            row.push(cell);
        }

        row
    }
}

pub struct Table<'a> {
    element: &'a mut Element,
}

impl<'a> Table<'a> {
    pub fn new(element: &'a mut Element) -> Self {
        Self { element }
    }

    pub fn row_count(&self) -> usize {
        self.element.elements().filter(|el| el.is(ROW)).count()
    }

    pub fn row_texts(&self) -> Vec<String> {
        self.element
            .elements()
            .filter(|el| el.is(ROW))
            .map(|row| {
                row.elements()
                    .filter(|el| el.is(CELL))
                    .map(paragraphs_text)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    pub fn rows(&mut self) -> Vec<Row<'_>> {
        self.element
            .elements_mut()
            .filter(|el| el.is(ROW))
            .map(|element| Row { element })
            .collect()
    }

    pub fn row(&mut self, index: usize) -> Option<Row<'_>> {
        self.element
            .elements_mut()
            .filter(|el| el.is(ROW))
            .nth(index)
            .map(|element| Row { element })
    }

    pub fn append_row(&mut self, row: Element) {
        self.element.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, bold: bool) -> Element {
        let props = bold.then(|| Element::new(RUN_PROPS).with_child(Element::new("w:b")));
        new_run(text, props)
    }

    fn paragraph(runs: Vec<Element>) -> Element {
        let mut p = Element::new(PARAGRAPH).with_child(Element::new(PARAGRAPH_PROPS));
        for r in runs {
            p.push(r);
        }
        p
    }

    #[test]
    fn test_paragraph_text_spans_runs_tabs_and_hyperlinks() {
        let link = Element::new("w:hyperlink").with_child(run("link", false));
        let mut element = paragraph(vec![run("Nombre:\t", true), run("{NOMBRE", false)]);
        element.push(link);

        let p = Paragraph::new(&mut element);
        assert_eq!(p.text(), "Nombre:\t{NOMBRElink");
    }

    #[test]
    fn test_run_set_text_keeps_formatting() {
        let mut element = paragraph(vec![run("{RUT}", true)]);
        let mut p = Paragraph::new(&mut element);
        for mut r in p.runs() {
            r.set_text("1-9\nfin");
        }

        assert_eq!(p.text(), "1-9\nfin");
        let r = element.child(RUN).unwrap();
        assert!(r.child(RUN_PROPS).is_some());
        assert!(r.child("w:br").is_some());
    }

    #[test]
    fn test_paragraph_set_text_collapses_runs() {
        let mut element = paragraph(vec![run("{NOMBRE ", true), run("BENEFICIARIO}", false)]);
        let mut p = Paragraph::new(&mut element);
        p.set_text("Ana");

        assert_eq!(p.text(), "Ana");
        let runs: Vec<&Element> = element.elements().filter(|el| el.is(RUN)).collect();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].child(RUN_PROPS).is_some());
        // Paragraph properties stay first.
        assert!(element.elements().next().unwrap().is(PARAGRAPH_PROPS));
    }

    #[test]
    fn test_paragraph_set_text_creates_run_when_empty() {
        let mut element = paragraph(vec![]);
        Paragraph::new(&mut element).set_text("texto");
        assert_eq!(Paragraph::new(&mut element).text(), "texto");
    }

    #[test]
    fn test_row_text_copy_keeps_width_only() {
        let props = Element::new(CELL_PROPS)
            .with_child(Element::new("w:tcW").with_attribute("w:w", "2000"))
            .with_child(Element::new("w:shd").with_attribute("w:fill", "FF0000"));
        let cell = Element::new(CELL)
            .with_child(props)
            .with_child(new_paragraph("{NOMBRE BENEFICIARIO}"));
        let mut row_el = Element::new(ROW).with_child(cell);

        let row = Row { element: &mut row_el };
        let mut copy = row.text_copy(&row.cell_texts());
        let copied_props = copy.child(CELL).and_then(|c| c.child(CELL_PROPS)).unwrap();
        assert!(copied_props.child("w:tcW").is_some());
        assert!(copied_props.child("w:shd").is_none());

        let copy_row = Row { element: &mut copy };
        assert_eq!(copy_row.text(), "{NOMBRE BENEFICIARIO}");
    }
}
