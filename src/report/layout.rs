//! Report page layout
//!
//! Places the report content on US-Letter pages. Produces positioned
//! [`Element`]s only; turning them into PDF objects happens in `pdf`.
//! Coordinates are PDF points with the origin at the bottom-left corner.

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;

pub const TITLE_FONT_SIZE: f32 = 24.0;
pub const DATE_FONT_SIZE: f32 = 24.0;
pub const BODY_FONT_SIZE: f32 = 14.0;

/// Bounding box for the embedded image
pub const IMAGE_BOX_WIDTH: f32 = 500.0;
pub const IMAGE_BOX_HEIGHT: f32 = 300.0;

const LINE_HEIGHT: f32 = 1.2;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// What goes into a report
#[derive(Debug, Clone)]
pub struct ReportContent {
    pub title: String,
    pub date_line: String,
    pub body: String,
    /// Pixel dimensions of the embedded image, if any
    pub image_size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// A positioned item on a page
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `y` is the baseline
    Text { x: f32, y: f32, size: f32, text: String },
    /// `x`/`y` is the lower-left corner
    Image { x: f32, y: f32, width: f32, height: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub pages: Vec<Vec<Element>>,
}

impl Layout {
    pub fn has_image(&self) -> bool {
        self.pages
            .iter()
            .flatten()
            .any(|e| matches!(e, Element::Image { .. }))
    }
}

/// Lay out title, date, body and optional image
pub fn layout(content: &ReportContent) -> Layout {
    let mut cursor = Cursor::new();

    cursor.paragraph(&content.title, TITLE_FONT_SIZE, Align::Center);
    cursor.move_down(TITLE_FONT_SIZE);
    cursor.paragraph(&content.date_line, DATE_FONT_SIZE, Align::Left);
    cursor.move_down(DATE_FONT_SIZE);
    cursor.paragraph(&content.body, BODY_FONT_SIZE, Align::Left);

    if let Some((width, height)) = content.image_size {
        cursor.move_down(BODY_FONT_SIZE);
        cursor.image(width, height);
    }

    Layout {
        pages: cursor.pages,
    }
}

/// Scale `width`x`height` to fit inside the box, keeping the aspect ratio
pub fn fit_within(width: u32, height: u32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let (w, h) = (width as f32, height as f32);
    let scale = (max_width / w).min(max_height / h);
    (w * scale, h * scale)
}

struct Cursor {
    pages: Vec<Vec<Element>>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn current(&mut self) -> &mut Vec<Element> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` still fits above the bottom margin
    fn reserve(&mut self, height: f32) {
        let at_top = self.y >= PAGE_HEIGHT - MARGIN;
        if self.y - height < MARGIN && !at_top {
            self.new_page();
        }
    }

    fn move_down(&mut self, size: f32) {
        self.y -= size * LINE_HEIGHT;
    }

    fn paragraph(&mut self, text: &str, size: f32, align: Align) {
        for line in wrap_text(text, size, CONTENT_WIDTH) {
            self.line(line, size, align);
        }
    }

    fn line(&mut self, text: String, size: f32, align: Align) {
        let height = size * LINE_HEIGHT;
        self.reserve(height);

        let x = match align {
            Align::Left => MARGIN,
            Align::Center => ((PAGE_WIDTH - text_width(&text, size)) / 2.0).max(MARGIN),
        };
        let y = self.y - size;
        self.y -= height;

        if !text.is_empty() {
            self.current().push(Element::Text { x, y, size, text });
        }
    }

    fn image(&mut self, width: u32, height: u32) {
        let (w, h) = fit_within(width, height, IMAGE_BOX_WIDTH, IMAGE_BOX_HEIGHT);
        self.reserve(IMAGE_BOX_HEIGHT);

        let box_top = self.y;
        let x = (PAGE_WIDTH - w) / 2.0;
        let y = box_top - (IMAGE_BOX_HEIGHT + h) / 2.0;
        self.y -= IMAGE_BOX_HEIGHT;

        self.current().push(Element::Image {
            x,
            y,
            width: w,
            height: h,
        });
    }
}

/// Greedy word wrap. Newlines start new lines; blank lines are kept as
/// empty strings. Words wider than a line are broken between characters.
pub fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate, size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, size) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    let mut next = current.clone();
                    next.push(ch);
                    if text_width(&next, size) > max_width && !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    } else {
                        current = next;
                    }
                }
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Width of `text` set in Helvetica at `size` points
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(glyph_width).sum();
    units as f32 * size / 1000.0
}

/// Helvetica advance widths (AFM units) for printable ASCII
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' - '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0' - '?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@' - 'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P' - '_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`' - 'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p' - '~'
];

fn glyph_width(c: char) -> u32 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        HELVETICA_WIDTHS[(code - 32) as usize] as u32
    } else {
        // Wide enough for any Latin-1 glyph in this font
        1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(body: &str, image_size: Option<(u32, u32)>) -> ReportContent {
        ReportContent {
            title: "Plant Analysis Report".to_string(),
            date_line: "Date: 3/14/2025".to_string(),
            body: body.to_string(),
            image_size,
        }
    }

    fn texts(layout: &Layout) -> Vec<String> {
        layout
            .pages
            .iter()
            .flatten()
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("", 12.0), 0.0);
        // 'W' is 944 units
        assert!((text_width("W", 10.0) - 9.44).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let lines = wrap_text(&text, BODY_FONT_SIZE, CONTENT_WIDTH);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, BODY_FONT_SIZE) <= CONTENT_WIDTH);
        }
    }

    #[test]
    fn test_wrap_keeps_paragraphs() {
        let lines = wrap_text("Species: Fern\n\nHealth: Good", BODY_FONT_SIZE, CONTENT_WIDTH);
        assert_eq!(lines, vec!["Species: Fern", "", "Health: Good"]);
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let word = "x".repeat(500);
        let lines = wrap_text(&word, BODY_FONT_SIZE, CONTENT_WIDTH);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_title_is_centered() {
        let layout = layout(&content("Sample text", None));
        match &layout.pages[0][0] {
            Element::Text { x, size, text, .. } => {
                assert_eq!(text, "Plant Analysis Report");
                assert_eq!(*size, TITLE_FONT_SIZE);
                let width = text_width(text, *size);
                assert!(((x + width / 2.0) - PAGE_WIDTH / 2.0).abs() < 0.01);
            }
            other => panic!("unexpected first element: {:?}", other),
        }
    }

    #[test]
    fn test_single_page_without_image() {
        let layout = layout(&content("Sample text", None));
        assert_eq!(layout.pages.len(), 1);
        assert!(!layout.has_image());
        assert_eq!(
            texts(&layout),
            vec!["Plant Analysis Report", "Date: 3/14/2025", "Sample text"]
        );
    }

    #[test]
    fn test_empty_body_keeps_heading() {
        let layout = layout(&content("", None));
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(
            texts(&layout),
            vec!["Plant Analysis Report", "Date: 3/14/2025"]
        );
    }

    #[test]
    fn test_long_body_paginates_without_loss() {
        let body = (0..200)
            .map(|i| format!("Line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let layout = layout(&content(&body, None));

        assert!(layout.pages.len() > 1);
        let all = texts(&layout);
        assert_eq!(all.len(), 202);
        assert_eq!(all.last().unwrap(), "Line 199");

        for element in layout.pages.iter().flatten() {
            if let Element::Text { y, .. } = element {
                assert!(*y >= MARGIN);
                assert!(*y <= PAGE_HEIGHT - MARGIN);
            }
        }
    }

    #[test]
    fn test_image_fits_box_and_is_centered() {
        let layout = layout(&content("Sample text", Some((1000, 1000))));
        let image = layout
            .pages
            .iter()
            .flatten()
            .find_map(|e| match e {
                Element::Image { x, width, height, .. } => Some((*x, *width, *height)),
                _ => None,
            })
            .unwrap();

        let (x, width, height) = image;
        assert_eq!(height, IMAGE_BOX_HEIGHT);
        assert_eq!(width, IMAGE_BOX_HEIGHT);
        assert!(((x + width / 2.0) - PAGE_WIDTH / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_image_moves_to_new_page_when_short_on_room() {
        let body = (0..20).map(|_| "filler").collect::<Vec<_>>().join("\n");
        let layout = layout(&content(&body, Some((800, 600))));

        assert_eq!(layout.pages.len(), 2);
        let last = layout.pages.last().unwrap();
        assert!(matches!(last[0], Element::Image { .. }));
        if let Element::Image { y, height, .. } = last[0] {
            assert!(y >= MARGIN);
            assert!(y + height <= PAGE_HEIGHT - MARGIN);
        }
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(1000, 500, 500.0, 300.0), (500.0, 250.0));
        assert_eq!(fit_within(300, 600, 500.0, 300.0), (150.0, 300.0));
        assert_eq!(fit_within(50, 30, 500.0, 300.0), (500.0, 300.0));
        assert_eq!(fit_within(0, 30, 500.0, 300.0), (0.0, 0.0));
    }
}
