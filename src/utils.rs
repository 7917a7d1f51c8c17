/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Average Helvetica glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH_EM: f32 = 0.5;

/// Formats a number the way it would be typed into a spreadsheet:
/// shortest round-trip form, no trailing `.0` for integral values.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_PT
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

/// Rough width of `text` in millimetres when set in Helvetica at `font_size_pt`.
pub fn estimate_text_width_mm(text: &str, font_size_pt: f32) -> f32 {
    text.chars().count() as f32 * pt_to_mm(font_size_pt) * AVG_GLYPH_WIDTH_EM
}

/// Greedy word wrap. Explicit line breaks in `text` are kept, blank lines
/// are preserved and words longer than a full line are split.
pub fn wrap_text(text: &str, max_width_mm: f32, font_size_pt: f32) -> Vec<String> {
    let glyph_mm = pt_to_mm(font_size_pt) * AVG_GLYPH_WIDTH_EM;
    let max_chars = ((max_width_mm / glyph_mm).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };

            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current);
    }

    lines
}
