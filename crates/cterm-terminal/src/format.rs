//! Column layout for name listings (HELP, alias lists).

/// Right-pad `text` with spaces to `width` characters.
pub fn pad_with_spaces(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let mut out = String::with_capacity(width.max(len));
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(len)));
    out
}

/// Lay `items` out in as many columns (up to six) as fit in `width`.
///
/// Short names get six columns; a name too long for two columns puts every
/// item on its own line. Each row ends with a newline.
pub fn columnize(items: &[String], width: usize) -> String {
    let longest = items.iter().map(|i| i.chars().count()).max().unwrap_or(0);
    let cols = (2..=6)
        .rev()
        .find(|&cols| longest * cols < width)
        .unwrap_or(1);

    let mut out = String::new();
    if cols == 1 {
        for item in items {
            out.push_str(item);
            out.push('\n');
        }
        return out;
    }

    let cell = width / cols;
    for row in items.chunks(cols) {
        let last = row.len() - 1;
        for (i, item) in row.iter().enumerate() {
            if i == last {
                out.push_str(item);
            } else {
                out.push_str(&pad_with_spaces(item, cell));
            }
        }
        out.push('\n');
    }
    out
}
