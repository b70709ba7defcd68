use regex::Regex;

// Tags the conversion itself emits. Anything else arriving as raw markup is
// entity-escaped, so untrusted input cannot inject structure. Letting these
// (and pre-existing entities) pass unchanged makes `normalize` idempotent on
// its own output.
const TAG_PATTERN: &str = r"(?i)^</?(b|strong|i|em|u|code|pre|br|p|ul|ol|li)\s*/?>";
const ENTITY_PATTERN: &str = r"^&(#[0-9]{1,7}|#x[0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});";
const BLOCK_TAG_PATTERN: &str = r"(?i)^</?(p|ul|ol|li|pre|br)\s*/?>";

/// 把輕量標記文字轉成 Anki 欄位用的 HTML
///
/// Supported input: `**bold**`, `*italic*`, `` `code` ``, `-`/`*` bullet
/// lines, `1.` numbered lines, single line breaks (become `<br>`) and blank
/// lines (separate `<p>` blocks). Pure and deterministic, no I/O.
///
/// A lone wrapping `<p>` around the whole result is stripped; Anki applies
/// its own spacing around field values and a redundant wrapper doubles it.
pub fn normalize(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    let html_blocks: Vec<String> = split_blocks(text)
        .iter()
        .map(|lines| render_block(lines))
        .collect();

    if html_blocks.len() == 1 {
        if let Some(inner) = html_blocks[0]
            .strip_prefix("<p>")
            .and_then(|s| s.strip_suffix("</p>"))
        {
            if !inner.contains("<p>") {
                return inner.to_string();
            }
        }
    }

    html_blocks.join("\n")
}

/// 以空白行切塊
fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn render_block(lines: &[&str]) -> String {
    if is_html_block(lines) {
        // 已經是轉換後的區塊標記，原樣保留（仍經過逃逸檢查）
        let converted: Vec<String> = lines.iter().map(|line| convert_inline(line)).collect();
        return converted.join("\n");
    }

    if let Some(items) = list_items(lines, &Regex::new(r"^[-*]\s+").unwrap()) {
        return render_list("ul", &items);
    }
    if let Some(items) = list_items(lines, &Regex::new(r"^\d+\.\s+").unwrap()) {
        return render_list("ol", &items);
    }

    let converted: Vec<String> = lines.iter().map(|line| convert_inline(line)).collect();
    format!("<p>{}</p>", converted.join("<br>"))
}

fn is_html_block(lines: &[&str]) -> bool {
    let block_tag = Regex::new(BLOCK_TAG_PATTERN).unwrap();
    lines.iter().all(|line| block_tag.is_match(line.trim_start()))
}

fn list_items(lines: &[&str], marker: &Regex) -> Option<Vec<String>> {
    let mut items = Vec::new();
    for line in lines {
        let trimmed = line.trim_start();
        let m = marker.find(trimmed)?;
        items.push(trimmed[m.end()..].to_string());
    }
    Some(items)
}

fn render_list(tag: &str, items: &[String]) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|item| format!("<li>{}</li>", convert_inline(item)))
        .collect();
    format!("<{}>\n{}\n</{}>", tag, rendered.join("\n"), tag)
}

/// 單行的行內轉換：先切出 code span，剩下的做逃逸與強調轉換
fn convert_inline(line: &str) -> String {
    let code = Regex::new(r"`([^`]+)`").unwrap();
    let mut out = String::new();
    let mut last = 0;

    for caps in code.captures_iter(line) {
        let whole = caps.get(0).expect("capture 0 always present");
        out.push_str(&convert_spans(&line[last..whole.start()]));
        out.push_str("<code>");
        out.push_str(&escape_all(&caps[1]));
        out.push_str("</code>");
        last = whole.end();
    }
    out.push_str(&convert_spans(&line[last..]));
    out
}

fn convert_spans(text: &str) -> String {
    let escaped = selective_escape(text);
    let bold = Regex::new(r"\*\*([^*]+)\*\*").unwrap();
    let escaped = bold.replace_all(&escaped, "<b>$1</b>");
    let italic = Regex::new(r"\*([^\s*][^*]*)\*").unwrap();
    let escaped = italic.replace_all(&escaped, "<i>$1</i>");
    escaped.into_owned()
}

/// Escape `&`, `<` and `>` except for the conversion's own tag vocabulary and
/// already-formed character entities.
fn selective_escape(text: &str) -> String {
    let tag = Regex::new(TAG_PATTERN).unwrap();
    let entity = Regex::new(ENTITY_PATTERN).unwrap();

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with('<') {
            if let Some(m) = tag.find(rest) {
                out.push_str(m.as_str());
                i += m.end();
                continue;
            }
            out.push_str("&lt;");
            i += 1;
            continue;
        }
        if rest.starts_with('&') {
            if let Some(m) = entity.find(rest) {
                out.push_str(m.as_str());
                i += m.end();
                continue;
            }
            out.push_str("&amp;");
            i += 1;
            continue;
        }
        if rest.starts_with('>') {
            out.push_str("&gt;");
            i += 1;
            continue;
        }
        let ch = rest.chars().next().expect("non-empty remainder");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn escape_all(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
