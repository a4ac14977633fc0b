use crate::models::{ChapterBoundary, ChapterIndexEntry, DocumentPage};
use crate::services::matcher::is_match;

pub fn page_marker(page_number: i64) -> String {
    format!("--- Page {} ---", page_number)
}

pub fn last_page_number(pages: &[DocumentPage]) -> Option<i64> {
    pages.iter().map(|p| p.page_number).max()
}

/// Page span between this chapter's start and the next one's.
///
/// No validation: a malformed outline yields an inverted range.
pub fn resolve_range(
    current: &ChapterIndexEntry,
    next: Option<&ChapterIndexEntry>,
    last_page: i64,
) -> ChapterBoundary {
    let end_page = match next {
        Some(next) => next.start_page - 1,
        None => last_page,
    };
    ChapterBoundary {
        start_page: current.start_page,
        end_page,
    }
}

/// Text of every page inside `range`, ascending, each preceded by a page marker.
/// Used for sizing and prompting only.
pub fn page_scoped_text(pages: &[DocumentPage], range: ChapterBoundary) -> String {
    let mut selected: Vec<&DocumentPage> = pages
        .iter()
        .filter(|p| p.page_number >= range.start_page && p.page_number <= range.end_page)
        .collect();
    selected.sort_by_key(|p| p.page_number);

    let mut out: Vec<String> = Vec::new();
    for page in selected {
        out.push(page_marker(page.page_number));
        out.extend(page.lines.iter().cloned());
    }
    out.join("\n")
}

/// Lines from the first occurrence of `title` up to, not including, the
/// first later occurrence of `next_title`.
///
/// Scans the whole document in its original order, so a title that also
/// appears earlier (a table of contents, say) starts the chapter there.
/// Returns an empty string when `title` never matches.
pub fn title_scoped_text(pages: &[DocumentPage], title: &str, next_title: Option<&str>) -> String {
    let mut found = false;
    let mut out: Vec<&str> = Vec::new();

    'scan: for page in pages {
        for line in &page.lines {
            if !found {
                if is_match(line, title) {
                    found = true;
                    out.push(line);
                }
                continue;
            }
            if let Some(next_title) = next_title {
                if is_match(line, next_title) {
                    break 'scan;
                }
            }
            out.push(line);
        }
    }

    out.join("\n")
}
