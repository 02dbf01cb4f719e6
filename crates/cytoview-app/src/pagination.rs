// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const DEFAULT_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// One-based page number after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub items: &'a [T],
}

impl<T> Page<'_, T> {
    /// Index of the first item of this page within the full sequence.
    pub fn offset(&self, page_size: usize) -> usize {
        (self.page - 1) * page_size.max(1)
    }
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let size = page_size.max(1);
    let total_pages = total_pages(items.len(), size);
    let page = clamp_page(page, total_pages);
    let start = ((page - 1) * size).min(items.len());
    let end = (start + size).min(items.len());
    Page {
        page,
        total_pages,
        items: &items[start..end],
    }
}

/// Resolves typed page-number text using its leading integer. Input without
/// digits, zero and negatives land on the first page; anything past the end
/// lands on the last.
pub fn parse_page_input(raw: &str, total_pages: usize) -> usize {
    let last = total_pages.max(1);
    let trimmed = raw.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = rest
        .split(|ch: char| !ch.is_ascii_digit())
        .next()
        .unwrap_or_default();
    if negative || digits.is_empty() {
        return 1;
    }
    match digits.parse::<usize>() {
        Ok(0) => 1,
        Ok(page) => page.min(last),
        Err(_) => last,
    }
}

/// Page cursor for one paginated list. Each list owns its own cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: usize,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl PageCursor {
    pub fn next(&mut self, len: usize, page_size: usize) -> usize {
        self.page = clamp_page(self.page.saturating_add(1), total_pages(len, page_size));
        self.page
    }

    pub fn prev(&mut self, len: usize, page_size: usize) -> usize {
        self.page = clamp_page(self.page.saturating_sub(1), total_pages(len, page_size));
        self.page
    }

    pub fn jump(&mut self, raw: &str, len: usize, page_size: usize) -> usize {
        self.page = parse_page_input(raw, total_pages(len, page_size));
        self.page
    }

    pub fn clamp(&mut self, len: usize, page_size: usize) -> usize {
        self.page = clamp_page(self.page, total_pages(len, page_size));
        self.page
    }
}
