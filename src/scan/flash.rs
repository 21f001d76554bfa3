//! scan/flash — склейка логического потока из физического дампа flash.
//!
//! Физический дамп: страницы по `page_size` байт, каждая начинается с заголовка страницы
//! размером `header_size`, который к данным не относится. Логический поток — конкатенация
//! областей данных страниц, начиная с произвольного смещения внутри первой страницы.
//!
//! ```text
//! page 0: [hdr 12][ data 244 ]   page 1: [hdr 12][ data 244 ]   ...
//!                ^offset -------------------^-------> continues after hdr
//! ```

use crate::config::LogConfig;
use crate::consts::{FLASH_PAGE_HDR_SIZE, FLASH_PAGE_SIZE};

/// Значение стёртой flash.
pub const ERASED_BYTE: u8 = 0xFF;

/// Page geometry. Invariant: `header_size < page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashLayout {
    page_size: usize,
    header_size: usize,
}

impl Default for FlashLayout {
    fn default() -> Self {
        Self {
            page_size: FLASH_PAGE_SIZE,
            header_size: FLASH_PAGE_HDR_SIZE,
        }
    }
}

impl FlashLayout {
    pub fn new(page_size: usize, header_size: usize) -> Result<Self, String> {
        if header_size >= page_size {
            return Err(format!(
                "flash page header ({}) must be smaller than page size ({})",
                header_size, page_size
            ));
        }
        Ok(Self {
            page_size,
            header_size,
        })
    }

    pub fn from_config(cfg: &LogConfig) -> Result<Self, String> {
        Self::new(cfg.flash_page_size, cfg.flash_page_header)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Data bytes carried by one page.
    pub fn data_per_page(&self) -> usize {
        self.page_size - self.header_size
    }
}

/// Собрать `len` логических байт, начиная с физического `offset`, пропуская заголовки страниц.
///
/// Pre: `layout` valid (header_size < page_size).
/// Post: result length is `len`, or less if `buf` ends first; bytes come from
/// `[offset, end of its page)` and then from `[k*page + header, (k+1)*page)` for the
/// following pages, in order. An `offset` inside a page header (including a page
/// boundary) starts right after that header.
pub fn deinterleave(buf: &[u8], offset: usize, len: usize, layout: FlashLayout) -> Vec<u8> {
    let ps = layout.page_size;
    let hs = layout.header_size;

    let mut pos = skip_page_header(offset, layout);
    let mut page_idx = pos / ps;
    let mut out = Vec::with_capacity(len.min(buf.len().saturating_sub(pos)));

    while out.len() < len && pos < buf.len() {
        let page_end = (page_idx + 1) * ps;
        let take = (len - out.len()).min(page_end - pos).min(buf.len() - pos);
        out.extend_from_slice(&buf[pos..pos + take]);
        if out.len() >= len {
            break;
        }
        page_idx += 1;
        pos = page_idx * ps + hs;
    }
    out
}

/// Физическая позиция, следующая за `len` логическими байтами, начатыми с `offset`.
pub fn physical_end(offset: usize, len: usize, layout: FlashLayout) -> usize {
    let ps = layout.page_size;
    let hs = layout.header_size;
    let mut remaining = len;
    let mut pos = skip_page_header(offset, layout);
    loop {
        let page_end = (pos / ps + 1) * ps;
        let room = page_end - pos;
        if remaining <= room {
            return pos + remaining;
        }
        remaining -= room;
        pos = page_end + hs;
    }
}

/// Inverse of [`deinterleave`]: lay `logical` out as a physical image starting at page 0.
///
/// Every page gets a synthetic header (page index LE, padded with [`ERASED_BYTE`]).
/// Bytes before `start` are erased. If `start` falls inside a page header, data begins
/// right after that header.
pub fn interleave(logical: &[u8], start: usize, layout: FlashLayout) -> Vec<u8> {
    let ps = layout.page_size;
    let hs = layout.header_size;

    let mut out = Vec::with_capacity(physical_end(start.max(hs), logical.len(), layout));
    let mut src = 0usize;

    while src < logical.len() {
        let pos = out.len();
        if hs > 0 && pos % ps == 0 {
            out.extend_from_slice(&synthetic_page_header(pos / ps, hs));
            continue;
        }
        let page_end = (pos / ps + 1) * ps;
        if pos < start {
            let pad = start.min(page_end) - pos;
            out.resize(pos + pad, ERASED_BYTE);
            continue;
        }
        let take = (page_end - pos).min(logical.len() - src);
        out.extend_from_slice(&logical[src..src + take]);
        src += take;
    }
    out
}

// заголовок страницы к данным не относится
fn skip_page_header(offset: usize, layout: FlashLayout) -> usize {
    let ps = layout.page_size;
    let hs = layout.header_size;
    if offset % ps < hs {
        (offset / ps) * ps + hs
    } else {
        offset
    }
}

fn synthetic_page_header(page_idx: usize, hs: usize) -> Vec<u8> {
    let mut h = vec![ERASED_BYTE; hs];
    let idx = (page_idx as u32).to_le_bytes();
    let n = hs.min(idx.len());
    h[..n].copy_from_slice(&idx[..n]);
    h
}
