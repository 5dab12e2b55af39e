// File: rolegate-core/src/presenter/pagination.rs

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use rolegate_common::models::inventory::InventoryItem;

pub const PAGE_SIZE: usize = 10;
pub const SUMMARY_LIMIT: usize = 5;
pub const SESSION_IDLE_TIMEOUT_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// One rendered view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Zero-based.
    pub index: usize,
    pub total_pages: usize,
    pub items: Vec<InventoryItem>,
    pub total_items: usize,
    pub summary: Vec<CategoryCount>,
    /// Distinct categories across the whole sequence, not just `summary`.
    pub category_count: usize,
    /// One-based position of `items[0]` in the full sequence.
    pub first_position: usize,
}

impl Page {
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total_pages
    }

    /// The single informational page shown for an empty sequence.
    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Back,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Back => "back",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => Ok(Direction::Next),
            "back" => Ok(Direction::Back),
            other => Err(format!("Unknown page direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdvanceRejected {
    #[error("only the user who ran the command can page through it")]
    NotOwner,
    #[error("this inventory view has expired")]
    Expired,
    #[error("no such inventory view")]
    Unknown,
}

/// `max(1, ceil(count / page_size))`
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Categories by descending count, ties kept in first-seen order.
pub fn category_summary(items: &[InventoryItem], limit: usize) -> Vec<CategoryCount> {
    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for item in items {
        match order.get(item.category.as_str()) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                order.insert(item.category.as_str(), counts.len());
                counts.push(CategoryCount {
                    category: item.category.clone(),
                    count: 1,
                });
            }
        }
    }

    // stable sort keeps encounter order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Server-side paging state over one result set, bound to the requester who
/// produced it.
#[derive(Debug, Clone)]
pub struct PresentationSession {
    owner_id: u64,
    items: Vec<InventoryItem>,
    summary: Vec<CategoryCount>,
    category_count: usize,
    page_size: usize,
    page_index: usize,
    idle_timeout: Duration,
    last_activity: DateTime<Utc>,
    closed: bool,
}

impl PresentationSession {
    pub fn new(owner_id: u64, items: Vec<InventoryItem>, now: DateTime<Utc>) -> Self {
        let summary = category_summary(&items, SUMMARY_LIMIT);
        let category_count = items
            .iter()
            .map(|item| item.category.as_str())
            .collect::<HashSet<_>>()
            .len();
        Self {
            owner_id,
            items,
            summary,
            category_count,
            page_size: PAGE_SIZE,
            page_index: 0,
            idle_timeout: Duration::seconds(SESSION_IDLE_TIMEOUT_SECS),
            last_activity: now,
            closed: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn owner_id(&self) -> u64 {
        self.owner_id
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.items.len(), self.page_size)
    }

    /// Renders `page_index`, clamped into range.
    pub fn render(&self, page_index: usize) -> Page {
        let total_pages = self.total_pages();
        let index = page_index.min(total_pages - 1);
        let start = (index * self.page_size).min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());

        Page {
            index,
            total_pages,
            items: self.items[start..end].to_vec(),
            total_items: self.items.len(),
            summary: self.summary.clone(),
            category_count: self.category_count,
            first_position: start + 1,
        }
    }

    pub fn current(&self) -> Page {
        self.render(self.page_index)
    }

    /// Moves one page in `direction`. At either bound this is a no-op that
    /// returns the unchanged page. Rejections leave the session untouched.
    pub fn advance(
        &mut self,
        actor_id: u64,
        direction: Direction,
        now: DateTime<Utc>,
    ) -> Result<Page, AdvanceRejected> {
        if self.is_expired(now) {
            return Err(AdvanceRejected::Expired);
        }
        if actor_id != self.owner_id {
            return Err(AdvanceRejected::NotOwner);
        }

        let last = self.total_pages() - 1;
        self.page_index = match direction {
            Direction::Next => (self.page_index + 1).min(last),
            Direction::Back => self.page_index.saturating_sub(1),
        };
        self.last_activity = now;
        Ok(self.current())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.closed || now - self.last_activity >= self.idle_timeout
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn items(n: usize) -> Vec<InventoryItem> {
        (1..=n)
            .map(|i| InventoryItem {
                item_id: i as u64,
                item_name: format!("Item {i}"),
                category: if i % 3 == 0 { "Hat".into() } else { "Shirt".into() },
            })
            .collect()
    }

    fn tagged(category: &str) -> InventoryItem {
        InventoryItem {
            item_id: 1,
            item_name: "x".into(),
            category: category.into(),
        }
    }

    #[test]
    fn test_twenty_three_items_make_three_pages() {
        let session = PresentationSession::new(1, items(23), t0());
        assert_eq!(session.total_pages(), 3);

        let first = session.render(0);
        assert_eq!(first.items.first().map(|i| i.item_id), Some(1));
        assert_eq!(first.items.last().map(|i| i.item_id), Some(10));

        let last = session.render(2);
        let ids: Vec<u64> = last.items.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![21, 22, 23]);
        assert_eq!(last.first_position, 21);
        assert!(last.is_last());
    }

    #[test]
    fn test_empty_sequence_is_page_one_of_one() {
        let session = PresentationSession::new(1, Vec::new(), t0());
        let page = session.current();
        assert_eq!(page.number(), 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.is_empty());
        assert!(page.items.is_empty());
        assert!(page.summary.is_empty());
        assert_eq!(page.category_count, 0);
    }

    #[test]
    fn test_advance_is_noop_at_bounds() {
        let mut session = PresentationSession::new(7, items(23), t0());

        let back = session.advance(7, Direction::Back, t0()).unwrap();
        assert_eq!(back.index, 0);

        session.advance(7, Direction::Next, t0()).unwrap();
        let last = session.advance(7, Direction::Next, t0()).unwrap();
        assert_eq!(last.index, 2);
        let still_last = session.advance(7, Direction::Next, t0()).unwrap();
        assert_eq!(still_last, last);
    }

    #[test]
    fn test_only_owner_may_advance() {
        let mut session = PresentationSession::new(7, items(23), t0());
        assert_eq!(session.advance(8, Direction::Next, t0()), Err(AdvanceRejected::NotOwner));
        assert_eq!(session.current().index, 0);
    }

    #[test]
    fn test_idle_session_expires_and_activity_refreshes() {
        let mut session = PresentationSession::new(7, items(23), t0());

        session.advance(7, Direction::Next, t0() + Duration::seconds(200)).unwrap();
        // 200s of activity pushed the deadline out
        assert!(!session.is_expired(t0() + Duration::seconds(400)));
        assert!(session.is_expired(t0() + Duration::seconds(500)));
        assert_eq!(
            session.advance(7, Direction::Next, t0() + Duration::seconds(500)),
            Err(AdvanceRejected::Expired)
        );
        assert_eq!(session.current().index, 1);
    }

    #[test]
    fn test_closed_session_rejects_owner() {
        let mut session = PresentationSession::new(7, items(5), t0());
        session.close();
        assert_eq!(session.advance(7, Direction::Back, t0()), Err(AdvanceRejected::Expired));
    }

    #[test]
    fn test_summary_orders_by_count_then_first_seen() {
        let list = vec![
            tagged("Face"),
            tagged("Hat"),
            tagged("Gear"),
            tagged("Hat"),
            tagged("Gear"),
            tagged("Shirt"),
            tagged("Pants"),
            tagged("Decal"),
        ];
        let summary = category_summary(&list, SUMMARY_LIMIT);
        let names: Vec<&str> = summary.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Hat", "Gear", "Face", "Shirt", "Pants"]);
        assert_eq!(summary[0].count, 2);

        let page = PresentationSession::new(1, list, t0()).current();
        assert_eq!(page.summary.len(), SUMMARY_LIMIT);
        assert_eq!(page.category_count, 6);
    }

    #[test]
    fn test_direction_parses() {
        assert_eq!("next".parse::<Direction>(), Ok(Direction::Next));
        assert_eq!("back".parse::<Direction>(), Ok(Direction::Back));
        assert!("up".parse::<Direction>().is_err());
    }
}
