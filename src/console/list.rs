//! Paginated list state: filters, paging, loading and delete confirmation
//!
//! Every search is stamped with a sequence number. Only the response to the
//! most recently issued search is applied, so a slow stale response can never
//! overwrite newer rows.

use tracing::{debug, warn};

use crate::console::notice::Notice;
use crate::console::resource::{Resource, SearchFilter};
use crate::console::validator::Field;
use crate::locale::Locale;
use crate::models::{Page, SearchCriteria};

/// A search to run against the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest<F> {
    pub seq: u64,
    pub criteria: SearchCriteria<F>,
}

#[derive(Debug)]
pub struct ListState<R: Resource> {
    filter: R::Filter,
    page_no: u32,
    page: Page<R::Item>,
    loading: bool,
    last_issued: u64,
    pending_delete: Option<R::Item>,
    notice: Option<Notice>,
}

impl<R: Resource> Default for ListState<R> {
    fn default() -> Self {
        Self {
            filter: R::Filter::default(),
            page_no: 1,
            page: Page::default(),
            loading: false,
            last_issued: 0,
            pending_delete: None,
            notice: None,
        }
    }
}

impl<R: Resource> ListState<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> &R::Filter {
        &self.filter
    }

    /// Edit a filter input; takes effect on the next search
    pub fn set_filter(&mut self, field: Field, value: &str) {
        self.filter.set(field, value);
    }

    pub fn page_no(&self) -> u32 {
        self.page_no
    }

    pub fn page_size(&self) -> u32 {
        R::PAGE_SIZE
    }

    pub fn items(&self) -> &[R::Item] {
        &self.page.page_items
    }

    pub fn total_count(&self) -> u64 {
        self.page.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// The pager is only shown when the results span more than one page
    pub fn pager_visible(&self) -> bool {
        self.page.total_count > R::PAGE_SIZE as u64
    }

    pub fn total_pages(&self) -> u32 {
        pages_for(self.page.total_count, R::PAGE_SIZE)
    }

    /// Initial search when the list is shown
    pub fn mount(&mut self) -> SearchRequest<R::Filter> {
        self.issue()
    }

    /// Submit the filter bar: always restarts from page 1
    pub fn query(&mut self) -> SearchRequest<R::Filter> {
        self.page_no = 1;
        self.issue()
    }

    /// Move to another page keeping the current filters
    pub fn change_page(&mut self, page_no: u32) -> SearchRequest<R::Filter> {
        self.page_no = page_no.max(1);
        self.issue()
    }

    /// Re-run the current search
    pub fn refresh(&mut self) -> SearchRequest<R::Filter> {
        self.issue()
    }

    fn issue(&mut self) -> SearchRequest<R::Filter> {
        self.last_issued += 1;
        self.loading = true;
        debug!(
            "Issuing {} search #{} page {}",
            R::NAME,
            self.last_issued,
            self.page_no
        );
        SearchRequest {
            seq: self.last_issued,
            criteria: SearchCriteria {
                page_no: self.page_no,
                page_size: R::PAGE_SIZE,
                filter: self.filter.clone(),
            },
        }
    }

    /// Apply a search response. Returns false when the response was stale.
    pub fn search_settled(
        &mut self,
        seq: u64,
        result: Result<Page<R::Item>, String>,
        locale: &Locale,
    ) -> bool {
        if seq != self.last_issued {
            debug!(
                "Discarding stale {} search #{} (latest is #{})",
                R::NAME,
                seq,
                self.last_issued
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => self.page = page,
            Err(message) => {
                warn!("{} search failed: {}", R::NAME, message);
                self.notice = Some(Notice::error(format!(
                    "{}: {}",
                    locale.get("searchFailed"),
                    message
                )));
            }
        }
        true
    }

    pub fn pending_delete(&self) -> Option<&R::Item> {
        self.pending_delete.as_ref()
    }

    /// Ask for confirmation before deleting `item`
    pub fn request_delete(&mut self, item: R::Item) {
        self.pending_delete = Some(item);
    }

    pub fn decline_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Confirm the pending deletion, yielding the item to delete
    pub fn confirm_delete(&mut self) -> Option<R::Item> {
        self.pending_delete.take()
    }

    /// Apply a delete result. On success the list is re-fetched at the current
    /// page, clamped to the last page that still exists.
    pub fn delete_settled(
        &mut self,
        result: Result<(), String>,
        locale: &Locale,
    ) -> Option<SearchRequest<R::Filter>> {
        match result {
            Ok(()) => {
                let remaining = self.page.total_count.saturating_sub(1);
                self.page_no = self.page_no.min(pages_for(remaining, R::PAGE_SIZE));
                self.notice = Some(Notice::success(locale.get("deleted")));
                Some(self.issue())
            }
            Err(message) => {
                warn!("{} delete failed: {}", R::NAME, message);
                self.notice = Some(Notice::error(format!(
                    "{}: {}",
                    locale.get("deleteFailed"),
                    message
                )));
                None
            }
        }
    }

    /// After a successful create or update the list restarts at page 1
    pub fn mutation_settled(&mut self, locale: &Locale) -> SearchRequest<R::Filter> {
        self.notice = Some(Notice::success(locale.get("saved")));
        self.page_no = 1;
        self.issue()
    }
}

/// Number of pages for `total` items, never less than one
pub fn pages_for(total: u64, page_size: u32) -> u32 {
    let size = page_size.max(1) as u64;
    (total.div_ceil(size)).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::resource::{Permissions, Users};
    use crate::models::{Action, Module, User, UserAppPermission};

    fn grants(n: usize) -> Vec<UserAppPermission> {
        (0..n)
            .map(|i| UserAppPermission::new(&format!("user{}", i), "orders", Module::Config, Action::Read))
            .collect()
    }

    #[test]
    fn test_pager_boundary() {
        let locale = Locale::en_us();
        let mut list = ListState::<Permissions>::new();

        let req = list.mount();
        list.search_settled(req.seq, Ok(Page::new(grants(10), 10)), &locale);
        assert!(!list.pager_visible());
        assert_eq!(list.total_pages(), 1);

        let req = list.refresh();
        list.search_settled(req.seq, Ok(Page::new(grants(10), 11)), &locale);
        assert!(list.pager_visible());
        assert_eq!(list.total_pages(), 2);
    }

    #[test]
    fn test_user_list_page_size() {
        let locale = Locale::en_us();
        let mut list = ListState::<Users>::new();
        let req = list.mount();
        assert_eq!(req.criteria.page_size, 9);
        let users = (0..9).map(|i| User::new(&format!("u{}", i), "")).collect();
        list.search_settled(req.seq, Ok(Page::new(users, 10)), &locale);
        assert!(list.pager_visible());
    }

    #[test]
    fn test_page_change_keeps_filters_and_query_resets_page() {
        let mut list = ListState::<Permissions>::new();
        list.set_filter(Field::Username, "alice");
        list.set_filter(Field::App, "orders");

        let req = list.change_page(3);
        assert_eq!(req.criteria.page_no, 3);
        assert_eq!(req.criteria.filter.username, "alice");
        assert_eq!(req.criteria.filter.app, "orders");

        let req = list.query();
        assert_eq!(req.criteria.page_no, 1);
        assert_eq!(list.page_no(), 1);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let locale = Locale::en_us();
        let mut list = ListState::<Permissions>::new();
        let first = list.mount();
        let second = list.change_page(2);

        assert!(list.search_settled(second.seq, Ok(Page::new(grants(2), 12)), &locale));
        assert!(!list.is_loading());
        assert!(!list.search_settled(first.seq, Ok(Page::new(grants(10), 12)), &locale));
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_loading_cleared_on_failure() {
        let locale = Locale::en_us();
        let mut list = ListState::<Permissions>::new();
        let req = list.mount();
        assert!(list.is_loading());
        list.search_settled(req.seq, Err("connection refused".into()), &locale);
        assert!(!list.is_loading());
        assert!(list.notice().unwrap().is_error());
        assert!(list.items().is_empty());
    }

    #[test]
    fn test_delete_clamps_to_last_page() {
        let locale = Locale::en_us();
        let mut list = ListState::<Permissions>::new();
        let req = list.change_page(3);
        list.search_settled(req.seq, Ok(Page::new(grants(1), 21)), &locale);

        list.request_delete(list.items()[0].clone());
        let item = list.confirm_delete().unwrap();
        assert_eq!(item.username, "user0");
        let refresh = list.delete_settled(Ok(()), &locale).unwrap();
        assert_eq!(refresh.criteria.page_no, 2);
    }

    #[test]
    fn test_delete_keeps_page_when_rows_remain() {
        let locale = Locale::en_us();
        let mut list = ListState::<Permissions>::new();
        let req = list.change_page(2);
        list.search_settled(req.seq, Ok(Page::new(grants(5), 15)), &locale);
        let refresh = list.delete_settled(Ok(()), &locale).unwrap();
        assert_eq!(refresh.criteria.page_no, 2);
    }

    #[test]
    fn test_declined_and_failed_delete() {
        let locale = Locale::en_us();
        let mut list = ListState::<Permissions>::new();
        list.request_delete(grants(1).remove(0));
        list.decline_delete();
        assert!(list.confirm_delete().is_none());

        assert!(list.delete_settled(Err("Permission denied".into()), &locale).is_none());
        assert!(list.take_notice().unwrap().message.contains("Permission denied"));
    }

    #[test]
    fn test_pages_for() {
        assert_eq!(pages_for(0, 10), 1);
        assert_eq!(pages_for(10, 10), 1);
        assert_eq!(pages_for(11, 10), 2);
    }
}
