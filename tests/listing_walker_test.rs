mod common;

use std::sync::Arc;

use common::*;
use jd_invoice_fetcher::models::{PageCursor, PageLimit};
use jd_invoice_fetcher::orchestrator::ListingWalker;
use jd_invoice_fetcher::services::Pacer;
use tempfile::tempdir;

fn walker(start: u32, max_page_no: u32) -> ListingWalker {
    ListingWalker::new(
        PageCursor::new(start, PageLimit::from_max_page_no(max_page_no)),
        Pacer::disabled(),
    )
}

fn three_pages() -> FakePortal {
    FakePortal::new()
        .with_page(vec![not_issued_row("101", 0, false)])
        .with_page(vec![not_issued_row("201", 0, true)])
        .with_page(vec![not_issued_row("301", 0, false)])
}

#[tokio::test]
async fn walks_every_page_in_order_until_the_last() {
    let dir = tempdir().unwrap();
    let portal = three_pages();
    let flow = order_flow(dir.path(), None, Arc::new(FakeTransfer::default()));

    let stats = walker(1, 0).walk(&portal, &flow).await;

    assert_eq!(stats.visited_pages, vec![1, 2, 3]);
    assert_eq!(portal.read_pages(), vec![1, 2, 3]);
    assert_eq!(stats.not_issuable, 2);
    assert_eq!(stats.request_pending, 1);
    assert!(!portal.calls().contains(&Call::Jump(4)));
}

#[tokio::test]
async fn max_page_one_processes_exactly_one_page() {
    let dir = tempdir().unwrap();
    let portal = three_pages();
    let flow = order_flow(dir.path(), None, Arc::new(FakeTransfer::default()));

    let stats = walker(1, 1).walk(&portal, &flow).await;

    assert_eq!(stats.visited_pages, vec![1]);
    assert_eq!(portal.read_pages(), vec![1]);
    assert!(!portal.calls().iter().any(|c| matches!(c, Call::Jump(_))));
}

#[tokio::test]
async fn stops_at_configured_max_page() {
    let dir = tempdir().unwrap();
    let portal = three_pages();
    let flow = order_flow(dir.path(), None, Arc::new(FakeTransfer::default()));

    let stats = walker(1, 2).walk(&portal, &flow).await;

    assert_eq!(stats.visited_pages, vec![1, 2]);
}

#[tokio::test]
async fn starts_from_configured_page() {
    let dir = tempdir().unwrap();
    let portal = three_pages();
    let flow = order_flow(dir.path(), None, Arc::new(FakeTransfer::default()));

    let stats = walker(2, 0).walk(&portal, &flow).await;

    assert_eq!(stats.visited_pages, vec![2, 3]);
    assert_eq!(portal.calls().first(), Some(&Call::Jump(2)));
}

#[tokio::test]
async fn start_page_beyond_max_is_still_processed() {
    let dir = tempdir().unwrap();
    let portal = FakePortal::new()
        .with_page(vec![not_issued_row("101", 0, false)])
        .with_page(vec![not_issued_row("201", 0, false)])
        .with_page(vec![not_issued_row("301", 0, false)])
        .with_page(vec![not_issued_row("401", 0, false)]);
    let flow = order_flow(dir.path(), None, Arc::new(FakeTransfer::default()));

    let stats = walker(3, 2).walk(&portal, &flow).await;

    assert_eq!(stats.visited_pages, vec![3]);
    assert_eq!(portal.read_pages(), vec![3]);
    assert_eq!(portal.calls().first(), Some(&Call::Jump(3)));
    assert!(!portal.calls().contains(&Call::Jump(4)));
}

#[tokio::test]
async fn unreadable_page_is_skipped() {
    let dir = tempdir().unwrap();
    let portal = three_pages().with_failing_page(2);
    let flow = order_flow(dir.path(), None, Arc::new(FakeTransfer::default()));

    let stats = walker(1, 0).walk(&portal, &flow).await;

    assert_eq!(stats.visited_pages, vec![1, 2, 3]);
    assert_eq!(stats.failed_pages, 1);
    assert_eq!(stats.not_issuable, 2);
    assert_eq!(stats.request_pending, 0);
}

#[tokio::test]
async fn failing_order_does_not_stop_the_page() {
    let dir = tempdir().unwrap();
    let portal = FakePortal::new()
        .with_page(vec![issued_row("111", 0), issued_row("222", 1)])
        .with_detail("111", snapshot("ACME Corp", "", &["换开"]))
        .with_detail("222", snapshot("ACME Corp", "", &["换开"]))
        .with_invoice("222", "ACME Corp");
    let flow = order_flow(dir.path(), Some(acme()), Arc::new(FakeTransfer::default()));

    let stats = walker(1, 0).walk(&portal, &flow).await;

    assert_eq!(stats.failed_orders, vec!["111".to_string()]);
    assert_eq!(stats.downloaded, 1);
    assert!(dir.path().join("ACME Corp-222.pdf").exists());
}

#[tokio::test]
async fn single_page_run_downloads_then_second_run_skips() {
    let dir = tempdir().unwrap();
    let transfer = Arc::new(FakeTransfer::default());
    let flow = order_flow(dir.path(), Some(acme()), transfer.clone());
    let portal = || {
        FakePortal::new()
            .with_page(vec![issued_row("12345", 0)])
            .with_detail("12345", snapshot("ACME Corp", "", &["换开"]))
            .with_invoice("12345", "ACME Corp")
    };

    let first_portal = portal();
    let first = walker(1, 1).walk(&first_portal, &flow).await;
    let second_portal = portal();
    let second = walker(1, 1).walk(&second_portal, &flow).await;

    assert_eq!(first.downloaded, 1);
    assert!(dir.path().join("ACME Corp-12345.pdf").exists());
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.already_present, 1);
    assert!(!second_portal.touched_order("12345"));
    assert_eq!(transfer.fetched().len(), 1);
}

#[tokio::test]
async fn personal_invoice_is_reissued_to_company() {
    let dir = tempdir().unwrap();
    let portal = FakePortal::new()
        .with_page(vec![issued_row("12345", 0)])
        .with_detail("12345", snapshot("个人", "", &["换开"]))
        .with_invoice("12345", "个人");
    let flow = order_flow(dir.path(), Some(acme()), Arc::new(FakeTransfer::default()));

    let stats = walker(1, 0).walk(&portal, &flow).await;

    assert_eq!(stats.reissue_submitted, 1);
    assert_eq!(stats.downloaded, 0);
    assert!(portal.calls().contains(&Call::Reissue {
        order_id: "12345".into(),
        company: "ACME Corp".into(),
    }));
}
